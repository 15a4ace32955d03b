// ISO 20022 camt.054 - BankToCustomerDebitCreditNotification
// Inbound advice of booked credits/debits, delivered onward to the client

use crate::common::{CashAccount, CurrencyAndAmount, GroupHeader};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// camt.054 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Camt054Document {
    #[serde(rename = "BkToCstmrDbtCdtNtfctn")]
    pub bank_to_customer_notification: BankToCustomerNotification,
}

/// Bank To Customer Debit Credit Notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankToCustomerNotification {
    #[serde(rename = "GrpHdr")]
    pub group_header: GroupHeader,

    #[serde(rename = "Ntfctn")]
    pub notifications: Vec<AccountNotification>,
}

/// Account Notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountNotification {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(rename = "Acct")]
    pub account: CashAccount,

    #[serde(rename = "Ntry", skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<NotificationEntry>>,
}

/// Notification Entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEntry {
    #[serde(rename = "Amt")]
    pub amount: CurrencyAndAmount,

    #[serde(rename = "CdtDbtInd")]
    pub credit_debit_indicator: String,

    #[serde(rename = "Sts", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(rename = "BookgDt", skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<NaiveDate>,

    #[serde(rename = "NtryDtls", skip_serializing_if = "Option::is_none")]
    pub entry_details: Option<Vec<EntryDetails>>,
}

/// Entry Details
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryDetails {
    #[serde(rename = "TxDtls", skip_serializing_if = "Option::is_none")]
    pub transaction_details: Option<Vec<TransactionDetails>>,
}

/// Transaction Details
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionDetails {
    #[serde(rename = "Refs", skip_serializing_if = "Option::is_none")]
    pub references: Option<TransactionReferences>,

    #[serde(rename = "Amt", skip_serializing_if = "Option::is_none")]
    pub amount: Option<CurrencyAndAmount>,
}

/// Transaction References
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionReferences {
    #[serde(rename = "MsgId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(rename = "EndToEndId", skip_serializing_if = "Option::is_none")]
    pub end_to_end_id: Option<String>,

    #[serde(rename = "TxId", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    #[serde(rename = "UETR", skip_serializing_if = "Option::is_none")]
    pub uetr: Option<String>,
}

impl Camt054Document {
    /// References of the first transaction detail of the first entry
    pub fn first_references(&self) -> Option<&TransactionReferences> {
        self.bank_to_customer_notification
            .notifications
            .first()
            .and_then(|n| n.entries.as_ref())
            .and_then(|es| es.first())
            .and_then(|e| e.entry_details.as_ref())
            .and_then(|ds| ds.first())
            .and_then(|d| d.transaction_details.as_ref())
            .and_then(|ts| ts.first())
            .and_then(|t| t.references.as_ref())
    }
}
