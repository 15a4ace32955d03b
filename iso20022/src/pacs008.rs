// ISO 20022 pacs.008 - FIToFICustomerCreditTransfer
// Scheme-facing dialect for other-bank credit transfers

use crate::common::{
    Agent, CashAccount, ChargeBearerType, CodeOrProprietary, CurrencyAndAmount, GroupHeader,
    PartyIdentification, PaymentIdentification, PaymentTypeInformation, RemittanceInformation,
};
use serde::{Deserialize, Serialize};

/// pacs.008 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Pacs008Document {
    #[serde(rename = "FIToFICstmrCdtTrf")]
    pub fi_to_fi_customer_credit_transfer: FiToFiCustomerCreditTransfer,
}

/// FI To FI Customer Credit Transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiToFiCustomerCreditTransfer {
    #[serde(rename = "GrpHdr")]
    pub group_header: GroupHeader,

    #[serde(rename = "CdtTrfTxInf")]
    pub credit_transfer_transactions: Vec<CreditTransferTransaction>,
}

/// Credit Transfer Transaction Information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransferTransaction {
    #[serde(rename = "PmtId")]
    pub payment_identification: PaymentIdentification,

    #[serde(rename = "PmtTpInf", skip_serializing_if = "Option::is_none")]
    pub payment_type_information: Option<PaymentTypeInformation>,

    #[serde(rename = "IntrBkSttlmAmt")]
    pub interbank_settlement_amount: CurrencyAndAmount,

    #[serde(rename = "ChrgBr")]
    pub charge_bearer: ChargeBearerType,

    #[serde(rename = "Dbtr")]
    pub debtor: PartyIdentification,

    #[serde(rename = "DbtrAcct")]
    pub debtor_account: CashAccount,

    #[serde(rename = "DbtrAgt")]
    pub debtor_agent: Agent,

    #[serde(rename = "CdtrAgt")]
    pub creditor_agent: Agent,

    #[serde(rename = "Cdtr")]
    pub creditor: PartyIdentification,

    #[serde(rename = "CdtrAcct")]
    pub creditor_account: CashAccount,

    #[serde(rename = "RmtInf", skip_serializing_if = "Option::is_none")]
    pub remittance_information: Option<RemittanceInformation>,
}

/// Settlement Information carried by the group header of scheme traffic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementInformation {
    #[serde(rename = "SttlmMtd")]
    pub settlement_method: String,

    #[serde(rename = "ClrSys", skip_serializing_if = "Option::is_none")]
    pub clearing_system: Option<CodeOrProprietary>,
}

impl Pacs008Document {
    /// First transaction of the transfer
    pub fn first_transaction(&self) -> Option<&CreditTransferTransaction> {
        self.fi_to_fi_customer_credit_transfer
            .credit_transfer_transactions
            .first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::AccountId;
    use chrono::Utc;

    #[test]
    fn test_xml_serialization_uses_short_tags() {
        let doc = Pacs008Document {
            fi_to_fi_customer_credit_transfer: FiToFiCustomerCreditTransfer {
                group_header: GroupHeader {
                    message_id: "MSG-PACS008-0001".to_string(),
                    creation_date_time: Utc::now(),
                    number_of_transactions: Some("1".to_string()),
                    control_sum: None,
                    initiating_party: None,
                    instructing_agent: Some(Agent::from_bic("NWBKGB2L")),
                    instructed_agent: Some(Agent::from_bic("BARCGB22")),
                },
                credit_transfer_transactions: vec![CreditTransferTransaction {
                    payment_identification: PaymentIdentification {
                        instruction_id: None,
                        end_to_end_id: "E2E-0001".to_string(),
                        transaction_id: Some("TX-0001".to_string()),
                        uetr: Some("20250115-PE01-P008-1A2B-0123456789AB".to_string()),
                    },
                    payment_type_information: None,
                    interbank_settlement_amount: CurrencyAndAmount {
                        currency: "GBP".to_string(),
                        amount: "100.00".to_string(),
                    },
                    charge_bearer: ChargeBearerType::SHAR,
                    debtor: PartyIdentification {
                        name: Some("Alice".to_string()),
                        postal_address: None,
                        country_of_residence: None,
                    },
                    debtor_account: CashAccount {
                        id: AccountId::Iban("GB29NWBK60161331926819".to_string()),
                        currency: None,
                    },
                    debtor_agent: Agent::from_bic("NWBKGB2L"),
                    creditor_agent: Agent::from_bic("BARCGB22"),
                    creditor: PartyIdentification {
                        name: Some("Bob".to_string()),
                        postal_address: None,
                        country_of_residence: None,
                    },
                    creditor_account: CashAccount {
                        id: AccountId::Iban("GB94BARC10201530093459".to_string()),
                        currency: None,
                    },
                    remittance_information: None,
                }],
            },
        };

        let xml = crate::to_xml(&doc).unwrap();
        assert!(xml.contains("<FIToFICstmrCdtTrf>"));
        assert!(xml.contains("<UETR>20250115-PE01-P008-1A2B-0123456789AB</UETR>"));
        assert!(xml.contains("Ccy=\"GBP\""));
        assert!(xml.contains("100.00"));
    }
}
