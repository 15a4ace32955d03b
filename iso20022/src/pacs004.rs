// ISO 20022 pacs.004 - PaymentReturn
// Scheme-initiated return of a previously settled transfer

use crate::common::{
    CodeOrProprietary, CurrencyAndAmount, GroupHeader, OriginalGroupInformation,
};
use serde::{Deserialize, Serialize};

/// pacs.004 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Pacs004Document {
    #[serde(rename = "PmtRtr")]
    pub payment_return: PaymentReturn,
}

/// Payment Return
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReturn {
    #[serde(rename = "GrpHdr")]
    pub group_header: GroupHeader,

    #[serde(rename = "OrgnlGrpInf", skip_serializing_if = "Option::is_none")]
    pub original_group_information: Option<OriginalGroupInformation>,

    #[serde(rename = "TxInf", skip_serializing_if = "Option::is_none")]
    pub transaction_information: Option<Vec<ReturnTransactionInformation>>,
}

/// Return Transaction Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnTransactionInformation {
    #[serde(rename = "RtrId", skip_serializing_if = "Option::is_none")]
    pub return_id: Option<String>,

    #[serde(rename = "OrgnlInstrId", skip_serializing_if = "Option::is_none")]
    pub original_instruction_id: Option<String>,

    #[serde(rename = "OrgnlEndToEndId", skip_serializing_if = "Option::is_none")]
    pub original_end_to_end_id: Option<String>,

    #[serde(rename = "OrgnlTxId", skip_serializing_if = "Option::is_none")]
    pub original_transaction_id: Option<String>,

    #[serde(rename = "OrgnlUETR", skip_serializing_if = "Option::is_none")]
    pub original_uetr: Option<String>,

    #[serde(rename = "RtrdIntrBkSttlmAmt", skip_serializing_if = "Option::is_none")]
    pub returned_interbank_settlement_amount: Option<CurrencyAndAmount>,

    #[serde(rename = "RtrRsnInf", skip_serializing_if = "Option::is_none")]
    pub return_reason: Option<Vec<ReturnReasonInformation>>,
}

/// Return Reason Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnReasonInformation {
    #[serde(rename = "Rsn", skip_serializing_if = "Option::is_none")]
    pub reason: Option<CodeOrProprietary>,

    #[serde(rename = "AddtlInf", skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<Vec<String>>,
}

impl Pacs004Document {
    /// First return entry
    pub fn first_return(&self) -> Option<&ReturnTransactionInformation> {
        self.payment_return
            .transaction_information
            .as_ref()
            .and_then(|txs| txs.first())
    }

    /// Reason code of the first return entry, if present
    pub fn return_reason_code(&self) -> Option<&str> {
        self.first_return()
            .and_then(|tx| tx.return_reason.as_ref())
            .and_then(|rs| rs.first())
            .and_then(|r| r.reason.as_ref())
            .and_then(|c| c.code.as_deref())
    }
}
