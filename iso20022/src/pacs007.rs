// ISO 20022 pacs.007 - FIToFIPaymentReversal
// Scheme-facing dialect for reversals and cancellations-as-reversals

use crate::common::{
    CodeOrProprietary, CurrencyAndAmount, GroupHeader, OriginalGroupInformation,
};
use serde::{Deserialize, Serialize};

/// pacs.007 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Pacs007Document {
    #[serde(rename = "FIToFIPmtRvsl")]
    pub fi_to_fi_payment_reversal: FiToFiPaymentReversal,
}

/// FI To FI Payment Reversal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiToFiPaymentReversal {
    #[serde(rename = "GrpHdr")]
    pub group_header: GroupHeader,

    #[serde(rename = "OrgnlGrpInf")]
    pub original_group_information: OriginalGroupInformation,

    #[serde(rename = "TxInf", skip_serializing_if = "Option::is_none")]
    pub transaction_information: Option<Vec<ReversalTransactionInformation>>,
}

/// Reversal Transaction Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReversalTransactionInformation {
    #[serde(rename = "RvslId", skip_serializing_if = "Option::is_none")]
    pub reversal_id: Option<String>,

    #[serde(rename = "OrgnlInstrId", skip_serializing_if = "Option::is_none")]
    pub original_instruction_id: Option<String>,

    #[serde(rename = "OrgnlEndToEndId", skip_serializing_if = "Option::is_none")]
    pub original_end_to_end_id: Option<String>,

    #[serde(rename = "OrgnlTxId", skip_serializing_if = "Option::is_none")]
    pub original_transaction_id: Option<String>,

    #[serde(rename = "OrgnlUETR", skip_serializing_if = "Option::is_none")]
    pub original_uetr: Option<String>,

    #[serde(rename = "RvsdIntrBkSttlmAmt", skip_serializing_if = "Option::is_none")]
    pub reversed_interbank_settlement_amount: Option<CurrencyAndAmount>,

    #[serde(rename = "RvslRsnInf", skip_serializing_if = "Option::is_none")]
    pub reversal_reason: Option<Vec<ReversalReasonInformation>>,
}

/// Reversal Reason Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReversalReasonInformation {
    #[serde(rename = "Rsn", skip_serializing_if = "Option::is_none")]
    pub reason: Option<CodeOrProprietary>,

    #[serde(rename = "AddtlInf", skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<Vec<String>>,
}

impl Pacs007Document {
    /// First reversal entry
    pub fn first_reversal(&self) -> Option<&ReversalTransactionInformation> {
        self.fi_to_fi_payment_reversal
            .transaction_information
            .as_ref()
            .and_then(|txs| txs.first())
    }
}
