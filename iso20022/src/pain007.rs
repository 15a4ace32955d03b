// ISO 20022 pain.007 - CustomerPaymentReversal
// Client-initiated reversal of an executed credit transfer

use crate::common::{
    CodeOrProprietary, CurrencyAndAmount, GroupHeader, OriginalGroupInformation,
};
use serde::{Deserialize, Serialize};

/// pain.007 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Pain007Document {
    #[serde(rename = "CstmrPmtRvsl")]
    pub customer_payment_reversal: CustomerPaymentReversal,
}

/// Customer Payment Reversal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerPaymentReversal {
    #[serde(rename = "GrpHdr")]
    pub group_header: GroupHeader,

    #[serde(rename = "OrgnlGrpInf")]
    pub original_group_information: OriginalGroupInformation,

    #[serde(rename = "OrgnlPmtInfAndRvsl", skip_serializing_if = "Option::is_none")]
    pub original_payment_information: Option<Vec<OriginalPaymentInformationAndReversal>>,
}

/// Original Payment Information And Reversal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginalPaymentInformationAndReversal {
    #[serde(rename = "OrgnlPmtInfId")]
    pub original_payment_information_id: String,

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

    #[serde(rename = "RvsdInstdAmt", skip_serializing_if = "Option::is_none")]
    pub reversed_instructed_amount: Option<CurrencyAndAmount>,

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

impl Pain007Document {
    /// First reversal entry
    pub fn first_reversal(&self) -> Option<&ReversalTransactionInformation> {
        self.customer_payment_reversal
            .original_payment_information
            .as_ref()
            .and_then(|pis| pis.first())
            .and_then(|pi| pi.transaction_information.as_ref())
            .and_then(|txs| txs.first())
    }
}
