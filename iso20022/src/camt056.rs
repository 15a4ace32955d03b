// ISO 20022 camt.056 - FIToFIPaymentCancellationRequest
// Interbank cancellation / status-request leg

use crate::common::{
    CodeOrProprietary, OriginalGroupInformation,
    PartyIdentification,
};
use serde::{Deserialize, Serialize};

/// camt.056 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Camt056Document {
    #[serde(rename = "FIToFIPmtCxlReq")]
    pub fi_to_fi_payment_cancellation_request: FiToFiPaymentCancellationRequest,
}

/// FI To FI Payment Cancellation Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiToFiPaymentCancellationRequest {
    #[serde(rename = "Assgnmt")]
    pub assignment: CaseAssignment,

    #[serde(rename = "Undrlyg")]
    pub underlying: Vec<UnderlyingTransaction>,
}

/// Case Assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseAssignment {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(rename = "Assgnr", skip_serializing_if = "Option::is_none")]
    pub assigner: Option<PartyIdentification>,

    #[serde(rename = "Assgne", skip_serializing_if = "Option::is_none")]
    pub assignee: Option<PartyIdentification>,

    #[serde(rename = "CreDtTm")]
    pub creation_date_time: chrono::DateTime<chrono::Utc>,
}

/// Underlying Transaction group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnderlyingTransaction {
    #[serde(rename = "TxInf", skip_serializing_if = "Option::is_none")]
    pub transaction_information: Option<Vec<CancellationTransactionInformation>>,
}

/// Cancellation Transaction Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancellationTransactionInformation {
    #[serde(rename = "CxlId", skip_serializing_if = "Option::is_none")]
    pub cancellation_id: Option<String>,

    #[serde(rename = "OrgnlGrpInf", skip_serializing_if = "Option::is_none")]
    pub original_group_information: Option<OriginalGroupInformation>,

    #[serde(rename = "OrgnlInstrId", skip_serializing_if = "Option::is_none")]
    pub original_instruction_id: Option<String>,

    #[serde(rename = "OrgnlEndToEndId", skip_serializing_if = "Option::is_none")]
    pub original_end_to_end_id: Option<String>,

    #[serde(rename = "OrgnlTxId", skip_serializing_if = "Option::is_none")]
    pub original_transaction_id: Option<String>,

    #[serde(rename = "OrgnlUETR", skip_serializing_if = "Option::is_none")]
    pub original_uetr: Option<String>,

    #[serde(rename = "CxlRsnInf", skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<Vec<CodeOrProprietary>>,
}

impl Camt056Document {
    /// First cancellation entry
    pub fn first_cancellation(&self) -> Option<&CancellationTransactionInformation> {
        self.fi_to_fi_payment_cancellation_request
            .underlying
            .first()
            .and_then(|u| u.transaction_information.as_ref())
            .and_then(|txs| txs.first())
    }
}
