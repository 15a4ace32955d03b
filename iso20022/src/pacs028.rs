// ISO 20022 pacs.028 - FIToFIPaymentStatusRequest
// Scheme-facing dialect for status inquiries on in-flight transfers

use crate::common::{GroupHeader, OriginalGroupInformation};
use serde::{Deserialize, Serialize};

/// pacs.028 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Pacs028Document {
    #[serde(rename = "FIToFIPmtStsReq")]
    pub fi_to_fi_payment_status_request: FiToFiPaymentStatusRequest,
}

/// FI To FI Payment Status Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiToFiPaymentStatusRequest {
    #[serde(rename = "GrpHdr")]
    pub group_header: GroupHeader,

    #[serde(rename = "OrgnlGrpInf", skip_serializing_if = "Option::is_none")]
    pub original_group_information: Option<OriginalGroupInformation>,

    #[serde(rename = "TxInf", skip_serializing_if = "Option::is_none")]
    pub transaction_information: Option<Vec<StatusRequestTransactionInformation>>,
}

/// Status Request Transaction Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRequestTransactionInformation {
    #[serde(rename = "StsReqId", skip_serializing_if = "Option::is_none")]
    pub status_request_id: Option<String>,

    #[serde(rename = "OrgnlInstrId", skip_serializing_if = "Option::is_none")]
    pub original_instruction_id: Option<String>,

    #[serde(rename = "OrgnlEndToEndId", skip_serializing_if = "Option::is_none")]
    pub original_end_to_end_id: Option<String>,

    #[serde(rename = "OrgnlTxId", skip_serializing_if = "Option::is_none")]
    pub original_transaction_id: Option<String>,

    #[serde(rename = "OrgnlUETR", skip_serializing_if = "Option::is_none")]
    pub original_uetr: Option<String>,
}

impl Pacs028Document {
    /// First status-request entry
    pub fn first_request(&self) -> Option<&StatusRequestTransactionInformation> {
        self.fi_to_fi_payment_status_request
            .transaction_information
            .as_ref()
            .and_then(|txs| txs.first())
    }
}
