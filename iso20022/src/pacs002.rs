// ISO 20022 pacs.002 - FIToFIPaymentStatusReport
// Scheme status advice correlated back to an in-flight transfer

use crate::common::{
    GroupHeader, OriginalGroupInformation, StatusReasonInformation,
};
use serde::{Deserialize, Serialize};

/// pacs.002 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Pacs002Document {
    #[serde(rename = "FIToFIPmtStsRpt")]
    pub fi_to_fi_payment_status_report: FiToFiPaymentStatusReport,
}

/// FI To FI Payment Status Report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiToFiPaymentStatusReport {
    #[serde(rename = "GrpHdr")]
    pub group_header: GroupHeader,

    #[serde(rename = "OrgnlGrpInfAndSts")]
    pub original_group_information: OriginalGroupInformation,

    #[serde(rename = "TxInfAndSts", skip_serializing_if = "Option::is_none")]
    pub transaction_information: Option<Vec<TransactionInformationAndStatus>>,
}

/// Transaction Information And Status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionInformationAndStatus {
    #[serde(rename = "StsId", skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,

    #[serde(rename = "OrgnlInstrId", skip_serializing_if = "Option::is_none")]
    pub original_instruction_id: Option<String>,

    #[serde(rename = "OrgnlEndToEndId", skip_serializing_if = "Option::is_none")]
    pub original_end_to_end_id: Option<String>,

    #[serde(rename = "OrgnlTxId", skip_serializing_if = "Option::is_none")]
    pub original_transaction_id: Option<String>,

    #[serde(rename = "OrgnlUETR", skip_serializing_if = "Option::is_none")]
    pub original_uetr: Option<String>,

    #[serde(rename = "TxSts")]
    pub transaction_status: String,

    #[serde(rename = "StsRsnInf", skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<Vec<StatusReasonInformation>>,
}

impl Pacs002Document {
    /// First transaction status entry
    pub fn first_status(&self) -> Option<&TransactionInformationAndStatus> {
        self.fi_to_fi_payment_status_report
            .transaction_information
            .as_ref()
            .and_then(|txs| txs.first())
    }

    /// Whether the scheme accepted the original message
    pub fn is_accepted(&self) -> bool {
        self.first_status()
            .map(|s| matches!(s.transaction_status.as_str(), "ACCP" | "ACSC" | "ACSP"))
            .unwrap_or(false)
    }
}

/// Ready-made documents for tests across the workspace
pub mod fixtures {
    use super::*;
    use chrono::Utc;

    /// A status report for the given original references
    pub fn status_for(
        original_msg_id: &str,
        original_tx_id: Option<&str>,
        original_uetr: Option<&str>,
        tx_status: &str,
    ) -> Pacs002Document {
        Pacs002Document {
            fi_to_fi_payment_status_report: FiToFiPaymentStatusReport {
                group_header: GroupHeader::new("MSG-PACS002-0001"),
                original_group_information: OriginalGroupInformation {
                    original_message_id: original_msg_id.to_string(),
                    original_message_name_id: "pacs.008.001.08".to_string(),
                    original_creation_date_time: Some(Utc::now()),
                },
                transaction_information: Some(vec![TransactionInformationAndStatus {
                    status_id: None,
                    original_instruction_id: None,
                    original_end_to_end_id: Some("E2E-0001".to_string()),
                    original_transaction_id: original_tx_id.map(|s| s.to_string()),
                    original_uetr: original_uetr.map(|s| s.to_string()),
                    transaction_status: tx_status.to_string(),
                    status_reason: None,
                }]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptance_codes() {
        assert!(fixtures::status_for("M1", None, None, "ACCP").is_accepted());
        assert!(fixtures::status_for("M1", None, None, "ACSC").is_accepted());
        assert!(!fixtures::status_for("M1", None, None, "RJCT").is_accepted());
    }
}
