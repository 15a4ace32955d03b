// ISO 20022 pain.002 - CustomerPaymentStatusReport
// Shaped back to the initiating client, echoing its original message id

use crate::common::{GroupHeader, StatusReasonInformation};
use serde::{Deserialize, Serialize};

/// pain.002 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Pain002Document {
    #[serde(rename = "CstmrPmtStsRpt")]
    pub customer_payment_status_report: CustomerPaymentStatusReport,
}

/// Customer Payment Status Report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerPaymentStatusReport {
    #[serde(rename = "GrpHdr")]
    pub group_header: GroupHeader,

    #[serde(rename = "OrgnlGrpInfAndSts")]
    pub original_group_information: OriginalGroupInformationAndStatus,

    #[serde(rename = "PmtInfSts", skip_serializing_if = "Option::is_none")]
    pub payment_information_status: Option<Vec<PaymentInformationStatus>>,
}

/// Original Group Information And Status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalGroupInformationAndStatus {
    #[serde(rename = "OrgnlMsgId")]
    pub original_message_id: String,

    #[serde(rename = "OrgnlMsgNmId")]
    pub original_message_name_id: String,

    #[serde(rename = "OrgnlCreDtTm", skip_serializing_if = "Option::is_none")]
    pub original_creation_date_time: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(rename = "GrpSts", skip_serializing_if = "Option::is_none")]
    pub group_status: Option<String>,

    #[serde(rename = "StsRsnInf", skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<Vec<StatusReasonInformation>>,
}

/// Payment Information Status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentInformationStatus {
    #[serde(rename = "OrgnlPmtInfId")]
    pub original_payment_information_id: String,

    #[serde(rename = "TxInfAndSts", skip_serializing_if = "Option::is_none")]
    pub transaction_information: Option<Vec<TransactionStatus>>,
}

/// Transaction-level status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionStatus {
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

impl Pain002Document {
    /// Group-level status code (ACCP, PDNG, RJCT, ...)
    pub fn group_status(&self) -> Option<&str> {
        self.customer_payment_status_report
            .original_group_information
            .group_status
            .as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_group_status_echoes_original_message() {
        let doc = Pain002Document {
            customer_payment_status_report: CustomerPaymentStatusReport {
                group_header: GroupHeader::new("MSG-PAIN002-0001"),
                original_group_information: OriginalGroupInformationAndStatus {
                    original_message_id: "MSG-PAIN001-0001".to_string(),
                    original_message_name_id: "pain.001.001.09".to_string(),
                    original_creation_date_time: Some(Utc::now()),
                    group_status: Some("ACCP".to_string()),
                    status_reason: None,
                },
                payment_information_status: None,
            },
        };
        assert_eq!(doc.group_status(), Some("ACCP"));
        let value = crate::to_json(&doc).unwrap();
        assert_eq!(
            value["CstmrPmtStsRpt"]["OrgnlGrpInfAndSts"]["OrgnlMsgId"],
            "MSG-PAIN001-0001"
        );
    }
}
