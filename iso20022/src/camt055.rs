// ISO 20022 camt.055 - CustomerPaymentCancellationRequest
// Client request to cancel a not-yet-settled credit transfer

use crate::common::{
    CodeOrProprietary, CurrencyAndAmount, OriginalGroupInformation,
    PartyIdentification,
};
use serde::{Deserialize, Serialize};

/// camt.055 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Camt055Document {
    #[serde(rename = "CstmrPmtCxlReq")]
    pub customer_payment_cancellation_request: CustomerPaymentCancellationRequest,
}

/// Customer Payment Cancellation Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerPaymentCancellationRequest {
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
    #[serde(rename = "OrgnlPmtInfAndCxl", skip_serializing_if = "Option::is_none")]
    pub original_payment_information: Option<Vec<OriginalPaymentInformationAndCancellation>>,
}

/// Original Payment Information And Cancellation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginalPaymentInformationAndCancellation {
    #[serde(rename = "OrgnlPmtInfId")]
    pub original_payment_information_id: String,

    #[serde(rename = "OrgnlGrpInf", skip_serializing_if = "Option::is_none")]
    pub original_group_information: Option<OriginalGroupInformation>,

    #[serde(rename = "TxInf", skip_serializing_if = "Option::is_none")]
    pub transaction_information: Option<Vec<CancellationTransactionInformation>>,
}

/// Cancellation Transaction Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancellationTransactionInformation {
    #[serde(rename = "CxlId", skip_serializing_if = "Option::is_none")]
    pub cancellation_id: Option<String>,

    #[serde(rename = "OrgnlInstrId", skip_serializing_if = "Option::is_none")]
    pub original_instruction_id: Option<String>,

    #[serde(rename = "OrgnlEndToEndId", skip_serializing_if = "Option::is_none")]
    pub original_end_to_end_id: Option<String>,

    #[serde(rename = "OrgnlTxId", skip_serializing_if = "Option::is_none")]
    pub original_transaction_id: Option<String>,

    #[serde(rename = "OrgnlUETR", skip_serializing_if = "Option::is_none")]
    pub original_uetr: Option<String>,

    #[serde(rename = "OrgnlInstdAmt", skip_serializing_if = "Option::is_none")]
    pub original_instructed_amount: Option<CurrencyAndAmount>,

    #[serde(rename = "CxlRsnInf", skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<Vec<CancellationReasonInformation>>,
}

/// Cancellation Reason Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancellationReasonInformation {
    #[serde(rename = "Rsn", skip_serializing_if = "Option::is_none")]
    pub reason: Option<CodeOrProprietary>,

    #[serde(rename = "AddtlInf", skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<Vec<String>>,
}

impl Camt055Document {
    /// First cancellation entry
    pub fn first_cancellation(&self) -> Option<&CancellationTransactionInformation> {
        self.customer_payment_cancellation_request
            .underlying
            .first()
            .and_then(|u| u.original_payment_information.as_ref())
            .and_then(|pis| pis.first())
            .and_then(|pi| pi.transaction_information.as_ref())
            .and_then(|txs| txs.first())
    }
}

/// Ready-made documents for tests across the workspace
pub mod fixtures {
    use super::*;
    use chrono::Utc;

    /// A single-transaction cancellation request
    pub fn cancellation_for(original_msg_id: &str, original_uetr: Option<&str>) -> Camt055Document {
        Camt055Document {
            customer_payment_cancellation_request: CustomerPaymentCancellationRequest {
                assignment: CaseAssignment {
                    id: "CASE-0001".to_string(),
                    assigner: None,
                    assignee: None,
                    creation_date_time: Utc::now(),
                },
                underlying: vec![UnderlyingTransaction {
                    original_payment_information: Some(vec![
                        OriginalPaymentInformationAndCancellation {
                            original_payment_information_id: "PMTINF-0001".to_string(),
                            original_group_information: Some(OriginalGroupInformation {
                                original_message_id: original_msg_id.to_string(),
                                original_message_name_id: "pain.001.001.09".to_string(),
                                original_creation_date_time: Some(Utc::now()),
                            }),
                            transaction_information: Some(vec![
                                CancellationTransactionInformation {
                                    cancellation_id: Some("CXL-0001".to_string()),
                                    original_instruction_id: None,
                                    original_end_to_end_id: Some("E2E-0001".to_string()),
                                    original_transaction_id: Some("TX-0001".to_string()),
                                    original_uetr: original_uetr.map(|s| s.to_string()),
                                    original_instructed_amount: Some(
                                        CurrencyAndAmount {
                                            currency: "GBP".to_string(),
                                            amount: "100.00".to_string(),
                                        },
                                    ),
                                    cancellation_reason: Some(vec![
                                        CancellationReasonInformation {
                                            reason: Some(CodeOrProprietary::code("DUPL")),
                                            additional_information: None,
                                        },
                                    ]),
                                },
                            ]),
                        },
                    ]),
                }],
            },
        }
    }
}
