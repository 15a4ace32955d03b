// ISO 20022 camt.029 - ResolutionOfInvestigation
// Scheme answer to a cancellation or investigation case

use crate::common::{CodeOrProprietary, OriginalGroupInformation};
use crate::camt056::CaseAssignment;
use serde::{Deserialize, Serialize};

/// camt.029 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Camt029Document {
    #[serde(rename = "RsltnOfInvstgtn")]
    pub resolution_of_investigation: ResolutionOfInvestigation,
}

/// Resolution Of Investigation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionOfInvestigation {
    #[serde(rename = "Assgnmt")]
    pub assignment: CaseAssignment,

    #[serde(rename = "Sts")]
    pub status: InvestigationStatus,

    #[serde(rename = "CxlDtls", skip_serializing_if = "Option::is_none")]
    pub cancellation_details: Option<Vec<CancellationDetails>>,
}

/// Investigation Status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestigationStatus {
    #[serde(rename = "Conf", skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<String>,
}

/// Cancellation Details
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancellationDetails {
    #[serde(rename = "OrgnlGrpInfAndSts", skip_serializing_if = "Option::is_none")]
    pub original_group_information: Option<OriginalGroupInformation>,

    #[serde(rename = "TxInfAndSts", skip_serializing_if = "Option::is_none")]
    pub transaction_information: Option<Vec<CancellationStatusEntry>>,
}

/// Per-transaction cancellation status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancellationStatusEntry {
    #[serde(rename = "CxlStsId", skip_serializing_if = "Option::is_none")]
    pub cancellation_status_id: Option<String>,

    #[serde(rename = "OrgnlInstrId", skip_serializing_if = "Option::is_none")]
    pub original_instruction_id: Option<String>,

    #[serde(rename = "OrgnlEndToEndId", skip_serializing_if = "Option::is_none")]
    pub original_end_to_end_id: Option<String>,

    #[serde(rename = "OrgnlTxId", skip_serializing_if = "Option::is_none")]
    pub original_transaction_id: Option<String>,

    #[serde(rename = "OrgnlUETR", skip_serializing_if = "Option::is_none")]
    pub original_uetr: Option<String>,

    #[serde(rename = "TxCxlSts", skip_serializing_if = "Option::is_none")]
    pub transaction_cancellation_status: Option<String>,

    #[serde(rename = "CxlStsRsnInf", skip_serializing_if = "Option::is_none")]
    pub cancellation_status_reason: Option<Vec<CodeOrProprietary>>,
}

impl Camt029Document {
    /// Whether the investigation confirms the cancellation (CNCL family)
    pub fn is_cancelled(&self) -> bool {
        self.resolution_of_investigation
            .status
            .confirmation
            .as_deref()
            .map(|c| matches!(c, "CNCL" | "ACCR"))
            .unwrap_or(false)
    }

    /// First cancellation status entry
    pub fn first_entry(&self) -> Option<&CancellationStatusEntry> {
        self.resolution_of_investigation
            .cancellation_details
            .as_ref()
            .and_then(|ds| ds.first())
            .and_then(|d| d.transaction_information.as_ref())
            .and_then(|txs| txs.first())
    }
}
