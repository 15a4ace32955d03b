//! Scheme-to-client shapers
//!
//! These are response-leg transforms: the one place a related UETR is
//! minted (same date and system segments as the original, fresh tail).

use super::mint_message_id;
use gateway_core::uetr::{Uetr, UetrGenerator};
use iso20022::common::{CodeOrProprietary, GroupHeader, StatusReasonInformation};
use iso20022::{camt029, camt054, pacs002, pacs004, pain002};
use serde::Serialize;
use serde_json::Value;

/// Notification delivered to the client for camt.029/054 traffic
#[derive(Debug, Clone, Serialize)]
pub struct ClientNotification {
    pub notification_type: String,
    pub uetr: Option<String>,
    pub original_message_id: Option<String>,
    pub status: String,
    pub detail: Value,
}

/// Build a pain.002 with the given group status, echoing the client's
/// original message id. Used for immediate acks, async accepted-pending
/// answers and failure advices alike.
pub fn status_pain002(
    original_message_id: &str,
    original_message_name_id: &str,
    original_uetr: Option<&Uetr>,
    group_status: &str,
    reason: Option<(&str, &str)>,
    uetr_gen: &UetrGenerator,
) -> pain002::Pain002Document {
    let related_uetr = original_uetr.map(|u| uetr_gen.generate_response(u, "pain.002"));
    let status_reason = reason.map(|(code, info)| {
        vec![StatusReasonInformation {
            reason: Some(CodeOrProprietary::code(code)),
            additional_information: Some(vec![info.to_string()]),
        }]
    });

    pain002::Pain002Document {
        customer_payment_status_report: pain002::CustomerPaymentStatusReport {
            group_header: GroupHeader::new(mint_message_id("P2")),
            original_group_information: pain002::OriginalGroupInformationAndStatus {
                original_message_id: original_message_id.to_string(),
                original_message_name_id: original_message_name_id.to_string(),
                original_creation_date_time: None,
                group_status: Some(group_status.to_string()),
                status_reason: status_reason.clone(),
            },
            payment_information_status: original_uetr.map(|u| {
                vec![pain002::PaymentInformationStatus {
                    original_payment_information_id: original_message_id.to_string(),
                    transaction_information: Some(vec![pain002::TransactionStatus {
                        status_id: related_uetr.map(|r| r.to_string()),
                        original_instruction_id: None,
                        original_end_to_end_id: None,
                        original_transaction_id: None,
                        original_uetr: Some(u.to_string()),
                        transaction_status: group_status.to_string(),
                        status_reason,
                    }]),
                }]
            }),
        },
    }
}

/// pacs.002 -> pain.002 for the initiating client
pub fn pacs002_to_pain002(
    source: &pacs002::Pacs002Document,
    client_message_id: &str,
    original_uetr: Option<&Uetr>,
    uetr_gen: &UetrGenerator,
) -> pain002::Pain002Document {
    let (status, reason) = match source.first_status() {
        Some(tx) => {
            let reason = tx
                .status_reason
                .as_ref()
                .and_then(|rs| rs.first())
                .and_then(|r| r.reason.as_ref())
                .and_then(|c| c.code.clone());
            (tx.transaction_status.clone(), reason)
        }
        None => ("RCVD".to_string(), None),
    };
    status_pain002(
        client_message_id,
        "pain.001.001.09",
        original_uetr,
        &status,
        reason.as_deref().map(|code| (code, "scheme status report")),
        uetr_gen,
    )
}

/// pacs.004 -> pain.002: a returned payment surfaces as a rejection
/// advice carrying the return reason.
pub fn pacs004_to_pain002(
    source: &pacs004::Pacs004Document,
    client_message_id: &str,
    original_uetr: Option<&Uetr>,
    uetr_gen: &UetrGenerator,
) -> pain002::Pain002Document {
    let reason_code = source.return_reason_code().unwrap_or("NARR");
    status_pain002(
        client_message_id,
        "pain.001.001.09",
        original_uetr,
        "RJCT",
        Some((reason_code, "payment returned by scheme")),
        uetr_gen,
    )
}

/// camt.054 -> client notification of a booked credit or debit
pub fn camt054_to_notification(source: &camt054::Camt054Document) -> ClientNotification {
    let refs = source.first_references();
    let entry = source
        .bank_to_customer_notification
        .notifications
        .first()
        .and_then(|n| n.entries.as_ref())
        .and_then(|es| es.first());

    ClientNotification {
        notification_type: "DEBIT_CREDIT_NOTIFICATION".to_string(),
        uetr: refs.and_then(|r| r.uetr.clone()),
        original_message_id: refs.and_then(|r| r.message_id.clone()),
        status: entry
            .and_then(|e| e.status.clone())
            .unwrap_or_else(|| "BOOK".to_string()),
        detail: serde_json::json!({
            "creditDebitIndicator": entry.map(|e| e.credit_debit_indicator.clone()),
            "amount": entry.map(|e| e.amount.amount.clone()),
            "currency": entry.map(|e| e.amount.currency.clone()),
        }),
    }
}

/// camt.029 -> client notification with the investigation outcome
pub fn camt029_to_notification(source: &camt029::Camt029Document) -> ClientNotification {
    let entry = source.first_entry();
    ClientNotification {
        notification_type: "INVESTIGATION_RESOLUTION".to_string(),
        uetr: entry.and_then(|e| e.original_uetr.clone()),
        original_message_id: source
            .resolution_of_investigation
            .cancellation_details
            .as_ref()
            .and_then(|ds| ds.first())
            .and_then(|d| d.original_group_information.as_ref())
            .map(|g| g.original_message_id.clone()),
        status: source
            .resolution_of_investigation
            .status
            .confirmation
            .clone()
            .unwrap_or_else(|| "PDNG".to_string()),
        detail: serde_json::json!({
            "cancelled": source.is_cancelled(),
            "cancellationStatus": entry.and_then(|e| e.transaction_cancellation_status.clone()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso20022::pacs002::fixtures as pacs002_fixtures;

    const UETR: &str = "20250115-PE01-P008-1A2B-0123456789AB";

    fn uetr_gen() -> UetrGenerator {
        UetrGenerator::new("PE01").unwrap()
    }

    #[test]
    fn test_pacs002_accepted_shapes_accp_pain002() {
        let original = Uetr::parse(UETR).unwrap();
        let source = pacs002_fixtures::status_for("MSG-P8", Some("TX-1"), Some(UETR), "ACCP");
        let shaped = pacs002_to_pain002(&source, "MSG-CLIENT-1", Some(&original), &uetr_gen());

        assert_eq!(shaped.group_status(), Some("ACCP"));
        let group = &shaped.customer_payment_status_report.original_group_information;
        assert_eq!(group.original_message_id, "MSG-CLIENT-1");

        // The response leg carries a related, distinct UETR
        let tx = shaped
            .customer_payment_status_report
            .payment_information_status
            .as_ref()
            .unwrap()[0]
            .transaction_information
            .as_ref()
            .unwrap()[0]
            .clone();
        assert_eq!(tx.original_uetr.as_deref(), Some(UETR));
        let response_uetr = Uetr::parse(tx.status_id.as_deref().unwrap()).unwrap();
        assert!(response_uetr.is_related_to(&original));
        assert_ne!(response_uetr.as_str(), UETR);
    }

    #[test]
    fn test_pacs002_rejection_carries_reason() {
        let mut source = pacs002_fixtures::status_for("MSG-P8", Some("TX-1"), Some(UETR), "RJCT");
        source
            .fi_to_fi_payment_status_report
            .transaction_information
            .as_mut()
            .unwrap()[0]
            .status_reason = Some(vec![StatusReasonInformation {
            reason: Some(CodeOrProprietary::code("AC04")),
            additional_information: None,
        }]);
        let original = Uetr::parse(UETR).unwrap();
        let shaped = pacs002_to_pain002(&source, "MSG-CLIENT-1", Some(&original), &uetr_gen());
        assert_eq!(shaped.group_status(), Some("RJCT"));
        let reason = shaped
            .customer_payment_status_report
            .original_group_information
            .status_reason
            .as_ref()
            .unwrap()[0]
            .reason
            .as_ref()
            .unwrap()
            .code
            .as_deref();
        assert_eq!(reason, Some("AC04"));
    }

    #[test]
    fn test_accepted_pending_ack() {
        let original = Uetr::parse(UETR).unwrap();
        let ack = status_pain002(
            "MSG-CLIENT-1",
            "pain.001.001.09",
            Some(&original),
            "PDNG",
            None,
            &uetr_gen(),
        );
        assert_eq!(ack.group_status(), Some("PDNG"));
    }
}
