//! Client-to-scheme transforms

use super::mint_message_id;
use chrono::Utc;
use gateway_core::error::{GatewayError, Result};
use gateway_core::tenant::TenantContext;
use iso20022::common::{
    ChargeBearerType, CodeOrProprietary, GroupHeader, OriginalGroupInformation,
    PaymentIdentification, PaymentTypeInformation,
};
use iso20022::{camt055, camt056, pacs007, pacs008, pacs028, pain001, pain007};

fn missing(field_path: &str) -> GatewayError {
    GatewayError::TransformationRequired {
        field_path: field_path.to_string(),
    }
}

/// pain.001 -> pacs.008. The established UETR is threaded unchanged;
/// `EndToEndId`, `InstrId` and `TxId` carry through verbatim.
pub fn pain001_to_pacs008(
    source: &pain001::Pain001Document,
    _tenant: &TenantContext,
    uetr: &str,
    local_instrument: Option<&str>,
) -> Result<pacs008::Pacs008Document> {
    let payment_info = source
        .first_payment_info()
        .ok_or_else(|| missing("CstmrCdtTrfInitn/PmtInf"))?;
    let tx = payment_info
        .credit_transfer_transactions
        .first()
        .ok_or_else(|| missing("PmtInf/CdtTrfTxInf"))?;

    let creditor_agent = tx
        .creditor_agent
        .clone()
        .ok_or_else(|| missing("CdtTrfTxInf/CdtrAgt"))?;

    let payment_type_information = local_instrument.map(|code| PaymentTypeInformation {
        service_level: None,
        local_instrument: Some(CodeOrProprietary::code(code)),
    });

    let mut group_header = GroupHeader::new(mint_message_id("P8"));
    group_header.creation_date_time = Utc::now();
    group_header.number_of_transactions = Some("1".to_string());
    group_header.instructing_agent = Some(payment_info.debtor_agent.clone());
    group_header.instructed_agent = Some(creditor_agent.clone());

    Ok(pacs008::Pacs008Document {
        fi_to_fi_customer_credit_transfer: pacs008::FiToFiCustomerCreditTransfer {
            group_header,
            credit_transfer_transactions: vec![pacs008::CreditTransferTransaction {
                payment_identification: PaymentIdentification {
                    instruction_id: tx.payment_identification.instruction_id.clone(),
                    end_to_end_id: tx.payment_identification.end_to_end_id.clone(),
                    transaction_id: tx.payment_identification.transaction_id.clone(),
                    uetr: Some(uetr.to_string()),
                },
                payment_type_information,
                // Amount text cloned verbatim: same currency, same scale
                interbank_settlement_amount: tx.amount.instructed_amount.clone(),
                charge_bearer: payment_info.charge_bearer.unwrap_or(ChargeBearerType::SHAR),
                debtor: payment_info.debtor.clone(),
                debtor_account: payment_info.debtor_account.clone(),
                debtor_agent: payment_info.debtor_agent.clone(),
                creditor_agent,
                creditor: tx.creditor.clone(),
                creditor_account: tx.creditor_account.clone(),
                remittance_information: tx.remittance_information.clone(),
            }],
        },
    })
}

/// camt.055 -> pacs.007. The cancellation becomes a scheme reversal;
/// original references, the original UETR included, carry verbatim.
pub fn camt055_to_pacs007(
    source: &camt055::Camt055Document,
    _tenant: &TenantContext,
) -> Result<pacs007::Pacs007Document> {
    let payment_info = source
        .customer_payment_cancellation_request
        .underlying
        .first()
        .and_then(|u| u.original_payment_information.as_ref())
        .and_then(|pis| pis.first())
        .ok_or_else(|| missing("CstmrPmtCxlReq/Undrlyg/OrgnlPmtInfAndCxl"))?;

    let original_group = payment_info
        .original_group_information
        .clone()
        .ok_or_else(|| missing("OrgnlPmtInfAndCxl/OrgnlGrpInf/OrgnlMsgId"))?;

    let transactions = payment_info
        .transaction_information
        .as_ref()
        .ok_or_else(|| missing("OrgnlPmtInfAndCxl/TxInf"))?;

    let transaction_information = transactions
        .iter()
        .map(|tx| pacs007::ReversalTransactionInformation {
            reversal_id: tx
                .cancellation_id
                .clone()
                .or_else(|| Some(mint_message_id("RVSL"))),
            original_instruction_id: tx.original_instruction_id.clone(),
            original_end_to_end_id: tx.original_end_to_end_id.clone(),
            original_transaction_id: tx.original_transaction_id.clone(),
            original_uetr: tx.original_uetr.clone(),
            reversed_interbank_settlement_amount: tx.original_instructed_amount.clone(),
            reversal_reason: tx.cancellation_reason.as_ref().map(|reasons| {
                reasons
                    .iter()
                    .map(|r| pacs007::ReversalReasonInformation {
                        reason: r.reason.clone(),
                        additional_information: r.additional_information.clone(),
                    })
                    .collect()
            }),
        })
        .collect();

    Ok(pacs007::Pacs007Document {
        fi_to_fi_payment_reversal: pacs007::FiToFiPaymentReversal {
            group_header: GroupHeader::new(mint_message_id("P7")),
            original_group_information: original_group,
            transaction_information: Some(transaction_information),
        },
    })
}

/// pain.007 -> pacs.007. The customer reversal in the scheme dialect.
pub fn pain007_to_pacs007(
    source: &pain007::Pain007Document,
    _tenant: &TenantContext,
) -> Result<pacs007::Pacs007Document> {
    let reversal = &source.customer_payment_reversal;
    let transactions = reversal
        .original_payment_information
        .as_ref()
        .and_then(|pis| pis.first())
        .and_then(|pi| pi.transaction_information.as_ref())
        .ok_or_else(|| missing("CstmrPmtRvsl/OrgnlPmtInfAndRvsl/TxInf"))?;

    let transaction_information = transactions
        .iter()
        .map(|tx| pacs007::ReversalTransactionInformation {
            reversal_id: tx
                .reversal_id
                .clone()
                .or_else(|| Some(mint_message_id("RVSL"))),
            original_instruction_id: tx.original_instruction_id.clone(),
            original_end_to_end_id: tx.original_end_to_end_id.clone(),
            original_transaction_id: tx.original_transaction_id.clone(),
            original_uetr: tx.original_uetr.clone(),
            reversed_interbank_settlement_amount: tx.reversed_instructed_amount.clone(),
            reversal_reason: tx.reversal_reason.as_ref().map(|reasons| {
                reasons
                    .iter()
                    .map(|r| pacs007::ReversalReasonInformation {
                        reason: r.reason.clone(),
                        additional_information: r.additional_information.clone(),
                    })
                    .collect()
            }),
        })
        .collect();

    Ok(pacs007::Pacs007Document {
        fi_to_fi_payment_reversal: pacs007::FiToFiPaymentReversal {
            group_header: GroupHeader::new(mint_message_id("P7")),
            original_group_information: reversal.original_group_information.clone(),
            transaction_information: Some(transaction_information),
        },
    })
}

/// camt.056 -> pacs.028. The cancellation inquiry becomes a scheme
/// status request on the original transaction.
pub fn camt056_to_pacs028(
    source: &camt056::Camt056Document,
    _tenant: &TenantContext,
) -> Result<pacs028::Pacs028Document> {
    let transactions = source
        .fi_to_fi_payment_cancellation_request
        .underlying
        .first()
        .and_then(|u| u.transaction_information.as_ref())
        .ok_or_else(|| missing("FIToFIPmtCxlReq/Undrlyg/TxInf"))?;

    let original_group: Option<OriginalGroupInformation> = transactions
        .first()
        .and_then(|tx| tx.original_group_information.clone());

    let transaction_information = transactions
        .iter()
        .map(|tx| pacs028::StatusRequestTransactionInformation {
            status_request_id: tx
                .cancellation_id
                .clone()
                .or_else(|| Some(mint_message_id("STSREQ"))),
            original_instruction_id: tx.original_instruction_id.clone(),
            original_end_to_end_id: tx.original_end_to_end_id.clone(),
            original_transaction_id: tx.original_transaction_id.clone(),
            original_uetr: tx.original_uetr.clone(),
        })
        .collect();

    Ok(pacs028::Pacs028Document {
        fi_to_fi_payment_status_request: pacs028::FiToFiPaymentStatusRequest {
            group_header: GroupHeader::new(mint_message_id("P28")),
            original_group_information: original_group,
            transaction_information: Some(transaction_information),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso20022::pain001::fixtures as pain001_fixtures;
    use proptest::prelude::*;

    const UETR: &str = "20250115-PE01-P001-1A2B-0123456789AB";

    fn tenant() -> TenantContext {
        TenantContext::new("acme").unwrap()
    }

    #[test]
    fn test_pain001_to_pacs008_threads_uetr_and_ids() {
        let source = pain001_fixtures::single_transfer(
            "GB29NWBK60161331926819",
            "GB94BARC10201530093459",
            "GBP",
            "100.00",
            Some(UETR),
        );
        let pacs008 = pain001_to_pacs008(&source, &tenant(), UETR, Some("SDVA")).unwrap();
        let tx = pacs008.first_transaction().unwrap();

        assert_eq!(tx.payment_identification.uetr.as_deref(), Some(UETR));
        assert_eq!(tx.payment_identification.end_to_end_id, "E2E-0001");
        assert_eq!(
            tx.payment_identification.instruction_id.as_deref(),
            Some("INSTR-0001")
        );
        assert_eq!(tx.interbank_settlement_amount.currency, "GBP");
        assert_eq!(tx.interbank_settlement_amount.amount, "100.00");
        assert_eq!(
            tx.payment_type_information
                .as_ref()
                .and_then(|pti| pti.local_instrument.as_ref())
                .and_then(|li| li.code.as_deref()),
            Some("SDVA")
        );
        // Destination message id is fresh
        let msg_id = &pacs008.fi_to_fi_customer_credit_transfer.group_header.message_id;
        assert!(msg_id.starts_with("P8-"));
        assert_ne!(msg_id, "MSG-PAIN001-0001");
    }

    #[test]
    fn test_pain001_missing_creditor_agent_fails_with_path() {
        let mut source = pain001_fixtures::single_transfer(
            "GB29NWBK60161331926819",
            "GB94BARC10201530093459",
            "GBP",
            "100.00",
            Some(UETR),
        );
        source
            .customer_credit_transfer_initiation
            .payment_information[0]
            .credit_transfer_transactions[0]
            .creditor_agent = None;

        let err = pain001_to_pacs008(&source, &tenant(), UETR, None).unwrap_err();
        match err {
            GatewayError::TransformationRequired { field_path } => {
                assert_eq!(field_path, "CdtTrfTxInf/CdtrAgt")
            }
            other => panic!("expected TransformationRequired, got {:?}", other),
        }
    }

    #[test]
    fn test_camt055_to_pacs007_carries_original_refs() {
        let source = iso20022::camt055::fixtures::cancellation_for("MSG-PAIN001-0001", Some(UETR));
        let pacs007 = camt055_to_pacs007(&source, &tenant()).unwrap();
        let tx = pacs007.first_reversal().unwrap();
        assert_eq!(tx.original_uetr.as_deref(), Some(UETR));
        assert_eq!(tx.original_transaction_id.as_deref(), Some("TX-0001"));
        assert_eq!(
            pacs007
                .fi_to_fi_payment_reversal
                .original_group_information
                .original_message_id,
            "MSG-PAIN001-0001"
        );
        assert_eq!(
            tx.reversed_interbank_settlement_amount.as_ref().unwrap().amount,
            "100.00"
        );
    }

    #[test]
    fn test_camt055_without_group_info_fails() {
        let mut source =
            iso20022::camt055::fixtures::cancellation_for("MSG-PAIN001-0001", Some(UETR));
        source.customer_payment_cancellation_request.underlying[0]
            .original_payment_information
            .as_mut()
            .unwrap()[0]
            .original_group_information = None;
        let err = camt055_to_pacs007(&source, &tenant()).unwrap_err();
        assert_eq!(err.kind(), "TransformationRequired");
    }

    proptest! {
        /// Money preservation: every source amount reappears with the
        /// identical currency and textual scale.
        #[test]
        fn prop_pain001_to_pacs008_preserves_money(
            units in 1u64..10_000_000u64,
            cents in 0u64..100u64,
            ccy in prop::sample::select(vec!["GBP", "ZAR", "USD", "EUR"]),
        ) {
            let amount = format!("{}.{:02}", units, cents);
            let source = pain001_fixtures::single_transfer(
                "GB29NWBK60161331926819",
                "GB94BARC10201530093459",
                ccy,
                &amount,
                Some(UETR),
            );
            let pacs008 = pain001_to_pacs008(&source, &tenant(), UETR, None).unwrap();
            let tx = pacs008.first_transaction().unwrap();
            prop_assert_eq!(&tx.interbank_settlement_amount.amount, &amount);
            prop_assert_eq!(&tx.interbank_settlement_amount.currency, ccy);
        }
    }
}
