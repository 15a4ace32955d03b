// ISO 20022 pain.001 - CustomerCreditTransferInitiation
// Entry point for customer-initiated credit transfers into the gateway

use crate::common::{
    Agent, CashAccount, ChargeBearerType, CurrencyAndAmount, GroupHeader, PartyIdentification,
    PaymentIdentification, PaymentTypeInformation, RemittanceInformation,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// pain.001 Document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Pain001Document {
    #[serde(rename = "CstmrCdtTrfInitn")]
    pub customer_credit_transfer_initiation: CustomerCreditTransferInitiation,
}

/// Customer Credit Transfer Initiation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCreditTransferInitiation {
    #[serde(rename = "GrpHdr")]
    pub group_header: GroupHeader,
    #[serde(rename = "PmtInf")]
    pub payment_information: Vec<PaymentInformation>,
}

/// Payment Information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInformation {
    #[serde(rename = "PmtInfId")]
    pub payment_information_id: String,

    #[serde(rename = "PmtMtd")]
    pub payment_method: String,

    #[serde(rename = "PmtTpInf", skip_serializing_if = "Option::is_none")]
    pub payment_type_information: Option<PaymentTypeInformation>,

    #[serde(rename = "ReqdExctnDt", skip_serializing_if = "Option::is_none")]
    pub requested_execution_date: Option<NaiveDate>,

    #[serde(rename = "Dbtr")]
    pub debtor: PartyIdentification,

    #[serde(rename = "DbtrAcct")]
    pub debtor_account: CashAccount,

    #[serde(rename = "DbtrAgt")]
    pub debtor_agent: Agent,

    #[serde(rename = "ChrgBr", skip_serializing_if = "Option::is_none")]
    pub charge_bearer: Option<ChargeBearerType>,

    #[serde(rename = "CdtTrfTxInf")]
    pub credit_transfer_transactions: Vec<CreditTransferTransaction>,
}

/// Credit Transfer Transaction Information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransferTransaction {
    #[serde(rename = "PmtId")]
    pub payment_identification: PaymentIdentification,

    #[serde(rename = "Amt")]
    pub amount: AmountType,

    #[serde(rename = "CdtrAgt", skip_serializing_if = "Option::is_none")]
    pub creditor_agent: Option<Agent>,

    #[serde(rename = "Cdtr")]
    pub creditor: PartyIdentification,

    #[serde(rename = "CdtrAcct")]
    pub creditor_account: CashAccount,

    #[serde(rename = "RmtInf", skip_serializing_if = "Option::is_none")]
    pub remittance_information: Option<RemittanceInformation>,
}

/// Amount wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountType {
    #[serde(rename = "InstdAmt")]
    pub instructed_amount: CurrencyAndAmount,
}

impl Pain001Document {
    /// First credit-transfer transaction, where the UETR and the routed
    /// accounts live. Absent on an empty initiation.
    pub fn first_transaction(&self) -> Option<&CreditTransferTransaction> {
        self.customer_credit_transfer_initiation
            .payment_information
            .first()
            .and_then(|pi| pi.credit_transfer_transactions.first())
    }

    /// First payment information block
    pub fn first_payment_info(&self) -> Option<&PaymentInformation> {
        self.customer_credit_transfer_initiation
            .payment_information
            .first()
    }
}

/// Ready-made documents for tests across the workspace
pub mod fixtures {
    use super::*;
    use crate::common::AccountId;
    use chrono::Utc;

    /// A single-transaction pain.001 between the given IBANs
    pub fn single_transfer(
        debtor_iban: &str,
        creditor_iban: &str,
        currency: &str,
        amount: &str,
        uetr: Option<&str>,
    ) -> Pain001Document {
        Pain001Document {
            customer_credit_transfer_initiation: CustomerCreditTransferInitiation {
                group_header: GroupHeader {
                    message_id: "MSG-PAIN001-0001".to_string(),
                    creation_date_time: Utc::now(),
                    number_of_transactions: Some("1".to_string()),
                    control_sum: None,
                    initiating_party: Some(PartyIdentification {
                        name: Some("Acme Treasury".to_string()),
                        postal_address: None,
                        country_of_residence: None,
                    }),
                    instructing_agent: None,
                    instructed_agent: None,
                },
                payment_information: vec![PaymentInformation {
                    payment_information_id: "PMTINF-0001".to_string(),
                    payment_method: "TRF".to_string(),
                    payment_type_information: None,
                    requested_execution_date: None,
                    debtor: PartyIdentification {
                        name: Some("Alice".to_string()),
                        postal_address: None,
                        country_of_residence: None,
                    },
                    debtor_account: CashAccount {
                        id: AccountId::Iban(debtor_iban.to_string()),
                        currency: Some(currency.to_string()),
                    },
                    debtor_agent: Agent::from_bic("NWBKGB2L"),
                    charge_bearer: Some(ChargeBearerType::SHAR),
                    credit_transfer_transactions: vec![CreditTransferTransaction {
                        payment_identification: PaymentIdentification {
                            instruction_id: Some("INSTR-0001".to_string()),
                            end_to_end_id: "E2E-0001".to_string(),
                            transaction_id: None,
                            uetr: uetr.map(|u| u.to_string()),
                        },
                        amount: AmountType {
                            instructed_amount: CurrencyAndAmount {
                                currency: currency.to_string(),
                                amount: amount.to_string(),
                            },
                        },
                        creditor_agent: Some(Agent::from_bic("BARCGB22")),
                        creditor: PartyIdentification {
                            name: Some("Bob".to_string()),
                            postal_address: None,
                            country_of_residence: None,
                        },
                        creditor_account: CashAccount {
                            id: AccountId::Iban(creditor_iban.to_string()),
                            currency: None,
                        },
                        remittance_information: Some(RemittanceInformation {
                            unstructured: Some(vec!["Invoice 42".to_string()]),
                        }),
                    }],
                }],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_transaction() {
        let doc = fixtures::single_transfer(
            "GB29NWBK60161331926819",
            "GB94BARC10201530093459",
            "GBP",
            "100.00",
            None,
        );
        let tx = doc.first_transaction().unwrap();
        assert_eq!(tx.payment_identification.end_to_end_id, "E2E-0001");
        assert!(tx.payment_identification.uetr.is_none());
        assert_eq!(tx.amount.instructed_amount.amount, "100.00");
    }

    #[test]
    fn test_json_round_trip_keeps_short_tags() {
        let doc = fixtures::single_transfer(
            "GB29NWBK60161331926819",
            "GB94BARC10201530093459",
            "GBP",
            "250.50",
            Some("20250115-PE01-P001-1A2B-0123456789AB"),
        );
        let value = crate::to_json(&doc).unwrap();
        assert!(value.get("CstmrCdtTrfInitn").is_some());
        let parsed: Pain001Document = crate::from_json(&value).unwrap();
        assert_eq!(
            parsed.first_transaction().unwrap().payment_identification.uetr,
            Some("20250115-PE01-P001-1A2B-0123456789AB".to_string())
        );
    }
}
