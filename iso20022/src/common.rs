// ISO 20022 Common Types and Structures

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Party Identification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartyIdentification {
    #[serde(rename = "Nm", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "PstlAdr", skip_serializing_if = "Option::is_none")]
    pub postal_address: Option<PostalAddress>,

    #[serde(rename = "CtryOfRes", skip_serializing_if = "Option::is_none")]
    pub country_of_residence: Option<String>,
}

/// Postal Address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostalAddress {
    #[serde(rename = "Ctry", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(rename = "AdrLine", skip_serializing_if = "Option::is_none")]
    pub address_line: Option<Vec<String>>,
}

/// Agent (Financial Institution)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Agent {
    #[serde(rename = "FinInstnId")]
    pub financial_institution_id: FinancialInstitutionIdentification,
}

impl Agent {
    /// Agent identified by BIC only
    pub fn from_bic(bic: impl Into<String>) -> Self {
        Self {
            financial_institution_id: FinancialInstitutionIdentification {
                bic: Some(bic.into()),
                clearing_system_member_id: None,
                name: None,
            },
        }
    }

    /// The member id on the local clearing system, if identified that way
    pub fn member_id(&self) -> Option<&str> {
        self.financial_institution_id
            .clearing_system_member_id
            .as_ref()
            .map(|m| m.member_id.as_str())
    }
}

/// Financial Institution Identification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialInstitutionIdentification {
    #[serde(rename = "BICFI", skip_serializing_if = "Option::is_none")]
    pub bic: Option<String>,

    #[serde(rename = "ClrSysMmbId", skip_serializing_if = "Option::is_none")]
    pub clearing_system_member_id: Option<ClearingSystemMemberIdentification>,

    #[serde(rename = "Nm", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Clearing System Member Identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearingSystemMemberIdentification {
    #[serde(rename = "ClrSysId", skip_serializing_if = "Option::is_none")]
    pub clearing_system_id: Option<CodeOrProprietary>,

    #[serde(rename = "MmbId")]
    pub member_id: String,
}

/// Cash Account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashAccount {
    #[serde(rename = "Id")]
    pub id: AccountId,

    #[serde(rename = "Ccy", skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl CashAccount {
    /// Account identified by IBAN
    pub fn iban(value: impl Into<String>) -> Self {
        Self {
            id: AccountId::Iban(value.into()),
            currency: None,
        }
    }

    /// The account number regardless of identification scheme
    pub fn account_number(&self) -> &str {
        match &self.id {
            AccountId::Iban(iban) => iban,
            AccountId::Other(other) => &other.id,
        }
    }
}

/// Account identification (IBAN or proprietary)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AccountId {
    #[serde(rename = "IBAN")]
    Iban(String),
    #[serde(rename = "Othr")]
    Other(GenericAccountIdentification),
}

/// Generic Account Identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericAccountIdentification {
    #[serde(rename = "Id")]
    pub id: String,
}

/// Active or Historic Currency and Amount. The textual amount is kept
/// verbatim so scale survives serialization untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAndAmount {
    #[serde(rename = "@Ccy")]
    pub currency: String,

    #[serde(rename = "$text")]
    pub amount: String,
}

impl CurrencyAndAmount {
    pub fn to_decimal(&self) -> Result<Decimal, rust_decimal::Error> {
        self.amount.parse::<Decimal>()
    }

    pub fn from_decimal(currency: impl Into<String>, amount: Decimal) -> Self {
        Self {
            currency: currency.into(),
            amount: amount.to_string(),
        }
    }
}

/// Group Header shared by initiation and FI-to-FI messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupHeader {
    #[serde(rename = "MsgId")]
    pub message_id: String,

    #[serde(rename = "CreDtTm")]
    pub creation_date_time: DateTime<Utc>,

    #[serde(rename = "NbOfTxs", skip_serializing_if = "Option::is_none")]
    pub number_of_transactions: Option<String>,

    #[serde(rename = "CtrlSum", skip_serializing_if = "Option::is_none")]
    pub control_sum: Option<String>,

    #[serde(rename = "InitgPty", skip_serializing_if = "Option::is_none")]
    pub initiating_party: Option<PartyIdentification>,

    #[serde(rename = "InstgAgt", skip_serializing_if = "Option::is_none")]
    pub instructing_agent: Option<Agent>,

    #[serde(rename = "InstdAgt", skip_serializing_if = "Option::is_none")]
    pub instructed_agent: Option<Agent>,
}

impl GroupHeader {
    /// A minimal header for a freshly minted message
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            creation_date_time: Utc::now(),
            number_of_transactions: None,
            control_sum: None,
            initiating_party: None,
            instructing_agent: None,
            instructed_agent: None,
        }
    }
}

/// Payment Identification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentIdentification {
    #[serde(rename = "InstrId", skip_serializing_if = "Option::is_none")]
    pub instruction_id: Option<String>,

    #[serde(rename = "EndToEndId")]
    pub end_to_end_id: String,

    #[serde(rename = "TxId", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    #[serde(rename = "UETR", skip_serializing_if = "Option::is_none")]
    pub uetr: Option<String>,
}

/// Payment Type Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentTypeInformation {
    #[serde(rename = "SvcLvl", skip_serializing_if = "Option::is_none")]
    pub service_level: Option<CodeOrProprietary>,

    #[serde(rename = "LclInstrm", skip_serializing_if = "Option::is_none")]
    pub local_instrument: Option<CodeOrProprietary>,
}

/// Code or Proprietary choice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeOrProprietary {
    #[serde(rename = "Cd", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(rename = "Prtry", skip_serializing_if = "Option::is_none")]
    pub proprietary: Option<String>,
}

impl CodeOrProprietary {
    pub fn code(value: impl Into<String>) -> Self {
        Self {
            code: Some(value.into()),
            proprietary: None,
        }
    }
}

/// Remittance Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemittanceInformation {
    #[serde(rename = "Ustrd", skip_serializing_if = "Option::is_none")]
    pub unstructured: Option<Vec<String>>,
}

/// Charge Bearer Type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeBearerType {
    DEBT,
    CRED,
    SHAR,
    SLEV,
}

/// Original Group Information carried by status/return/reversal messages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginalGroupInformation {
    #[serde(rename = "OrgnlMsgId")]
    pub original_message_id: String,

    #[serde(rename = "OrgnlMsgNmId")]
    pub original_message_name_id: String,

    #[serde(rename = "OrgnlCreDtTm", skip_serializing_if = "Option::is_none")]
    pub original_creation_date_time: Option<DateTime<Utc>>,
}

/// Status Reason Information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusReasonInformation {
    #[serde(rename = "Rsn", skip_serializing_if = "Option::is_none")]
    pub reason: Option<CodeOrProprietary>,

    #[serde(rename = "AddtlInf", skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_amount_round_trip_preserves_scale() {
        let amt = CurrencyAndAmount::from_decimal("GBP", Decimal::new(10000, 2));
        assert_eq!(amt.amount, "100.00");
        assert_eq!(amt.to_decimal().unwrap(), Decimal::new(10000, 2));
        assert_eq!(amt.to_decimal().unwrap().scale(), 2);
    }

    #[test]
    fn test_cash_account_number() {
        let acct = CashAccount::iban("GB29NWBK60161331926819");
        assert_eq!(acct.account_number(), "GB29NWBK60161331926819");
    }
}
