// ISO 20022 Message Support Module
// Typed message trees for the flows the gateway carries, JSON (client
// envelope) and XML (scheme dialect) codecs, structural validation, and
// per-type UETR location.

pub mod camt029;
pub mod camt054;
pub mod camt055;
pub mod camt056;
pub mod common; // Common types and structures (must be first)
pub mod locate;
pub mod pacs002;
pub mod pacs004;
pub mod pacs007;
pub mod pacs008;
pub mod pacs028;
pub mod pain001;
pub mod pain002;
pub mod pain007;
pub mod validator;

// Re-exports for convenience
pub use locate::{locate_original_refs, locate_uetr, OriginalRefs};
pub use validator::{StructuralValidator, ValidationIssue, ValidationResult};

use gateway_core::error::{GatewayError, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Message types the gateway accepts or emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Customer credit transfer initiation
    Pain001,
    /// Customer payment status report
    Pain002,
    /// Customer payment reversal
    Pain007,
    /// FI-to-FI payment status report
    Pacs002,
    /// Payment return
    Pacs004,
    /// FI-to-FI payment reversal
    Pacs007,
    /// FI-to-FI customer credit transfer
    Pacs008,
    /// FI-to-FI payment status request
    Pacs028,
    /// Resolution of investigation
    Camt029,
    /// Bank-to-customer debit/credit notification
    Camt054,
    /// Customer payment cancellation request
    Camt055,
    /// FI-to-FI payment cancellation request
    Camt056,
}

impl MessageType {
    /// Canonical dotted identifier (version-qualified)
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Pain001 => "pain.001.001.09",
            MessageType::Pain002 => "pain.002.001.10",
            MessageType::Pain007 => "pain.007.001.09",
            MessageType::Pacs002 => "pacs.002.001.10",
            MessageType::Pacs004 => "pacs.004.001.09",
            MessageType::Pacs007 => "pacs.007.001.09",
            MessageType::Pacs008 => "pacs.008.001.08",
            MessageType::Pacs028 => "pacs.028.001.03",
            MessageType::Camt029 => "camt.029.001.09",
            MessageType::Camt054 => "camt.054.001.08",
            MessageType::Camt055 => "camt.055.001.08",
            MessageType::Camt056 => "camt.056.001.08",
        }
    }

    /// ISO 20022 XML namespace for the type
    pub fn xmlns(&self) -> String {
        format!("urn:iso:std:iso:20022:tech:xsd:{}", self.as_str())
    }

    /// 4-character code embedded in minted UETRs
    pub fn uetr_code(&self) -> &'static str {
        gateway_core::uetr::message_type_code(self.as_str())
    }

    /// Parse a dotted identifier, version suffix optional
    pub fn parse(value: &str) -> Result<Self> {
        let normalized = value.to_ascii_lowercase();
        let family = normalized.split('.').take(2).collect::<Vec<_>>().join(".");
        match family.as_str() {
            "pain.001" => Ok(MessageType::Pain001),
            "pain.002" => Ok(MessageType::Pain002),
            "pain.007" => Ok(MessageType::Pain007),
            "pacs.002" => Ok(MessageType::Pacs002),
            "pacs.004" => Ok(MessageType::Pacs004),
            "pacs.007" => Ok(MessageType::Pacs007),
            "pacs.008" => Ok(MessageType::Pacs008),
            "pacs.028" => Ok(MessageType::Pacs028),
            "camt.029" => Ok(MessageType::Camt029),
            "camt.054" => Ok(MessageType::Camt054),
            "camt.055" => Ok(MessageType::Camt055),
            "camt.056" => Ok(MessageType::Camt056),
            _ => Err(GatewayError::ValidationFailed {
                field_path: "messageType".to_string(),
                message: format!("unsupported message type: {}", value),
            }),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a client-envelope JSON body into a typed message tree
pub fn from_json<T: DeserializeOwned>(body: &serde_json::Value) -> Result<T> {
    serde_json::from_value(body.clone()).map_err(|e| GatewayError::ValidationFailed {
        field_path: "Document".to_string(),
        message: format!("failed to parse message body: {}", e),
    })
}

/// Serialize a typed message tree to the client JSON envelope
pub fn to_json<T: Serialize>(message: &T) -> Result<serde_json::Value> {
    serde_json::to_value(message)
        .map_err(|e| GatewayError::Internal(format!("failed to serialize message: {}", e)))
}

/// Serialize a typed message tree to the scheme-facing XML dialect
pub fn to_xml<T: Serialize>(message: &T) -> Result<String> {
    quick_xml::se::to_string(message)
        .map_err(|e| GatewayError::Internal(format!("failed to generate ISO XML: {}", e)))
}

/// Parse a scheme XML body into a typed message tree
pub fn from_xml<T: DeserializeOwned>(xml: &str) -> Result<T> {
    quick_xml::de::from_str(xml).map_err(|e| GatewayError::ValidationFailed {
        field_path: "Document".to_string(),
        message: format!("failed to parse ISO XML: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_parse() {
        assert_eq!(MessageType::parse("pain.001").unwrap(), MessageType::Pain001);
        assert_eq!(
            MessageType::parse("PACS.008.001.08").unwrap(),
            MessageType::Pacs008
        );
        assert!(MessageType::parse("mt103").is_err());
    }

    #[test]
    fn test_uetr_codes_distinct_for_status_pair() {
        assert_eq!(MessageType::Pain002.uetr_code(), "P002");
        assert_eq!(MessageType::Pacs002.uetr_code(), "F002");
        assert_eq!(MessageType::Pacs008.uetr_code(), "P008");
    }

    #[test]
    fn test_xmlns() {
        assert_eq!(
            MessageType::Pacs008.xmlns(),
            "urn:iso:std:iso:20022:tech:xsd:pacs.008.001.08"
        );
    }
}
