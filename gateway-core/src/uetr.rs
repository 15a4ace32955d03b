//! UETR identity plane
//!
//! The unique end-to-end transaction reference is the primary transaction
//! identity from ingress to final settlement advice. Shape:
//!
//! ```text
//! YYYYMMDD-SYSID-MTYP-SEQ-SUFFIX
//! 20250115-PE01-P008-1A2B-0123456789AB
//! ```
//!
//! Segment 1: UTC date of minting. Segment 2: configured system id.
//! Segment 3: 4-character message-type code. Segment 4: random 16-bit
//! sequence as uppercase hex. Segment 5: leading hex of a fresh UUID.
//! Two UETRs are related iff their first two segments match.

use crate::error::{GatewayError, Result};
use chrono::Utc;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

lazy_static! {
    static ref UETR_RE: Regex =
        Regex::new(r"^[A-Z0-9]{8}-[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{12}$").unwrap();
}

/// A validated 36-character end-to-end reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uetr(String);

impl Uetr {
    /// Accept an externally-supplied candidate. Strict: no trimming, no
    /// case folding beyond what the pattern admits.
    pub fn parse(candidate: &str) -> Result<Self> {
        if Self::validate(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(GatewayError::ValidationFailed {
                field_path: "PmtId/UETR".to_string(),
                message: format!("malformed UETR: {}", candidate),
            })
        }
    }

    /// Strict pattern check
    pub fn validate(candidate: &str) -> bool {
        UETR_RE.is_match(candidate)
    }

    /// The raw reference
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segment 1: the 8-character minting date
    pub fn timestamp(&self) -> &str {
        &self.0[0..8]
    }

    /// Segment 2: the 4-character system id
    pub fn system_id(&self) -> &str {
        &self.0[9..13]
    }

    /// Segment 3: the 4-character message-type code
    pub fn message_type_code(&self) -> &str {
        &self.0[14..18]
    }

    /// Related iff date and system-id segments match
    pub fn is_related_to(&self, other: &Uetr) -> bool {
        self.timestamp() == other.timestamp() && self.system_id() == other.system_id()
    }
}

impl std::fmt::Display for Uetr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps an ISO 20022 message-type name to its 4-character UETR code.
///
/// Customer (pain) and scheme (pacs) status reports get distinct codes so
/// the UETR alone tells them apart.
pub fn message_type_code(message_type: &str) -> &'static str {
    let normalized = message_type.to_ascii_lowercase();
    let family = normalized
        .split('.')
        .take(2)
        .collect::<Vec<_>>()
        .join(".");
    match family.as_str() {
        "pain.001" => "P001",
        "pain.002" => "P002",
        "pain.007" => "P007",
        "pacs.008" => "P008",
        "pacs.002" => "F002",
        "pacs.004" => "F004",
        "pacs.007" => "F007",
        "pacs.028" => "F028",
        "camt.029" => "C029",
        "camt.054" => "C054",
        "camt.055" => "C055",
        "camt.056" => "C056",
        _ => "UNKN",
    }
}

/// Mints UETRs under a configured system id
#[derive(Debug, Clone)]
pub struct UetrGenerator {
    system_id: String,
}

impl UetrGenerator {
    /// A generator for the given 4-character system id
    pub fn new(system_id: impl Into<String>) -> Result<Self> {
        let system_id = system_id.into();
        if system_id.len() != 4 || !system_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(GatewayError::Internal(format!(
                "system id must be 4 alphanumeric characters, got {:?}",
                system_id
            )));
        }
        Ok(Self {
            system_id: system_id.to_ascii_uppercase(),
        })
    }

    /// Mint a fresh reference for an outbound message
    pub fn generate(&self, message_type: &str) -> Uetr {
        let date = Utc::now().format("%Y%m%d");
        let code = message_type_code(message_type);
        Uetr(format!(
            "{}-{}-{}-{}-{}",
            date,
            self.system_id,
            code,
            Self::sequence(),
            Self::suffix()
        ))
    }

    /// Mint the related reference for a response leg: segments 1 and 2 are
    /// re-used from the original, segment 3 is the response type, segments
    /// 4 and 5 are fresh. The only legal way to produce a related UETR.
    pub fn generate_response(&self, original: &Uetr, response_message_type: &str) -> Uetr {
        let code = message_type_code(response_message_type);
        Uetr(format!(
            "{}-{}-{}-{}-{}",
            original.timestamp(),
            original.system_id(),
            code,
            Self::sequence(),
            Self::suffix()
        ))
    }

    /// Configured system id
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    fn sequence() -> String {
        format!("{:04X}", rand::thread_rng().gen::<u16>())
    }

    fn suffix() -> String {
        Uuid::new_v4().simple().to_string()[..12].to_ascii_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn generator() -> UetrGenerator {
        UetrGenerator::new("PE01").unwrap()
    }

    #[test]
    fn test_generate_matches_pattern() {
        let uetr = generator().generate("pain.001.001.09");
        assert!(Uetr::validate(uetr.as_str()), "minted {}", uetr);
        assert_eq!(uetr.as_str().len(), 36);
        assert_eq!(uetr.timestamp().len(), 8);
        assert_eq!(uetr.system_id(), "PE01");
        assert_eq!(uetr.message_type_code(), "P001");
    }

    #[test]
    fn test_validate_strictness() {
        assert!(Uetr::validate("20250115-PE01-P008-1A2B-0123456789AB"));
        // No trimming
        assert!(!Uetr::validate(" 20250115-PE01-P008-1A2B-0123456789AB"));
        // No case folding
        assert!(!Uetr::validate("20250115-pe01-P008-1A2B-0123456789AB"));
        // Wrong segment widths
        assert!(!Uetr::validate("2025011-PE01-P008-1A2B-0123456789AB"));
        assert!(!Uetr::validate("20250115-PE01-P008-1A2B-0123456789ABCDEF"));
        assert!(!Uetr::validate(""));
    }

    #[test]
    fn test_response_is_related_and_distinct() {
        let gen = generator();
        let original = gen.generate("pacs.008.001.08");
        let response = gen.generate_response(&original, "pacs.002.001.10");
        assert!(original.is_related_to(&response));
        assert!(response.is_related_to(&original));
        assert_ne!(original, response);
        assert_eq!(response.message_type_code(), "F002");
    }

    #[test]
    fn test_distinct_status_codes() {
        // Customer and scheme status reports must stay distinguishable
        assert_ne!(message_type_code("pain.002"), message_type_code("pacs.002"));
        assert_eq!(message_type_code("PAIN.002.001.10"), "P002");
        assert_eq!(message_type_code("pacs.002.001.10"), "F002");
        assert_eq!(message_type_code("mt103"), "UNKN");
    }

    #[test]
    fn test_unrelated_across_system_ids() {
        let a = UetrGenerator::new("PE01").unwrap().generate("pain.001");
        let b = UetrGenerator::new("PE02").unwrap().generate("pain.001");
        assert!(!a.is_related_to(&b));
    }

    #[test]
    fn test_bad_system_id_rejected() {
        assert!(UetrGenerator::new("toolong").is_err());
        assert!(UetrGenerator::new("P-1").is_err());
        assert!(UetrGenerator::new("").is_err());
    }

    proptest! {
        #[test]
        fn prop_minted_always_valid(mt in "[a-z]{4}\\.[0-9]{3}") {
            let uetr = generator().generate(&mt);
            prop_assert!(Uetr::validate(uetr.as_str()));
            prop_assert_eq!(uetr.timestamp().len(), 8);
            prop_assert_eq!(uetr.system_id(), "PE01");
        }

        #[test]
        fn prop_response_related(mt in prop::sample::select(vec![
            "pain.001", "pacs.008", "camt.055", "camt.056",
        ])) {
            let gen = generator();
            let original = gen.generate(mt);
            let response = gen.generate_response(&original, "pacs.002");
            prop_assert!(original.is_related_to(&response));
            prop_assert!(Uetr::validate(response.as_str()));
            prop_assert_ne!(original, response);
        }
    }
}
