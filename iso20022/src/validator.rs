//! Structural validation of inbound message trees
//!
//! Validates against schema rules before a message enters the flow engine.
//! Errors block processing; warnings ride along in flow metadata.

use crate::MessageType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Validation issue detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub severity: String,
    pub field_path: String,
    pub message: String,
}

/// Validation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, code: &str, field_path: &str, message: String) {
        self.valid = false;
        self.errors.push(ValidationIssue {
            code: code.to_string(),
            severity: "ERROR".to_string(),
            field_path: field_path.to_string(),
            message,
        });
    }

    pub fn add_warning(&mut self, code: &str, field_path: &str, message: String) {
        self.warnings.push(ValidationIssue {
            code: code.to_string(),
            severity: "WARNING".to_string(),
            field_path: field_path.to_string(),
            message,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// ISO 20022 structural validator
pub struct StructuralValidator {
    /// Strict mode treats warnings as errors
    strict_mode: bool,
}

impl StructuralValidator {
    pub fn new(strict_mode: bool) -> Self {
        Self { strict_mode }
    }

    /// Validate the JSON envelope for the declared message type
    pub fn validate(&self, message_type: MessageType, body: &Value) -> ValidationResult {
        let mut result = ValidationResult::success();

        let root_tag = Self::root_tag(message_type);
        let root = match body.get(root_tag) {
            Some(root) => root,
            None => {
                result.add_error(
                    "MISSING_ROOT",
                    root_tag,
                    format!("expected root element {} for {}", root_tag, message_type),
                );
                return result;
            }
        };

        self.check_header_id(message_type, root, &mut result);
        Self::check_amounts(root, root_tag, &mut result);

        if self.strict_mode && !result.warnings.is_empty() {
            let warnings = std::mem::take(&mut result.warnings);
            for w in warnings {
                result.add_error(&w.code, &w.field_path, w.message);
            }
        }

        result
    }

    fn root_tag(message_type: MessageType) -> &'static str {
        match message_type {
            MessageType::Pain001 => "CstmrCdtTrfInitn",
            MessageType::Pain002 => "CstmrPmtStsRpt",
            MessageType::Pain007 => "CstmrPmtRvsl",
            MessageType::Pacs002 => "FIToFIPmtStsRpt",
            MessageType::Pacs004 => "PmtRtr",
            MessageType::Pacs007 => "FIToFIPmtRvsl",
            MessageType::Pacs008 => "FIToFICstmrCdtTrf",
            MessageType::Pacs028 => "FIToFIPmtStsReq",
            MessageType::Camt029 => "RsltnOfInvstgtn",
            MessageType::Camt054 => "BkToCstmrDbtCdtNtfctn",
            MessageType::Camt055 => "CstmrPmtCxlReq",
            MessageType::Camt056 => "FIToFIPmtCxlReq",
        }
    }

    fn check_header_id(&self, message_type: MessageType, root: &Value, result: &mut ValidationResult) {
        // Case-assignment messages identify themselves through Assgnmt/Id
        let (path, id) = match message_type {
            MessageType::Camt029 | MessageType::Camt055 | MessageType::Camt056 => (
                "Assgnmt/Id",
                root.pointer("/Assgnmt/Id").and_then(Value::as_str),
            ),
            _ => (
                "GrpHdr/MsgId",
                root.pointer("/GrpHdr/MsgId").and_then(Value::as_str),
            ),
        };

        match id {
            Some(value) if !value.trim().is_empty() => {
                if value.len() > 35 {
                    result.add_warning(
                        "ID_TOO_LONG",
                        path,
                        format!("identifier exceeds 35 characters: {}", value.len()),
                    );
                }
            }
            _ => result.add_error("MISSING_ID", path, "missing message identifier".to_string()),
        }

        if let Some(nb) = root.pointer("/GrpHdr/NbOfTxs").and_then(Value::as_str) {
            if nb.parse::<u32>().is_err() {
                result.add_error(
                    "INVALID_NB_OF_TXS",
                    "GrpHdr/NbOfTxs",
                    format!("not a number: {}", nb),
                );
            }
        }
    }

    /// Walk the tree for currency-and-amount nodes and validate each
    fn check_amounts(node: &Value, path: &str, result: &mut ValidationResult) {
        match node {
            Value::Object(map) => {
                if let (Some(ccy), Some(amt)) = (
                    map.get("@Ccy").and_then(Value::as_str),
                    map.get("$text").and_then(Value::as_str),
                ) {
                    if ccy.len() != 3 || !ccy.chars().all(|c| c.is_ascii_uppercase()) {
                        result.add_error(
                            "INVALID_CURRENCY",
                            path,
                            format!("not an ISO 4217 code: {}", ccy),
                        );
                    }
                    match amt.parse::<Decimal>() {
                        Ok(value) if value > Decimal::ZERO => {}
                        Ok(value) => result.add_error(
                            "NON_POSITIVE_AMOUNT",
                            path,
                            format!("amount must be positive: {}", value),
                        ),
                        Err(_) => result.add_error(
                            "INVALID_AMOUNT",
                            path,
                            format!("not a decimal: {}", amt),
                        ),
                    }
                } else {
                    for (key, child) in map {
                        Self::check_amounts(child, &format!("{}/{}", path, key), result);
                    }
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    Self::check_amounts(child, &format!("{}[{}]", path, i), result);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_pain001_passes() {
        let body = json!({
            "CstmrCdtTrfInitn": {
                "GrpHdr": { "MsgId": "MSG-1", "NbOfTxs": "1" },
                "PmtInf": [{
                    "CdtTrfTxInf": [{
                        "Amt": { "InstdAmt": { "@Ccy": "GBP", "$text": "100.00" } }
                    }]
                }]
            }
        });
        let result = StructuralValidator::new(false).validate(MessageType::Pain001, &body);
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let body = json!({ "FIToFICstmrCdtTrf": {} });
        let result = StructuralValidator::new(false).validate(MessageType::Pain001, &body);
        assert!(!result.valid);
        assert_eq!(result.errors[0].code, "MISSING_ROOT");
    }

    #[test]
    fn test_missing_msg_id_is_fatal() {
        let body = json!({ "CstmrCdtTrfInitn": { "GrpHdr": {} } });
        let result = StructuralValidator::new(false).validate(MessageType::Pain001, &body);
        assert!(result.errors.iter().any(|e| e.code == "MISSING_ID"));
    }

    #[test]
    fn test_bad_currency_and_amount() {
        let body = json!({
            "CstmrCdtTrfInitn": {
                "GrpHdr": { "MsgId": "MSG-1" },
                "PmtInf": [{
                    "CdtTrfTxInf": [{
                        "Amt": { "InstdAmt": { "@Ccy": "gbp", "$text": "-5" } }
                    }]
                }]
            }
        });
        let result = StructuralValidator::new(false).validate(MessageType::Pain001, &body);
        assert!(result.errors.iter().any(|e| e.code == "INVALID_CURRENCY"));
        assert!(result.errors.iter().any(|e| e.code == "NON_POSITIVE_AMOUNT"));
    }

    #[test]
    fn test_long_id_warns_then_strict_escalates() {
        let body = json!({
            "CstmrCdtTrfInitn": { "GrpHdr": { "MsgId": "M".repeat(40) } }
        });
        let lenient = StructuralValidator::new(false).validate(MessageType::Pain001, &body);
        assert!(lenient.valid);
        assert_eq!(lenient.warnings.len(), 1);

        let strict = StructuralValidator::new(true).validate(MessageType::Pain001, &body);
        assert!(!strict.valid);
    }
}
