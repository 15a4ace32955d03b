//! Message transformation between client and scheme dialects
//!
//! Pure functions over the typed ISO 20022 trees. The UETR is copied
//! verbatim into the destination; only response-leg shapers mint a
//! related reference. Monetary amounts are cloned as text, so currency
//! and scale survive untouched. Missing schema-required destination
//! fields fail with `TransformationRequired` naming the field path;
//! business data is never defaulted.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;

use uuid::Uuid;

/// Mint a fresh destination message id
pub fn mint_message_id(prefix: &str) -> String {
    format!(
        "{}-{}",
        prefix,
        Uuid::new_v4().simple().to_string()[..16].to_ascii_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_message_id_shape() {
        let id = mint_message_id("P8");
        assert!(id.starts_with("P8-"));
        assert_eq!(id.len(), 19);
        assert_ne!(mint_message_id("P8"), mint_message_id("P8"));
    }
}
