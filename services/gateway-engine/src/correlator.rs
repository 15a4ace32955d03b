//! Correlation of inbound scheme responses to in-flight flows
//!
//! Primary key is the UETR; a secondary index on
//! `(OrgnlMsgId, OrgnlTxId)` covers inbound messages that omit it.
//! Entries live only as long as their flow and are evicted on
//! terminalization. A miss is an orphan, surfaced for operator review;
//! a correlation is never invented.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use iso20022::OriginalRefs;
use serde::Serialize;
use uuid::Uuid;

/// An awaiting flow, registered at dispatch
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationEntry {
    pub correlation_id: Uuid,
    pub uetr: String,
    pub tenant_id: String,
    /// MsgId of the client's original message, echoed in status reports
    pub client_message_id: String,
    /// MsgId of the dispatched scheme message (secondary index)
    pub original_message_id: Option<String>,
    /// TxId of the dispatched scheme message (secondary index)
    pub original_transaction_id: Option<String>,
    pub registered_at: DateTime<Utc>,
}

pub struct Correlator {
    by_uetr: DashMap<String, CorrelationEntry>,
    by_refs: DashMap<(String, String), String>,
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            by_uetr: DashMap::new(),
            by_refs: DashMap::new(),
        }
    }

    /// Register an awaiting flow
    pub fn register(&self, entry: CorrelationEntry) {
        if let (Some(msg_id), Some(tx_id)) = (
            entry.original_message_id.clone(),
            entry.original_transaction_id.clone(),
        ) {
            self.by_refs.insert((msg_id, tx_id), entry.uetr.clone());
        }
        self.by_uetr.insert(entry.uetr.clone(), entry);
    }

    /// Look up by UETR first, then by the original-reference tuple
    pub fn resolve(&self, uetr: Option<&str>, refs: &OriginalRefs) -> Option<CorrelationEntry> {
        if let Some(uetr) = uetr {
            if let Some(entry) = self.by_uetr.get(uetr) {
                return Some(entry.clone());
            }
        }
        if let (Some(msg_id), Some(tx_id)) = (
            refs.original_message_id.as_ref(),
            refs.original_transaction_id.as_ref(),
        ) {
            if let Some(uetr) = self.by_refs.get(&(msg_id.clone(), tx_id.clone())) {
                return self.by_uetr.get(uetr.value()).map(|e| e.clone());
            }
        }
        None
    }

    /// Evict on terminalization to bound memory
    pub fn evict(&self, uetr: &str) {
        if let Some((_, entry)) = self.by_uetr.remove(uetr) {
            if let (Some(msg_id), Some(tx_id)) =
                (entry.original_message_id, entry.original_transaction_id)
            {
                self.by_refs.remove(&(msg_id, tx_id));
            }
        }
    }

    /// In-flight entries (admin surface)
    pub fn len(&self) -> usize {
        self.by_uetr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uetr.is_empty()
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UETR: &str = "20250115-PE01-P008-1A2B-0123456789AB";

    fn entry() -> CorrelationEntry {
        CorrelationEntry {
            correlation_id: Uuid::new_v4(),
            uetr: UETR.to_string(),
            tenant_id: "acme".to_string(),
            client_message_id: "MSG-CLIENT-1".to_string(),
            original_message_id: Some("MSG-1".to_string()),
            original_transaction_id: Some("TX-1".to_string()),
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_by_uetr() {
        let correlator = Correlator::new();
        correlator.register(entry());
        let resolved = correlator
            .resolve(Some(UETR), &OriginalRefs::default())
            .unwrap();
        assert_eq!(resolved.tenant_id, "acme");
    }

    #[test]
    fn test_resolve_by_original_refs_when_uetr_absent() {
        let correlator = Correlator::new();
        correlator.register(entry());
        let refs = OriginalRefs {
            original_message_id: Some("MSG-1".to_string()),
            original_transaction_id: Some("TX-1".to_string()),
        };
        let resolved = correlator.resolve(None, &refs).unwrap();
        assert_eq!(resolved.uetr, UETR);
    }

    #[test]
    fn test_orphan_is_none() {
        let correlator = Correlator::new();
        correlator.register(entry());
        let refs = OriginalRefs {
            original_message_id: Some("MSG-other".to_string()),
            original_transaction_id: Some("TX-other".to_string()),
        };
        assert!(correlator.resolve(Some("20990101-PE01-F002-0000-000000000000"), &refs).is_none());
    }

    #[test]
    fn test_eviction_clears_both_indexes() {
        let correlator = Correlator::new();
        correlator.register(entry());
        correlator.evict(UETR);
        assert!(correlator.is_empty());
        let refs = OriginalRefs {
            original_message_id: Some("MSG-1".to_string()),
            original_transaction_id: Some("TX-1".to_string()),
        };
        assert!(correlator.resolve(None, &refs).is_none());
    }
}
