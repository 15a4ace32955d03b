// Per-type UETR and original-reference location.
//
// Works on the untyped JSON envelope so a malformed message can still be
// probed for identity before full parsing. Returns Option on the hot
// path: absence and malformation are both "not found", never an error.

use crate::MessageType;
use gateway_core::uetr::Uetr;
use serde_json::Value;

/// A step into the message tree: named field or array index
enum Step {
    Field(&'static str),
    Index(usize),
}

use Step::{Field, Index};

fn walk<'a>(value: &'a Value, steps: &[Step]) -> Option<&'a Value> {
    let mut current = value;
    for step in steps {
        current = match step {
            Field(name) => current.get(*name)?,
            Index(i) => current.get(*i)?,
        };
    }
    Some(current)
}

fn string_at(value: &Value, steps: &[Step]) -> Option<String> {
    walk(value, steps)?.as_str().map(|s| s.to_string())
}

/// Locate the UETR at its message-type-specific path. Malformed values
/// are treated as absent so a fresh reference gets minted upstream.
pub fn locate_uetr(body: &Value, message_type: MessageType) -> Option<String> {
    let raw = match message_type {
        MessageType::Pain001 => string_at(
            body,
            &[
                Field("CstmrCdtTrfInitn"),
                Field("PmtInf"),
                Index(0),
                Field("CdtTrfTxInf"),
                Index(0),
                Field("PmtId"),
                Field("UETR"),
            ],
        ),
        MessageType::Pacs008 => string_at(
            body,
            &[
                Field("FIToFICstmrCdtTrf"),
                Field("CdtTrfTxInf"),
                Index(0),
                Field("PmtId"),
                Field("UETR"),
            ],
        ),
        MessageType::Pacs002 => string_at(
            body,
            &[
                Field("FIToFIPmtStsRpt"),
                Field("TxInfAndSts"),
                Index(0),
                Field("OrgnlUETR"),
            ],
        ),
        MessageType::Pain002 => string_at(
            body,
            &[
                Field("CstmrPmtStsRpt"),
                Field("PmtInfSts"),
                Index(0),
                Field("TxInfAndSts"),
                Index(0),
                Field("OrgnlUETR"),
            ],
        ),
        MessageType::Pain007 => string_at(
            body,
            &[
                Field("CstmrPmtRvsl"),
                Field("OrgnlPmtInfAndRvsl"),
                Index(0),
                Field("TxInf"),
                Index(0),
                Field("OrgnlUETR"),
            ],
        ),
        MessageType::Pacs004 => string_at(
            body,
            &[Field("PmtRtr"), Field("TxInf"), Index(0), Field("OrgnlUETR")],
        ),
        MessageType::Pacs007 => string_at(
            body,
            &[
                Field("FIToFIPmtRvsl"),
                Field("TxInf"),
                Index(0),
                Field("OrgnlUETR"),
            ],
        ),
        MessageType::Pacs028 => string_at(
            body,
            &[
                Field("FIToFIPmtStsReq"),
                Field("TxInf"),
                Index(0),
                Field("OrgnlUETR"),
            ],
        ),
        MessageType::Camt029 => string_at(
            body,
            &[
                Field("RsltnOfInvstgtn"),
                Field("CxlDtls"),
                Index(0),
                Field("TxInfAndSts"),
                Index(0),
                Field("OrgnlUETR"),
            ],
        ),
        MessageType::Camt054 => string_at(
            body,
            &[
                Field("BkToCstmrDbtCdtNtfctn"),
                Field("Ntfctn"),
                Index(0),
                Field("Ntry"),
                Index(0),
                Field("NtryDtls"),
                Index(0),
                Field("TxDtls"),
                Index(0),
                Field("Refs"),
                Field("UETR"),
            ],
        ),
        MessageType::Camt055 => string_at(
            body,
            &[
                Field("CstmrPmtCxlReq"),
                Field("Undrlyg"),
                Index(0),
                Field("OrgnlPmtInfAndCxl"),
                Index(0),
                Field("TxInf"),
                Index(0),
                Field("OrgnlUETR"),
            ],
        ),
        MessageType::Camt056 => string_at(
            body,
            &[
                Field("FIToFIPmtCxlReq"),
                Field("Undrlyg"),
                Index(0),
                Field("TxInf"),
                Index(0),
                Field("OrgnlUETR"),
            ],
        ),
    }?;

    if Uetr::validate(&raw) {
        Some(raw)
    } else {
        None
    }
}

/// Original references carried by response-leg messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalRefs {
    pub original_message_id: Option<String>,
    pub original_transaction_id: Option<String>,
}

/// Locate `(OrgnlMsgId, OrgnlTxId)` for inbound messages that omit UETR
pub fn locate_original_refs(body: &Value, message_type: MessageType) -> OriginalRefs {
    match message_type {
        MessageType::Pacs002 => OriginalRefs {
            original_message_id: string_at(
                body,
                &[
                    Field("FIToFIPmtStsRpt"),
                    Field("OrgnlGrpInfAndSts"),
                    Field("OrgnlMsgId"),
                ],
            ),
            original_transaction_id: string_at(
                body,
                &[
                    Field("FIToFIPmtStsRpt"),
                    Field("TxInfAndSts"),
                    Index(0),
                    Field("OrgnlTxId"),
                ],
            ),
        },
        MessageType::Pacs004 => OriginalRefs {
            original_message_id: string_at(
                body,
                &[Field("PmtRtr"), Field("OrgnlGrpInf"), Field("OrgnlMsgId")],
            ),
            original_transaction_id: string_at(
                body,
                &[Field("PmtRtr"), Field("TxInf"), Index(0), Field("OrgnlTxId")],
            ),
        },
        MessageType::Camt029 => OriginalRefs {
            original_message_id: string_at(
                body,
                &[
                    Field("RsltnOfInvstgtn"),
                    Field("CxlDtls"),
                    Index(0),
                    Field("OrgnlGrpInfAndSts"),
                    Field("OrgnlMsgId"),
                ],
            ),
            original_transaction_id: string_at(
                body,
                &[
                    Field("RsltnOfInvstgtn"),
                    Field("CxlDtls"),
                    Index(0),
                    Field("TxInfAndSts"),
                    Index(0),
                    Field("OrgnlTxId"),
                ],
            ),
        },
        MessageType::Camt054 => OriginalRefs {
            original_message_id: string_at(
                body,
                &[
                    Field("BkToCstmrDbtCdtNtfctn"),
                    Field("Ntfctn"),
                    Index(0),
                    Field("Ntry"),
                    Index(0),
                    Field("NtryDtls"),
                    Index(0),
                    Field("TxDtls"),
                    Index(0),
                    Field("Refs"),
                    Field("MsgId"),
                ],
            ),
            original_transaction_id: string_at(
                body,
                &[
                    Field("BkToCstmrDbtCdtNtfctn"),
                    Field("Ntfctn"),
                    Index(0),
                    Field("Ntry"),
                    Index(0),
                    Field("NtryDtls"),
                    Index(0),
                    Field("TxDtls"),
                    Index(0),
                    Field("Refs"),
                    Field("TxId"),
                ],
            ),
        },
        _ => OriginalRefs::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const UETR: &str = "20250115-PE01-P008-1A2B-0123456789AB";

    #[test]
    fn test_locate_pain001_uetr() {
        let body = json!({
            "CstmrCdtTrfInitn": {
                "PmtInf": [{
                    "CdtTrfTxInf": [{
                        "PmtId": { "EndToEndId": "E2E-1", "UETR": UETR }
                    }]
                }]
            }
        });
        assert_eq!(locate_uetr(&body, MessageType::Pain001).as_deref(), Some(UETR));
    }

    #[test]
    fn test_malformed_uetr_treated_as_absent() {
        let body = json!({
            "CstmrCdtTrfInitn": {
                "PmtInf": [{
                    "CdtTrfTxInf": [{
                        "PmtId": { "EndToEndId": "E2E-1", "UETR": "not-a-uetr" }
                    }]
                }]
            }
        });
        assert_eq!(locate_uetr(&body, MessageType::Pain001), None);
    }

    #[test]
    fn test_locate_pacs002_original_refs() {
        let body = json!({
            "FIToFIPmtStsRpt": {
                "OrgnlGrpInfAndSts": { "OrgnlMsgId": "MSG-1", "OrgnlMsgNmId": "pacs.008.001.08" },
                "TxInfAndSts": [{ "OrgnlTxId": "TX-1", "OrgnlUETR": UETR, "TxSts": "ACCP" }]
            }
        });
        assert_eq!(locate_uetr(&body, MessageType::Pacs002).as_deref(), Some(UETR));
        let refs = locate_original_refs(&body, MessageType::Pacs002);
        assert_eq!(refs.original_message_id.as_deref(), Some("MSG-1"));
        assert_eq!(refs.original_transaction_id.as_deref(), Some("TX-1"));
    }

    #[test]
    fn test_locate_camt054_uetr() {
        let body = json!({
            "BkToCstmrDbtCdtNtfctn": {
                "Ntfctn": [{
                    "Ntry": [{
                        "NtryDtls": [{
                            "TxDtls": [{ "Refs": { "UETR": UETR, "TxId": "TX-9" } }]
                        }]
                    }]
                }]
            }
        });
        assert_eq!(locate_uetr(&body, MessageType::Camt054).as_deref(), Some(UETR));
    }

    #[test]
    fn test_absent_paths_return_none() {
        let body = json!({ "CstmrCdtTrfInitn": { "PmtInf": [] } });
        assert_eq!(locate_uetr(&body, MessageType::Pain001), None);
        assert_eq!(
            locate_original_refs(&body, MessageType::Pain001),
            OriginalRefs::default()
        );
    }
}
