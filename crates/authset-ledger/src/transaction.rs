use authset_core::Address;
use serde::{Deserialize, Serialize};

/// An entry-point invocation submitted to the ledger.
///
/// `from` is taken as authenticated; signature checking belongs to the
/// surrounding chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    #[serde(flatten)]
    pub call: Call,
}

impl Transaction {
    pub fn new(from: Address, to: Address, call: Call) -> Self {
        Transaction { from, to, call }
    }
}

/// Externally reachable entry points of both modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    // governance
    AddValidator { validator: Address },
    RemoveValidator { validator: Address },
    SetRecentBlocks { recent_blocks: u64 },
    SetRelay { relay: Address },

    // registry
    FinalizeChange,
    ReportMalicious {
        reported: Address,
        block_number: u64,
        #[serde(default, with = "hex_bytes")]
        evidence: Vec<u8>,
    },
    ReportBenign { reported: Address, block_number: u64 },
    SetRelayed { relay: Address },

    // either
    SetOwner { owner: Address },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::AddValidator { .. } => "add_validator",
            Call::RemoveValidator { .. } => "remove_validator",
            Call::SetRecentBlocks { .. } => "set_recent_blocks",
            Call::SetRelay { .. } => "set_relay",
            Call::FinalizeChange => "finalize_change",
            Call::ReportMalicious { .. } => "report_malicious",
            Call::ReportBenign { .. } => "report_benign",
            Call::SetRelayed { .. } => "set_relayed",
            Call::SetOwner { .. } => "set_owner",
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_json_shape() {
        let json = r#"{
            "from": "0x0000000000000000000000000000000000000001",
            "to": "0x00000000000000000000000000000000000000b0",
            "call": "report_malicious",
            "reported": "0x0000000000000000000000000000000000000002",
            "block_number": 12,
            "evidence": "0xdeadbeef"
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.from, Address::from_low_u64_be(1));
        assert_eq!(
            tx.call,
            Call::ReportMalicious {
                reported: Address::from_low_u64_be(2),
                block_number: 12,
                evidence: vec![0xde, 0xad, 0xbe, 0xef],
            }
        );
    }

    #[test]
    fn test_unit_call_and_default_evidence() {
        let finalize: Transaction = serde_json::from_str(
            r#"{"from": "0x00000000000000000000000000000000000000ff",
                "to": "0x00000000000000000000000000000000000000b0",
                "call": "finalize_change"}"#,
        )
        .unwrap();
        assert_eq!(finalize.call, Call::FinalizeChange);

        let report: Call = serde_json::from_str(
            r#"{"call": "report_malicious",
                "reported": "0x0000000000000000000000000000000000000002",
                "block_number": 3}"#,
        )
        .unwrap();
        assert!(matches!(report, Call::ReportMalicious { ref evidence, .. } if evidence.is_empty()));
    }
}
