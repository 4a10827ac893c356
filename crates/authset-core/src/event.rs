// Protocol notifications.
//
// SCHEMA: the serialized shape of AuthorityEvent is consumed by tooling that
// replays history. Variant names and field names are stable.

use crate::address::{Address, BlockHash};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthorityEvent {
    /// A new set was proposed, anchored at `parent_hash`
    InitiateChange {
        parent_hash: BlockHash,
        new_set: Vec<Address>,
    },

    /// A proposal became binding
    ChangeFinalized { current_set: Vec<Address> },

    /// An admitted misbehavior report
    Report {
        reporter: Address,
        reported: Address,
        malicious: bool,
    },

    OwnershipChanged { previous: Address, new: Address },
}

impl AuthorityEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthorityEvent::InitiateChange { .. } => "INITIATE_CHANGE",
            AuthorityEvent::ChangeFinalized { .. } => "CHANGE_FINALIZED",
            AuthorityEvent::Report { .. } => "REPORT",
            AuthorityEvent::OwnershipChanged { .. } => "OWNERSHIP_CHANGED",
        }
    }
}

/// An event together with where and by whom it was emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub block_number: u64,
    pub emitter: Address,
    #[serde(flatten)]
    pub event: AuthorityEvent,
}

/// Events emitted during a single call.
///
/// The host commits the buffer to its log only when the call succeeds, so
/// a failed call never leaks notifications.
#[derive(Debug, Default, Clone)]
pub struct EventBuffer {
    records: Vec<EventRecord>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, emitter: Address, block_number: u64, event: AuthorityEvent) {
        log::debug!("{} emitted {} at block {}", emitter, event.kind(), block_number);
        self.records.push(EventRecord {
            block_number,
            emitter,
            event,
        });
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<EventRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_flat() {
        let record = EventRecord {
            block_number: 7,
            emitter: Address::from_low_u64_be(1),
            event: AuthorityEvent::Report {
                reporter: Address::from_low_u64_be(2),
                reported: Address::from_low_u64_be(3),
                malicious: true,
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["event"], "report");
        assert_eq!(value["block_number"], 7);
        assert_eq!(value["malicious"], true);
        assert_eq!(
            value["reported"],
            "0x0000000000000000000000000000000000000003"
        );

        let back: EventRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_buffer_keeps_emission_order() {
        let mut buffer = EventBuffer::new();
        let emitter = Address::from_low_u64_be(9);
        buffer.emit(emitter, 1, AuthorityEvent::ChangeFinalized { current_set: vec![] });
        buffer.emit(
            emitter,
            1,
            AuthorityEvent::OwnershipChanged {
                previous: Address::ZERO,
                new: emitter,
            },
        );

        let kinds: Vec<_> = buffer.records().iter().map(|r| r.event.kind()).collect();
        assert_eq!(kinds, vec!["CHANGE_FINALIZED", "OWNERSHIP_CHANGED"]);
    }
}
