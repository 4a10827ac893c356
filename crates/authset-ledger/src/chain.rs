// Simulated block clock.
//
// INVARIANTS:
// 1. Block hashes are chained: hash(n) commits to n and hash(n - 1)
// 2. The clock only moves forward, by at most MAX_ADVANCE blocks per call
// 3. parent_hash() is always the hash of block (number() - 1)
// 4. Only the last HASH_WINDOW hashes are retained

use authset_core::BlockHash;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use thiserror::Error;

const BLOCK_DOMAIN: &[u8] = b"AUTHSET_BLOCK_V1";
const GENESIS_DOMAIN: &[u8] = b"AUTHSET_GENESIS_V1";

/// Largest number of blocks a single advance may seal.
pub const MAX_ADVANCE: u64 = 100_000;

/// Number of recent block hashes kept for `hash_of`.
pub const HASH_WINDOW: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Cannot advance {requested} blocks at once (limit {limit})")]
    AdvanceTooFar { requested: u64, limit: u64 },

    #[error("Block number overflow advancing {requested} blocks from {current}")]
    Overflow { current: u64, requested: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainClock {
    /// Block calls currently execute in
    number: u64,

    /// Hashes of the most recent sealed blocks, oldest first; the back is
    /// the hash of block `number - 1`
    recent: VecDeque<BlockHash>,
}

impl ChainClock {
    /// Clock whose current block is `start_block` (at least 1).
    ///
    /// History before the start block is not simulated: its parent is a
    /// genesis anchor derived from the start number alone.
    pub fn new(start_block: u64) -> Self {
        let number = start_block.max(1);
        let mut recent = VecDeque::with_capacity(HASH_WINDOW);
        recent.push_back(Self::genesis_anchor(number - 1));
        ChainClock { number, recent }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn parent_hash(&self) -> BlockHash {
        self.recent.back().copied().unwrap_or(BlockHash::ZERO)
    }

    /// Hash of a sealed block still inside the retained window.
    pub fn hash_of(&self, number: u64) -> Option<BlockHash> {
        let age = self.number.checked_sub(number).filter(|age| *age > 0)?;
        let age = usize::try_from(age).ok()?;
        let index = self.recent.len().checked_sub(age)?;
        self.recent.get(index).copied()
    }

    /// Seal the current block and move on `blocks` times.
    pub fn advance(&mut self, blocks: u64) -> Result<(), ChainError> {
        if blocks > MAX_ADVANCE {
            return Err(ChainError::AdvanceTooFar {
                requested: blocks,
                limit: MAX_ADVANCE,
            });
        }
        let target = self
            .number
            .checked_add(blocks)
            .ok_or(ChainError::Overflow {
                current: self.number,
                requested: blocks,
            })?;

        while self.number < target {
            let hash = Self::block_hash(self.number, self.parent_hash());
            if self.recent.len() == HASH_WINDOW {
                self.recent.pop_front();
            }
            self.recent.push_back(hash);
            self.number += 1;
        }
        Ok(())
    }

    fn block_hash(number: u64, parent: BlockHash) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(BLOCK_DOMAIN);
        hasher.update(number.to_be_bytes());
        hasher.update(parent.as_bytes());
        BlockHash::from_bytes(hasher.finalize().into())
    }

    fn genesis_anchor(number: u64) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(GENESIS_DOMAIN);
        hasher.update(number.to_be_bytes());
        BlockHash::from_bytes(hasher.finalize().into())
    }
}

impl Default for ChainClock {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_starts_at_requested_block() {
        let clock = ChainClock::new(5);
        assert_eq!(clock.number(), 5);
        assert_eq!(Some(clock.parent_hash()), clock.hash_of(4));
        assert!(clock.hash_of(3).is_none());
        assert_eq!(ChainClock::new(0).number(), 1);
    }

    #[test]
    fn test_distant_start_block_is_immediate() {
        let clock = ChainClock::new(u64::MAX - 1);
        assert_eq!(clock.number(), u64::MAX - 1);
        assert_ne!(clock.parent_hash(), ChainClock::new(1).parent_hash());
    }

    #[test]
    fn test_advance_chains_hashes() {
        let mut clock = ChainClock::default();
        let first_parent = clock.parent_hash();
        clock.advance(3).unwrap();

        assert_eq!(clock.number(), 4);
        assert_ne!(clock.parent_hash(), first_parent);
        assert_eq!(clock.hash_of(0), Some(first_parent));
        assert_eq!(clock.hash_of(1), Some(ChainClock::block_hash(1, first_parent)));
        assert_eq!(
            clock.hash_of(3),
            Some(ChainClock::block_hash(3, clock.hash_of(2).unwrap()))
        );
        assert!(clock.hash_of(4).is_none());
    }

    #[test]
    fn test_hashes_are_deterministic() {
        let mut a = ChainClock::new(2);
        let mut b = ChainClock::new(2);
        a.advance(2).unwrap();
        a.advance(1).unwrap();
        b.advance(3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut clock = ChainClock::default();
        clock.advance(HASH_WINDOW as u64 * 4).unwrap();

        assert_eq!(clock.number(), HASH_WINDOW as u64 * 4 + 1);
        assert_eq!(clock.recent.len(), HASH_WINDOW);
        assert!(clock.hash_of(clock.number() - HASH_WINDOW as u64).is_some());
        assert!(clock.hash_of(clock.number() - HASH_WINDOW as u64 - 1).is_none());
    }

    #[test]
    fn test_oversized_advance_rejected() {
        let mut clock = ChainClock::default();
        let before = clock.clone();

        assert_eq!(
            clock.advance(MAX_ADVANCE + 1),
            Err(ChainError::AdvanceTooFar {
                requested: MAX_ADVANCE + 1,
                limit: MAX_ADVANCE,
            })
        );
        assert_eq!(clock, before);
    }

    #[test]
    fn test_overflow_rejected() {
        let mut clock = ChainClock::new(u64::MAX - 1);
        assert!(matches!(clock.advance(2), Err(ChainError::Overflow { .. })));
        clock.advance(1).unwrap();
        assert_eq!(clock.number(), u64::MAX);
    }
}
