// Pending validator set with a tombstoned membership index.
//
// INVARIANTS:
// 1. No address appears twice in the pending list
// 2. index[a].is_member iff list[index[a].position] == a
// 3. Removed addresses keep a (false, 0) tombstone; they are never deleted
// 4. Removal swaps the last element into the freed slot (order not preserved)

use authset_core::{Address, AuthorityError, AuthorityResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw index entry as exposed by `status()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipStatus {
    pub is_member: bool,
    pub position: usize,
}

/// Tri-state view of an index lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Never seen
    Absent,

    /// In the pending list at this position
    Member(usize),

    /// Tombstoned by a removal
    Removed,
}

impl Membership {
    pub fn is_member(&self) -> bool {
        matches!(self, Membership::Member(_))
    }

    /// Error to raise when `address` is required to be a member but isn't.
    pub fn require_member(self, address: Address) -> AuthorityResult<usize> {
        match self {
            Membership::Member(position) => Ok(position),
            Membership::Absent => Err(AuthorityError::NotAMember(address)),
            Membership::Removed => Err(AuthorityError::AlreadyRemoved(address)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipIndex {
    entries: HashMap<Address, MembershipStatus>,
}

impl MembershipIndex {
    pub fn lookup(&self, address: &Address) -> Membership {
        match self.entries.get(address) {
            None => Membership::Absent,
            Some(status) if status.is_member => Membership::Member(status.position),
            Some(_) => Membership::Removed,
        }
    }

    /// Entry for `address`; an unknown address reads as `(false, 0)`.
    pub fn status(&self, address: &Address) -> MembershipStatus {
        self.entries.get(address).copied().unwrap_or_default()
    }

    /// Entries sorted by address, for canonical encodings.
    pub fn sorted_entries(&self) -> Vec<(Address, MembershipStatus)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(a, s)| (*a, *s)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    fn place(&mut self, address: Address, position: usize) {
        self.entries.insert(
            address,
            MembershipStatus {
                is_member: true,
                position,
            },
        );
    }

    fn tombstone(&mut self, address: Address) {
        self.entries.insert(address, MembershipStatus::default());
    }
}

/// The next validator set, kept in lockstep with its index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSet {
    validators: Vec<Address>,
    index: MembershipIndex,
}

impl PendingSet {
    /// Build from an initial list; duplicates are rejected.
    pub fn from_initial(initial: &[Address]) -> AuthorityResult<Self> {
        let mut set = PendingSet::default();
        for address in initial {
            if set.index.lookup(address).is_member() {
                return Err(AuthorityError::DuplicateInitialValidator(*address));
            }
            set.push(*address);
        }
        Ok(set)
    }

    pub fn validators(&self) -> &[Address] {
        &self.validators
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn index(&self) -> &MembershipIndex {
        &self.index
    }

    pub fn lookup(&self, address: &Address) -> Membership {
        self.index.lookup(address)
    }

    /// Append `address`; the caller has checked it is not a member.
    /// Returns the position it landed at.
    pub fn push(&mut self, address: Address) -> usize {
        let position = self.validators.len();
        self.validators.push(address);
        self.index.place(address, position);
        position
    }

    /// Swap-remove `address` and tombstone its entry.
    pub fn remove(&mut self, address: Address) -> AuthorityResult<()> {
        let position = self.index.lookup(&address).require_member(address)?;

        self.validators.swap_remove(position);
        if let Some(moved) = self.validators.get(position).copied() {
            self.index.place(moved, position);
        }
        self.index.tombstone(address);

        Ok(())
    }
}
