// AUTHORITY SET: GOVERNANCE LOGIC
// Owner-controlled rules for proposing membership changes and filtering
// misbehavior reports. The canonical set lives in the registry; this crate
// only stages edits and announces them through the relay.

pub mod governance_logic;
pub mod membership;

pub use governance_logic::GovernanceLogic;
pub use membership::{Membership, MembershipIndex, MembershipStatus, PendingSet};
