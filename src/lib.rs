//! Authority-set governance for permissioned consensus.
//!
//! The registry ([`registry::AuthorityRegistry`]) holds the binding validator
//! set the consensus engine reads; governance
//! ([`governance::GovernanceLogic`]) stages owner-driven membership edits and
//! filters misbehavior reports. The two only talk through relay-authorized
//! calls hosted by a [`ledger::Ledger`].

pub use authset_core as primitives;
pub use authset_governance as governance;
pub use authset_ledger as ledger;
pub use authset_registry as registry;

pub mod scenario;

pub use authset_core::{Address, AuthorityError, AuthorityEvent, AuthorityResult, EventRecord};
pub use authset_ledger::{Call, GenesisConfig, Ledger, Receipt, Transaction};
pub use scenario::{Scenario, ScenarioError, Step, StepOutcome};
