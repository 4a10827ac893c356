// AUTHORITY SET: LEDGER HOST
// Hosts registry and governance instances at addresses, executes every
// transaction as one all-or-nothing unit, and keeps the ordered event log
// the consensus engine and tooling replay.

pub mod chain;
pub mod genesis;
pub mod handle;
pub mod ledger;
pub mod transaction;

pub use chain::{ChainClock, ChainError, MAX_ADVANCE};
pub use genesis::{GenesisConfig, GenesisError};
pub use handle::LedgerHandle;
pub use ledger::{Ledger, Receipt};
pub use transaction::{Call, Transaction};
