// AUTHORITY SET: SHARED PRIMITIVES
// Types both protocol modules agree on: participant addresses, the call
// context every entry point receives, the error taxonomy, emitted events,
// and the ownership / relay building blocks used for access control.

pub mod address;
pub mod context;
pub mod error;
pub mod event;
pub mod ownership;
pub mod ports;
pub mod relay;

pub use address::{Address, AddressParseError, BlockHash};
pub use context::CallContext;
pub use error::{AuthorityError, AuthorityResult, Role};
pub use event::{AuthorityEvent, EventBuffer, EventRecord};
pub use ownership::Ownable;
pub use ports::{GovernancePort, ValidatorSetPort};
pub use relay::RelayLink;

/// Default number of blocks a misbehavior report may lag behind the
/// current block and still be admitted.
pub const DEFAULT_RECENT_BLOCKS: u64 = 20;
