// Protocol error taxonomy.
//
// Every failure is a hard abort: the host discards all state mutations and
// events of the failed call. Nothing here is retried by the protocol.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Privilege an entry point demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Current owner of the module
    Owner,

    /// The registry's fixed finalization caller
    SystemCaller,

    /// The module's configured counterpart
    Relay,

    /// Member of the registry's current set
    CurrentValidator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "OWNER"),
            Role::SystemCaller => write!(f, "SYSTEM_CALLER"),
            Role::Relay => write!(f, "RELAY"),
            Role::CurrentValidator => write!(f, "CURRENT_VALIDATOR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    #[error("Unauthorized: {caller} lacks role {required}")]
    Unauthorized { caller: Address, required: Role },

    #[error("{0} is already a member of the pending set")]
    DuplicateMember(Address),

    #[error("{0} is not a member of the pending set")]
    NotAMember(Address),

    #[error("{0} was already removed from the pending set")]
    AlreadyRemoved(Address),

    #[error("A validator set change is already pending finalization")]
    ChangeAlreadyPending,

    #[error("No validator set change is pending")]
    NoChangePending,

    #[error("Stale report: block {reported_block} is older than {window} blocks at block {current_block}")]
    StaleReport {
        reported_block: u64,
        current_block: u64,
        window: u64,
    },

    #[error("Relay target {0} does not host a counterpart module")]
    UnresolvedRelay(Address),

    #[error("Initial validator list contains {0} more than once")]
    DuplicateInitialValidator(Address),

    #[error("No module deployed at {0}")]
    UnknownModule(Address),

    #[error("Address {0} already hosts a module")]
    AddressInUse(Address),

    #[error("Module {target} does not accept {call}")]
    UnsupportedCall { target: Address, call: &'static str },

    #[error("Module address {0} cannot originate transactions")]
    ModuleSender(Address),
}

/// Result type for protocol operations
pub type AuthorityResult<T> = Result<T, AuthorityError>;

impl AuthorityError {
    pub fn unauthorized(caller: Address, required: Role) -> Self {
        AuthorityError::Unauthorized { caller, required }
    }
}
