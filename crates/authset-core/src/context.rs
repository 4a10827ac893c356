use crate::address::{Address, BlockHash};
use serde::{Deserialize, Serialize};

/// Who is calling, and where on the chain the call executes.
///
/// Every entry point receives one of these. Cross-module calls derive a
/// new context with [`CallContext::relayed_by`] so the callee sees the
/// calling module's address as its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Immediate caller of the entry point
    pub caller: Address,

    /// Number of the block the call executes in
    pub block_number: u64,

    /// Hash of the block preceding `block_number`
    pub parent_hash: BlockHash,
}

impl CallContext {
    pub fn new(caller: Address, block_number: u64, parent_hash: BlockHash) -> Self {
        CallContext {
            caller,
            block_number,
            parent_hash,
        }
    }

    /// Same block position, issued by `module`.
    pub fn relayed_by(&self, module: Address) -> Self {
        CallContext {
            caller: module,
            ..*self
        }
    }
}
