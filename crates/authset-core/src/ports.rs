// CROSS-MODULE PORTS
// The only surfaces one module may call on the other.
//
// SAFETY: Implementations must authorize `ctx.caller` against their own relay
// link before doing anything. The caller passes a context derived with
// `CallContext::relayed_by(own_address)`, so the callee sees the calling
// module, never the original transaction sender.

use crate::address::{Address, BlockHash};
use crate::context::CallContext;
use crate::error::AuthorityResult;
use crate::event::EventBuffer;

/// Calls Governance Logic makes into the Authority Registry.
pub trait ValidatorSetPort {
    /// Address this module is hosted at.
    fn address(&self) -> Address;

    /// Stage `new_set` as the proposal awaiting finalization.
    fn initiate_change(
        &mut self,
        ctx: &CallContext,
        parent_hash: BlockHash,
        new_set: Vec<Address>,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()>;
}

/// Calls the Authority Registry makes into Governance Logic.
pub trait GovernancePort {
    /// Address this module is hosted at.
    fn address(&self) -> Address;

    /// The registry promoted the staged proposal.
    fn finalize_change(&mut self, ctx: &CallContext, events: &mut EventBuffer) -> AuthorityResult<()>;

    /// Forwarded malicious-behavior report; `reporter` was vetted by the registry.
    fn report_malicious(
        &mut self,
        ctx: &CallContext,
        reporter: Address,
        reported: Address,
        block_number: u64,
        evidence: &[u8],
        events: &mut EventBuffer,
    ) -> AuthorityResult<()>;

    /// Forwarded benign-misbehavior report; `reporter` was vetted by the registry.
    fn report_benign(
        &mut self,
        ctx: &CallContext,
        reporter: Address,
        reported: Address,
        block_number: u64,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()>;
}
