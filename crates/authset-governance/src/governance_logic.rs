// GOVERNANCE LOGIC
// Staged membership edits and misbehavior-report admission.
//
// SAFETY INVARIANTS:
// 1. At most one staged change per epoch: edits require `finalized == true`
// 2. `finalized` is cleared by an accepted edit and set only by the relay's finalize callback
// 3. Every accepted edit is announced to the registry in the same call
// 4. Reports are admitted only from the relay, only about current pending members,
//    and only within the recency window
// 5. A failed call leaves every field untouched

use crate::membership::{MembershipStatus, PendingSet};
use authset_core::{
    Address, AuthorityError, AuthorityEvent, AuthorityResult, CallContext, EventBuffer,
    GovernancePort, Ownable, RelayLink, ValidatorSetPort, DEFAULT_RECENT_BLOCKS,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceLogic {
    /// Address this instance is hosted at
    address: Address,

    ownership: Ownable,

    /// Points at the authority registry
    relay: RelayLink,

    /// Next validator set and its membership index
    pending: PendingSet,

    /// True iff `pending` equals the binding set
    finalized: bool,

    /// Maximum age, in blocks, of an admissible report
    recent_blocks: u64,
}

impl GovernanceLogic {
    /// Create an instance seeded with `initial`.
    ///
    /// The genesis set still needs one finalize callback before edits are
    /// accepted: `finalized` starts false.
    pub fn new(
        address: Address,
        owner: Address,
        relay: Address,
        initial: &[Address],
    ) -> AuthorityResult<Self> {
        Ok(GovernanceLogic {
            address,
            ownership: Ownable::new(owner),
            relay: RelayLink::new(relay),
            pending: PendingSet::from_initial(initial)?,
            finalized: false,
            recent_blocks: DEFAULT_RECENT_BLOCKS,
        })
    }

    /// Create an instance taking over an already-binding set.
    ///
    /// Used when governance moves to a new address: the set it starts from
    /// is the registry's current one, so there is nothing left to finalize.
    pub fn resume(
        address: Address,
        owner: Address,
        relay: Address,
        binding: &[Address],
    ) -> AuthorityResult<Self> {
        let mut governance = Self::new(address, owner, relay, binding)?;
        governance.finalized = true;
        Ok(governance)
    }

    pub fn with_recent_blocks(mut self, recent_blocks: u64) -> Self {
        self.recent_blocks = recent_blocks;
        self
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn relay(&self) -> Address {
        self.relay.get()
    }

    pub fn pending(&self) -> &[Address] {
        self.pending.validators()
    }

    pub fn pending_set(&self) -> &PendingSet {
        &self.pending
    }

    pub fn status(&self, address: &Address) -> MembershipStatus {
        self.pending.index().status(address)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn recent_blocks(&self) -> u64 {
        self.recent_blocks
    }

    /// Stage `validator` as a new member and announce the resulting set.
    pub fn add_validator(
        &mut self,
        ctx: &CallContext,
        validator: Address,
        registry: &mut dyn ValidatorSetPort,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        self.ownership.ensure_owner(ctx.caller)?;
        if self.pending.lookup(&validator).is_member() {
            return Err(AuthorityError::DuplicateMember(validator));
        }
        self.ensure_no_pending_change()?;

        let mut staged = self.pending.clone();
        let position = staged.push(validator);
        self.announce(ctx, staged, registry, events)?;

        info!("Staged addition of {} at position {}", validator, position);
        Ok(())
    }

    /// Stage removal of `validator` and announce the resulting set.
    pub fn remove_validator(
        &mut self,
        ctx: &CallContext,
        validator: Address,
        registry: &mut dyn ValidatorSetPort,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        self.ownership.ensure_owner(ctx.caller)?;
        self.pending.lookup(&validator).require_member(validator)?;
        self.ensure_no_pending_change()?;

        let mut staged = self.pending.clone();
        staged.remove(validator)?;
        self.announce(ctx, staged, registry, events)?;

        info!("Staged removal of {}", validator);
        Ok(())
    }

    pub fn set_recent_blocks(&mut self, ctx: &CallContext, recent_blocks: u64) -> AuthorityResult<()> {
        self.ownership.ensure_owner(ctx.caller)?;
        info!(
            "Recency window of {} changed: {} -> {}",
            self.address, self.recent_blocks, recent_blocks
        );
        self.recent_blocks = recent_blocks;
        Ok(())
    }

    pub fn set_relay(&mut self, ctx: &CallContext, relay: Address) -> AuthorityResult<()> {
        self.ownership.ensure_owner(ctx.caller)?;
        info!("Governance {} relay re-pointed: {} -> {}", self.address, self.relay.get(), relay);
        self.relay.set(relay);
        Ok(())
    }

    pub fn set_owner(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        self.ownership.set_owner(ctx, self.address, new_owner, events)
    }

    fn ensure_no_pending_change(&self) -> AuthorityResult<()> {
        if !self.finalized {
            return Err(AuthorityError::ChangeAlreadyPending);
        }
        Ok(())
    }

    /// Send `staged` to the registry and adopt it once accepted.
    fn announce(
        &mut self,
        ctx: &CallContext,
        staged: PendingSet,
        registry: &mut dyn ValidatorSetPort,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        if registry.address() != self.relay.get() {
            return Err(AuthorityError::UnresolvedRelay(self.relay.get()));
        }

        registry.initiate_change(
            &ctx.relayed_by(self.address),
            ctx.parent_hash,
            staged.validators().to_vec(),
            events,
        )?;

        self.pending = staged;
        self.finalized = false;
        Ok(())
    }

    fn admit_report(
        &self,
        ctx: &CallContext,
        reported: Address,
        block_number: u64,
    ) -> AuthorityResult<()> {
        self.relay.ensure_counterpart(ctx.caller)?;

        // A reference ahead of the current block has no defined age; treat it as stale.
        let fresh = ctx
            .block_number
            .checked_sub(block_number)
            .is_some_and(|age| age <= self.recent_blocks);
        if !fresh {
            return Err(AuthorityError::StaleReport {
                reported_block: block_number,
                current_block: ctx.block_number,
                window: self.recent_blocks,
            });
        }

        self.pending.lookup(&reported).require_member(reported)?;
        Ok(())
    }

    fn record_report(
        &self,
        ctx: &CallContext,
        reporter: Address,
        reported: Address,
        malicious: bool,
        events: &mut EventBuffer,
    ) {
        info!(
            "Report admitted: {} accused {} (malicious={})",
            reporter, reported, malicious
        );
        events.emit(
            self.address,
            ctx.block_number,
            AuthorityEvent::Report {
                reporter,
                reported,
                malicious,
            },
        );
    }
}

impl GovernancePort for GovernanceLogic {
    fn address(&self) -> Address {
        self.address
    }

    fn finalize_change(&mut self, ctx: &CallContext, events: &mut EventBuffer) -> AuthorityResult<()> {
        self.relay.ensure_counterpart(ctx.caller)?;

        if self.finalized {
            warn!("Governance {} finalized with no staged change", self.address);
        }
        self.finalized = true;

        info!("Governance {} finalized {} validators", self.address, self.pending.len());
        events.emit(
            self.address,
            ctx.block_number,
            AuthorityEvent::ChangeFinalized {
                current_set: self.pending.validators().to_vec(),
            },
        );
        Ok(())
    }

    fn report_malicious(
        &mut self,
        ctx: &CallContext,
        reporter: Address,
        reported: Address,
        block_number: u64,
        _evidence: &[u8],
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        self.admit_report(ctx, reported, block_number)?;
        self.record_report(ctx, reporter, reported, true, events);
        Ok(())
    }

    fn report_benign(
        &mut self,
        ctx: &CallContext,
        reporter: Address,
        reported: Address,
        block_number: u64,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        self.admit_report(ctx, reported, block_number)?;
        self.record_report(ctx, reporter, reported, false, events);
        Ok(())
    }
}
