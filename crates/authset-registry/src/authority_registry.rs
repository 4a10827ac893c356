// AUTHORITY REGISTRY
// The set the consensus engine builds blocks with.
//
// SAFETY INVARIANTS:
// 1. `current` changes only through finalize_change from the system caller
// 2. finalize_change fails hard when nothing is staged
// 3. Proposals are accepted only from the relay (governance) address
// 4. Reports are accepted only from members of `current` (not pending)
// 5. Finalization calls back into governance in the same call; either both
//    sides finalize or neither does

use authset_core::{
    Address, AuthorityError, AuthorityEvent, AuthorityResult, BlockHash, CallContext, EventBuffer,
    GovernancePort, Ownable, RelayLink, Role, ValidatorSetPort,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry view of the shared change workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryState {
    /// Nothing staged; `current` is binding
    Stable,

    /// A proposal awaits the system caller
    ProposalPending,
}

impl fmt::Display for RegistryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryState::Stable => write!(f, "STABLE"),
            RegistryState::ProposalPending => write!(f, "PROPOSAL_PENDING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityRegistry {
    /// Address this instance is hosted at
    address: Address,

    ownership: Ownable,

    /// Points at governance logic
    relay: RelayLink,

    /// Only caller allowed to finalize
    system_address: Address,

    /// Binding validator set, in protocol index order
    current: Vec<Address>,

    /// Proposal awaiting finalization
    staged: Option<Vec<Address>>,
}

impl AuthorityRegistry {
    /// Create a registry whose binding set is `initial`.
    ///
    /// `initial` is also staged, so the genesis set is finalized by one
    /// explicit system call like any later change.
    pub fn new(
        address: Address,
        owner: Address,
        system_address: Address,
        relay: Address,
        initial: Vec<Address>,
    ) -> Self {
        AuthorityRegistry {
            address,
            ownership: Ownable::new(owner),
            relay: RelayLink::new(relay),
            system_address,
            staged: Some(initial.clone()),
            current: initial,
        }
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn relay(&self) -> Address {
        self.relay.get()
    }

    pub fn system_address(&self) -> Address {
        self.system_address
    }

    /// The binding validator set.
    pub fn validators(&self) -> &[Address] {
        &self.current
    }

    pub fn is_validator(&self, address: &Address) -> bool {
        self.current.contains(address)
    }

    pub fn staged(&self) -> Option<&[Address]> {
        self.staged.as_deref()
    }

    pub fn state(&self) -> RegistryState {
        match self.staged {
            Some(_) => RegistryState::ProposalPending,
            None => RegistryState::Stable,
        }
    }

    /// Promote the staged proposal and notify governance.
    pub fn finalize_change(
        &mut self,
        ctx: &CallContext,
        governance: &mut dyn GovernancePort,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        if ctx.caller != self.system_address {
            return Err(AuthorityError::unauthorized(ctx.caller, Role::SystemCaller));
        }
        let staged = self.staged.clone().ok_or(AuthorityError::NoChangePending)?;
        self.ensure_relay_target(governance.address())?;

        governance.finalize_change(&ctx.relayed_by(self.address), events)?;

        self.current = staged;
        self.staged = None;

        info!(
            "Registry {} finalized {} validators at block {}",
            self.address,
            self.current.len(),
            ctx.block_number
        );
        events.emit(
            self.address,
            ctx.block_number,
            AuthorityEvent::ChangeFinalized {
                current_set: self.current.clone(),
            },
        );
        Ok(())
    }

    /// Forward a malicious-behavior report from a current validator.
    pub fn report_malicious(
        &mut self,
        ctx: &CallContext,
        reported: Address,
        block_number: u64,
        evidence: &[u8],
        governance: &mut dyn GovernancePort,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        self.ensure_current_validator(ctx.caller)?;
        self.ensure_relay_target(governance.address())?;

        debug!("Forwarding malicious report {} -> {}", ctx.caller, reported);
        governance.report_malicious(
            &ctx.relayed_by(self.address),
            ctx.caller,
            reported,
            block_number,
            evidence,
            events,
        )
    }

    /// Forward a benign-misbehavior report from a current validator.
    pub fn report_benign(
        &mut self,
        ctx: &CallContext,
        reported: Address,
        block_number: u64,
        governance: &mut dyn GovernancePort,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        self.ensure_current_validator(ctx.caller)?;
        self.ensure_relay_target(governance.address())?;

        debug!("Forwarding benign report {} -> {}", ctx.caller, reported);
        governance.report_benign(
            &ctx.relayed_by(self.address),
            ctx.caller,
            reported,
            block_number,
            events,
        )
    }

    pub fn set_relayed(&mut self, ctx: &CallContext, relay: Address) -> AuthorityResult<()> {
        self.ownership.ensure_owner(ctx.caller)?;
        info!("Registry {} relay re-pointed: {} -> {}", self.address, self.relay.get(), relay);
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

    fn ensure_current_validator(&self, caller: Address) -> AuthorityResult<()> {
        if !self.is_validator(&caller) {
            return Err(AuthorityError::unauthorized(caller, Role::CurrentValidator));
        }
        Ok(())
    }

    fn ensure_relay_target(&self, target: Address) -> AuthorityResult<()> {
        if target != self.relay.get() {
            return Err(AuthorityError::UnresolvedRelay(self.relay.get()));
        }
        Ok(())
    }
}

impl ValidatorSetPort for AuthorityRegistry {
    fn address(&self) -> Address {
        self.address
    }

    fn initiate_change(
        &mut self,
        ctx: &CallContext,
        parent_hash: BlockHash,
        new_set: Vec<Address>,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        self.relay.ensure_counterpart(ctx.caller)?;

        if self.staged.is_some() {
            debug!("Registry {} replacing an unfinalized proposal", self.address);
        }
        info!(
            "Registry {} staged {} validators anchored at {}",
            self.address,
            new_set.len(),
            parent_hash
        );
        events.emit(
            self.address,
            ctx.block_number,
            AuthorityEvent::InitiateChange {
                parent_hash,
                new_set: new_set.clone(),
            },
        );
        self.staged = Some(new_set);
        Ok(())
    }
}
