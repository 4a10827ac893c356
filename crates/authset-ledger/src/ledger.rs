// LEDGER HOST
// Totally-ordered, all-or-nothing execution of module entry points.
//
// SAFETY INVARIANTS:
// 1. Transactions execute one at a time against the current block
// 2. A failed transaction restores every module to its pre-call snapshot
//    and commits none of its events
// 3. Relay addresses are resolved here; a module never holds a direct
//    reference to its counterpart
// 4. Module addresses cannot originate transactions
// 5. The state root is a deterministic commitment to all module state

use crate::chain::{ChainClock, ChainError};
use crate::transaction::{Call, Transaction};
use authset_core::{
    Address, AuthorityError, AuthorityResult, BlockHash, CallContext, EventBuffer, EventRecord,
    GovernancePort, ValidatorSetPort,
};
use authset_governance::{GovernanceLogic, MembershipStatus};
use authset_registry::AuthorityRegistry;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Outcome of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Position of the transaction in the ledger's total order
    pub sequence: u64,
    pub block_number: u64,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    clock: ChainClock,
    registries: BTreeMap<Address, AuthorityRegistry>,
    governances: BTreeMap<Address, GovernanceLogic>,
    log: Vec<EventRecord>,
    committed: u64,
    rejected: u64,
}

impl Ledger {
    pub fn new(start_block: u64) -> Self {
        Ledger {
            clock: ChainClock::new(start_block),
            ..Default::default()
        }
    }

    pub fn deploy_registry(&mut self, registry: AuthorityRegistry) -> AuthorityResult<()> {
        let address = ValidatorSetPort::address(&registry);
        self.ensure_vacant(address)?;
        info!("Registry deployed at {} with {} validators", address, registry.validators().len());
        self.registries.insert(address, registry);
        Ok(())
    }

    pub fn deploy_governance(&mut self, governance: GovernanceLogic) -> AuthorityResult<()> {
        let address = GovernancePort::address(&governance);
        self.ensure_vacant(address)?;
        info!("Governance deployed at {} with {} validators", address, governance.pending().len());
        self.governances.insert(address, governance);
        Ok(())
    }

    /// Deploy a governance instance at `address` that takes over the binding
    /// set of `registry`.
    ///
    /// The registry must be stable; relays are left for the owners to
    /// re-point with ordinary transactions.
    pub fn migrate_governance(
        &mut self,
        registry: Address,
        address: Address,
        owner: Address,
        recent_blocks: u64,
    ) -> AuthorityResult<()> {
        let source = self
            .registries
            .get(&registry)
            .ok_or(AuthorityError::UnknownModule(registry))?;
        if source.staged().is_some() {
            return Err(AuthorityError::ChangeAlreadyPending);
        }

        let governance = GovernanceLogic::resume(address, owner, registry, source.validators())?
            .with_recent_blocks(recent_blocks);
        self.deploy_governance(governance)?;
        info!("Governance migration prepared: {} now governs registry {}", address, registry);
        Ok(())
    }

    fn ensure_vacant(&self, address: Address) -> AuthorityResult<()> {
        if self.hosts(&address) {
            return Err(AuthorityError::AddressInUse(address));
        }
        Ok(())
    }

    pub fn hosts(&self, address: &Address) -> bool {
        self.registries.contains_key(address) || self.governances.contains_key(address)
    }

    pub fn registry(&self, address: &Address) -> Option<&AuthorityRegistry> {
        self.registries.get(address)
    }

    pub fn governance(&self, address: &Address) -> Option<&GovernanceLogic> {
        self.governances.get(address)
    }

    pub fn block_number(&self) -> u64 {
        self.clock.number()
    }

    pub fn parent_hash(&self) -> BlockHash {
        self.clock.parent_hash()
    }

    pub fn clock(&self) -> &ChainClock {
        &self.clock
    }

    /// Move the clock on `blocks` blocks; returns the new block number.
    pub fn advance_blocks(&mut self, blocks: u64) -> Result<u64, ChainError> {
        self.clock.advance(blocks)?;
        debug!("Advanced to block {}", self.clock.number());
        Ok(self.clock.number())
    }

    /// Committed events, oldest first.
    pub fn events(&self) -> &[EventRecord] {
        &self.log
    }

    /// Events committed after the first `offset` records.
    pub fn events_since(&self, offset: usize) -> &[EventRecord] {
        self.log.get(offset..).unwrap_or(&[])
    }

    pub fn events_from(&self, emitter: Address) -> impl Iterator<Item = &EventRecord> {
        self.log.iter().filter(move |record| record.emitter == emitter)
    }

    pub fn committed_count(&self) -> u64 {
        self.committed
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    /// Execute `tx` in the current block.
    pub fn execute(&mut self, tx: &Transaction) -> AuthorityResult<Receipt> {
        let ctx = CallContext::new(tx.from, self.clock.number(), self.clock.parent_hash());
        let snapshot = (self.registries.clone(), self.governances.clone());
        let mut events = EventBuffer::new();

        match self.dispatch(&ctx, tx.to, &tx.call, &mut events) {
            Ok(()) => {
                let events = events.into_records();
                self.log.extend(events.iter().cloned());
                self.committed += 1;
                debug!(
                    "{} from {} to {} committed with {} events",
                    tx.call.name(),
                    tx.from,
                    tx.to,
                    events.len()
                );
                Ok(Receipt {
                    sequence: self.committed + self.rejected - 1,
                    block_number: ctx.block_number,
                    events,
                })
            }
            Err(e) => {
                (self.registries, self.governances) = snapshot;
                self.rejected += 1;
                warn!("{} from {} to {} reverted: {}", tx.call.name(), tx.from, tx.to, e);
                Err(e)
            }
        }
    }

    fn dispatch(
        &mut self,
        ctx: &CallContext,
        to: Address,
        call: &Call,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        if self.hosts(&ctx.caller) {
            return Err(AuthorityError::ModuleSender(ctx.caller));
        }

        if let Some(governance) = self.governances.get_mut(&to) {
            let relay = governance.relay();
            let mut unhosted = Unhosted(relay);
            let registry: &mut dyn ValidatorSetPort = match self.registries.get_mut(&relay) {
                Some(registry) => registry,
                None => &mut unhosted,
            };

            return match call {
                Call::AddValidator { validator } => {
                    governance.add_validator(ctx, *validator, registry, events)
                }
                Call::RemoveValidator { validator } => {
                    governance.remove_validator(ctx, *validator, registry, events)
                }
                Call::SetRecentBlocks { recent_blocks } => {
                    governance.set_recent_blocks(ctx, *recent_blocks)
                }
                Call::SetRelay { relay } => governance.set_relay(ctx, *relay),
                Call::SetOwner { owner } => governance.set_owner(ctx, *owner, events),
                other => Err(AuthorityError::UnsupportedCall {
                    target: to,
                    call: other.name(),
                }),
            };
        }

        if let Some(registry) = self.registries.get_mut(&to) {
            let relay = registry.relay();
            let mut unhosted = Unhosted(relay);
            let governance: &mut dyn GovernancePort = match self.governances.get_mut(&relay) {
                Some(governance) => governance,
                None => &mut unhosted,
            };

            return match call {
                Call::FinalizeChange => registry.finalize_change(ctx, governance, events),
                Call::ReportMalicious {
                    reported,
                    block_number,
                    evidence,
                } => registry.report_malicious(ctx, *reported, *block_number, evidence, governance, events),
                Call::ReportBenign {
                    reported,
                    block_number,
                } => registry.report_benign(ctx, *reported, *block_number, governance, events),
                Call::SetRelayed { relay } => registry.set_relayed(ctx, *relay),
                Call::SetOwner { owner } => registry.set_owner(ctx, *owner, events),
                other => Err(AuthorityError::UnsupportedCall {
                    target: to,
                    call: other.name(),
                }),
            };
        }

        Err(AuthorityError::UnknownModule(to))
    }

    /// SHA-256 commitment to the block clock and all module state.
    pub fn state_root(&self) -> bincode::Result<BlockHash> {
        let commitment = StateCommitment {
            block_number: self.clock.number(),
            parent_hash: self.clock.parent_hash(),
            registries: self.registries.values().collect(),
            governances: self
                .governances
                .values()
                .map(|governance| GovernanceCommitment {
                    address: GovernancePort::address(governance),
                    owner: governance.owner(),
                    relay: governance.relay(),
                    pending: governance.pending(),
                    index: governance.pending_set().index().sorted_entries(),
                    finalized: governance.is_finalized(),
                    recent_blocks: governance.recent_blocks(),
                })
                .collect(),
        };

        let encoded = bincode::serialize(&commitment)?;
        let mut hasher = Sha256::new();
        hasher.update(b"AUTHSET_STATE_V1");
        hasher.update(&encoded);
        Ok(BlockHash::from_bytes(hasher.finalize().into()))
    }
}

#[derive(Serialize)]
struct StateCommitment<'a> {
    block_number: u64,
    parent_hash: BlockHash,
    registries: Vec<&'a AuthorityRegistry>,
    governances: Vec<GovernanceCommitment<'a>>,
}

/// Canonical form of governance state; the live index is a hash map.
#[derive(Serialize)]
struct GovernanceCommitment<'a> {
    address: Address,
    owner: Address,
    relay: Address,
    pending: &'a [Address],
    index: Vec<(Address, MembershipStatus)>,
    finalized: bool,
    recent_blocks: u64,
}

/// Stand-in for a relay target that hosts no module of the right kind.
///
/// Lets the calling module run its own checks first; the cross-call itself
/// then fails.
struct Unhosted(Address);

impl ValidatorSetPort for Unhosted {
    fn address(&self) -> Address {
        self.0
    }

    fn initiate_change(
        &mut self,
        _ctx: &CallContext,
        _parent_hash: BlockHash,
        _new_set: Vec<Address>,
        _events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        Err(AuthorityError::UnresolvedRelay(self.0))
    }
}

impl GovernancePort for Unhosted {
    fn address(&self) -> Address {
        self.0
    }

    fn finalize_change(&mut self, _ctx: &CallContext, _events: &mut EventBuffer) -> AuthorityResult<()> {
        Err(AuthorityError::UnresolvedRelay(self.0))
    }

    fn report_malicious(
        &mut self,
        _ctx: &CallContext,
        _reporter: Address,
        _reported: Address,
        _block_number: u64,
        _evidence: &[u8],
        _events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        Err(AuthorityError::UnresolvedRelay(self.0))
    }

    fn report_benign(
        &mut self,
        _ctx: &CallContext,
        _reporter: Address,
        _reported: Address,
        _block_number: u64,
        _events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        Err(AuthorityError::UnresolvedRelay(self.0))
    }
}
