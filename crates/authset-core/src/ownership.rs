// Single-owner access control.
//
// INVARIANTS:
// 1. Exactly one owner at any time
// 2. Transfer is immediate: the previous owner loses authority on the next call
// 3. A rejected call mutates nothing

use crate::address::Address;
use crate::context::CallContext;
use crate::error::{AuthorityError, AuthorityResult, Role};
use crate::event::{AuthorityEvent, EventBuffer};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    pub fn new(owner: Address) -> Self {
        Ownable { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Reject any caller other than the current owner.
    pub fn ensure_owner(&self, caller: Address) -> AuthorityResult<()> {
        if caller != self.owner {
            return Err(AuthorityError::unauthorized(caller, Role::Owner));
        }
        Ok(())
    }

    /// Hand ownership to `new_owner`, emitting on behalf of `module`.
    pub fn set_owner(
        &mut self,
        ctx: &CallContext,
        module: Address,
        new_owner: Address,
        events: &mut EventBuffer,
    ) -> AuthorityResult<()> {
        self.ensure_owner(ctx.caller)?;

        let previous = self.owner;
        self.owner = new_owner;

        info!("Ownership of {} moved: {} -> {}", module, previous, new_owner);
        events.emit(
            module,
            ctx.block_number,
            AuthorityEvent::OwnershipChanged {
                previous,
                new: new_owner,
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::BlockHash;

    fn ctx(caller: Address) -> CallContext {
        CallContext::new(caller, 1, BlockHash::ZERO)
    }

    #[test]
    fn test_owner_can_transfer() {
        let module = Address::from_low_u64_be(100);
        let alice = Address::from_low_u64_be(1);
        let bob = Address::from_low_u64_be(2);
        let mut ownable = Ownable::new(alice);
        let mut events = EventBuffer::new();

        ownable.set_owner(&ctx(alice), module, bob, &mut events).unwrap();

        assert_eq!(ownable.owner(), bob);
        assert_eq!(events.len(), 1);
        assert_eq!(events.records()[0].emitter, module);
        assert_eq!(
            events.records()[0].event,
            AuthorityEvent::OwnershipChanged {
                previous: alice,
                new: bob
            }
        );
    }

    #[test]
    fn test_previous_owner_loses_authority() {
        let module = Address::from_low_u64_be(100);
        let alice = Address::from_low_u64_be(1);
        let bob = Address::from_low_u64_be(2);
        let mut ownable = Ownable::new(alice);
        let mut events = EventBuffer::new();

        ownable.set_owner(&ctx(alice), module, bob, &mut events).unwrap();

        let err = ownable
            .set_owner(&ctx(alice), module, alice, &mut events)
            .unwrap_err();
        assert_eq!(err, AuthorityError::unauthorized(alice, Role::Owner));
        assert_eq!(ownable.owner(), bob);
        assert_eq!(events.len(), 1);
    }
}
