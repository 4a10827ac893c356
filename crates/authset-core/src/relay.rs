use crate::address::Address;
use crate::error::{AuthorityError, AuthorityResult, Role};
use serde::{Deserialize, Serialize};

/// Mutable pointer at the counterpart module.
///
/// The owning module gates [`RelayLink::set`] behind its owner check. No
/// validation is done on the target: the zero address is accepted and simply
/// makes every relay-only entry point reject its callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayLink {
    counterpart: Address,
}

impl RelayLink {
    pub fn new(counterpart: Address) -> Self {
        RelayLink { counterpart }
    }

    pub fn get(&self) -> Address {
        self.counterpart
    }

    pub fn set(&mut self, counterpart: Address) {
        self.counterpart = counterpart;
    }

    pub fn is_severed(&self) -> bool {
        self.counterpart.is_zero()
    }

    /// Reject any caller other than the configured counterpart.
    pub fn ensure_counterpart(&self, caller: Address) -> AuthorityResult<()> {
        if self.is_severed() || caller != self.counterpart {
            return Err(AuthorityError::unauthorized(caller, Role::Relay));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_counterpart_passes() {
        let a = Address::from_low_u64_be(1);
        let b = Address::from_low_u64_be(2);
        let mut link = RelayLink::new(a);

        assert!(link.ensure_counterpart(a).is_ok());
        assert_eq!(
            link.ensure_counterpart(b),
            Err(AuthorityError::unauthorized(b, Role::Relay))
        );

        link.set(b);
        assert!(link.ensure_counterpart(a).is_err());
        assert!(link.ensure_counterpart(b).is_ok());
    }

    #[test]
    fn test_zero_target_severs_link() {
        let mut link = RelayLink::new(Address::from_low_u64_be(1));
        link.set(Address::ZERO);

        assert!(link.is_severed());
        // even a caller claiming the zero address is refused
        assert!(link.ensure_counterpart(Address::ZERO).is_err());
    }
}
