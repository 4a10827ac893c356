// AUTHORITY SET: REGISTRY
// Canonical, engine-facing validator set. Changes arrive from governance
// through the relay and become binding only when the system caller finalizes.

pub mod authority_registry;

pub use authority_registry::{AuthorityRegistry, RegistryState};
