// Genesis configuration.
//
// Loaded from a TOML/JSON file layered with AUTHSET_* environment overrides,
// validated, then used to deploy one registry/governance pair pointing at
// each other.

use crate::ledger::Ledger;
use authset_core::{Address, AuthorityError, DEFAULT_RECENT_BLOCKS};
use authset_governance::GovernanceLogic;
use authset_registry::AuthorityRegistry;
use config::{Config, Environment, File, FileFormat};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

pub const ENV_PREFIX: &str = "AUTHSET";

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid genesis: {0}")]
    Invalid(String),

    #[error(transparent)]
    Authority(#[from] AuthorityError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub registry_address: Address,
    pub governance_address: Address,

    /// Initial owner of both modules
    pub owner: Address,

    /// Caller allowed to finalize on the registry
    pub system_address: Address,

    pub initial_validators: Vec<Address>,

    #[serde(default = "default_recent_blocks")]
    pub recent_blocks: u64,

    #[serde(default = "default_start_block")]
    pub start_block: u64,
}

fn default_recent_blocks() -> u64 {
    DEFAULT_RECENT_BLOCKS
}

fn default_start_block() -> u64 {
    1
}

impl GenesisConfig {
    /// Load from `path`, then apply `AUTHSET_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self, GenesisError> {
        let settings = Config::builder()
            .add_source(File::from(path))
            .add_source(Self::environment())
            .build()?;
        Self::finish(settings)
    }

    /// Parse an in-memory document (no environment layering).
    pub fn from_str_with_format(text: &str, format: FileFormat) -> Result<Self, GenesisError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, format))
            .build()?;
        Self::finish(settings)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("initial_validators")
    }

    fn finish(settings: Config) -> Result<Self, GenesisError> {
        let genesis: GenesisConfig = settings.try_deserialize()?;
        genesis.validate()?;
        Ok(genesis)
    }

    pub fn validate(&self) -> Result<(), GenesisError> {
        if self.registry_address == self.governance_address {
            return Err(GenesisError::Invalid(
                "registry and governance must live at different addresses".to_string(),
            ));
        }
        for (name, address) in [
            ("registry_address", self.registry_address),
            ("governance_address", self.governance_address),
            ("system_address", self.system_address),
        ] {
            if address.is_zero() {
                return Err(GenesisError::Invalid(format!("{} must not be zero", name)));
            }
        }

        let mut seen = HashSet::new();
        for validator in &self.initial_validators {
            if !seen.insert(validator) {
                return Err(AuthorityError::DuplicateInitialValidator(*validator).into());
            }
        }
        Ok(())
    }

    /// Deploy the configured pair into a fresh ledger.
    pub fn build_ledger(&self) -> Result<Ledger, GenesisError> {
        self.validate()?;

        let mut ledger = Ledger::new(self.start_block);
        let governance = GovernanceLogic::new(
            self.governance_address,
            self.owner,
            self.registry_address,
            &self.initial_validators,
        )?
        .with_recent_blocks(self.recent_blocks);
        let registry = AuthorityRegistry::new(
            self.registry_address,
            self.owner,
            self.system_address,
            self.governance_address,
            self.initial_validators.clone(),
        );

        ledger.deploy_registry(registry)?;
        ledger.deploy_governance(governance)?;

        info!(
            "Genesis at block {}: {} validators, registry {}, governance {}",
            ledger.block_number(),
            self.initial_validators.len(),
            self.registry_address,
            self.governance_address
        );
        Ok(ledger)
    }
}
