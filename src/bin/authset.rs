use anyhow::{Context, Result};
use authset::ledger::{GenesisConfig, Ledger};
use authset::{EventRecord, Scenario, StepOutcome};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "authset")]
#[command(about = "Authority-set governance ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the genesis ledger and print its state
    Show {
        #[arg(long)]
        genesis: PathBuf,
    },

    /// Replay a transaction script on top of a genesis ledger
    Replay {
        #[arg(long)]
        genesis: PathBuf,

        #[arg(long)]
        script: PathBuf,

        /// Print outcomes and the event log as JSON
        #[arg(long)]
        json: bool,

        /// Stop at the first reverted transaction
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Show { genesis } => {
            let (config, ledger) = load_genesis(&genesis)?;
            print_state(&config, &ledger)?;
        }
        Commands::Replay {
            genesis,
            script,
            json,
            strict,
        } => {
            let (config, mut ledger) = load_genesis(&genesis)?;
            let scenario = Scenario::load(&script)
                .with_context(|| format!("loading scenario {}", script.display()))?;

            let outcomes = match scenario.replay(&mut ledger, strict) {
                Ok(outcomes) => outcomes,
                Err(e) => {
                    error!("Replay aborted: {}", e);
                    return Err(e.into());
                }
            };

            if json {
                let report = serde_json::json!({
                    "outcomes": outcomes,
                    "events": ledger.events(),
                    "validators": ledger
                        .registry(&config.registry_address)
                        .map(|registry| registry.validators().to_vec())
                        .unwrap_or_default(),
                    "state_root": ledger.state_root()?,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for (index, outcome) in outcomes.iter().enumerate() {
                    print_outcome(index, outcome);
                }
                print_state(&config, &ledger)?;
            }

            info!(
                "{} committed, {} reverted",
                ledger.committed_count(),
                ledger.rejected_count()
            );
        }
    }

    Ok(())
}

fn load_genesis(path: &Path) -> Result<(GenesisConfig, Ledger)> {
    let config = GenesisConfig::load(path)
        .with_context(|| format!("loading genesis {}", path.display()))?;
    let ledger = config.build_ledger().context("building genesis ledger")?;
    Ok((config, ledger))
}

fn print_outcome(index: usize, outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Advanced { block_number } => {
            println!("[{:>3}] advanced to block {}", index, block_number);
        }
        StepOutcome::Committed { receipt } => {
            println!(
                "[{:>3}] committed #{} in block {}",
                index, receipt.sequence, receipt.block_number
            );
            for record in &receipt.events {
                print_event(record);
            }
        }
        StepOutcome::Reverted { call, error } => {
            println!("[{:>3}] {} reverted: {}", index, call, error);
        }
    }
}

fn print_event(record: &EventRecord) {
    println!("        {} from {}", record.event.kind(), record.emitter);
}

fn print_state(config: &GenesisConfig, ledger: &Ledger) -> Result<()> {
    println!("block:        {}", ledger.block_number());
    println!("parent hash:  {}", ledger.parent_hash());
    println!("state root:   {}", ledger.state_root()?);

    if let Some(registry) = ledger.registry(&config.registry_address) {
        println!("registry:     {} ({})", config.registry_address, registry.state());
        for validator in registry.validators() {
            println!("  validator   {}", validator);
        }
        if let Some(staged) = registry.staged() {
            println!("  staged      {} validators", staged.len());
        }
    }

    if let Some(governance) = ledger.governance(&config.governance_address) {
        println!(
            "governance:   {} (finalized: {}, window: {})",
            config.governance_address,
            governance.is_finalized(),
            governance.recent_blocks()
        );
        for validator in governance.pending() {
            println!("  pending     {}", validator);
        }
    }
    Ok(())
}
