// Scripted replay of transactions against a ledger.
//
// A scenario is a JSON document listing transactions and block advances in
// submission order. Replays are deterministic: the same genesis and the same
// scenario always yield the same receipts and state root.

use authset_core::AuthorityError;
use authset_ledger::{ChainError, Ledger, Receipt, Transaction};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Step {index} cannot advance the clock: {source}")]
    Advance {
        index: usize,
        #[source]
        source: ChainError,
    },

    #[error("Step {index} ({call}) reverted: {source}")]
    StepReverted {
        index: usize,
        call: &'static str,
        #[source]
        source: AuthorityError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Advance { advance_blocks: u64 },
    Transaction(Transaction),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

/// What happened to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Advanced { block_number: u64 },
    Committed { receipt: Receipt },
    Reverted { call: &'static str, error: String },
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Apply every step to `ledger`.
    ///
    /// A reverted transaction is recorded and the replay continues, unless
    /// `strict` is set, in which case the first revert stops the replay.
    /// An advance the clock refuses always stops the replay.
    pub fn replay(&self, ledger: &mut Ledger, strict: bool) -> Result<Vec<StepOutcome>, ScenarioError> {
        let mut outcomes = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let outcome = match step {
                Step::Advance { advance_blocks } => {
                    let block_number = ledger
                        .advance_blocks(*advance_blocks)
                        .map_err(|source| ScenarioError::Advance { index, source })?;
                    StepOutcome::Advanced { block_number }
                }
                Step::Transaction(tx) => match ledger.execute(tx) {
                    Ok(receipt) => StepOutcome::Committed { receipt },
                    Err(source) if strict => {
                        return Err(ScenarioError::StepReverted {
                            index,
                            call: tx.call.name(),
                            source,
                        });
                    }
                    Err(error) => {
                        warn!("Step {} ({}) reverted: {}", index, tx.call.name(), error);
                        StepOutcome::Reverted {
                            call: tx.call.name(),
                            error: error.to_string(),
                        }
                    }
                },
            };
            outcomes.push(outcome);
        }

        info!(
            "Replayed {} steps, now at block {}",
            outcomes.len(),
            ledger.block_number()
        );
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authset_core::Address;
    use authset_ledger::{Call, GenesisConfig, MAX_ADVANCE};
    use proptest::prelude::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn ledger() -> Ledger {
        GenesisConfig {
            registry_address: addr(0xb0),
            governance_address: addr(0xa0),
            owner: addr(0xc0),
            system_address: addr(0xfe),
            initial_validators: vec![addr(1), addr(2)],
            recent_blocks: 20,
            start_block: 1,
        }
        .build_ledger()
        .unwrap()
    }

    const SCRIPT: &str = r#"{
        "steps": [
            { "from": "0x00000000000000000000000000000000000000fe",
              "to": "0x00000000000000000000000000000000000000b0",
              "call": "finalize_change" },
            { "advance_blocks": 3 },
            { "from": "0x00000000000000000000000000000000000000c0",
              "to": "0x00000000000000000000000000000000000000a0",
              "call": "add_validator",
              "validator": "0x0000000000000000000000000000000000000003" },
            { "from": "0x00000000000000000000000000000000000000c0",
              "to": "0x00000000000000000000000000000000000000a0",
              "call": "add_validator",
              "validator": "0x0000000000000000000000000000000000000004" },
            { "from": "0x00000000000000000000000000000000000000fe",
              "to": "0x00000000000000000000000000000000000000b0",
              "call": "finalize_change" }
        ]
    }"#;

    #[test]
    fn test_parse_mixed_steps() {
        let scenario: Scenario = serde_json::from_str(SCRIPT).unwrap();
        assert_eq!(scenario.steps.len(), 5);
        assert_eq!(scenario.steps[1], Step::Advance { advance_blocks: 3 });
        assert!(matches!(
            &scenario.steps[2],
            Step::Transaction(tx) if tx.call == Call::AddValidator { validator: addr(3) }
        ));
    }

    #[test]
    fn test_lenient_replay_records_reverts() {
        let scenario: Scenario = serde_json::from_str(SCRIPT).unwrap();
        let mut ledger = ledger();

        let outcomes = scenario.replay(&mut ledger, false).unwrap();

        assert_eq!(outcomes[1], StepOutcome::Advanced { block_number: 4 });
        assert!(matches!(
            &outcomes[3],
            StepOutcome::Reverted { call: "add_validator", .. }
        ));
        assert!(matches!(&outcomes[4], StepOutcome::Committed { .. }));
        assert_eq!(
            ledger.registry(&addr(0xb0)).unwrap().validators(),
            &[addr(1), addr(2), addr(3)]
        );
    }

    #[test]
    fn test_strict_replay_stops_at_revert() {
        let scenario: Scenario = serde_json::from_str(SCRIPT).unwrap();
        let mut ledger = ledger();

        let err = scenario.replay(&mut ledger, true).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::StepReverted {
                index: 3,
                source: AuthorityError::ChangeAlreadyPending,
                ..
            }
        ));
        assert_eq!(
            ledger.registry(&addr(0xb0)).unwrap().validators(),
            &[addr(1), addr(2)]
        );
    }

    #[test]
    fn test_oversized_advance_aborts_replay() {
        let scenario = Scenario {
            steps: vec![
                Step::Advance { advance_blocks: 2 },
                Step::Advance {
                    advance_blocks: MAX_ADVANCE + 1,
                },
            ],
        };
        let mut ledger = ledger();

        let err = scenario.replay(&mut ledger, false).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Advance {
                index: 1,
                source: ChainError::AdvanceTooFar { .. },
            }
        ));
        assert_eq!(ledger.block_number(), 3);
    }

    fn tx(from: u64, to: u64, call: Call) -> Step {
        Step::Transaction(Transaction::new(addr(from), addr(to), call))
    }

    fn arb_step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (1u64..6).prop_map(|v| tx(0xc0, 0xa0, Call::AddValidator { validator: addr(v) })),
            (1u64..6).prop_map(|v| tx(0xc0, 0xa0, Call::RemoveValidator { validator: addr(v) })),
            Just(tx(0xfe, 0xb0, Call::FinalizeChange)),
            (0u64..30).prop_map(|advance_blocks| Step::Advance { advance_blocks }),
            (1u64..6, 1u64..6, 0u64..40).prop_map(|(reporter, reported, block_number)| {
                tx(
                    reporter,
                    0xb0,
                    Call::ReportBenign {
                        reported: addr(reported),
                        block_number,
                    },
                )
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_replay_is_deterministic(steps in prop::collection::vec(arb_step(), 0..25)) {
            let scenario = Scenario { steps };
            let mut first = ledger();
            let mut second = ledger();

            let a = scenario.replay(&mut first, false).unwrap();
            let b = scenario.replay(&mut second, false).unwrap();

            prop_assert_eq!(a, b);
            prop_assert_eq!(first.events(), second.events());
            prop_assert_eq!(first.state_root().unwrap(), second.state_root().unwrap());
        }

        #[test]
        fn prop_reverted_steps_leave_no_trace(steps in prop::collection::vec(arb_step(), 0..25)) {
            let scenario = Scenario { steps };
            let mut full = ledger();
            let outcomes = scenario.replay(&mut full, false).unwrap();

            let kept = Scenario {
                steps: scenario
                    .steps
                    .iter()
                    .zip(&outcomes)
                    .filter(|(_, outcome)| !matches!(outcome, StepOutcome::Reverted { .. }))
                    .map(|(step, _)| step.clone())
                    .collect(),
            };
            let mut filtered = ledger();
            let kept_outcomes = kept.replay(&mut filtered, true).unwrap();

            prop_assert_eq!(kept_outcomes.len(), kept.steps.len());
            prop_assert_eq!(full.events(), filtered.events());
            prop_assert_eq!(full.state_root().unwrap(), filtered.state_root().unwrap());
        }
    }
}
