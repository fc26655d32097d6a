//! Scenario execution
//!
//! Builds a registry from the scenario configuration, wires in the demo
//! callbacks, and applies each step in order.

use crate::callbacks::{DemoCallbacks, Transcript};
use crate::config::{Scenario, Step};
use anyhow::{anyhow, Context, Result};
use callback_registry::{CallbackRef, LogObserver, Registry, RegistryStats};
use serde::Serialize;
use serde_json::Value;

/// Outcome of a scenario run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Number of steps applied
    pub steps: usize,
    /// Lines recorded by the callbacks, in call order
    pub transcript: Vec<String>,
    /// Callback invocations summed over all triggers
    pub invocations: usize,
    /// Entries removed by unset steps
    pub unset_entries: usize,
    /// Registry state after the last step
    pub stats: RegistryStats,
}

/// Run every step of a scenario against a fresh registry
pub fn run_scenario(scenario: &Scenario) -> Result<RunReport> {
    log::info!(
        "Running {} steps (keys: {:?}, duplicates: {:?})",
        scenario.steps.len(),
        scenario.registry.key_policy,
        scenario.registry.duplicate_policy
    );

    let transcript = Transcript::new();
    let callbacks = DemoCallbacks::new(&transcript);

    let mut registry: Registry<Value> = Registry::with_config(scenario.registry);
    registry.add_observer(LogObserver);

    let mut invocations = 0;
    let mut unset_entries = 0;

    for (index, step) in scenario.steps.iter().enumerate() {
        let number = index + 1;
        log::debug!("Step {}: {:?}", number, step);

        match step {
            Step::IsetCbk {
                key,
                callback,
                context,
            } => {
                let cb = lookup(&callbacks, callback)?;
                registry.iset_cbk(*key, cb, context.clone());
            }
            Step::SsetCbk {
                key,
                callback,
                context,
            } => {
                let cb = lookup(&callbacks, callback)?;
                registry.sset_cbk(key, cb, context.clone());
            }
            Step::TriggerInt {
                key,
                str_val,
                int_val,
            } => {
                invocations += registry
                    .trigger_int(*key, str_val, *int_val)
                    .with_context(|| format!("Step {}: trigger_int({}) failed", number, key))?;
            }
            Step::TriggerStr {
                key,
                str_val,
                int_val,
            } => {
                invocations += registry
                    .trigger_str(key, str_val, *int_val)
                    .with_context(|| format!("Step {}: trigger_str({:?}) failed", number, key))?;
            }
            Step::UnsetCbk { callback } => {
                let cb = lookup(&callbacks, callback)?;
                unset_entries += registry.unset_cbk(&cb);
            }
        }
    }

    let report = RunReport {
        steps: scenario.steps.len(),
        transcript: transcript.lines(),
        invocations,
        unset_entries,
        stats: registry.stats(),
    };
    log::info!(
        "Scenario finished: {} invocations, {} entries left",
        report.invocations,
        report.stats.entries
    );
    Ok(report)
}

fn lookup(callbacks: &DemoCallbacks, name: &str) -> Result<CallbackRef<Value>> {
    callbacks
        .get(name)
        .cloned()
        .ok_or_else(|| anyhow!("Unknown callback: {}", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use callback_registry::{DuplicatePolicy, KeyPolicy};

    #[test]
    fn test_builtin_scenario() {
        let report = run_scenario(&Scenario::builtin()).unwrap();

        assert_eq!(report.steps, 7);
        assert_eq!(
            report.transcript,
            vec![
                "3rd callback [the_string] 521 None",
                "3rd callback [the other string] 1222 None",
                "2nd callback [the third string {}] -1 None",
            ]
        );
        assert_eq!(report.invocations, 3);
        // cbk3 was registered twice but stored once
        assert_eq!(report.unset_entries, 1);
        assert_eq!(report.stats.entries, 1);
        assert_eq!(report.stats.str_keys, 1);
    }

    #[test]
    fn test_builtin_scenario_with_aliasing() {
        let mut scenario = Scenario::builtin();
        scenario.registry.key_policy = KeyPolicy::Aliased;

        let report = run_scenario(&scenario).unwrap();
        assert_eq!(
            report.transcript,
            vec![
                "3rd callback [the_string] 521 None",
                "3rd callback [the other string] 1222 None",
                "2nd callback [the other string] 1222 None",
                "3rd callback [the third string {}] -1 None",
                "2nd callback [the third string {}] -1 None",
            ]
        );
        assert_eq!(report.stats.int_keys, 1);
    }

    #[test]
    fn test_builtin_scenario_with_duplicates() {
        let mut scenario = Scenario::builtin();
        scenario.registry.duplicate_policy = DuplicatePolicy::Append;

        let report = run_scenario(&scenario).unwrap();
        assert_eq!(report.invocations, 5);
        assert_eq!(report.unset_entries, 2);
    }

    #[test]
    fn test_context_is_passed_through() {
        let scenario = Scenario {
            registry: Default::default(),
            steps: vec![
                Step::SsetCbk {
                    key: "door".into(),
                    callback: "cbk2".into(),
                    context: serde_json::json!({ "room": "hall" }),
                },
                Step::TriggerStr {
                    key: "door".into(),
                    str_val: "opened".into(),
                    int_val: 1,
                },
            ],
        };

        let report = run_scenario(&scenario).unwrap();
        assert_eq!(report.transcript, vec![r#"2nd callback [opened] 1 {"room":"hall"}"#]);
    }

    #[test]
    fn test_bundled_aliased_scenario() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/aliased.toml");
        let scenario = crate::config::load_scenario(&path).unwrap();

        let report = run_scenario(&scenario).unwrap();
        assert_eq!(
            report.transcript,
            vec![
                "3rd callback [reading] 42 sensor-a",
                r#"2nd callback [reading] 42 {"zone":3}"#,
                "1st callback",
            ]
        );
        // cbk4 was never registered
        assert_eq!(report.unset_entries, 0);
        assert_eq!(report.stats.entries, 3);
    }

    #[test]
    fn test_unknown_callback_fails() {
        let scenario = Scenario {
            registry: Default::default(),
            steps: vec![Step::UnsetCbk {
                callback: "nope".into(),
            }],
        };
        assert!(run_scenario(&scenario).is_err());
    }
}
