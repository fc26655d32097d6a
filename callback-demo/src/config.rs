//! Scenario loading and parsing
//!
//! A scenario is the ordered list of registry operations the demo replays,
//! plus the registry configuration to replay them with.

use crate::callbacks::DEMO_CALLBACKS;
use anyhow::{Context, Result};
use callback_registry::RegistryConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Scenario file contents (loaded from a TOML file)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub registry: RegistryConfig,
    pub steps: Vec<Step>,
}

/// One registry operation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    IsetCbk {
        key: u64,
        callback: String,
        #[serde(default)]
        context: Value,
    },
    SsetCbk {
        key: String,
        callback: String,
        #[serde(default)]
        context: Value,
    },
    TriggerInt {
        key: u64,
        str_val: String,
        int_val: i64,
    },
    TriggerStr {
        key: String,
        str_val: String,
        int_val: i64,
    },
    UnsetCbk {
        callback: String,
    },
}

impl Step {
    /// Name of the demo callback this step refers to, if any
    pub fn callback(&self) -> Option<&str> {
        match self {
            Step::IsetCbk { callback, .. }
            | Step::SsetCbk { callback, .. }
            | Step::UnsetCbk { callback } => Some(callback),
            Step::TriggerInt { .. } | Step::TriggerStr { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Step {step}: unknown callback '{name}' (expected one of cbk1, cbk2, cbk3, cbk4)")]
    UnknownCallback { step: usize, name: String },

    #[error("Scenario has no steps")]
    Empty,
}

impl Scenario {
    /// The sequence the original demo script runs, with its literal arguments
    pub fn builtin() -> Self {
        Self {
            registry: RegistryConfig::default(),
            steps: vec![
                Step::IsetCbk {
                    key: 14,
                    callback: "cbk3".into(),
                    context: Value::Null,
                },
                Step::IsetCbk {
                    key: 14,
                    callback: "cbk3".into(),
                    context: Value::Null,
                },
                Step::TriggerInt {
                    key: 14,
                    str_val: "the_string".into(),
                    int_val: 521,
                },
                Step::SsetCbk {
                    key: "14".into(),
                    callback: "cbk2".into(),
                    context: Value::Null,
                },
                Step::TriggerInt {
                    key: 14,
                    str_val: "the other string".into(),
                    int_val: 1222,
                },
                Step::TriggerStr {
                    key: "14".into(),
                    str_val: "the third string {}".into(),
                    int_val: -1,
                },
                Step::UnsetCbk {
                    callback: "cbk3".into(),
                },
            ],
        }
    }

    /// Check that the scenario only names callbacks the demo provides
    pub fn validate(&self) -> std::result::Result<(), ScenarioError> {
        if self.steps.is_empty() {
            return Err(ScenarioError::Empty);
        }

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(name) = step.callback() {
                if !DEMO_CALLBACKS.contains(&name) {
                    return Err(ScenarioError::UnknownCallback {
                        step: index + 1,
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Load a scenario from a TOML file
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {:?}", path))?;

    let scenario: Scenario = toml::from_str(&content)
        .with_context(|| format!("Failed to parse scenario file: {:?}", path))?;

    scenario
        .validate()
        .with_context(|| format!("Invalid scenario file: {:?}", path))?;

    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use callback_registry::{DuplicatePolicy, KeyPolicy};
    use std::io::Write;

    #[test]
    fn test_scenario_deserialization() {
        let toml_content = r#"
            [registry]
            key_policy = "aliased"

            [[steps]]
            op = "iset_cbk"
            key = 7
            callback = "cbk1"
            context = { room = "kitchen" }

            [[steps]]
            op = "trigger_str"
            key = "7"
            str_val = "door"
            int_val = 1
        "#;

        let scenario: Scenario = toml::from_str(toml_content).unwrap();
        assert_eq!(scenario.registry.key_policy, KeyPolicy::Aliased);
        assert_eq!(scenario.registry.duplicate_policy, DuplicatePolicy::Deduplicate);
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(
            scenario.steps[0],
            Step::IsetCbk {
                key: 7,
                callback: "cbk1".into(),
                context: serde_json::json!({ "room": "kitchen" }),
            }
        );
    }

    #[test]
    fn test_bundled_script_matches_builtin() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/script.toml");
        let scenario = load_scenario(&path).unwrap();
        assert_eq!(scenario, Scenario::builtin());
    }

    #[test]
    fn test_unknown_callback_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[steps]]\nop = \"unset_cbk\"\ncallback = \"cbk9\""
        )
        .unwrap();

        let err = load_scenario(file.path()).unwrap_err();
        let root = err.root_cause().to_string();
        assert!(root.contains("cbk9"), "unexpected error: {}", root);
    }

    #[test]
    fn test_empty_scenario_rejected() {
        let scenario = Scenario {
            registry: RegistryConfig::default(),
            steps: Vec::new(),
        };
        assert!(matches!(scenario.validate(), Err(ScenarioError::Empty)));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_scenario(Path::new("does/not/exist.toml")).is_err());
    }
}
