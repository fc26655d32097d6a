//! Registry configuration types
//!
//! The two policies here settle how keys and repeated registrations are
//! treated. Everything else about the registry is fixed behaviour.

use crate::types::Key;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Registry`](crate::Registry)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Whether string keys that spell an integer alias integer keys
    #[serde(default)]
    pub key_policy: KeyPolicy,

    /// What happens when a callback is registered twice under one key
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

/// Relationship between integer and string keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Two parallel namespaces: `"14"` and `14` are different keys
    #[default]
    Separate,
    /// A string key in canonical decimal form resolves to the integer key
    Aliased,
}

/// Handling of a callback registered again under the same key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep one entry; a repeated registration keeps the first context and position
    #[default]
    Deduplicate,
    /// Every registration adds an entry, and each one fires
    Append,
}

impl RegistryConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the key policy
    pub fn with_key_policy(mut self, policy: KeyPolicy) -> Self {
        self.key_policy = policy;
        self
    }

    /// Builder method: set the duplicate policy
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Map a key to the bucket it is stored under
    pub fn resolve(&self, key: Key) -> Key {
        match (self.key_policy, key) {
            (KeyPolicy::Aliased, Key::Str(s)) => match Key::canonical_int(&s) {
                Some(v) => Key::Int(v),
                None => Key::Str(s),
            },
            (_, key) => key,
        }
    }
}
