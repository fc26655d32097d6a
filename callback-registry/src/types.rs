//! Core types for the callback registry
//!
//! This module defines the keys callbacks are registered under, the callback
//! contract itself, and the error type returned by registry operations.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Error type a callback may return to abort a trigger
pub type CallbackError = Box<dyn StdError + Send + Sync + 'static>;

/// Return type of every callback invocation
pub type CallbackResult = std::result::Result<(), CallbackError>;

/// Identifier under which callbacks are grouped
///
/// Integer and string keys live in separate namespaces unless the registry is
/// configured with [`KeyPolicy::Aliased`](crate::KeyPolicy::Aliased).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Integer trigger (unsigned 64-bit)
    Int(u64),
    /// String trigger
    Str(String),
}

impl Key {
    /// Interpret a string key as an integer key if it is the canonical
    /// decimal rendering of a `u64` ("14" yes, "014", "+14" and "1e3" no)
    pub fn canonical_int(s: &str) -> Option<u64> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if s.len() > 1 && s.starts_with('0') {
            return None;
        }
        s.parse().ok()
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Key::Int(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(v) => write!(f, "{}", v),
            Key::Str(s) => write!(f, "[{}]", s),
        }
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Key::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

/// A function invoked when its key is triggered
///
/// Called as `(str_val, int_val, context)`. The meaning of `str_val` and
/// `int_val` depends on the trigger; `context` is the value supplied at
/// registration, passed through untouched.
pub trait Callback<C>: Send + Sync {
    fn call(&self, str_val: &str, int_val: i64, context: &C) -> CallbackResult;
}

impl<C, F> Callback<C> for F
where
    F: Fn(&str, i64, &C) -> CallbackResult + Send + Sync,
{
    fn call(&self, str_val: &str, int_val: i64, context: &C) -> CallbackResult {
        self(str_val, int_val, context)
    }
}

/// Shared reference to a callback
///
/// Identity is the shared allocation: clones of one `CallbackRef` are equal,
/// two refs created separately never are, even around the same function.
/// This identity is what de-duplication and `unset_cbk` compare against.
pub struct CallbackRef<C> {
    inner: Arc<dyn Callback<C>>,
}

impl<C> CallbackRef<C> {
    /// Wrap a closure or function into a new, distinct reference
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&str, i64, &C) -> CallbackResult + Send + Sync + 'static,
    {
        Self::from_callback(callback)
    }

    /// Wrap any [`Callback`] implementor into a new, distinct reference
    pub fn from_callback<T>(callback: T) -> Self
    where
        T: Callback<C> + 'static,
    {
        Self {
            inner: Arc::new(callback),
        }
    }

    /// Invoke the callback
    pub fn call(&self, str_val: &str, int_val: i64, context: &C) -> CallbackResult {
        self.inner.call(str_val, int_val, context)
    }

    /// Stable address of the shared allocation, used for identity
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl<C> Clone for CallbackRef<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> PartialEq for CallbackRef<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<C> Eq for CallbackRef<C> {}

impl<C> Hash for CallbackRef<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<C> fmt::Debug for CallbackRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallbackRef({:#x})", self.id())
    }
}

/// Errors that can occur in registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Callback for key {key} failed: {source}")]
    Callback {
        key: Key,
        #[source]
        source: CallbackError,
    },

    #[error("Awaitable was already triggered")]
    AlreadyTriggered,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &str, _: i64, _: &()) -> CallbackResult {
        Ok(())
    }

    #[test]
    fn test_canonical_int() {
        assert_eq!(Key::canonical_int("14"), Some(14));
        assert_eq!(Key::canonical_int("0"), Some(0));
        assert_eq!(Key::canonical_int("18446744073709551615"), Some(u64::MAX));
        assert_eq!(Key::canonical_int("014"), None);
        assert_eq!(Key::canonical_int("+14"), None);
        assert_eq!(Key::canonical_int("-1"), None);
        assert_eq!(Key::canonical_int(""), None);
        assert_eq!(Key::canonical_int("18446744073709551616"), None);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(Key::Int(14).to_string(), "14");
        assert_eq!(Key::from("14").to_string(), "[14]");
    }

    #[test]
    fn test_callback_ref_identity() {
        let a: CallbackRef<()> = CallbackRef::new(noop);
        let b: CallbackRef<()> = CallbackRef::new(noop);
        let a2 = a.clone();

        assert_eq!(a, a2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_callback_ref_call() {
        let cb: CallbackRef<i32> = CallbackRef::new(|s, i, ctx| {
            if s == "boom" {
                return Err("boom".into());
            }
            assert_eq!(i, 7);
            assert_eq!(*ctx, 3);
            Ok(())
        });

        assert!(cb.call("ok", 7, &3).is_ok());
        assert!(cb.call("boom", 7, &3).is_err());
    }
}
