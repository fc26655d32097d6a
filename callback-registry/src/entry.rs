//! Registered entries and the weak handles that point at them

use crate::types::{CallbackRef, Key, RegistryError, Result};
use std::fmt;
use std::sync::{Arc, Weak};

/// One registration: a callback bound to a key with its context
pub struct CallbackEntry<C> {
    key: Key,
    callback: CallbackRef<C>,
    context: C,
}

impl<C> CallbackEntry<C> {
    pub(crate) fn new(key: Key, callback: CallbackRef<C>, context: C) -> Self {
        Self {
            key,
            callback,
            context,
        }
    }

    /// Key this entry is stored under (after alias resolution)
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn callback(&self) -> &CallbackRef<C> {
        &self.callback
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Run the callback with this entry's context
    pub(crate) fn invoke(&self, str_val: &str, int_val: i64) -> Result<()> {
        log::trace!(
            "Invoking {:?} for key {} ({:?}, {})",
            self.callback,
            self.key,
            str_val,
            int_val
        );
        self.callback
            .call(str_val, int_val, &self.context)
            .map_err(|source| RegistryError::Callback {
                key: self.key.clone(),
                source,
            })
    }
}

impl<C: fmt::Debug> fmt::Debug for CallbackEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("key", &self.key)
            .field("callback", &self.callback)
            .field("context", &self.context)
            .finish()
    }
}

/// Weak reference to a single registration
///
/// A handle is returned by every `set` operation. It stays live exactly as
/// long as the entry is registered, and goes stale once the entry is removed
/// by `unset_cbk` or `clear`.
pub struct CallbackHandle<C> {
    entry: Weak<CallbackEntry<C>>,
}

impl<C> CallbackHandle<C> {
    pub(crate) fn new(entry: &Arc<CallbackEntry<C>>) -> Self {
        Self {
            entry: Arc::downgrade(entry),
        }
    }

    /// Get the entry if it is still registered
    pub fn upgrade(&self) -> Option<Arc<CallbackEntry<C>>> {
        self.entry.upgrade()
    }

    pub fn is_live(&self) -> bool {
        self.entry.strong_count() > 0
    }

    /// Invoke exactly this registration
    ///
    /// # Returns
    /// * `Ok(true)` if the callback ran
    /// * `Ok(false)` if the entry no longer exists
    /// * `Err(RegistryError::Callback)` if the callback failed
    pub fn trigger(&self, str_val: &str, int_val: i64) -> Result<bool> {
        match self.upgrade() {
            Some(entry) => {
                entry.invoke(str_val, int_val)?;
                Ok(true)
            }
            None => {
                log::debug!("Callback no longer exists");
                Ok(false)
            }
        }
    }

    /// True if both handles point at the same registration
    pub fn same_entry(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.entry, &other.entry)
    }
}

impl<C> Clone for CallbackHandle<C> {
    fn clone(&self) -> Self {
        Self {
            entry: Weak::clone(&self.entry),
        }
    }
}

impl<C> fmt::Debug for CallbackHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(entry) => write!(f, "CallbackHandle({} -> {:?})", entry.key, entry.callback),
            None => write!(f, "CallbackHandle(stale)"),
        }
    }
}
