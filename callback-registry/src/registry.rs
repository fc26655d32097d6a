//! Main registry API
//!
//! The [`Registry`] owns every registration and dispatches triggers to them.
//! It is a plain value: whoever needs it holds it (or a
//! [`SharedRegistry`](crate::SharedRegistry) when threads are involved).

use crate::config::{DuplicatePolicy, RegistryConfig};
use crate::entry::{CallbackEntry, CallbackHandle};
use crate::observer::RegistryObserver;
use crate::types::{CallbackRef, Key, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

pub(crate) type Observers<C> = Vec<Arc<dyn RegistryObserver<C>>>;

/// Callback registry keyed by integer or string triggers
pub struct Registry<C> {
    config: RegistryConfig,

    /// Registrations per resolved key, in registration order.
    /// Ordered by key so removals are reported in a stable order.
    callbacks: BTreeMap<Key, Vec<Arc<CallbackEntry<C>>>>,

    /// Notified on every insert and removal, in insertion order
    observers: Observers<C>,
}

impl<C> Registry<C> {
    /// Create an empty registry with default settings
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            callbacks: BTreeMap::new(),
            observers: Vec::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Attach an observer; it only sees changes made after this call
    pub fn add_observer<O>(&mut self, observer: O)
    where
        O: RegistryObserver<C> + 'static,
    {
        self.observers.push(Arc::new(observer));
    }

    /// Register a callback under an integer trigger
    pub fn iset_cbk(&mut self, key: u64, callback: CallbackRef<C>, context: C) -> CallbackHandle<C> {
        self.set_cbk(Key::Int(key), callback, context)
    }

    /// Register a callback under a string trigger
    pub fn sset_cbk(&mut self, key: &str, callback: CallbackRef<C>, context: C) -> CallbackHandle<C> {
        self.set_cbk(Key::from(key), callback, context)
    }

    /// Register a callback under any key
    ///
    /// With [`DuplicatePolicy::Deduplicate`] a callback that is already
    /// registered under the same key is left as it is: no new entry, the
    /// first context is kept, and the existing handle is returned.
    pub fn set_cbk(&mut self, key: Key, callback: CallbackRef<C>, context: C) -> CallbackHandle<C> {
        let (entry, added) = self.insert(key, callback, context);
        let handle = CallbackHandle::new(&entry);
        if added {
            notify_register(&self.observers, &entry, &handle);
        }
        handle
    }

    /// Store a registration; the flag is false when an existing entry was reused
    pub(crate) fn insert(
        &mut self,
        key: Key,
        callback: CallbackRef<C>,
        context: C,
    ) -> (Arc<CallbackEntry<C>>, bool) {
        let key = self.config.resolve(key);

        if self.config.duplicate_policy == DuplicatePolicy::Deduplicate {
            let existing = self
                .callbacks
                .get(&key)
                .and_then(|entries| entries.iter().find(|e| *e.callback() == callback));
            if let Some(entry) = existing {
                log::debug!("{:?} already registered for trigger {}", callback, key);
                return (Arc::clone(entry), false);
            }
        }

        log::debug!("Setting {:?} for trigger {}", callback, key);
        let entry = Arc::new(CallbackEntry::new(key.clone(), callback, context));
        self.callbacks
            .entry(key)
            .or_insert_with(Vec::new)
            .push(Arc::clone(&entry));

        (entry, true)
    }

    /// Invoke every callback registered under an integer trigger
    ///
    /// # Returns
    /// * `Ok(n)` - number of callbacks invoked (0 for an unknown trigger)
    /// * `Err(RegistryError::Callback)` - first callback failure; callbacks
    ///   after the failing one are not invoked
    pub fn trigger_int(&self, key: u64, str_val: &str, int_val: i64) -> Result<usize> {
        self.trigger(Key::Int(key), str_val, int_val)
    }

    /// Invoke every callback registered under a string trigger
    pub fn trigger_str(&self, key: &str, str_val: &str, int_val: i64) -> Result<usize> {
        self.trigger(Key::from(key), str_val, int_val)
    }

    /// Invoke every callback registered under a key, in registration order
    pub fn trigger(&self, key: Key, str_val: &str, int_val: i64) -> Result<usize> {
        let key = self.config.resolve(key);

        match self.callbacks.get(&key) {
            Some(entries) => {
                log::debug!("Triggering {} ({} callbacks)", key, entries.len());
                for entry in entries {
                    entry.invoke(str_val, int_val)?;
                }
                Ok(entries.len())
            }
            None => {
                log::debug!("Trigger not known: {}", key);
                Ok(0)
            }
        }
    }

    /// Invoke exactly the registration behind a handle
    ///
    /// Returns `Ok(false)` if the handle went stale.
    pub fn trigger_cbk(&self, handle: &CallbackHandle<C>, str_val: &str, int_val: i64) -> Result<bool> {
        handle.trigger(str_val, int_val)
    }

    /// Remove a callback from every key it is registered under
    ///
    /// Returns the number of entries removed. An unknown callback is not an
    /// error; it simply removes nothing. Observers hear about the removed
    /// entries in key order.
    pub fn unset_cbk(&mut self, callback: &CallbackRef<C>) -> usize {
        let removed = self.remove(callback);
        notify_unregister(&self.observers, &removed);
        removed.len()
    }

    /// Take every entry of a callback out of the map, in key order
    ///
    /// The returned entries keep handles live until the caller drops them.
    pub(crate) fn remove(&mut self, callback: &CallbackRef<C>) -> Vec<Arc<CallbackEntry<C>>> {
        let mut removed = Vec::new();
        for entries in self.callbacks.values_mut() {
            let (gone, kept): (Vec<_>, Vec<_>) = entries
                .drain(..)
                .partition(|e| e.callback() == callback);
            *entries = kept;
            removed.extend(gone);
        }
        self.callbacks.retain(|_, entries| !entries.is_empty());

        if removed.is_empty() {
            log::debug!("{:?} is not known, nothing to unset", callback);
        } else {
            log::debug!("Unset {:?} ({} entries)", callback, removed.len());
        }
        removed
    }

    /// Remove every registration
    pub fn clear(&mut self) {
        let removed = self.drain();
        notify_unregister(&self.observers, &removed);
    }

    /// Take every entry out of the map, in key order
    pub(crate) fn drain(&mut self) -> Vec<Arc<CallbackEntry<C>>> {
        std::mem::take(&mut self.callbacks)
            .into_values()
            .flatten()
            .collect()
    }

    /// Observers to notify once a lock around this registry is released
    pub(crate) fn observers(&self) -> Observers<C> {
        self.observers.clone()
    }

    /// True if at least one callback is registered under the key
    pub fn contains(&self, key: &Key) -> bool {
        self.callbacks_for(key) > 0
    }

    /// Number of callbacks registered under the key
    pub fn callbacks_for(&self, key: &Key) -> usize {
        let key = self.config.resolve(key.clone());
        self.callbacks.get(&key).map(|v| v.len()).unwrap_or(0)
    }

    /// All keys with at least one registration, sorted (integers first)
    pub fn keys(&self) -> Vec<Key> {
        self.callbacks.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        let int_keys = self.callbacks.keys().filter(|k| k.is_int()).count();
        let str_keys = self.callbacks.len() - int_keys;
        let entries = self.callbacks.values().map(|v| v.len()).sum();

        RegistryStats {
            int_keys,
            str_keys,
            entries,
        }
    }

    /// Entries currently registered under the key, for dispatch outside a lock
    pub(crate) fn snapshot(&self, key: Key) -> (Key, Vec<Arc<CallbackEntry<C>>>) {
        let key = self.config.resolve(key);
        let entries = self.callbacks.get(&key).cloned().unwrap_or_default();
        (key, entries)
    }
}

pub(crate) fn notify_register<C>(
    observers: &[Arc<dyn RegistryObserver<C>>],
    entry: &Arc<CallbackEntry<C>>,
    handle: &CallbackHandle<C>,
) {
    for observer in observers {
        observer.on_register(entry.key(), handle);
    }
}

pub(crate) fn notify_unregister<C>(
    observers: &[Arc<dyn RegistryObserver<C>>],
    removed: &[Arc<CallbackEntry<C>>],
) {
    if observers.is_empty() {
        return;
    }
    for entry in removed {
        let handle = CallbackHandle::new(entry);
        for observer in observers {
            observer.on_unregister(entry.key(), &handle);
        }
    }
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RegistryStats {
    /// Integer keys with at least one registration
    pub int_keys: usize,
    /// String keys with at least one registration
    pub str_keys: usize,
    /// Total number of registrations
    pub entries: usize,
}
