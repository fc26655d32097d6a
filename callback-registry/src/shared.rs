//! Thread-safe registry wrapper
//!
//! [`SharedRegistry`] serializes every operation on a mutex. Triggers copy the
//! matching entries out under the lock and run the callbacks after releasing
//! it, so a callback is free to call back into the registry. Observers are
//! notified after the lock is released as well.

use crate::config::RegistryConfig;
use crate::entry::CallbackHandle;
use crate::observer::RegistryObserver;
use crate::registry::{notify_register, notify_unregister, Registry, RegistryStats};
use crate::types::{CallbackRef, Key, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a registry shared between threads
pub struct SharedRegistry<C> {
    inner: Arc<Mutex<Registry<C>>>,
}

impl<C> SharedRegistry<C> {
    pub fn new() -> Self {
        Self::from_registry(Registry::new())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self::from_registry(Registry::with_config(config))
    }

    pub fn from_registry(registry: Registry<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn add_observer<O>(&self, observer: O)
    where
        O: RegistryObserver<C> + 'static,
    {
        self.inner.lock().add_observer(observer);
    }

    pub fn iset_cbk(&self, key: u64, callback: CallbackRef<C>, context: C) -> CallbackHandle<C> {
        self.set_cbk(Key::Int(key), callback, context)
    }

    pub fn sset_cbk(&self, key: &str, callback: CallbackRef<C>, context: C) -> CallbackHandle<C> {
        self.set_cbk(Key::from(key), callback, context)
    }

    pub fn set_cbk(&self, key: Key, callback: CallbackRef<C>, context: C) -> CallbackHandle<C> {
        let (entry, added, observers) = {
            let mut registry = self.inner.lock();
            let (entry, added) = registry.insert(key, callback, context);
            (entry, added, registry.observers())
        };

        let handle = CallbackHandle::new(&entry);
        if added {
            notify_register(&observers, &entry, &handle);
        }
        handle
    }

    pub fn trigger_int(&self, key: u64, str_val: &str, int_val: i64) -> Result<usize> {
        self.trigger(Key::Int(key), str_val, int_val)
    }

    pub fn trigger_str(&self, key: &str, str_val: &str, int_val: i64) -> Result<usize> {
        self.trigger(Key::from(key), str_val, int_val)
    }

    /// Invoke the callbacks registered under `key` when the call was made
    ///
    /// Registrations added or removed by a callback during dispatch take
    /// effect from the next trigger on.
    pub fn trigger(&self, key: Key, str_val: &str, int_val: i64) -> Result<usize> {
        let (key, entries) = self.inner.lock().snapshot(key);

        if entries.is_empty() {
            log::debug!("Trigger not known: {}", key);
            return Ok(0);
        }

        log::debug!("Triggering {} ({} callbacks)", key, entries.len());
        for entry in &entries {
            entry.invoke(str_val, int_val)?;
        }
        Ok(entries.len())
    }

    /// Invoke exactly the registration behind a handle, without taking the lock
    pub fn trigger_cbk(&self, handle: &CallbackHandle<C>, str_val: &str, int_val: i64) -> Result<bool> {
        handle.trigger(str_val, int_val)
    }

    pub fn unset_cbk(&self, callback: &CallbackRef<C>) -> usize {
        let (removed, observers) = {
            let mut registry = self.inner.lock();
            (registry.remove(callback), registry.observers())
        };

        notify_unregister(&observers, &removed);
        removed.len()
    }

    pub fn clear(&self) {
        let (removed, observers) = {
            let mut registry = self.inner.lock();
            (registry.drain(), registry.observers())
        };

        notify_unregister(&observers, &removed);
    }

    pub fn callbacks_for(&self, key: &Key) -> usize {
        self.inner.lock().callbacks_for(key)
    }

    pub fn keys(&self) -> Vec<Key> {
        self.inner.lock().keys()
    }

    pub fn stats(&self) -> RegistryStats {
        self.inner.lock().stats()
    }
}

impl<C> Clone for SharedRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Default for SharedRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_callback_can_unset_itself() {
        let registry: SharedRegistry<()> = SharedRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let slot: Arc<Mutex<Option<CallbackRef<()>>>> = Arc::default();
        let reg = registry.clone();
        let calls_cb = Arc::clone(&calls);
        let slot_cb = Arc::clone(&slot);
        let once = CallbackRef::new(move |_, _, _| {
            calls_cb.fetch_add(1, Ordering::SeqCst);
            if let Some(me) = slot_cb.lock().take() {
                reg.unset_cbk(&me);
            }
            Ok(())
        });
        *slot.lock() = Some(once.clone());

        registry.iset_cbk(1, once, ());
        assert_eq!(registry.trigger_int(1, "a", 0).unwrap(), 1);
        assert_eq!(registry.trigger_int(1, "b", 0).unwrap(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_can_trigger_another_key() {
        let registry: SharedRegistry<()> = SharedRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_cb = Arc::clone(&hits);
        registry.sset_cbk(
            "leaf",
            CallbackRef::new(move |_, _, _| {
                hits_cb.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            (),
        );

        let reg = registry.clone();
        registry.sset_cbk(
            "root",
            CallbackRef::new(move |s, i, _| {
                reg.trigger_str("leaf", s, i)?;
                Ok(())
            }),
            (),
        );

        registry.trigger_str("root", "x", 1).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    /// Observer that reads the registry it is attached to
    struct StatsRecorder {
        registry: SharedRegistry<()>,
        entries: Arc<Mutex<Vec<String>>>,
    }

    impl RegistryObserver<()> for StatsRecorder {
        fn on_register(&self, key: &Key, _handle: &CallbackHandle<()>) {
            let stats = self.registry.stats();
            self.entries.lock().push(format!("+{} {}", key, stats.entries));
        }

        fn on_unregister(&self, key: &Key, _handle: &CallbackHandle<()>) {
            let stats = self.registry.stats();
            self.entries.lock().push(format!("-{} {}", key, stats.entries));
        }
    }

    #[test]
    fn test_observer_can_query_registry() {
        let registry: SharedRegistry<()> = SharedRegistry::new();
        let entries = Arc::new(Mutex::new(Vec::new()));
        registry.add_observer(StatsRecorder {
            registry: registry.clone(),
            entries: Arc::clone(&entries),
        });

        let cb: CallbackRef<()> = CallbackRef::new(|_, _, _| Ok(()));
        registry.iset_cbk(7, cb.clone(), ());
        registry.sset_cbk("seven", cb.clone(), ());
        assert_eq!(registry.unset_cbk(&cb), 2);
        registry.iset_cbk(8, cb, ());
        registry.clear();

        assert_eq!(
            *entries.lock(),
            vec!["+7 1", "+[seven] 2", "-7 0", "-[seven] 0", "+8 1", "-8 0"]
        );
    }

    #[test]
    fn test_concurrent_registration() {
        let registry: SharedRegistry<usize> = SharedRegistry::new();
        let total = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|n| {
                let registry = registry.clone();
                let total = Arc::clone(&total);
                thread::spawn(move || {
                    let cb = CallbackRef::new(move |_, _, ctx: &usize| {
                        total.fetch_add(*ctx, Ordering::SeqCst);
                        Ok(())
                    });
                    registry.iset_cbk(42, cb, n);
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(registry.callbacks_for(&Key::Int(42)), 8);
        assert_eq!(registry.trigger_int(42, "", 0).unwrap(), 8);
        assert_eq!(total.load(Ordering::SeqCst), (0..8).sum::<usize>());
    }
}
