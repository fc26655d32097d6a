//! Registration observers
//!
//! An observer is told about every entry that enters or leaves a registry.
//! This is how a host component learns which triggers the other side is
//! interested in without polling the registry.

use crate::entry::CallbackHandle;
use crate::types::Key;

/// Hook notified when entries are registered or removed
///
/// `on_register` runs after the entry is inserted. `on_unregister` runs
/// after removal while the entry is still alive, so the handle can still be
/// upgraded. Removals under several keys are reported in key order.
pub trait RegistryObserver<C>: Send + Sync {
    fn on_register(&self, _key: &Key, _handle: &CallbackHandle<C>) {}

    fn on_unregister(&self, _key: &Key, _handle: &CallbackHandle<C>) {}
}

/// Observer that logs every registration change at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl<C> RegistryObserver<C> for LogObserver {
    fn on_register(&self, key: &Key, handle: &CallbackHandle<C>) {
        log::info!("Registered {:?} for trigger {}", handle, key);
    }

    fn on_unregister(&self, key: &Key, handle: &CallbackHandle<C>) {
        log::info!("Unregistering {:?} from trigger {}", handle, key);
    }
}
