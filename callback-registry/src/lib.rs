//! Callback Registry Library
//!
//! Register callbacks under integer or string triggers, fire those triggers
//! with a string and an integer payload, and unregister callbacks again.
//!
//! # Architecture
//!
//! - [`Registry`] is an ordinary value owned by whoever needs it; there is no
//!   process-wide state
//! - Callbacks run synchronously, in registration order, on the thread that
//!   fires the trigger
//! - [`RegistryConfig`] decides whether `"14"` aliases `14` and whether a
//!   repeated registration adds a second entry
//! - [`SharedRegistry`] wraps a registry for use from several threads
//! - [`Awaitable`] turns a trigger into a future
//!
//! # Example Usage
//!
//! ```
//! use callback_registry::{CallbackRef, Registry};
//!
//! let mut registry: Registry<Option<&str>> = Registry::new();
//!
//! let cbk = CallbackRef::new(|str_val, int_val, ctx| {
//!     println!("callback [{}] {} {:?}", str_val, int_val, ctx);
//!     Ok(())
//! });
//!
//! registry.iset_cbk(14, cbk.clone(), None);
//! assert_eq!(registry.trigger_int(14, "the_string", 521).unwrap(), 1);
//!
//! registry.unset_cbk(&cbk);
//! assert_eq!(registry.trigger_int(14, "the_string", 521).unwrap(), 0);
//! ```

// Public modules
pub mod awaitable;
pub mod config;
pub mod entry;
pub mod observer;
pub mod registry;
pub mod shared;
pub mod types;

// Re-export main types for convenience
pub use awaitable::{AwaitOutcome, Awaitable};
pub use config::{DuplicatePolicy, KeyPolicy, RegistryConfig};
pub use entry::{CallbackEntry, CallbackHandle};
pub use observer::{LogObserver, RegistryObserver};
pub use registry::{Registry, RegistryStats};
pub use shared::SharedRegistry;
pub use types::{
    Callback, CallbackError, CallbackRef, CallbackResult, Key, RegistryError, Result,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: a fresh registry is empty
        let registry: Registry<()> = Registry::new();
        let stats = registry.stats();
        assert_eq!(stats.entries, 0);
    }
}
