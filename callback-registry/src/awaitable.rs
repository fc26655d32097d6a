//! One-shot awaitable events
//!
//! An [`Awaitable`] is the async counterpart of a callback: instead of running
//! code when fired, it resolves a future with `strval`, `intval` and the
//! `usrval` chosen when it was created. It can be fired directly or be
//! registered in a registry through [`Awaitable::callback`].

use crate::types::{CallbackRef, RegistryError, Result};
use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Values an awaitable resolves with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitOutcome<C> {
    pub strval: String,
    pub intval: i64,
    pub usrval: C,
}

struct Slot {
    fired: Option<(String, i64)>,
    sender: Option<oneshot::Sender<(String, i64)>>,
}

struct Inner<C> {
    usrval: C,
    slot: Mutex<Slot>,
}

/// Cloneable one-shot event; all clones observe the same trigger
///
/// Every clone can be awaited separately and every pending clone is woken
/// when the event fires.
pub struct Awaitable<C> {
    inner: Arc<Inner<C>>,
    receiver: Shared<oneshot::Receiver<(String, i64)>>,
}

impl<C> Awaitable<C> {
    pub fn new(usrval: C) -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            inner: Arc::new(Inner {
                usrval,
                slot: Mutex::new(Slot {
                    fired: None,
                    sender: Some(sender),
                }),
            }),
            receiver: receiver.shared(),
        }
    }

    /// Resolve the awaitable and wake everyone waiting on it
    ///
    /// Fails with [`RegistryError::AlreadyTriggered`] on every call after the
    /// first; the first values are kept.
    pub fn trigger(&self, strval: &str, intval: i64) -> Result<()> {
        let mut slot = self.inner.slot.lock();
        if slot.fired.is_some() {
            return Err(RegistryError::AlreadyTriggered);
        }

        let payload = (strval.to_string(), intval);
        slot.fired = Some(payload.clone());
        if let Some(sender) = slot.sender.take() {
            // Receivers live as long as any clone, which includes self
            let _ = sender.send(payload);
        }
        Ok(())
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.slot.lock().fired.is_some()
    }
}

impl<C: Clone> Awaitable<C> {
    pub fn usrval(&self) -> C {
        self.inner.usrval.clone()
    }

    /// The resolved values, once triggered
    pub fn outcome(&self) -> Option<AwaitOutcome<C>> {
        let slot = self.inner.slot.lock();
        slot.fired.as_ref().map(|(strval, intval)| AwaitOutcome {
            strval: strval.clone(),
            intval: *intval,
            usrval: self.inner.usrval.clone(),
        })
    }
}

impl<C: Send + Sync + 'static> Awaitable<C> {
    /// Callback that resolves this awaitable when its key fires
    ///
    /// Only the first firing counts; later ones are ignored.
    pub fn callback<X>(&self) -> CallbackRef<X> {
        let awaitable = self.clone();
        CallbackRef::new(move |strval, intval, _| {
            match awaitable.trigger(strval, intval) {
                Ok(()) | Err(RegistryError::AlreadyTriggered) => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}

impl<C> Clone for Awaitable<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            receiver: self.receiver.clone(),
        }
    }
}

impl<C: Clone> Future for Awaitable<C> {
    type Output = AwaitOutcome<C>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.receiver.poll_unpin(cx) {
            Poll::Ready(Ok((strval, intval))) => Poll::Ready(AwaitOutcome {
                strval,
                intval,
                usrval: self.inner.usrval.clone(),
            }),
            // The sender is only dropped with the last clone, so a
            // cancellation cannot be observed from a live clone
            Poll::Ready(Err(oneshot::Canceled)) | Poll::Pending => Poll::Pending,
        }
    }
}
