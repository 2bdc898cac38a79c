use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, trace, warn};

use crate::{channel::BoundedChannel, error::Error, gate::DeliveryGate, listener::Deliver};

/// Counters shared between a pipeline's loop and its owner.
#[derive(Debug, Default)]
pub(crate) struct LoopCounters {
    pub(crate) delivered: AtomicU64,
    pub(crate) failures: AtomicU64,
}

/// A running dispatch loop: a thread draining a channel into a listener.
///
/// Dropping it stops the loop.
#[derive(Debug)]
pub(crate) struct DispatchLoop<T> {
    channel: Arc<BoundedChannel<T>>,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> DispatchLoop<T> {
    /// Start a thread named `name` which hands items from `channel` to `sink`.
    ///
    /// If a `gate` is given, no item is taken out of the channel while it is closed.
    pub(crate) fn spawn<D: Deliver<T>>(
        name: String,
        channel: Arc<BoundedChannel<T>>,
        gate: Option<Arc<DeliveryGate>>,
        counters: Arc<LoopCounters>,
        sink: D,
    ) -> Result<Self, Error> {
        let token = CancellationToken::new();

        let handle = {
            let channel = Arc::clone(&channel);
            let token = token.clone();
            let span = info_span!("looper", %name);

            thread::Builder::new()
                .name(name)
                .spawn(move || {
                    let _entered = span.entered();
                    run(&channel, gate.as_deref(), &token, &counters, sink);
                })
                .map_err(|e| Error::Spawn(e.to_string()))?
        };

        Ok(Self {
            channel,
            token,
            handle: Some(handle),
        })
    }
}

impl<T> DispatchLoop<T> {
    /// Tell the loop to exit without waiting for it.
    ///
    /// No item is taken out of the channel after this returns.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
        self.channel.wake();
    }

    /// Stop the loop and wait for its thread to exit.
    ///
    /// A delivery in flight is allowed to finish.
    /// Items still queued stay in the channel.
    pub(crate) fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.cancel();

        // A listener may stop its own loop. It will exit once the callback returns.
        if handle.thread().id() == thread::current().id() {
            debug!("Loop stopped from within its own listener, not joining");
            return;
        }

        if handle.join().is_err() {
            error!("Loop thread panicked outside of listener");
        }
    }
}

impl<T> Drop for DispatchLoop<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<T, D: Deliver<T>>(
    channel: &BoundedChannel<T>,
    gate: Option<&DeliveryGate>,
    token: &CancellationToken,
    counters: &LoopCounters,
    mut sink: D,
) {
    debug!("Loop started");

    // A closed gate leaves items queued, so they are evicted oldest first like any other.
    let ready = || gate.map_or(true, DeliveryGate::is_enabled);

    while let Some(item) = channel.pop_blocking_when(token, &ready) {
        match panic::catch_unwind(AssertUnwindSafe(|| sink.deliver(item))) {
            Ok(Ok(())) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                trace!("Delivered");
            }
            Ok(Err(e)) => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(%e, "Listener returned an error, continuing with next item");
            }
            Err(payload) => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    panic = panic_message(payload.as_ref()),
                    "Listener panicked, continuing with next item"
                );
            }
        }
    }

    debug!("Loop stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "(non-string panic payload)"
    }
}
