use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::Error;

/// The number of items each pipeline holds before evicting.
pub const DEFAULT_CAPACITY: usize = 5000;

/// Counters for a [`BoundedChannel`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    /// Items admitted.
    pub pushed: u64,

    /// Items dropped to make room for newer ones.
    pub evicted: u64,

    /// Items taken out by the consumer.
    pub popped: u64,

    /// Items currently queued.
    pub len: usize,

    /// The most items ever queued at once.
    pub peak_len: usize,

    /// The channel's capacity.
    pub capacity: usize,
}

#[derive(Debug)]
struct Inner<T> {
    queue: VecDeque<T>,
    metrics: ChannelMetrics,
}

/// A fixed capacity FIFO.
///
/// Pushing never blocks and never fails: if the channel is full the oldest
/// item is dropped to make room.
/// Any number of threads may push, a single consumer pops.
///
/// The lock is only held for the duration of a push or a pop.
/// The consumer waits on the channel's condition variable both for data and
/// for whatever else it needs before taking an item out, see [`BoundedChannel::pop_blocking_when`].
#[derive(Debug)]
pub struct BoundedChannel<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
    capacity: usize,
}

impl<T> BoundedChannel<T> {
    /// Create a channel holding at most `capacity` items.
    ///
    /// A capacity of zero is rejected.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::BadConfig(
                "A bounded channel needs room for at least one item".into(),
            ));
        }

        Ok(Self::with_capacity(capacity))
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity.min(1024)),
                metrics: ChannelMetrics {
                    capacity,
                    ..Default::default()
                },
            }),
            available: Condvar::new(),
            capacity,
        }
    }

    /// Append an item, evicting the oldest one if full.
    pub fn push(&self, item: T) {
        {
            let mut inner = self.inner.lock();

            if inner.queue.len() == self.capacity {
                inner.queue.pop_front();
                inner.metrics.evicted += 1;
                trace!(capacity = self.capacity, "Channel full, evicted oldest item");
            }

            inner.queue.push_back(item);
            inner.metrics.pushed += 1;

            let len = inner.queue.len();
            inner.metrics.peak_len = inner.metrics.peak_len.max(len);
        }

        self.available.notify_one();
    }

    /// Wait until an item is available and take it out.
    ///
    /// Returns `None` once `token` is cancelled.
    /// A cancelling party must call [`BoundedChannel::wake`] after cancelling to wake a waiting consumer.
    pub fn pop_blocking(&self, token: &CancellationToken) -> Option<T> {
        self.pop_blocking_when(token, || true)
    }

    /// Wait until an item is available and `ready` holds, then take the item out.
    ///
    /// `ready` is checked with the channel locked, so while it is false nothing leaves the channel
    /// and queued items stay subject to eviction.
    /// Whoever makes `ready` true must call [`BoundedChannel::wake`] afterwards.
    ///
    /// Returns `None` once `token` is cancelled.
    pub fn pop_blocking_when<F: Fn() -> bool>(
        &self,
        token: &CancellationToken,
        ready: F,
    ) -> Option<T> {
        let mut inner = self.inner.lock();

        loop {
            if token.is_cancelled() {
                return None;
            }

            if !inner.queue.is_empty() && ready() {
                let item = inner.queue.pop_front();
                inner.metrics.popped += 1;
                return item;
            }

            self.available.wait(&mut inner);
        }
    }

    /// Take an item out if one is available.
    pub fn try_pop(&self) -> Option<T> {
        let mut inner = self.inner.lock();

        let item = inner.queue.pop_front();
        if item.is_some() {
            inner.metrics.popped += 1;
        }

        item
    }

    /// Wake any consumer blocked in [`BoundedChannel::pop_blocking`] or [`BoundedChannel::pop_blocking_when`]
    /// so it re-checks its conditions.
    pub fn wake(&self) {
        // Taking the lock orders this wakeup after a consumer's checks,
        // so the consumer is either already waiting or will see the new state.
        let _inner = self.inner.lock();
        self.available.notify_all();
    }

    /// Number of items queued.
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Are there no items queued?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The maximum number of items held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A snapshot of the counters.
    pub fn metrics(&self) -> ChannelMetrics {
        let inner = self.inner.lock();

        ChannelMetrics {
            len: inner.queue.len(),
            ..inner.metrics
        }
    }
}

impl<T> Default for BoundedChannel<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
