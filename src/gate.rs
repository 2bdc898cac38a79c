use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

/// A switch deciding whether queued data may be handed to its listener.
///
/// Open by default.
///
/// The gate does not block anyone by itself: the consumer checks it while holding the
/// channel lock (see [`crate::channel::BoundedChannel::pop_blocking_when`]), so a closed gate
/// keeps items in the channel where they stay subject to eviction.
/// After [`DeliveryGate::resume`] the channel must be woken.
#[derive(Debug)]
pub struct DeliveryGate {
    enabled: AtomicBool,
}

impl Default for DeliveryGate {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }
}

impl DeliveryGate {
    /// Close the gate.
    /// A delivery in flight is not affected, the next one waits.
    pub fn pause(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        debug!("Delivery paused");
    }

    /// Open the gate.
    pub fn resume(&self) {
        self.enabled.store(true, Ordering::SeqCst);
        debug!("Delivery resumed");
    }

    /// Is the gate open?
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::channel::BoundedChannel;
    use pretty_assertions::assert_eq;

    #[test]
    fn open_by_default() {
        let gate = DeliveryGate::default();
        assert!(gate.is_enabled());
    }

    #[test]
    fn pause_and_resume_toggle() {
        let gate = DeliveryGate::default();

        gate.pause();
        gate.pause();
        assert!(!gate.is_enabled());

        gate.resume();
        assert!(gate.is_enabled());
    }

    #[test]
    fn resume_releases_consumer_waiting_on_channel() {
        let channel = Arc::new(BoundedChannel::new(4).unwrap());
        let gate = Arc::new(DeliveryGate::default());
        gate.pause();
        channel.push(1);

        let consumer = {
            let channel = Arc::clone(&channel);
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                channel.pop_blocking_when(&CancellationToken::new(), || gate.is_enabled())
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!consumer.is_finished());
        assert_eq!(channel.len(), 1);

        gate.resume();
        channel.wake();

        assert_eq!(consumer.join().unwrap(), Some(1));
    }
}
