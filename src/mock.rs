//! A mock port, useful to exercise the looper without actual serial hardware.
//!
//! [`MockPort`] plays the part of the native layer: it periodically inserts
//! chunks of text and toggles line state bits.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, Instrument};

use crate::{
    config::MockConfig,
    error::TransportError,
    looper::Looper,
    records::{LineState, Signal},
    transport::LineStateReader,
};

#[derive(Debug, Default)]
struct Lines {
    state: AtomicU32,
    fail_reads: AtomicBool,
}

/// Line state of a mock port.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MockLines(Arc<Lines>);

impl MockLines {
    /// Mock lines starting out in the given state.
    pub fn new<S: Into<LineState>>(state: S) -> Self {
        let lines = Self::default();
        lines.set(state);
        lines
    }

    /// The current raw line state.
    pub fn state(&self) -> LineState {
        LineState(self.0.state.load(Ordering::SeqCst))
    }

    /// Overwrite the raw line state.
    pub fn set<S: Into<LineState>>(&self, state: S) {
        self.0.state.store(state.into().bits(), Ordering::SeqCst);
    }

    /// Flip a single signal, returning the new raw line state.
    pub fn toggle(&self, signal: Signal) -> LineState {
        LineState(self.0.state.fetch_xor(signal.bit(), Ordering::SeqCst) ^ signal.bit())
    }

    /// Make reads of the line state fail, as if the port went away.
    pub fn fail_reads(&self, fail: bool) {
        self.0.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl LineStateReader for MockLines {
    fn read_line_state(&mut self) -> Result<LineState, TransportError> {
        if self.0.fail_reads.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }

        Ok(self.state())
    }
}

/// A running mock producer feeding a [`Looper`].
///
/// Dropping it stops the producer.
#[derive(Debug)]
pub struct MockPort {
    lines: MockLines,
    token: CancellationToken,
    handle: Option<JoinHandle<u64>>,
}

impl MockPort {
    /// Start producing data into `looper`, and line events by toggling `lines`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(looper: Arc<Looper>, lines: MockLines, config: MockConfig) -> Self {
        let token = CancellationToken::new();

        let port_span = info_span!("mock", port = %looper.port());
        info!(?config, "Running mock port");

        let handle = {
            let lines = lines.clone();
            let token = token.clone();

            tokio::spawn(
                async move {
                    let signals = [Signal::Cts, Signal::Dsr, Signal::Dcd, Signal::Ri];
                    let period = Duration::from_millis(config.data_interval_ms.max(1));
                    let mut ticker = tokio::time::interval(period);
                    let mut ticks: u64 = 0;

                    loop {
                        tokio::select! {
                            _ = token.cancelled() => break,
                            _ = ticker.tick() => {}
                        }

                        ticks += 1;

                        let mut chunk = lipsum::lipsum_words(config.words_per_chunk);
                        chunk.push('\n');
                        trace!(len = chunk.len(), "Producing data");
                        looper.insert_data(chunk.into_bytes());

                        let every = config.line_toggle_every;
                        if every != 0 && ticks % every == 0 {
                            let signal = signals[(ticks / every) as usize % signals.len()];
                            let state = lines.toggle(signal);
                            debug!(%signal, %state, "Toggling line");
                            looper.insert_line_event(state);
                        }
                    }

                    info!("Mock port stopped producing");
                    ticks
                }
                .instrument(port_span),
            )
        };

        Self {
            lines,
            token,
            handle: Some(handle),
        }
    }

    /// The mock's lines.
    pub fn lines(&self) -> MockLines {
        self.lines.clone()
    }

    /// Stop producing. Returns how many chunks were produced.
    pub async fn stop(mut self) -> u64 {
        self.token.cancel();

        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => 0,
        }
    }
}

impl Drop for MockPort {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
