use std::{
    fmt::Display,
    sync::{atomic::Ordering, Arc},
};

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    channel::{BoundedChannel, ChannelMetrics},
    config::LooperConfig,
    dispatch::{DispatchLoop, LoopCounters},
    error::Error,
    filter::LineStateFilter,
    gate::DeliveryGate,
    listener::{self, DataListener, EventListener},
    records::{DataRecord, LineState, LineStatusRecord},
    transport::LineStateReader,
};

/// Which of the two pipelines something is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pipeline {
    /// Raw data chunks.
    Data,
    /// Line status transitions.
    Event,
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pipeline::Data => write!(f, "data"),
            Pipeline::Event => write!(f, "event"),
        }
    }
}

/// Identifies the device a [`Looper`] serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// The native handle of the opened port.
    pub handle: u64,

    /// The port's name, such as `/dev/ttyUSB0` or `COM3`.
    pub name: String,
}

impl PortInfo {
    /// Create port info from a handle and a name.
    pub fn new<S: AsRef<str>>(handle: u64, name: S) -> Self {
        Self {
            handle,
            name: name.as_ref().into(),
        }
    }
}

impl Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (handle {})", self.name, self.handle)
    }
}

/// How one pipeline is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Is a loop draining this pipeline right now?
    pub running: bool,

    /// Items handed to a listener which returned successfully.
    pub delivered: u64,

    /// Items for which the listener returned an error or panicked.
    pub listener_failures: u64,

    /// The pipeline's queue.
    pub channel: ChannelMetrics,
}

/// How both pipelines are doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LooperStats {
    /// The data pipeline.
    pub data: PipelineStats,

    /// The line event pipeline.
    pub events: PipelineStats,

    /// Is data delivery paused?
    pub paused: bool,

    /// The events mask in use.
    pub events_mask: LineState,
}

/// Delivers data and line events for one port to the registered listeners.
///
/// The native layer calls [`Looper::insert_data`] and [`Looper::insert_line_event`]
/// from whatever thread it runs on.
/// These never block on delivery.
///
/// Two dispatch loops, each on its own thread, hand items to the listeners in arrival order.
///
/// Locking: the data channel, the event channel, and the filter each have their own lock.
/// The filter lock is held while pushing a transition into the event channel so that
/// transitions are queued in the order they were computed.
/// The data channel lock is never held together with any other.
#[derive(Debug)]
pub struct Looper {
    port: PortInfo,

    data: Arc<BoundedChannel<DataRecord>>,
    data_counters: Arc<LoopCounters>,
    data_loop: Mutex<Option<DispatchLoop<DataRecord>>>,
    gate: Arc<DeliveryGate>,

    events: Arc<BoundedChannel<LineStatusRecord>>,
    event_counters: Arc<LoopCounters>,
    event_loop: Mutex<Option<DispatchLoop<LineStatusRecord>>>,
    filter: Mutex<LineStateFilter>,
}

impl Looper {
    /// Create a looper for the given port. No loops are started.
    pub fn new(config: LooperConfig, port: PortInfo) -> Result<Self, Error> {
        config.validate()?;

        info!(%port, ?config, "Creating looper");

        Ok(Self {
            port,
            data: Arc::new(BoundedChannel::new(config.data_capacity)?),
            data_counters: Arc::default(),
            data_loop: Mutex::new(None),
            gate: Arc::default(),
            events: Arc::new(BoundedChannel::new(config.event_capacity)?),
            event_counters: Arc::default(),
            event_loop: Mutex::new(None),
            filter: Mutex::new(LineStateFilter::new(config.events_mask)),
        })
    }

    /// The port this looper serves.
    pub fn port(&self) -> &PortInfo {
        &self.port
    }

    /// Queue a chunk of data for the data listener.
    ///
    /// May be called before any loop is started, items simply queue up.
    pub fn insert_data<B: Into<Bytes>>(&self, bytes: B) {
        let record = DataRecord::new(bytes);
        trace!(len = record.len(), "Inserting data");

        self.data.push(record);
    }

    /// Compute the transition the given raw line state means and queue it for the event listener.
    pub fn insert_line_event<S: Into<LineState>>(&self, raw: S) {
        let raw = raw.into();

        let mut filter = self.filter.lock();
        let record = filter.apply(raw);
        trace!(%raw, %record, "Inserting line event");

        self.events.push(record);
    }

    /// Start delivering data to `listener`.
    pub fn start_data_loop<L: DataListener>(&self, listener: L) -> Result<(), Error> {
        let mut data_loop = self.data_loop.lock();
        if data_loop.is_some() {
            return Err(Error::AlreadyRunning(Pipeline::Data));
        }

        *data_loop = Some(DispatchLoop::spawn(
            format!(
                "DataLooper for handle {} and port {}",
                self.port.handle, self.port.name
            ),
            Arc::clone(&self.data),
            Some(Arc::clone(&self.gate)),
            Arc::clone(&self.data_counters),
            listener::Data(listener),
        )?);

        info!(port = %self.port, "Data loop started");
        Ok(())
    }

    /// Read the current line state as a baseline, then start delivering line events to `listener`.
    ///
    /// If the line state cannot be read the loop is not started.
    pub fn start_event_loop<L: EventListener, R: LineStateReader + ?Sized>(
        &self,
        listener: L,
        reader: &mut R,
    ) -> Result<(), Error> {
        let mut event_loop = self.event_loop.lock();
        if event_loop.is_some() {
            return Err(Error::AlreadyRunning(Pipeline::Event));
        }

        let baseline = reader.read_line_state()?;
        debug!(%baseline, "Read current line state");
        self.filter.lock().seed(baseline);

        *event_loop = Some(DispatchLoop::spawn(
            format!(
                "EventLooper for handle {} and port {}",
                self.port.handle, self.port.name
            ),
            Arc::clone(&self.events),
            None,
            Arc::clone(&self.event_counters),
            listener::Events(listener),
        )?);

        info!(port = %self.port, "Event loop started");
        Ok(())
    }

    /// Stop the data loop. Queued data is kept.
    ///
    /// Waits for a delivery in flight to finish, unless called from within that delivery.
    pub fn stop_data_loop(&self) -> Result<(), Error> {
        // Cancelled under the lock so a new loop can't start pulling items while this one still does.
        // Joined outside of it so a listener calling back into the looper can't deadlock with us.
        let mut data_loop = {
            let mut slot = self.data_loop.lock();
            let data_loop = slot.take().ok_or(Error::NotRunning(Pipeline::Data))?;
            data_loop.cancel();
            data_loop
        };

        data_loop.stop();

        info!(port = %self.port, "Data loop stopped");
        Ok(())
    }

    /// Stop the event loop. Queued events are kept.
    ///
    /// Waits for a delivery in flight to finish, unless called from within that delivery.
    pub fn stop_event_loop(&self) -> Result<(), Error> {
        let mut event_loop = {
            let mut slot = self.event_loop.lock();
            let event_loop = slot.take().ok_or(Error::NotRunning(Pipeline::Event))?;
            event_loop.cancel();
            event_loop
        };

        event_loop.stop();

        info!(port = %self.port, "Event loop stopped");
        Ok(())
    }

    /// Is the data loop running?
    pub fn is_data_loop_running(&self) -> bool {
        self.data_loop.lock().is_some()
    }

    /// Is the event loop running?
    pub fn is_event_loop_running(&self) -> bool {
        self.event_loop.lock().is_some()
    }

    /// Stop handing data to the listener after the current delivery.
    /// Data keeps being queued, and evicted oldest first once the channel is full.
    pub fn pause(&self) {
        self.gate.pause();
    }

    /// Continue handing data to the listener.
    pub fn resume(&self) {
        self.gate.resume();
        self.data.wake();
    }

    /// Is data delivery paused?
    pub fn is_paused(&self) -> bool {
        !self.gate.is_enabled()
    }

    /// Select which line state bits matter for future line events.
    pub fn set_events_mask<S: Into<LineState>>(&self, mask: S) {
        let mask = mask.into();
        self.filter.lock().set_mask(mask);

        debug!(%mask, "Events mask set");
    }

    /// The line state bits which currently matter.
    pub fn events_mask(&self) -> LineState {
        self.filter.lock().mask()
    }

    /// Counters for both pipelines.
    pub fn stats(&self) -> LooperStats {
        LooperStats {
            data: PipelineStats {
                running: self.is_data_loop_running(),
                delivered: self.data_counters.delivered.load(Ordering::Relaxed),
                listener_failures: self.data_counters.failures.load(Ordering::Relaxed),
                channel: self.data.metrics(),
            },
            events: PipelineStats {
                running: self.is_event_loop_running(),
                delivered: self.event_counters.delivered.load(Ordering::Relaxed),
                listener_failures: self.event_counters.failures.load(Ordering::Relaxed),
                channel: self.events.metrics(),
            },
            paused: self.is_paused(),
            events_mask: self.events_mask(),
        }
    }
}
