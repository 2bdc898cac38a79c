#![allow(dead_code)]

use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    time::Duration,
};

use serial_looper::{
    config::LooperConfig,
    listener::{DataListener, EventListener, ListenerResult},
    looper::{Looper, PortInfo},
    records::{DataRecord, LineState, LineStatusRecord},
};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait when asserting nothing arrives.
pub const QUIET: Duration = Duration::from_millis(200);

pub fn looper() -> Looper {
    looper_with_capacity(100)
}

pub fn looper_with_capacity(capacity: usize) -> Looper {
    Looper::new(
        LooperConfig {
            data_capacity: capacity,
            event_capacity: capacity,
            events_mask: LineState::DEFAULT_MASK,
        },
        PortInfo::new(42, "/dev/ttyTest"),
    )
    .expect("Config should be valid")
}

/// Forwards everything it gets to a channel.
pub struct Collector<T>(Sender<T>);

impl<T> Collector<T> {
    pub fn new() -> (Self, Receiver<T>) {
        let (tx, rx) = mpsc::channel();
        (Self(tx), rx)
    }
}

impl DataListener for Collector<DataRecord> {
    fn on_new_data(&mut self, record: DataRecord) -> ListenerResult {
        self.0.send(record)?;
        Ok(())
    }
}

impl EventListener for Collector<LineStatusRecord> {
    fn on_new_line_event(&mut self, record: LineStatusRecord) -> ListenerResult {
        self.0.send(record)?;
        Ok(())
    }
}

pub fn receive_n<T>(rx: &Receiver<T>, n: usize) -> Vec<T> {
    (0..n)
        .map(|i| {
            rx.recv_timeout(TIMEOUT)
                .unwrap_or_else(|e| panic!("Item {i} of {n} did not arrive: {e:?}"))
        })
        .collect()
}

pub fn assert_quiet<T: std::fmt::Debug>(rx: &Receiver<T>) {
    match rx.recv_timeout(QUIET) {
        Err(RecvTimeoutError::Timeout) => {}
        other => panic!("Expected nothing to arrive, got {other:?}"),
    }
}

pub fn texts(records: Vec<DataRecord>) -> Vec<String> {
    records
        .into_iter()
        .map(|record| String::from_utf8_lossy(record.data()).to_string())
        .collect()
}

pub fn transition(previous: u32, new: u32) -> LineStatusRecord {
    LineStatusRecord::new(LineState(previous), LineState(new))
}
