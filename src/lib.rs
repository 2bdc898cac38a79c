#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

/// Line states, data chunks and line status transitions.
pub mod records;

/// The bounded, evicting queue each pipeline is built on.
pub mod channel;

/// Masking of raw line states into transitions.
pub mod filter;

/// Pausing and resuming data delivery.
pub mod gate;

/// What applications implement to receive data and line events.
pub mod listener;

/// The threads draining each pipeline into its listener.
pub(crate) mod dispatch;

/// The looper itself: both pipelines for a single port.
pub mod looper;

/// What the looper needs from the underlying port.
pub mod transport;

/// Mocked port, producing data and line events without hardware.
pub mod mock;

/// Relates to config files.
pub mod config;

/// Possible errors in this library.
pub mod error;

/// Logging/tracing setup.
pub mod logging;

/// The command line interface.
pub mod cli;
