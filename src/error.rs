use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::looper::Pipeline;

/// Errors thay may occur in this library.
#[derive(Debug, Error, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub enum Error {
    /// A dispatch loop was started while one was already running for that pipeline.
    #[error("The {0} loop is already running")]
    AlreadyRunning(Pipeline),

    /// A dispatch loop was stopped while none was running for that pipeline.
    #[error("The {0} loop is not running")]
    NotRunning(Pipeline),

    /// The current line state could not be read when starting the event loop.
    /// Without it there is no baseline for transitions, so the loop is not started.
    #[error("Could not read the current line state: {0}")]
    LineStateQuery(String),

    /// The configuration is not usable.
    #[error("Bad configuration: `{0}`")]
    BadConfig(String),

    /// The OS refused to give us a thread for a loop.
    #[error("Could not spawn a loop thread: {0}")]
    Spawn(String),
}

impl Error {
    /// Get the inner bad configuration message, if that's the variant.
    pub fn try_into_bad_config(self) -> Result<String, Self> {
        if let Self::BadConfig(message) = self {
            Ok(message)
        } else {
            Err(self)
        }
    }
}

/// Problems reported by the transport a [`crate::transport::LineStateReader`] sits on top of.
#[derive(Debug, Error)]
pub enum TransportError {
    /// IO related errors.
    #[error("Underlying IO problem")]
    IO(#[from] std::io::Error),

    /// The serial port itself complained.
    #[error("Serial port problem")]
    SerialPort(#[from] serialport::Error),

    /// Port is gone.
    #[error("Serial port disconnected")]
    Disconnected,
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            message += &format!(": {cause}");
            source = cause.source();
        }

        Error::LineStateQuery(message)
    }
}
