use tracing::trace;

use crate::{error::TransportError, records::LineState};

/// Something which can tell the current state of a port's lines.
///
/// Used once when starting the event loop, so the first transition has a correct baseline.
pub trait LineStateReader {
    /// Read the raw line state.
    fn read_line_state(&mut self) -> Result<LineState, TransportError>;
}

impl<P: serialport::SerialPort + ?Sized> LineStateReader for P {
    fn read_line_state(&mut self) -> Result<LineState, TransportError> {
        let mut state = LineState::EMPTY;

        if self.read_clear_to_send()? {
            state = state | LineState::CTS;
        }
        if self.read_data_set_ready()? {
            state = state | LineState::DSR;
        }
        if self.read_carrier_detect()? {
            state = state | LineState::DCD;
        }
        if self.read_ring_indicator()? {
            state = state | LineState::RI;
        }

        trace!(name = ?self.name(), %state, "Read line state from serial port");

        Ok(state)
    }
}
