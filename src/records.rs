use bytes::Bytes;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    ops::{BitAnd, BitOr, BitXor},
};

/// A single hardware signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Clear to send.
    Cts,
    /// Data set ready.
    Dsr,
    /// Data carrier detect.
    Dcd,
    /// Ring indicator.
    Ri,
    /// Loopback.
    Loop,
    /// Request to send.
    Rts,
    /// Data terminal ready.
    Dtr,
}

impl Signal {
    /// All signals, in bit order.
    pub const ALL: [Signal; 7] = [
        Signal::Cts,
        Signal::Dsr,
        Signal::Dcd,
        Signal::Ri,
        Signal::Loop,
        Signal::Rts,
        Signal::Dtr,
    ];

    /// The bit this signal occupies in a [`LineState`].
    pub const fn bit(self) -> u32 {
        match self {
            Signal::Cts => 0x01,
            Signal::Dsr => 0x02,
            Signal::Dcd => 0x04,
            Signal::Ri => 0x08,
            Signal::Loop => 0x10,
            Signal::Rts => 0x20,
            Signal::Dtr => 0x40,
        }
    }
}

impl Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Signal::Cts => "CTS",
            Signal::Dsr => "DSR",
            Signal::Dcd => "DCD",
            Signal::Ri => "RI",
            Signal::Loop => "LOOP",
            Signal::Rts => "RTS",
            Signal::Dtr => "DTR",
        };
        write!(f, "{name}")
    }
}

/// A set of line state bits, as reported by the native layer.
///
/// Bits outside the known [`Signal`]s are kept as-is,
/// since the native layer may report more than we know how to name.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineState(pub u32);

impl LineState {
    /// No lines set.
    pub const EMPTY: LineState = LineState(0);

    /// Clear to send.
    pub const CTS: LineState = LineState(Signal::Cts.bit());
    /// Data set ready.
    pub const DSR: LineState = LineState(Signal::Dsr.bit());
    /// Data carrier detect.
    pub const DCD: LineState = LineState(Signal::Dcd.bit());
    /// Ring indicator.
    pub const RI: LineState = LineState(Signal::Ri.bit());
    /// Loopback.
    pub const LOOP: LineState = LineState(Signal::Loop.bit());
    /// Request to send.
    pub const RTS: LineState = LineState(Signal::Rts.bit());
    /// Data terminal ready.
    pub const DTR: LineState = LineState(Signal::Dtr.bit());

    /// The mask applied unless configured otherwise: the four input signals
    /// a DCE drives.
    pub const DEFAULT_MASK: LineState =
        LineState(Signal::Cts.bit() | Signal::Dsr.bit() | Signal::Dcd.bit() | Signal::Ri.bit());

    /// The raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Is the given signal set?
    pub const fn contains(self, signal: Signal) -> bool {
        self.0 & signal.bit() != 0
    }

    /// Are no bits set?
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The known signals which are set.
    pub fn signals(self) -> impl Iterator<Item = Signal> {
        Signal::ALL
            .into_iter()
            .filter(move |signal| self.contains(*signal))
    }
}

impl From<u32> for LineState {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<Signal> for LineState {
    fn from(signal: Signal) -> Self {
        Self(signal.bit())
    }
}

impl FromIterator<Signal> for LineState {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0, |bits, signal| bits | signal.bit()))
    }
}

impl BitAnd for LineState {
    type Output = LineState;

    fn bitand(self, rhs: Self) -> Self::Output {
        LineState(self.0 & rhs.0)
    }
}

impl BitOr for LineState {
    type Output = LineState;

    fn bitor(self, rhs: Self) -> Self::Output {
        LineState(self.0 | rhs.0)
    }
}

impl BitXor for LineState {
    type Output = LineState;

    fn bitxor(self, rhs: Self) -> Self::Output {
        LineState(self.0 ^ rhs.0)
    }
}

impl Display for LineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "(none)");
        }

        write!(f, "{}", self.signals().join(" | "))?;

        let known = Signal::ALL.iter().fold(0, |bits, signal| bits | signal.bit());
        let unknown = self.0 & !known;
        if unknown != 0 {
            write!(f, " | {unknown:#x}")?;
        }

        Ok(())
    }
}

/// The direction a signal moved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
}

/// A chunk of bytes as it came off the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord(Bytes);

impl DataRecord {
    /// Create a new data record.
    pub fn new<B: Into<Bytes>>(bytes: B) -> Self {
        Self(bytes.into())
    }

    /// Borrowed form.
    pub fn data(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Does this record hold no bytes?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Turn the record into its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Display for DataRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = String::from_utf8_lossy(&self.0[..self.0.len().min(48)]);

        write!(f, "{} byte(s): {}", self.0.len(), s.trim())
    }
}

/// A change of (masked) line state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStatusRecord {
    previous: LineState,
    new: LineState,
}

impl LineStatusRecord {
    /// Create a new record from an old and a new state.
    pub fn new(previous: LineState, new: LineState) -> Self {
        Self { previous, new }
    }

    /// The state before the transition.
    pub fn previous(&self) -> LineState {
        self.previous
    }

    /// The state after the transition.
    pub fn new_state(&self) -> LineState {
        self.new
    }

    /// Which bits differ between the previous and new state.
    pub fn changed(&self) -> LineState {
        self.previous ^ self.new
    }

    /// How the given signal moved, if at all.
    pub fn edge(&self, signal: Signal) -> Option<Edge> {
        match (self.previous.contains(signal), self.new.contains(signal)) {
            (false, true) => Some(Edge::Rising),
            (true, false) => Some(Edge::Falling),
            _ => None,
        }
    }

    /// Is CTS high after the transition?
    pub fn cts(&self) -> bool {
        self.new.contains(Signal::Cts)
    }

    /// Is DSR high after the transition?
    pub fn dsr(&self) -> bool {
        self.new.contains(Signal::Dsr)
    }

    /// Is DCD high after the transition?
    pub fn dcd(&self) -> bool {
        self.new.contains(Signal::Dcd)
    }

    /// Is RI high after the transition?
    pub fn ri(&self) -> bool {
        self.new.contains(Signal::Ri)
    }
}

impl Display for LineStatusRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.previous, self.new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_mask_is_the_four_input_signals() {
        assert_eq!(LineState::DEFAULT_MASK, LineState(0b1111));
        assert_eq!(
            LineState::DEFAULT_MASK,
            [Signal::Cts, Signal::Dsr, Signal::Dcd, Signal::Ri]
                .into_iter()
                .collect::<LineState>()
        );
    }

    #[test]
    fn display_names_signals() {
        assert_eq!(LineState::EMPTY.to_string(), "(none)");
        assert_eq!((LineState::CTS | LineState::RI).to_string(), "CTS | RI");
        assert_eq!((LineState::DSR | LineState(0x100)).to_string(), "DSR | 0x100");
    }

    #[test]
    fn edges() {
        let record = LineStatusRecord::new(
            LineState::CTS | LineState::DSR,
            LineState::DSR | LineState::DCD,
        );

        assert_eq!(record.edge(Signal::Cts), Some(Edge::Falling));
        assert_eq!(record.edge(Signal::Dcd), Some(Edge::Rising));
        assert_eq!(record.edge(Signal::Dsr), None);
        assert_eq!(record.edge(Signal::Ri), None);
        assert_eq!(record.changed(), LineState::CTS | LineState::DCD);

        assert!(!record.cts());
        assert!(record.dsr());
        assert!(record.dcd());
        assert!(!record.ri());
    }

    #[test]
    fn data_record_display_is_truncated() {
        let record = DataRecord::new(vec![b'a'; 100]);

        assert_eq!(record.len(), 100);
        assert_eq!(record.to_string(), format!("100 byte(s): {}", "a".repeat(48)));
    }
}
