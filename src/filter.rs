use tracing::trace;

use crate::records::{LineState, LineStatusRecord};

/// Turns raw line state reports into transition records.
///
/// Only the bits selected by the mask are considered.
/// The filter remembers the last raw state, so each record carries what came before it,
/// masked with the mask in use when the record is made.
///
/// Not synchronized: callers feeding it from several threads must serialize access,
/// otherwise two reports may both pair up with the same previous state.
#[derive(Debug, Clone)]
pub struct LineStateFilter {
    mask: LineState,
    last_raw: LineState,
}

impl Default for LineStateFilter {
    fn default() -> Self {
        Self::new(LineState::DEFAULT_MASK)
    }
}

impl LineStateFilter {
    /// A filter with the given mask and an all-low baseline.
    pub fn new(mask: LineState) -> Self {
        Self {
            mask,
            last_raw: LineState::EMPTY,
        }
    }

    /// Set the baseline from the line state as read from hardware.
    pub fn seed(&mut self, raw: LineState) {
        self.last_raw = raw;
        trace!(baseline = %self.last(), "Line state baseline set");
    }

    /// Mask the raw state and pair it up with the previous one.
    pub fn apply(&mut self, raw: LineState) -> LineStatusRecord {
        let record = LineStatusRecord::new(self.last(), raw & self.mask);
        self.last_raw = raw;

        record
    }

    /// Replace the mask. Only affects records made from now on, including the previous state they carry.
    pub fn set_mask(&mut self, mask: LineState) {
        self.mask = mask;
    }

    /// The mask in use.
    pub fn mask(&self) -> LineState {
        self.mask
    }

    /// The last state seen, under the current mask.
    pub fn last(&self) -> LineState {
        self.last_raw & self.mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(previous: u32, new: u32) -> LineStatusRecord {
        LineStatusRecord::new(previous.into(), new.into())
    }

    #[test]
    fn transitions_and_mask_change() {
        let mut filter = LineStateFilter::new(LineState(0b1111));
        filter.seed(LineState(0b0000));

        assert_eq!(filter.apply(LineState(0b0011)), record(0b0000, 0b0011));
        assert_eq!(filter.apply(LineState(0b1011)), record(0b0011, 0b1011));

        filter.set_mask(LineState(0b0011));
        assert_eq!(filter.apply(LineState(0b1111)), record(0b0011, 0b0011));
    }

    #[test]
    fn previous_is_last_masked_raw() {
        let mask = LineState(0b0101);
        let mut filter = LineStateFilter::new(mask);
        let baseline = LineState(0b1111);
        filter.seed(baseline);

        let raws = [0b0000, 0b1010, 0b0111, 0b0101, 0b1111, 0b0001].map(LineState);

        let mut previous = baseline & mask;
        for raw in raws {
            let record = filter.apply(raw);
            assert_eq!(record.previous(), previous);
            assert_eq!(record.new_state(), raw & mask);
            previous = raw & mask;
        }
    }

    #[test]
    fn previous_state_follows_mask_changes() {
        let mut filter = LineStateFilter::new(LineState(0b1111));
        filter.seed(LineState(0b0110));

        filter.set_mask(LineState(0b0010));
        assert_eq!(filter.last(), LineState(0b0010));
        assert_eq!(filter.apply(LineState(0b1011)), record(0b0010, 0b0010));

        // Widening brings back bits which were hidden, as last reported.
        filter.set_mask(LineState(0b1111));
        assert_eq!(filter.apply(LineState(0b0001)), record(0b1011, 0b0001));
    }

    #[test]
    fn seed_uses_mask() {
        let mut filter = LineStateFilter::default();
        filter.seed(LineState::CTS | LineState::DTR);

        assert_eq!(filter.last(), LineState::CTS);
    }

    #[test]
    fn unmasked_bits_are_invisible() {
        let mut filter = LineStateFilter::default();

        let transition = filter.apply(LineState::RTS | LineState::DTR);
        assert_eq!(transition, record(0, 0));
    }
}
