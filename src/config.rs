use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{channel::DEFAULT_CAPACITY, error::Error, records::LineState};

/// Tunables of a [`crate::looper::Looper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooperConfig {
    /// How many data chunks may be queued before the oldest is dropped.
    pub data_capacity: usize,

    /// How many line events may be queued before the oldest is dropped.
    pub event_capacity: usize,

    /// Which line state bits are reported on initially.
    pub events_mask: LineState,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            data_capacity: DEFAULT_CAPACITY,
            event_capacity: DEFAULT_CAPACITY,
            events_mask: LineState::DEFAULT_MASK,
        }
    }
}

impl LooperConfig {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.data_capacity == 0 {
            return Err(Error::BadConfig(
                "The data capacity is zero. Each pipeline needs room for at least one item."
                    .into(),
            ));
        }

        if self.event_capacity == 0 {
            return Err(Error::BadConfig(
                "The event capacity is zero. Each pipeline needs room for at least one item."
                    .into(),
            ));
        }

        Ok(())
    }
}

/// How the mock port behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Time between data chunks.
    pub data_interval_ms: u64,

    /// Words of lorem ipsum per data chunk.
    pub words_per_chunk: usize,

    /// Toggle a line every this many chunks. Zero means never.
    pub line_toggle_every: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            data_interval_ms: 250,
            words_per_chunk: 8,
            line_toggle_every: 4,
        }
    }
}

/// The configuration used for running the demo binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// The looper.
    pub looper: LooperConfig,

    /// The mock port feeding it.
    pub mock: MockConfig,
}

impl Config {
    fn ron() -> ron::Options {
        ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .with_default_extension(ron::extensions::Extensions::UNWRAP_NEWTYPES)
    }

    /// Deserialize a .ron file's contents.
    pub fn deserialize(input: &str) -> Result<Self, Error> {
        let config = Self::ron()
            .from_str::<Config>(input)
            .map_err(|e| Error::BadConfig(format!("Not valid RON: {e}")))?;

        config.validate()?;

        Ok(config)
    }

    /// An example configuration with some fields filled in.
    pub fn example() -> Self {
        Self {
            looper: LooperConfig {
                data_capacity: 1000,
                event_capacity: 100,
                events_mask: LineState::CTS | LineState::DSR,
            },
            mock: MockConfig {
                data_interval_ms: 100,
                words_per_chunk: 12,
                line_toggle_every: 10,
            },
        }
    }

    /// Serialize the configuration in a "pretty" (i.e. non-compact) fashion.
    pub fn serialize_pretty(&self) -> Result<String, Error> {
        Self::ron()
            .to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::BadConfig(format!("Could not serialize: {e}")))
    }

    /// Setup a new configuration from a RON file.
    pub fn new_from_path<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        let p = p.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::BadConfig(format!("Could not read {p:?}: {e}")))?;

        Self::deserialize(&s)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        self.looper.validate()
    }
}
