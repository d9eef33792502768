use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::types::{Result, SombraError};

/// Default number of buffered updates tolerated before a populating updater flushes.
pub const DEFAULT_QUEUE_THRESHOLD: usize = 10_000;
/// Default bound, in encoded value bytes, of one sampling step.
pub const DEFAULT_SAMPLE_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Configuration supplied when creating an index populator.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PopulatorOptions {
    /// Buffered update count that must be exceeded before a batch boundary flushes.
    pub queue_threshold: usize,
    /// Encoded bytes a sampler accumulates before folding the current step.
    pub sample_buffer_size: usize,
}

impl Default for PopulatorOptions {
    fn default() -> Self {
        Self {
            queue_threshold: DEFAULT_QUEUE_THRESHOLD,
            sample_buffer_size: DEFAULT_SAMPLE_BUFFER_SIZE,
        }
    }
}

impl PopulatorOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flush threshold for buffered updates.
    pub fn queue_threshold(mut self, updates: usize) -> Self {
        self.queue_threshold = updates;
        self
    }

    /// Sets the sampler step bound in encoded bytes.
    pub fn sample_buffer_size(mut self, bytes: usize) -> Self {
        self.sample_buffer_size = bytes;
        self
    }

    /// Parses options from a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let opts: Self = toml::from_str(contents)
            .map_err(|err| SombraError::Config(format!("failed to parse populator options: {err}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reads options from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            SombraError::Config(format!(
                "failed to read populator options {}: {err}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Rejects settings the populator cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.queue_threshold == 0 {
            return Err(SombraError::Config(
                "queue_threshold must be greater than zero".into(),
            ));
        }
        if self.sample_buffer_size == 0 {
            return Err(SombraError::Config(
                "sample_buffer_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
