//! Tracing subscriber bootstrap.

use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{Result, SombraError};

/// Installs a global `fmt` subscriber filtered by `level`.
///
/// `level` accepts any `EnvFilter` directive, e.g. `"info"` or
/// `"sombra_txindex::storage::index=debug"`. Fails if the directive does not
/// parse or a global subscriber is already installed.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).map_err(|_| SombraError::Invalid("invalid log filter"))?;
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| SombraError::Invalid("logging already initialized"))
}
