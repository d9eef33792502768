//! Transaction-aware property index queries and non-unique index population.
//!
//! [`storage::TxIndexOverlay`] answers index queries and unique seeks as they
//! look from inside an uncommitted transaction. [`storage::NonUniquePopulator`]
//! builds a non-unique index from a stream of property updates while keeping
//! a running selectivity sample.

#![warn(missing_docs)]

pub mod logging;
pub mod storage;
pub mod types;

pub use logging::init_logging;
