#![forbid(unsafe_code)]

mod overlay;
mod populator;
mod reader;
mod sampler;
mod types;
mod update;

pub use overlay::TxIndexOverlay;
pub use populator::{
    IndexPopulator, IndexUpdater, IndexWriter, NonUniquePopulator, PropertyAccessor,
};
pub use reader::IndexReader;
pub use sampler::{IndexSample, NonUniqueSampler};
pub use types::{
    collect_all, EmptyPostingStream, IndexDef, IndexKind, IndexQuery, PostingStream,
    VecPostingStream,
};
pub use update::{NodePropertyUpdate, PropertyChange, UpdateMode};
