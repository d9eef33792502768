use crate::types::{NodeId, Result};

use super::types::{collect_all, IndexQuery, PostingStream};

/// Read access to the committed contents of one property index.
///
/// Results reflect the index as of the last flush or commit; they know
/// nothing about the caller's uncommitted changes.
pub trait IndexReader {
    /// Streams the committed nodes whose indexed value satisfies `query`.
    fn query<'a>(&'a self, query: &IndexQuery) -> Result<Box<dyn PostingStream + 'a>>;

    /// Collects the committed matches for `query` into a vector.
    ///
    /// The stream is released before returning, including on error.
    fn query_all(&self, query: &IndexQuery) -> Result<Vec<NodeId>> {
        let mut stream = self.query(query)?;
        let mut out = Vec::new();
        collect_all(&mut *stream, &mut out)?;
        Ok(out)
    }
}

impl<T: IndexReader + ?Sized> IndexReader for &T {
    fn query<'a>(&'a self, query: &IndexQuery) -> Result<Box<dyn PostingStream + 'a>> {
        (**self).query(query)
    }
}
