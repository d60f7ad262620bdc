use crate::error::SourceError;
use async_trait::async_trait;
use model::records::row::RowData;

/// A live connection to the relational source.
///
/// Connections are not safe for concurrent cursor use; the engine opens
/// one connection per concurrently migrated table and never shares one
/// across tables.
#[async_trait]
pub trait SourceConnection: Send {
    /// Opens a forward-only cursor over `query`.
    async fn execute<'a>(
        &'a mut self,
        query: &str,
    ) -> Result<Box<dyn RowCursor + Send + 'a>, SourceError>;
}

/// Forward-only batched cursor over one result set.
#[async_trait]
pub trait RowCursor: Send {
    /// Column names from the result descriptor, captured once per
    /// cursor.
    fn columns(&self) -> &[String];

    /// Fetches up to `max_rows` rows. An empty result marks the end of
    /// the result set; every finite result set reaches it.
    async fn fetch(&mut self, max_rows: usize) -> Result<Vec<RowData>, SourceError>;
}
