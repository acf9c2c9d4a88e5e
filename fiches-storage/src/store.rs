//! Async document store trait.

use crate::document::{Document, FieldUpdate, Query};
use ::async_trait::async_trait;
use fiches_core::{Collection, FichesResult};

/// Document store operations consumed by the triggers.
///
/// Implementations are shared between concurrent requests, and every method
/// may be called concurrently with the others. No method is transactional
/// across documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document of a collection.
    async fn get_all(&self, collection: Collection) -> FichesResult<Vec<Document>>;

    /// Documents of a collection matching a single filter, up to `query.limit`.
    async fn query(&self, collection: Collection, query: &Query) -> FichesResult<Vec<Document>>;

    /// Overwrite the given top-level fields of one document, leaving the
    /// others untouched.
    ///
    /// Fails with `StorageError::NotFound` when the document does not exist.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        update: &FieldUpdate,
    ) -> FichesResult<()>;

    /// Check that the backend answers.
    async fn health_check(&self) -> FichesResult<()>;
}
