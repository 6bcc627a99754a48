//! Collection-scoped document storage.
//!
//! [`DocumentStore`] is the storage adapter every document-backed repository is
//! written against. Each implementation is bound to exactly one collection when
//! it is constructed; the binding never changes afterwards.
//!
//! ```text
//! ┌──────────────────────┐
//! │ domain repository    │  typed entities
//! └──────────┬───────────┘
//!            │ bson::Document
//! ┌──────────▼───────────┐
//! │ DocumentStore        │  MongoDocumentStore | MemoryDocumentStore
//! └──────────────────────┘
//! ```
//!
//! Filters and updates use MongoDB query syntax. [`MemoryDocumentStore`]
//! understands the subset documented on its type.

mod filter;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use crate::common::DatabaseResult;

pub use memory::{MemoryDocumentStore, MemorySequence};

/// Sort, skip and limit for [`DocumentStore::find`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Sort specification, e.g. `doc! { "product_id": 1 }`
    pub sort: Option<Document>,
    /// Documents to skip before returning results
    pub skip: Option<u64>,
    /// Maximum number of documents to return (non-positive means unlimited)
    pub limit: Option<i64>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Generic access to a single collection of untyped documents.
///
/// No validation or duplicate detection happens here beyond what unique indexes
/// enforce. Store errors are returned as-is; nothing is retried.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the collection this store is bound to
    fn collection_name(&self) -> &str;

    /// First document matching `filter`, in whatever order the store yields
    async fn find_one(&self, filter: Document) -> DatabaseResult<Option<Document>>;

    /// Persist `document` and return its store-assigned identifier.
    ///
    /// ObjectIds are returned in hex form. Fails with
    /// [`DatabaseError::DuplicateKey`](crate::DatabaseError::DuplicateKey) when a
    /// unique index rejects the document.
    async fn insert(&self, document: Document) -> DatabaseResult<String>;

    /// All documents matching `filter`, shaped by `options`
    async fn find(&self, filter: Document, options: QueryOptions)
    -> DatabaseResult<Vec<Document>>;

    /// Number of documents matching `filter`
    async fn count(&self, filter: Document) -> DatabaseResult<u64>;

    /// Apply an operator update (`$set`, `$unset`) to the first match.
    ///
    /// Returns the number of matched documents (0 or 1).
    async fn update_one(&self, filter: Document, update: Document) -> DatabaseResult<u64>;

    /// Create a unique index on a top-level field. Idempotent.
    async fn ensure_unique_index(&self, field: &str) -> DatabaseResult<()>;
}

/// Atomic, monotonically increasing counters keyed by name
#[async_trait]
pub trait IdSequence: Send + Sync {
    /// Increment the counter for `key` and return the new value (first value is 1)
    async fn next_id(&self, key: &str) -> DatabaseResult<i64>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    fn collection_name(&self) -> &str {
        (**self).collection_name()
    }

    async fn find_one(&self, filter: Document) -> DatabaseResult<Option<Document>> {
        (**self).find_one(filter).await
    }

    async fn insert(&self, document: Document) -> DatabaseResult<String> {
        (**self).insert(document).await
    }

    async fn find(
        &self,
        filter: Document,
        options: QueryOptions,
    ) -> DatabaseResult<Vec<Document>> {
        (**self).find(filter, options).await
    }

    async fn count(&self, filter: Document) -> DatabaseResult<u64> {
        (**self).count(filter).await
    }

    async fn update_one(&self, filter: Document, update: Document) -> DatabaseResult<u64> {
        (**self).update_one(filter, update).await
    }

    async fn ensure_unique_index(&self, field: &str) -> DatabaseResult<()> {
        (**self).ensure_unique_index(field).await
    }
}

#[async_trait]
impl<T: IdSequence + ?Sized> IdSequence for Arc<T> {
    async fn next_id(&self, key: &str) -> DatabaseResult<i64> {
        (**self).next_id(key).await
    }
}

/// String form of a store-assigned `_id`
pub fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}
