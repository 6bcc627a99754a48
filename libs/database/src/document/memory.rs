//! In-process document store for tests and local runs

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use mongodb::bson::{Bson, Document, oid::ObjectId};
use tokio::sync::Mutex;
use tracing::instrument;

use super::filter::{apply_update, matches, sort_documents};
use super::{DocumentStore, IdSequence, QueryOptions, id_to_string};
use crate::common::{DatabaseError, DatabaseResult};

/// A [`DocumentStore`] that keeps one collection in memory.
///
/// Supported filter operators: plain equality (with `null` matching missing
/// fields), `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$exists`,
/// `$regex` with `$options`, `$or` and `$and`. Updates support `$set` and
/// `$unset`. Anything else fails with [`DatabaseError::Unsupported`].
///
/// Unique indexes behave like MongoDB's: a missing field indexes as `null`.
/// All operations are serialized behind one lock.
pub struct MemoryDocumentStore {
    name: String,
    state: Mutex<Collection>,
}

#[derive(Default)]
struct Collection {
    documents: Vec<Document>,
    unique_fields: BTreeSet<String>,
}

impl Collection {
    /// Reject `candidate` if it collides on `_id` or a unique field with any
    /// stored document other than the one at `skip`.
    fn check_unique(
        &self,
        collection: &str,
        candidate: &Document,
        skip: Option<usize>,
    ) -> DatabaseResult<()> {
        let fields = std::iter::once("_id").chain(self.unique_fields.iter().map(String::as_str));

        for field in fields {
            let value = candidate.get(field).unwrap_or(&Bson::Null);
            let clash = self
                .documents
                .iter()
                .enumerate()
                .filter(|(index, _)| Some(*index) != skip)
                .any(|(_, existing)| existing.get(field).unwrap_or(&Bson::Null) == value);

            if clash {
                return Err(DatabaseError::DuplicateKey(format!(
                    "{collection} index: {field} dup key: {value}"
                )));
            }
        }
        Ok(())
    }

    fn position(&self, filter: &Document) -> DatabaseResult<Option<usize>> {
        for (index, document) in self.documents.iter().enumerate() {
            if matches(document, filter)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

impl MemoryDocumentStore {
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            name: collection_name.into(),
            state: Mutex::new(Collection::default()),
        }
    }

    /// Snapshot of every stored document, in insertion order
    pub async fn documents(&self) -> Vec<Document> {
        self.state.lock().await.documents.clone()
    }

    /// Number of stored documents, regardless of any filter
    pub async fn len(&self) -> usize {
        self.state.lock().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn collection_name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, filter: Document) -> DatabaseResult<Option<Document>> {
        let state = self.state.lock().await;
        Ok(state
            .position(&filter)?
            .map(|index| state.documents[index].clone()))
    }

    #[instrument(skip(self, document), fields(collection = %self.name))]
    async fn insert(&self, document: Document) -> DatabaseResult<String> {
        let mut stored = document;
        if !stored.contains_key("_id") {
            let mut with_id = Document::new();
            with_id.insert("_id", ObjectId::new());
            with_id.extend(stored);
            stored = with_id;
        }

        let mut state = self.state.lock().await;
        state.check_unique(&self.name, &stored, None)?;

        let id = id_to_string(stored.get("_id").unwrap_or(&Bson::Null));
        state.documents.push(stored);
        Ok(id)
    }

    async fn find(
        &self,
        filter: Document,
        options: QueryOptions,
    ) -> DatabaseResult<Vec<Document>> {
        let mut found = {
            let state = self.state.lock().await;
            let mut found = Vec::new();
            for document in &state.documents {
                if matches(document, &filter)? {
                    found.push(document.clone());
                }
            }
            found
        };

        if let Some(sort) = &options.sort {
            sort_documents(&mut found, sort);
        }

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = match options.limit {
            Some(limit) if limit > 0 => limit as usize,
            _ => usize::MAX,
        };

        Ok(found.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, filter: Document) -> DatabaseResult<u64> {
        let state = self.state.lock().await;
        let mut count = 0;
        for document in &state.documents {
            if matches(document, &filter)? {
                count += 1;
            }
        }
        Ok(count)
    }

    #[instrument(skip(self, filter, update), fields(collection = %self.name))]
    async fn update_one(&self, filter: Document, update: Document) -> DatabaseResult<u64> {
        let mut state = self.state.lock().await;
        let Some(index) = state.position(&filter)? else {
            return Ok(0);
        };

        let mut updated = state.documents[index].clone();
        apply_update(&mut updated, &update)?;
        state.check_unique(&self.name, &updated, Some(index))?;
        state.documents[index] = updated;
        Ok(1)
    }

    async fn ensure_unique_index(&self, field: &str) -> DatabaseResult<()> {
        let mut state = self.state.lock().await;
        if state.unique_fields.contains(field) {
            return Ok(());
        }

        let mut seen = Vec::with_capacity(state.documents.len());
        for document in &state.documents {
            let value = document.get(field).unwrap_or(&Bson::Null);
            if seen.contains(&value) {
                return Err(DatabaseError::DuplicateKey(format!(
                    "{} index: {field} dup key: {value}",
                    self.name
                )));
            }
            seen.push(value);
        }

        state.unique_fields.insert(field.to_string());
        Ok(())
    }
}

/// An [`IdSequence`] backed by a map of counters
#[derive(Default)]
pub struct MemorySequence {
    counters: Mutex<HashMap<String, i64>>,
}

impl MemorySequence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdSequence for MemorySequence {
    async fn next_id(&self, key: &str) -> DatabaseResult<i64> {
        let mut counters = self.counters.lock().await;
        let counter = counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
