//! MongoDB-backed [`DocumentStore`] and [`IdSequence`]

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use tracing::{info, instrument};

use crate::common::{DatabaseError, DatabaseResult};
use crate::document::{DocumentStore, IdSequence, QueryOptions, id_to_string};

/// Server error code for unique index violations
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Default collection holding [`MongoSequence`] counters
pub const COUNTERS_COLLECTION: &str = "counters";

/// A [`DocumentStore`] bound to one MongoDB collection.
///
/// The collection handle is resolved once at construction.
#[derive(Clone, Debug)]
pub struct MongoDocumentStore {
    collection: Collection<Document>,
}

impl MongoDocumentStore {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Document>(collection_name),
        }
    }

    pub fn from_collection(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    /// Underlying driver collection for operations outside the adapter contract
    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }
}

/// Map driver errors, singling out unique index violations
fn classify(err: mongodb::error::Error) -> DatabaseError {
    if is_duplicate_key(&err) {
        DatabaseError::DuplicateKey(err.to_string())
    } else {
        DatabaseError::Mongo(err)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    fn collection_name(&self) -> &str {
        self.collection.name()
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    async fn find_one(&self, filter: Document) -> DatabaseResult<Option<Document>> {
        Ok(self.collection.find_one(filter).await?)
    }

    #[instrument(skip(self, document), fields(collection = %self.collection.name()))]
    async fn insert(&self, document: Document) -> DatabaseResult<String> {
        let result = self.collection.insert_one(document).await.map_err(classify)?;
        Ok(id_to_string(&result.inserted_id))
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    async fn find(
        &self,
        filter: Document,
        options: QueryOptions,
    ) -> DatabaseResult<Vec<Document>> {
        let find_options = FindOptions::builder()
            .sort(options.sort)
            .skip(options.skip)
            .limit(options.limit)
            .build();

        let cursor = self
            .collection
            .find(filter)
            .with_options(find_options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    async fn count(&self, filter: Document) -> DatabaseResult<u64> {
        Ok(self.collection.count_documents(filter).await?)
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    async fn update_one(&self, filter: Document, update: Document) -> DatabaseResult<u64> {
        let result = self
            .collection
            .update_one(filter, update)
            .await
            .map_err(classify)?;
        Ok(result.matched_count)
    }

    async fn ensure_unique_index(&self, field: &str) -> DatabaseResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { field: 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(format!("idx_{field}_unique"))
                    .build(),
            )
            .build();

        self.collection.create_index(index).await.map_err(classify)?;
        info!(collection = %self.collection.name(), field, "Unique index ensured");
        Ok(())
    }
}

/// Counters stored as `{ _id: <key>, seq: <i64> }` documents.
///
/// Each increment is a single `findAndModify`, so concurrent callers never
/// observe the same value.
#[derive(Clone, Debug)]
pub struct MongoSequence {
    counters: Collection<Document>,
}

impl MongoSequence {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COUNTERS_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            counters: db.collection::<Document>(collection_name),
        }
    }
}

#[async_trait]
impl IdSequence for MongoSequence {
    #[instrument(skip(self))]
    async fn next_id(&self, key: &str) -> DatabaseResult<i64> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .counters
            .find_one_and_update(doc! { "_id": key }, doc! { "$inc": { "seq": 1_i64 } })
            .with_options(options)
            .await?
            .ok_or_else(|| DatabaseError::Generic(format!("counter '{key}' was not upserted")))?;

        counter
            .get_i64("seq")
            .map_err(|e| DatabaseError::Serialization(format!("counter '{key}': {e}")))
    }
}
