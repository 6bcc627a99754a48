//! Document-store implementation of ProductRepository
//!
//! Products are stored one document per product:
//!
//! ```text
//! { _id: ObjectId, product_id: i64, name, name_key, ..., deleted_at? }
//! ```
//!
//! `product_id` is the domain id, drawn from an [`IdSequence`] keyed by the
//! collection name. `name_key` is the normalized name; a unique index on it
//! is what actually enforces name uniqueness.

use async_trait::async_trait;
use chrono::Utc;
use database::document::{DocumentStore, IdSequence, QueryOptions};
use database::mongodb::{MongoDocumentStore, MongoSequence};
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::Database;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    name_key, DeletedFilter, PaginatedResult, Product, ProductSort, SearchCriteria,
};
use crate::repository::ProductRepository;

/// Collection used when none is configured
pub const DEFAULT_COLLECTION: &str = "products";

const ID_FIELD: &str = "product_id";
const NAME_KEY_FIELD: &str = "name_key";
const DELETED_AT_FIELD: &str = "deleted_at";

/// [`ProductRepository`] over any [`DocumentStore`]
pub struct DocumentProductRepository<S, Q> {
    store: S,
    sequence: Q,
}

/// The production wiring: MongoDB collection plus MongoDB counters
pub type MongoProductRepository = DocumentProductRepository<MongoDocumentStore, MongoSequence>;

impl DocumentProductRepository<MongoDocumentStore, MongoSequence> {
    /// Bind to the default `products` collection
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, DEFAULT_COLLECTION)
    }

    /// Bind to a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self::from_parts(
            MongoDocumentStore::new(db, collection_name),
            MongoSequence::new(db),
        )
    }

    /// Bind to a collection and make sure its unique indexes exist
    pub async fn open(db: &Database, collection_name: &str) -> ProductResult<Self> {
        Self::initialized(
            MongoDocumentStore::new(db, collection_name),
            MongoSequence::new(db),
        )
        .await
    }
}

impl<S: DocumentStore, Q: IdSequence> DocumentProductRepository<S, Q> {
    pub fn from_parts(store: S, sequence: Q) -> Self {
        Self { store, sequence }
    }

    /// Like [`from_parts`](Self::from_parts), creating the unique indexes first
    pub async fn initialized(store: S, sequence: Q) -> ProductResult<Self> {
        let repository = Self::from_parts(store, sequence);
        repository.init_indexes().await?;
        Ok(repository)
    }

    /// The underlying store, for maintenance operations
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create the unique indexes the repository relies on
    pub async fn init_indexes(&self) -> ProductResult<()> {
        self.store.ensure_unique_index(ID_FIELD).await?;
        self.store.ensure_unique_index(NAME_KEY_FIELD).await?;
        info!(
            collection = self.store.collection_name(),
            "Product indexes created successfully"
        );
        Ok(())
    }

    /// Restrict a filter to products that are not soft-deleted
    fn live(mut filter: Document) -> Document {
        filter.insert(DELETED_AT_FIELD, Bson::Null);
        filter
    }

    async fn find_product(&self, filter: Document) -> ProductResult<Option<Product>> {
        self.store
            .find_one(filter)
            .await?
            .map(from_document)
            .transpose()
    }

    /// Build a store filter from SearchCriteria
    pub(crate) fn build_filter(criteria: &SearchCriteria) -> Document {
        let mut filter = doc! {};

        match criteria.deleted {
            DeletedFilter::Exclude => {
                filter.insert(DELETED_AT_FIELD, Bson::Null);
            }
            DeletedFilter::Include => {}
            DeletedFilter::Only => {
                filter.insert(DELETED_AT_FIELD, doc! { "$ne": Bson::Null });
            }
        }

        if let Some(status) = criteria.status {
            filter.insert("status", status.to_string());
        }

        if let Some(category) = criteria.category {
            filter.insert("category", category.to_string());
        }

        if let Some(ref brand) = criteria.brand {
            filter.insert("brand", brand.as_str());
        }

        if criteria.min_price.is_some() || criteria.max_price.is_some() {
            let mut price = doc! {};
            if let Some(min) = criteria.min_price {
                price.insert("$gte", min);
            }
            if let Some(max) = criteria.max_price {
                price.insert("$lte", max);
            }
            filter.insert("price", price);
        }

        match criteria.in_stock {
            Some(true) => {
                filter.insert("stock", doc! { "$gt": 0 });
            }
            Some(false) => {
                filter.insert("stock", doc! { "$lte": 0 });
            }
            None => {}
        }

        if let Some(ref tag) = criteria.tag {
            filter.insert("tags", doc! { "$in": [tag.as_str()] });
        }

        if let Some(ref search) = criteria.search {
            let pattern = regex::escape(search);
            filter.insert(
                "$or",
                vec![
                    doc! { "name": { "$regex": pattern.as_str(), "$options": "i" } },
                    doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
                ],
            );
        }

        filter
    }

    fn sort_spec(sort: ProductSort) -> Document {
        match sort {
            ProductSort::IdAsc => doc! { ID_FIELD: 1 },
            ProductSort::IdDesc => doc! { ID_FIELD: -1 },
        }
    }
}

#[async_trait]
impl<S: DocumentStore, Q: IdSequence> ProductRepository for DocumentProductRepository<S, Q> {
    #[instrument(skip(self, product), fields(product_name = %product.name))]
    async fn insert(&self, product: Product) -> ProductResult<Product> {
        product.validate()?;

        // Fast path only; the unique index on name_key is authoritative
        if self.exists_by_name(&product.name).await? {
            return Err(ProductError::DuplicateName(product.name));
        }

        let id = self.sequence.next_id(self.store.collection_name()).await?;
        let product = Product {
            id,
            deleted_at: None,
            ..product
        };

        self.store
            .insert(to_document(&product)?)
            .await
            .map_err(|e| ProductError::from_write(e, &product.name))?;

        info!(product_id = id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self, product), fields(product_id = product.id))]
    async fn update(&self, product: Product) -> ProductResult<Product> {
        product.validate()?;

        let id = product.id;
        let name = product.name.clone();

        // Same fast path as insert; the unique index stays authoritative
        let clash = self
            .store
            .find_one(doc! { NAME_KEY_FIELD: product.name_key(), ID_FIELD: { "$ne": id } })
            .await?;
        if clash.is_some() {
            return Err(ProductError::DuplicateName(name));
        }

        let product = Product {
            updated_at: Utc::now(),
            ..product
        };

        let mut fields = to_document(&product)?;
        for managed in [ID_FIELD, "created_at", DELETED_AT_FIELD] {
            fields.remove(managed);
        }

        let matched = self
            .store
            .update_one(Self::live(doc! { ID_FIELD: id }), doc! { "$set": fields })
            .await
            .map_err(|e| ProductError::from_write(e, &name))?;

        if matched == 0 {
            return Err(ProductError::NotFound(id));
        }

        info!(product_id = id, "Product updated successfully");
        self.find_by_id(id).await?.ok_or(ProductError::NotFound(id))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> ProductResult<Option<Product>> {
        self.find_product(Self::live(doc! { ID_FIELD: id })).await
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> ProductResult<Option<Product>> {
        self.find_product(Self::live(doc! { NAME_KEY_FIELD: name_key(name) }))
            .await
    }

    #[instrument(skip(self))]
    async fn exists_by_name(&self, name: &str) -> ProductResult<bool> {
        let found = self
            .store
            .find_one(doc! { NAME_KEY_FIELD: name_key(name) })
            .await?;
        Ok(found.is_some())
    }

    #[instrument(skip(self, product), fields(product_id = product.id))]
    async fn delete(&self, product: &Product) -> ProductResult<Product> {
        let id = product.id;
        let now = timestamp()?;

        let matched = self
            .store
            .update_one(
                Self::live(doc! { ID_FIELD: id }),
                doc! { "$set": { DELETED_AT_FIELD: now.clone(), "updated_at": now } },
            )
            .await?;

        let current = self
            .find_product(doc! { ID_FIELD: id })
            .await?
            .ok_or(ProductError::NotFound(id))?;

        if matched == 0 {
            debug!(product_id = id, "Product was already deleted");
        } else {
            info!(product_id = id, "Product deleted successfully");
        }
        Ok(current)
    }

    #[instrument(skip(self))]
    async fn restore(&self, id: i64) -> ProductResult<Option<Product>> {
        let matched = self
            .store
            .update_one(
                doc! { ID_FIELD: id, DELETED_AT_FIELD: { "$ne": Bson::Null } },
                doc! {
                    "$unset": { DELETED_AT_FIELD: "" },
                    "$set": { "updated_at": timestamp()? },
                },
            )
            .await?;

        if matched == 0 {
            debug!(product_id = id, "No soft-deleted product to restore");
            return Ok(None);
        }

        info!(product_id = id, "Product restored successfully");
        self.find_by_id(id).await
    }

    #[instrument(skip(self))]
    async fn list(&self, criteria: SearchCriteria) -> ProductResult<PaginatedResult<Product>> {
        let filter = Self::build_filter(&criteria);
        let limit = criteria.effective_limit();

        let total = self.store.count(filter.clone()).await?;

        let options = QueryOptions::new()
            .sort(Self::sort_spec(criteria.sort))
            .skip(criteria.offset)
            .limit(limit);

        let items = self
            .store
            .find(filter, options)
            .await?
            .into_iter()
            .map(from_document)
            .collect::<ProductResult<Vec<_>>>()?;

        Ok(PaginatedResult::new(items, total, limit, criteria.offset))
    }
}

/// Encode a product as its stored document
fn to_document(product: &Product) -> ProductResult<Document> {
    let mut document = bson::to_document(product)?;
    document.remove("id");
    document.insert(ID_FIELD, product.id);
    document.insert(NAME_KEY_FIELD, product.name_key());
    Ok(document)
}

/// Decode a stored document, dropping store-only fields
fn from_document(mut document: Document) -> ProductResult<Product> {
    let id = document
        .remove(ID_FIELD)
        .ok_or_else(|| ProductError::Serialization(format!("document without {ID_FIELD}")))?;
    document.insert("id", id);
    document.remove("_id");
    document.remove(NAME_KEY_FIELD);
    Ok(bson::from_document(document)?)
}

/// Current time in the same encoding serde gives `Product` timestamps
fn timestamp() -> ProductResult<Bson> {
    Ok(bson::to_bson(&Utc::now())?)
}
