use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{PaginatedResult, Product, SearchCriteria};

/// Repository trait for Product persistence
///
/// Lookups report a missing product as `None`, never as an error. Soft-deleted
/// products are invisible to `find_by_id`, `find_by_name` and the default
/// `list`, but still hold their name: `exists_by_name` reports them and
/// `insert` rejects their name.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Store a new product and return it with its assigned id.
    ///
    /// Any id already on `product` is ignored. Fails with `DuplicateName` when
    /// the name is taken, even if the store-level pre-check raced.
    async fn insert(&self, product: Product) -> ProductResult<Product>;

    /// Replace the mutable fields of a live product
    async fn update(&self, product: Product) -> ProductResult<Product>;

    /// Get a live product by ID
    async fn find_by_id(&self, id: i64) -> ProductResult<Option<Product>>;

    /// Get a live product by name, ignoring case and surrounding whitespace
    async fn find_by_name(&self, name: &str) -> ProductResult<Option<Product>>;

    /// Whether any product, live or soft-deleted, holds this name
    async fn exists_by_name(&self, name: &str) -> ProductResult<bool>;

    /// Soft-delete a product. Deleting an already deleted product is a no-op.
    async fn delete(&self, product: &Product) -> ProductResult<Product>;

    /// Undo a soft delete; `None` when no soft-deleted product has this id
    async fn restore(&self, id: i64) -> ProductResult<Option<Product>>;

    /// List products matching the criteria
    async fn list(&self, criteria: SearchCriteria) -> ProductResult<PaginatedResult<Product>>;
}
