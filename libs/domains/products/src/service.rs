//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{name_key, CreateProduct, PaginatedResult, Product, SearchCriteria, UpdateProduct};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// The service turns DTOs into aggregates and reports absent products as
/// [`ProductError::NotFound`]. Persistence rules live in the repository.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new product
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input.validate()?;

        self.repository.insert(Product::new(input)).await
    }

    /// Get a live product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i64) -> ProductResult<Product> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Get a live product by name
    #[instrument(skip(self))]
    pub async fn get_by_name(&self, name: &str) -> ProductResult<Option<Product>> {
        self.repository.find_by_name(name).await
    }

    /// Whether a name is taken, by a live or a soft-deleted product
    #[instrument(skip(self))]
    pub async fn name_taken(&self, name: &str) -> ProductResult<bool> {
        self.repository.exists_by_name(name).await
    }

    /// Update an existing product
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: i64, input: UpdateProduct) -> ProductResult<Product> {
        input.validate()?;

        let mut product = self.get_product(id).await?;

        // Renaming to a different spelling of the same name is allowed
        if let Some(ref new_name) = input.name {
            if name_key(new_name) != product.name_key()
                && self.repository.exists_by_name(new_name).await?
            {
                return Err(ProductError::DuplicateName(new_name.clone()));
            }
        }

        product.apply_update(input);
        self.repository.update(product).await
    }

    /// Soft-delete a live product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i64) -> ProductResult<Product> {
        let product = self.get_product(id).await?;
        self.repository.delete(&product).await
    }

    /// Bring a soft-deleted product back
    #[instrument(skip(self))]
    pub async fn restore_product(&self, id: i64) -> ProductResult<Product> {
        self.repository
            .restore(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// List products with optional filters
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        criteria: SearchCriteria,
    ) -> ProductResult<PaginatedResult<Product>> {
        self.repository.list(criteria).await
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeletedFilter, ProductCategory, ProductStatus};
    use crate::repository::MockProductRepository;
    use chrono::Utc;
    use mockall::predicate;

    fn create_input(name: &str) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            description: "A useful thing".to_string(),
            price: 1999,
            stock: 10,
            category: ProductCategory::Electronics,
            status: ProductStatus::Active,
            sku: Some("WID-001".to_string()),
            brand: None,
            tags: vec![],
        }
    }

    fn stored(id: i64, name: &str) -> Product {
        let mut product = Product::named(name);
        product.id = id;
        product
    }

    #[tokio::test]
    async fn test_create_product_passes_unassigned_product_to_repository() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_insert()
            .withf(|p| p.id == 0 && p.name == "Widget" && p.price == 1999)
            .times(1)
            .returning(|p| Ok(Product { id: 1, ..p }));

        let service = ProductService::new(mock_repo);
        let product = service.create_product(create_input("Widget")).await.unwrap();

        assert_eq!(product.id, 1);
        assert_eq!(product.category, ProductCategory::Electronics);
    }

    #[tokio::test]
    async fn test_create_product_validation_error() {
        // Repository must not be touched
        let mock_repo = MockProductRepository::new();
        let service = ProductService::new(mock_repo);

        let mut input = create_input("Widget");
        input.price = -5;

        let result = service.create_product(input).await;
        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_product_duplicate_name_from_repository() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_insert()
            .returning(|p| Err(ProductError::DuplicateName(p.name)));

        let service = ProductService::new(mock_repo);
        let result = service.create_product(create_input("Widget")).await;

        assert!(matches!(result, Err(ProductError::DuplicateName(ref n)) if n == "Widget"));
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_find_by_id()
            .with(predicate::eq(42))
            .returning(|_| Ok(None));

        let service = ProductService::new(mock_repo);
        let result = service.get_product(42).await;

        assert!(matches!(result, Err(ProductError::NotFound(42))));
    }

    #[tokio::test]
    async fn test_get_by_name_delegates() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_find_by_name()
            .with(predicate::eq("widget"))
            .returning(|_| Ok(Some(stored(1, "Widget"))));

        let service = ProductService::new(mock_repo);
        let product = service.get_by_name("widget").await.unwrap().unwrap();

        assert_eq!(product.name, "Widget");
    }

    #[tokio::test]
    async fn test_update_product_applies_changes() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_find_by_id()
            .with(predicate::eq(1))
            .returning(|id| Ok(Some(stored(id, "Widget"))));
        mock_repo
            .expect_update()
            .withf(|p| p.id == 1 && p.stock == 3 && p.name == "Widget")
            .returning(Ok);

        let service = ProductService::new(mock_repo);
        let update = UpdateProduct {
            stock: Some(3),
            ..Default::default()
        };

        let product = service.update_product(1, update).await.unwrap();
        assert_eq!(product.stock, 3);
    }

    #[tokio::test]
    async fn test_update_product_rename_to_taken_name() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(stored(id, "Widget"))));
        mock_repo
            .expect_exists_by_name()
            .with(predicate::eq("Gadget"))
            .returning(|_| Ok(true));
        mock_repo.expect_update().never();

        let service = ProductService::new(mock_repo);
        let update = UpdateProduct {
            name: Some("Gadget".to_string()),
            ..Default::default()
        };

        let result = service.update_product(1, update).await;
        assert!(matches!(result, Err(ProductError::DuplicateName(_))));
    }

    #[tokio::test]
    async fn test_update_product_case_only_rename_skips_name_check() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(stored(id, "Widget"))));
        mock_repo.expect_exists_by_name().never();
        mock_repo.expect_update().returning(Ok);

        let service = ProductService::new(mock_repo);
        let update = UpdateProduct {
            name: Some("WIDGET".to_string()),
            ..Default::default()
        };

        let product = service.update_product(1, update).await.unwrap();
        assert_eq!(product.name, "WIDGET");
    }

    #[tokio::test]
    async fn test_delete_product_not_found() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo.expect_find_by_id().returning(|_| Ok(None));
        mock_repo.expect_delete().never();

        let service = ProductService::new(mock_repo);
        let result = service.delete_product(7).await;

        assert!(matches!(result, Err(ProductError::NotFound(7))));
    }

    #[tokio::test]
    async fn test_delete_product_soft_deletes() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(stored(id, "Widget"))));
        mock_repo.expect_delete().times(1).returning(|p| {
            Ok(Product {
                deleted_at: Some(Utc::now()),
                ..p.clone()
            })
        });

        let service = ProductService::new(mock_repo);
        let product = service.delete_product(1).await.unwrap();

        assert!(product.is_deleted());
    }

    #[tokio::test]
    async fn test_restore_product_not_found() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_restore()
            .with(predicate::eq(3))
            .returning(|_| Ok(None));

        let service = ProductService::new(mock_repo);
        let result = service.restore_product(3).await;

        assert!(matches!(result, Err(ProductError::NotFound(3))));
    }

    #[tokio::test]
    async fn test_list_products_forwards_criteria() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_list()
            .withf(|c| c.deleted == DeletedFilter::Only && c.limit == 10)
            .returning(|c| Ok(PaginatedResult::new(vec![stored(2, "Gadget")], 1, c.limit, c.offset)));

        let service = ProductService::new(mock_repo);
        let criteria = SearchCriteria {
            deleted: DeletedFilter::Only,
            limit: 10,
            ..Default::default()
        };

        let page = service.list_products(criteria).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Gadget");
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn test_service_clone_shares_repository() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_exists_by_name()
            .times(2)
            .returning(|_| Ok(false));

        let service = ProductService::new(mock_repo);
        let cloned = service.clone();

        assert!(!service.name_taken("Widget").await.unwrap());
        assert!(!cloned.name_taken("Widget").await.unwrap());
    }
}
