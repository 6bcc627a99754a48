//! Products Domain
//!
//! Persistence and business logic for the product catalog.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← DTOs in, NotFound for absent products
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Aggregate persistence (trait + document-store implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │DocumentStore│  ← MongoDB collection or in-memory store (database crate)
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{CreateProduct, MongoProductRepository, ProductService};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("catalog");
//!
//! // Creates the unique indexes before returning
//! let repository = MongoProductRepository::open(&db, domain_products::DEFAULT_COLLECTION).await?;
//!
//! let service = ProductService::new(repository);
//! let widget = service
//!     .create_product(serde_json::from_str::<CreateProduct>(
//!         r#"{ "name": "Widget", "price": 1999 }"#,
//!     )?)
//!     .await?;
//! assert_eq!(widget.id, 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use error::{ProductError, ProductResult};
pub use models::{
    name_key, CreateProduct, DeletedFilter, PaginatedResult, Product, ProductCategory,
    ProductSort, ProductStatus, SearchCriteria, UpdateProduct,
};
pub use repository::ProductRepository;
pub use service::ProductService;
pub use store::{DocumentProductRepository, MongoProductRepository, DEFAULT_COLLECTION};
