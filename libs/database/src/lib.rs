//! Storage primitives for document-backed repositories
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB connector, [`document::DocumentStore`] and its
//!   MongoDB and in-memory implementations
//! - `config` - `core_config::FromEnv` for [`mongodb::MongoConfig`]
//! - `all` - everything above
//!
//! # Example
//!
//! ```ignore
//! use database::document::DocumentStore;
//! use database::mongodb::{MongoConfig, MongoDocumentStore, connect_from_config_with_retry};
//!
//! let config = MongoConfig::with_database("mongodb://localhost:27017", "catalog");
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let store = MongoDocumentStore::new(&client.database(config.database()), "products");
//!
//! let id = store.insert(bson::doc! { "name": "Widget" }).await?;
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod document;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
