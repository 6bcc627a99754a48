//! MongoDB connection management and the MongoDB-backed document store

mod config;
mod connector;
mod health;
mod store;

pub use config::MongoConfig;
pub use connector::{
    connect, connect_from_config, connect_from_config_with_retry, connect_with_retry,
};
pub use health::{HealthStatus, check_health, check_health_detailed};
pub use store::{COUNTERS_COLLECTION, MongoDocumentStore, MongoSequence};

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, Database, bson};
