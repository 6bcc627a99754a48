//! Configuration for the products CLI

use core_config::{FromEnv, env_or_default};
use database::mongodb::MongoConfig;

pub use core_config::Environment;

const DEFAULT_APP_NAME: &str = "products-cli";

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb: MongoConfig,
    /// Collection holding product documents (`PRODUCTS_COLLECTION`)
    pub collection: String,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();

        let mut mongodb = MongoConfig::from_env()?;
        if mongodb.app_name.is_none() {
            mongodb = mongodb.with_app_name(DEFAULT_APP_NAME);
        }

        let collection = env_or_default(
            "PRODUCTS_COLLECTION",
            domain_products::DEFAULT_COLLECTION,
        );

        Ok(Self {
            mongodb,
            collection,
            environment,
        })
    }
}
