use database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(i64),

    #[error("Product with name '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    /// Map a store error raised while writing `name`, turning unique index
    /// violations into [`ProductError::DuplicateName`].
    pub(crate) fn from_write(err: DatabaseError, name: &str) -> Self {
        if err.is_duplicate_key() {
            ProductError::DuplicateName(name.to_string())
        } else {
            ProductError::Store(err)
        }
    }
}

impl From<validator::ValidationErrors> for ProductError {
    fn from(err: validator::ValidationErrors) -> Self {
        ProductError::Validation(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for ProductError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        ProductError::Serialization(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for ProductError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        ProductError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_becomes_duplicate_name() {
        let err = ProductError::from_write(DatabaseError::DuplicateKey("name_key".into()), "Widget");
        assert!(matches!(err, ProductError::DuplicateName(ref name) if name == "Widget"));
    }

    #[test]
    fn test_other_store_errors_pass_through() {
        let err = ProductError::from_write(DatabaseError::Generic("timeout".into()), "Widget");
        assert!(matches!(err, ProductError::Store(DatabaseError::Generic(_))));
        assert_eq!(err.to_string(), "Database error: timeout");
    }
}
