use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::{Validate, ValidationError};

/// Id carried by a product that has not been inserted yet
pub const UNASSIGNED_ID: i64 = 0;

/// Largest page `list` will return
pub const MAX_PAGE_SIZE: i64 = 500;

/// Product status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductStatus {
    /// Available for sale
    #[default]
    Active,
    Inactive,
    OutOfStock,
    Discontinued,
    Draft,
}

/// Product category
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductCategory {
    #[default]
    General,
    Electronics,
    Clothing,
    Food,
    Books,
    HomeGarden,
    Sports,
    Toys,
    Health,
    Automotive,
    Other,
}

/// Product aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Product {
    /// Domain identifier, assigned on insert ([`UNASSIGNED_ID`] before that)
    pub id: i64,
    /// Unique product name (compared case-insensitively, see [`name_key`])
    #[validate(custom(function = "valid_name"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price in cents
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    pub category: ProductCategory,
    #[serde(default)]
    pub status: ProductStatus,
    /// Stock Keeping Unit
    #[validate(length(max = 50))]
    pub sku: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set while the product is soft-deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(custom(function = "valid_name"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price in cents
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub category: ProductCategory,
    #[serde(default)]
    pub status: ProductStatus,
    #[validate(length(max = 50))]
    pub sku: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// DTO for updating an existing product
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(custom(function = "valid_name"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub category: Option<ProductCategory>,
    pub status: Option<ProductStatus>,
    #[validate(length(max = 50))]
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Which soft-deleted products a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeletedFilter {
    /// Live products only
    #[default]
    Exclude,
    /// Live and soft-deleted products
    Include,
    /// Soft-deleted products only
    Only,
}

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductSort {
    /// Oldest first
    #[default]
    IdAsc,
    /// Newest first
    IdDesc,
}

/// Filters, pagination and ordering for `list`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchCriteria {
    pub status: Option<ProductStatus>,
    pub category: Option<ProductCategory>,
    pub brand: Option<String>,
    /// Minimum price (in cents)
    pub min_price: Option<i64>,
    /// Maximum price (in cents)
    pub max_price: Option<i64>,
    /// `true`: stock > 0, `false`: stock == 0
    pub in_stock: Option<bool>,
    pub tag: Option<String>,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    #[serde(default)]
    pub deleted: DeletedFilter,
    #[serde(default)]
    pub sort: ProductSort,
    /// Page size, clamped to `1..=MAX_PAGE_SIZE`
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            status: None,
            category: None,
            brand: None,
            min_price: None,
            max_price: None,
            in_stock: None,
            tag: None,
            search: None,
            deleted: DeletedFilter::default(),
            sort: ProductSort::default(),
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl SearchCriteria {
    pub fn effective_limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of results plus the total number of matches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    /// Matches across all pages
    pub total: u64,
    pub limit: i64,
    pub offset: u64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, limit: i64, offset: u64) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    /// Whether another page follows this one
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.items.len() as u64) < self.total
    }
}

fn default_limit() -> i64 {
    50
}

/// Longest product name, counted in characters after trimming
pub const MAX_NAME_LENGTH: usize = 200;

fn valid_name(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("blank"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::new("length"));
    }
    Ok(())
}

/// Normalized form of a product name used for uniqueness and lookups
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Product {
    /// Build an uninserted product from a CreateProduct DTO
    pub fn new(input: CreateProduct) -> Self {
        let now = Utc::now();
        Self {
            id: UNASSIGNED_ID,
            name: input.name,
            description: input.description,
            price: input.price,
            stock: input.stock,
            category: input.category,
            status: input.status,
            sku: input.sku,
            brand: input.brand,
            tags: input.tags,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Minimal uninserted product, mostly useful in tests and scripts
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(CreateProduct {
            name: name.into(),
            description: String::new(),
            price: 0,
            stock: 0,
            category: ProductCategory::default(),
            status: ProductStatus::default(),
            sku: None,
            brand: None,
            tags: Vec::new(),
        })
    }

    /// Apply updates from an UpdateProduct DTO
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(sku) = update.sku {
            self.sku = Some(sku);
        }
        if let Some(brand) = update.brand {
            self.brand = Some(brand);
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        self.updated_at = Utc::now();
    }

    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}
