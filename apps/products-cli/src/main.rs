//! Products CLI
//!
//! Command-line access to the product catalog. Every command connects to
//! MongoDB, runs one repository operation and prints the result as JSON.

use clap::{Args, Parser, Subcommand};
use core_config::env::load_dotenv;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::{
    CreateProduct, DeletedFilter, MongoProductRepository, ProductCategory, ProductService,
    ProductSort, ProductStatus, SearchCriteria, UpdateProduct,
};
use eyre::Result;
use serde_json::json;
use tracing::{debug, info};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "products-cli")]
#[command(about = "Manage products stored in MongoDB")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure the unique indexes exist and report the collection
    InitIndexes,

    /// Insert a new product
    Insert(InsertArgs),

    /// Get a product by id
    Get { id: i64 },

    /// Find a product by name (case-insensitive)
    FindByName { name: String },

    /// Check whether a name is taken, including by deleted products
    Exists { name: String },

    /// Update fields of an existing product
    Update(UpdateArgs),

    /// Soft-delete a product
    Delete { id: i64 },

    /// Restore a soft-deleted product
    Restore { id: i64 },

    /// List products
    List(ListArgs),

    /// Ping MongoDB
    Health,
}

#[derive(Args)]
struct InsertArgs {
    #[arg(short, long)]
    name: String,

    #[arg(short, long, default_value = "")]
    description: String,

    /// Price in cents
    #[arg(short, long)]
    price: i64,

    #[arg(short, long, default_value_t = 0)]
    stock: i32,

    #[arg(short, long, default_value = "general")]
    category: ProductCategory,

    #[arg(long, default_value = "active")]
    status: ProductStatus,

    #[arg(long)]
    sku: Option<String>,

    #[arg(long)]
    brand: Option<String>,

    #[arg(short, long, value_delimiter = ',')]
    tags: Vec<String>,
}

impl From<InsertArgs> for CreateProduct {
    fn from(args: InsertArgs) -> Self {
        CreateProduct {
            name: args.name,
            description: args.description,
            price: args.price,
            stock: args.stock,
            category: args.category,
            status: args.status,
            sku: args.sku,
            brand: args.brand,
            tags: args.tags,
        }
    }
}

#[derive(Args)]
struct UpdateArgs {
    id: i64,

    #[arg(short, long)]
    name: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    /// Price in cents
    #[arg(short, long)]
    price: Option<i64>,

    #[arg(short, long)]
    stock: Option<i32>,

    #[arg(short, long)]
    category: Option<ProductCategory>,

    #[arg(long)]
    status: Option<ProductStatus>,

    #[arg(long)]
    sku: Option<String>,

    #[arg(long)]
    brand: Option<String>,

    /// Replaces all tags
    #[arg(short, long, value_delimiter = ',')]
    tags: Option<Vec<String>>,
}

impl From<UpdateArgs> for UpdateProduct {
    fn from(args: UpdateArgs) -> Self {
        UpdateProduct {
            name: args.name,
            description: args.description,
            price: args.price,
            stock: args.stock,
            category: args.category,
            status: args.status,
            sku: args.sku,
            brand: args.brand,
            tags: args.tags,
        }
    }
}

#[derive(Args)]
struct ListArgs {
    #[arg(long)]
    status: Option<ProductStatus>,

    #[arg(long)]
    category: Option<ProductCategory>,

    #[arg(long)]
    brand: Option<String>,

    #[arg(long)]
    min_price: Option<i64>,

    #[arg(long)]
    max_price: Option<i64>,

    /// `true` for stock > 0, `false` for sold out
    #[arg(long)]
    in_stock: Option<bool>,

    #[arg(long)]
    tag: Option<String>,

    /// Substring of name or description
    #[arg(short, long)]
    search: Option<String>,

    /// exclude, include or only
    #[arg(long, default_value = "exclude")]
    deleted: DeletedFilter,

    /// id_asc or id_desc
    #[arg(long, default_value = "id_asc")]
    sort: ProductSort,

    #[arg(short, long, default_value_t = 50)]
    limit: i64,

    #[arg(short, long, default_value_t = 0)]
    offset: u64,
}

impl From<ListArgs> for SearchCriteria {
    fn from(args: ListArgs) -> Self {
        SearchCriteria {
            status: args.status,
            category: args.category,
            brand: args.brand,
            min_price: args.min_price,
            max_price: args.max_price,
            in_stock: args.in_stock,
            tag: args.tag,
            search: args.search,
            deleted: args.deleted,
            sort: args.sort,
            limit: args.limit,
            offset: args.offset,
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    let dotenv = load_dotenv();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    if let Some(path) = dotenv {
        debug!(path = %path.display(), "Loaded environment file");
    }

    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());

    let client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;

    let db = client.database(config.mongodb.database());
    // Unique indexes are ensured on every start
    let service =
        ProductService::new(MongoProductRepository::open(&db, &config.collection).await?);

    match cli.command {
        Commands::InitIndexes => {
            print_json(&json!({ "collection": config.collection, "indexes": "ready" }))?;
        }

        Commands::Insert(args) => {
            let product = service.create_product(args.into()).await?;
            print_json(&product)?;
        }

        Commands::Get { id } => {
            print_json(&service.get_product(id).await?)?;
        }

        Commands::FindByName { name } => {
            print_json(&service.get_by_name(&name).await?)?;
        }

        Commands::Exists { name } => {
            let exists = service.name_taken(&name).await?;
            print_json(&json!({ "name": name, "exists": exists }))?;
        }

        Commands::Update(args) => {
            let id = args.id;
            print_json(&service.update_product(id, args.into()).await?)?;
        }

        Commands::Delete { id } => {
            print_json(&service.delete_product(id).await?)?;
        }

        Commands::Restore { id } => {
            print_json(&service.restore_product(id).await?)?;
        }

        Commands::List(args) => {
            let page = service.list_products(args.into()).await?;
            info!(total = page.total, returned = page.items.len(), "Listed products");
            print_json(&page)?;
        }

        Commands::Health => {
            let status = database::mongodb::check_health_detailed(&client).await;
            print_json(&status)?;
            if !status.healthy {
                return Err(eyre::eyre!("MongoDB is unhealthy"));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_insert() {
        let cli = Cli::try_parse_from([
            "products-cli",
            "insert",
            "--name",
            "Widget",
            "--price",
            "1999",
            "--category",
            "home_garden",
            "--tags",
            "tools,sale",
        ])
        .unwrap();

        let Commands::Insert(args) = cli.command else {
            panic!("expected insert");
        };
        let input = CreateProduct::from(args);
        assert_eq!(input.name, "Widget");
        assert_eq!(input.price, 1999);
        assert_eq!(input.category, ProductCategory::HomeGarden);
        assert_eq!(input.status, ProductStatus::Active);
        assert_eq!(input.tags, vec!["tools", "sale"]);
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::try_parse_from(["products-cli", "list"]).unwrap();

        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(SearchCriteria::from(args), SearchCriteria::default());
    }

    #[test]
    fn test_parse_list_deleted_only() {
        let cli = Cli::try_parse_from([
            "products-cli",
            "list",
            "--deleted",
            "only",
            "--sort",
            "id_desc",
            "--in-stock",
            "false",
        ])
        .unwrap();

        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        let criteria = SearchCriteria::from(args);
        assert_eq!(criteria.deleted, DeletedFilter::Only);
        assert_eq!(criteria.sort, ProductSort::IdDesc);
        assert_eq!(criteria.in_stock, Some(false));
    }

    #[test]
    fn test_parse_update_leaves_unset_fields_alone() {
        let cli = Cli::try_parse_from(["products-cli", "update", "7", "--stock", "3"]).unwrap();

        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };
        assert_eq!(args.id, 7);
        let update = UpdateProduct::from(args);
        assert_eq!(update.stock, Some(3));
        assert!(update.name.is_none());
        assert!(update.tags.is_none());
    }

    #[test]
    fn test_parse_find_by_name() {
        let cli = Cli::try_parse_from(["products-cli", "find-by-name", "widget"]).unwrap();
        assert!(matches!(cli.command, Commands::FindByName { ref name } if name == "widget"));
    }
}
