//! Storefront Application CLI
//!
//! Operator seeding commands: create catalog products and coupons directly
//! against the database.

use std::process;

use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use rust_decimal::Decimal;
use storefront::coupons::CouponKind;
use storefront_app::{
    database::{self, Db},
    domain::{
        catalog::{NewProduct, PgCatalogRepository, ProductStatus, ProductUuid},
        coupons::{CouponUuid, NewCoupon, PgCouponsRepository},
    },
};

#[derive(Debug, Parser)]
#[command(name = "storefront-app", about = "Storefront CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Product(ProductCommand),
    Coupon(CouponCommand),
}

#[derive(Debug, Args)]
struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    Create(CreateProductArgs),
}

#[derive(Debug, Args)]
struct CreateProductArgs {
    /// Stock keeping unit, unique per product
    #[arg(long)]
    sku: String,

    /// Product display name
    #[arg(long)]
    name: String,

    /// Unit price in minor units (e.g. cents)
    #[arg(long)]
    price: u64,

    /// Initial stock on hand
    #[arg(long, default_value_t = 0)]
    stock: u32,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[derive(Debug, Args)]
struct CouponCommand {
    #[command(subcommand)]
    command: CouponSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponSubcommand {
    Create(CreateCouponArgs),
}

#[derive(Debug, Args)]
struct CreateCouponArgs {
    /// Redemption code, unique per coupon
    #[arg(long)]
    code: String,

    /// Coupon display name
    #[arg(long)]
    name: String,

    /// Percentage off the subtotal, e.g. 10 for 10%
    #[arg(long, conflicts_with_all = ["amount", "free_shipping"])]
    percent: Option<Decimal>,

    /// Fixed discount in minor units
    #[arg(long, conflicts_with = "free_shipping")]
    amount: Option<u64>,

    /// Waive the shipping cost instead of discounting
    #[arg(long)]
    free_shipping: bool,

    /// Cap on a percentage discount, in minor units
    #[arg(long, requires = "percent")]
    maximum_discount: Option<u64>,

    /// Minimum cart subtotal required to redeem, in minor units
    #[arg(long)]
    minimum_subtotal: Option<u64>,

    /// Maximum number of redemptions
    #[arg(long)]
    usage_limit: Option<u32>,

    /// Start of the validity window (RFC 3339)
    #[arg(long)]
    starts_at: Option<Timestamp>,

    /// End of the validity window (RFC 3339)
    #[arg(long)]
    expires_at: Option<Timestamp>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Product(ProductCommand {
            command: ProductSubcommand::Create(args),
        }) => create_product(args).await,
        Commands::Coupon(CouponCommand {
            command: CouponSubcommand::Create(args),
        }) => create_coupon(args).await,
    }
}

async fn connect(database_url: &str) -> Result<Db, String> {
    let pool = database::connect(database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    Ok(Db::new(pool))
}

async fn create_product(args: CreateProductArgs) -> Result<(), String> {
    let db = connect(&args.database_url).await?;

    let mut tx = db
        .begin_transaction()
        .await
        .map_err(|error| format!("failed to begin transaction: {error}"))?;

    let product = PgCatalogRepository::new()
        .create_product(
            &mut tx,
            NewProduct {
                uuid: ProductUuid::new(),
                sku: args.sku,
                name: args.name,
                price: args.price,
                stock_quantity: args.stock,
                status: ProductStatus::Active,
            },
        )
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    tx.commit()
        .await
        .map_err(|error| format!("failed to commit: {error}"))?;

    println!("product_uuid: {}", product.uuid);
    println!("sku: {}", product.sku);
    println!("price: {}", product.price);
    println!("stock: {}", product.stock_quantity);

    Ok(())
}

async fn create_coupon(args: CreateCouponArgs) -> Result<(), String> {
    let kind = match (args.percent, args.amount, args.free_shipping) {
        (Some(percent), None, false) => CouponKind::Percentage {
            percent,
            maximum_discount: args.maximum_discount,
        },
        (None, Some(amount), false) => CouponKind::FixedAmount { amount },
        (None, None, true) => CouponKind::FreeShipping,
        _ => {
            return Err(
                "exactly one of --percent, --amount or --free-shipping is required".to_string(),
            );
        }
    };

    let db = connect(&args.database_url).await?;

    let mut tx = db
        .begin_transaction()
        .await
        .map_err(|error| format!("failed to begin transaction: {error}"))?;

    let coupon = PgCouponsRepository::new()
        .create_coupon(
            &mut tx,
            NewCoupon {
                uuid: CouponUuid::new(),
                code: args.code,
                name: args.name,
                kind,
                minimum_subtotal: args.minimum_subtotal,
                usage_limit: args.usage_limit,
                is_active: true,
                starts_at: args.starts_at,
                expires_at: args.expires_at,
            },
        )
        .await
        .map_err(|error| format!("failed to create coupon: {error}"))?;

    tx.commit()
        .await
        .map_err(|error| format!("failed to commit: {error}"))?;

    println!("coupon_uuid: {}", coupon.uuid);
    println!("code: {}", coupon.code);

    Ok(())
}
