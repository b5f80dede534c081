//! # Shopfront CLI
//!
//! Terminal front end for the Shopfront stores.
//!
//! ## Commands
//! ```text
//! shopfront config show|path
//! shopfront carts list [--user <id>]
//! shopfront cart show <id> [--hydrate]
//! shopfront cart add <product> [--qty n] --user <id> [--cart <id>]
//! shopfront cart set <product> <qty> --cart <id>
//! shopfront cart remove <product> --cart <id>
//! shopfront cart clear --cart <id>
//! shopfront products list|show <id>
//! shopfront users list|show <id>
//! shopfront nav <role>
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration (file, then environment)
//! 3. Build the HTTP client and the stores
//! 4. Run the command, print JSON to stdout

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use shopfront_client::{
    Api, CartCategory, CartStore, ClientConfig, ErrorHandler, HttpApi, ProductStore,
    TracingErrorHandler, UserStore,
};
use shopfront_core::{nav_menu, CartId, ProductId, Role, UserId};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "shopfront", version, about = "Shopfront storefront client")]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect the loaded configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// List carts.
    #[command(subcommand)]
    Carts(CartsCommand),

    /// Read or edit a single cart.
    #[command(subcommand)]
    Cart(CartCommand),

    /// Browse the catalogue.
    #[command(subcommand)]
    Products(ProductsCommand),

    /// Browse users.
    #[command(subcommand)]
    Users(UsersCommand),

    /// Print the navigation menu for a role (user or admin).
    Nav { role: Role },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the default config file location.
    Path,
}

#[derive(Debug, Subcommand)]
enum CartsCommand {
    List {
        /// Only carts of this user.
        #[arg(long)]
        user: Option<UserId>,
    },
}

#[derive(Debug, Args)]
struct CartTarget {
    /// Cart to edit.
    #[arg(long)]
    cart: CartId,
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    Show {
        id: CartId,
        /// Fetch product details so the subtotal is complete.
        #[arg(long)]
        hydrate: bool,
    },
    Add {
        product: ProductId,
        #[arg(long, default_value_t = 1)]
        qty: i64,
        /// Owner used when a new cart has to be created.
        #[arg(long)]
        user: UserId,
        /// Existing cart to add to.
        #[arg(long)]
        cart: Option<CartId>,
    },
    Set {
        product: ProductId,
        qty: i64,
        #[command(flatten)]
        target: CartTarget,
    },
    Remove {
        product: ProductId,
        #[command(flatten)]
        target: CartTarget,
    },
    Clear {
        #[command(flatten)]
        target: CartTarget,
    },
}

#[derive(Debug, Subcommand)]
enum ProductsCommand {
    List,
    Show { id: ProductId },
}

#[derive(Debug, Subcommand)]
enum UsersCommand {
    List,
    Show { id: UserId },
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.clone()).context("loading configuration")?;
    debug!(environment = %config.app.environment, "Configuration loaded");

    match cli.command {
        Command::Config(cmd) => run_config(cmd, &config),
        Command::Nav { role } => print(&nav_menu(role)),
        Command::Carts(cmd) => run_carts(cmd, &Backend::new(&config)?).await,
        Command::Cart(cmd) => run_cart(cmd, &Backend::new(&config)?).await,
        Command::Products(cmd) => run_products(cmd, &Backend::new(&config)?).await,
        Command::Users(cmd) => run_users(cmd, &Backend::new(&config)?).await,
    }
}

/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "info,shopfront=debug";

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays machine readable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=shopfront=trace` - Show trace for shopfront crates only
/// - Default: INFO, DEBUG for shopfront crates
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .with_writer(std::io::stderr)
        .init();
}

fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Shared HTTP client and error sink for store-backed commands.
struct Backend {
    api: Arc<dyn Api>,
    handler: Arc<dyn ErrorHandler>,
}

impl Backend {
    fn new(config: &ClientConfig) -> Result<Self> {
        let api = HttpApi::from_config(config).context("building HTTP client")?;
        info!(base_url = %api.base_url(), "Using backend");
        Ok(Backend {
            api: Arc::new(api),
            handler: Arc::new(TracingErrorHandler),
        })
    }

    fn carts(&self) -> CartStore {
        CartStore::new(self.api.clone(), self.handler.clone())
    }
}

fn print<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Commands
// =============================================================================

fn run_config(cmd: ConfigCommand, config: &ClientConfig) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
        ConfigCommand::Path => {
            let path = ClientConfig::default_config_path()
                .ok_or_else(|| anyhow!("no config directory on this platform"))?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

async fn run_carts(cmd: CartsCommand, ctx: &Backend) -> Result<()> {
    let store = ctx.carts();
    let carts = match cmd {
        CartsCommand::List { user: Some(user) } => store.get_user_carts(user).await,
        CartsCommand::List { user: None } => store.get_carts().await,
    };
    if let Some(error) = store.error(CartCategory::List) {
        bail!(error);
    }
    print(&carts)
}

async fn run_cart(cmd: CartCommand, ctx: &Backend) -> Result<()> {
    let store = ctx.carts();

    let cart = match cmd {
        CartCommand::Show { id, hydrate } => {
            let cart = load_cart(&store, id).await?;
            if hydrate {
                let fetched = store.hydrate_cart_products().await?;
                debug!(fetched, "Product details loaded");
            }
            let summary = store.summary();
            return print(&json!({ "cart": cart, "summary": summary }));
        }
        CartCommand::Add {
            product,
            qty,
            user,
            cart,
        } => {
            if let Some(id) = cart {
                load_cart(&store, id).await?;
            }
            store.add_item(user, product, qty).await
        }
        CartCommand::Set {
            product,
            qty,
            target,
        } => {
            load_cart(&store, target.cart).await?;
            store.set_quantity(product, qty).await
        }
        CartCommand::Remove { product, target } => {
            load_cart(&store, target.cart).await?;
            if store.remove_item(product).await {
                store.cart()
            } else {
                None
            }
        }
        CartCommand::Clear { target } => {
            load_cart(&store, target.cart).await?;
            if store.clear_cart().await {
                store.cart()
            } else {
                None
            }
        }
    };

    let cart = cart.ok_or_else(|| {
        anyhow!(store
            .error(CartCategory::Mutate)
            .unwrap_or_else(|| "cart update failed".to_string()))
    })?;
    print(&cart)
}

async fn load_cart(store: &CartStore, id: CartId) -> Result<shopfront_core::Cart> {
    store.get_cart(id).await.ok_or_else(|| {
        anyhow!(store
            .error(CartCategory::Detail)
            .unwrap_or_else(|| format!("cart {} not available", id)))
    })
}

async fn run_products(cmd: ProductsCommand, ctx: &Backend) -> Result<()> {
    let store = ProductStore::new(ctx.api.clone(), ctx.handler.clone());
    match cmd {
        ProductsCommand::List => {
            let products = store.get_products().await;
            if let Some(error) = store.error() {
                bail!(error);
            }
            print(&products)
        }
        ProductsCommand::Show { id } => {
            let product = store
                .get_product(id)
                .await
                .ok_or_else(|| anyhow!(store.error().unwrap_or_default()))?;
            print(&product)
        }
    }
}

async fn run_users(cmd: UsersCommand, ctx: &Backend) -> Result<()> {
    let store = UserStore::new(ctx.api.clone(), ctx.handler.clone());
    match cmd {
        UsersCommand::List => {
            let users = store.get_users().await;
            if let Some(error) = store.error() {
                bail!(error);
            }
            print(&users)
        }
        UsersCommand::Show { id } => {
            let user = store
                .get_user(id)
                .await
                .ok_or_else(|| anyhow!(store.error().unwrap_or_default()))?;
            print(&user)
        }
    }
}
