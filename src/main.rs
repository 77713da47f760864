use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::config::{Config, SessionConfig};
use storefront::types::{Product, SearchQuery, SortDirection, User};
use storefront::{
    ApiClient, CartSnapshot, CartStore, FileSessionStore, MemorySessionStore, SearchController, SearchSnapshot,
    SearchSource, SessionContext, SessionStore,
};

/// Command-line client for the storefront API
#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the API
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Session file (filesystem backend)
    #[arg(long, value_name = "PATH")]
    session_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Drop the persisted session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Ask for a password reset e-mail
    ForgotPassword { email: String },
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Product catalog
    Products {
        #[command(subcommand)]
        action: ListAction,
    },
    /// User administration
    Users {
        #[command(subcommand)]
        action: ListAction,
    },
}

#[derive(Subcommand, Debug)]
enum CartAction {
    Show,
    Add {
        product_id: u64,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Update { cart_item_id: u64, quantity: u32 },
    /// One more unit, bounded by stock
    Inc { cart_item_id: u64 },
    /// One less unit, never below one
    Dec { cart_item_id: u64 },
    Remove { cart_item_id: u64 },
    Clear,
}

#[derive(Subcommand, Debug)]
enum ListAction {
    Search {
        /// Search term
        #[arg(default_value = "")]
        term: String,
        /// Zero-based page
        #[arg(short, long, default_value_t = 0)]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
        /// Sort key
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        desc: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_ref(), args.api_url.as_deref(), args.session_path.as_ref())?;

    info!("Configuration loaded: api_url={}", config.api_url);

    // Create session store
    let store: Arc<dyn SessionStore> = match &config.session {
        SessionConfig::File { path } => {
            info!("Using session file at: {}", path.display());
            Arc::new(FileSessionStore::new(path.clone()))
        }
        SessionConfig::Memory => Arc::new(MemorySessionStore::new()),
    };
    let session = SessionContext::new(store);
    session.init().await?;

    let client = Arc::new(ApiClient::from_config(&config, session.clone())?);

    match args.command {
        Command::Login { email, password } => {
            let user = client.login(&email, &password).await?;
            println!("Signed in as {} <{}> ({})", user.full_name, user.email, user.role);
        }
        Command::Logout => {
            client.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => match session.user().await {
            Some(user) => println!("{} <{}> ({})", user.full_name, user.email, user.role),
            None => println!("Not signed in"),
        },
        Command::ForgotPassword { email } => {
            let message = client.forgot_password(&email).await?;
            println!("{}", message.as_deref().unwrap_or("Request sent"));
        }
        Command::Cart { action } => {
            let cart = CartStore::new(client, session);
            cart.load().await?;
            match action.unwrap_or(CartAction::Show) {
                CartAction::Show => {}
                CartAction::Add { product_id, quantity } => cart.add_item(product_id, quantity).await?,
                CartAction::Update { cart_item_id, quantity } => {
                    cart.update_quantity(cart_item_id, quantity).await?
                }
                CartAction::Inc { cart_item_id } => cart.increment(cart_item_id).await?,
                CartAction::Dec { cart_item_id } => cart.decrement(cart_item_id).await?,
                CartAction::Remove { cart_item_id } => cart.remove_item(cart_item_id).await?,
                CartAction::Clear => cart.clear().await?,
            }
            print_cart(&cart.snapshot());
        }
        Command::Products { action } => {
            let snap = run_search::<Product>(client, config.search.product_page_size, "name", &config, action).await?;
            for p in &snap.content {
                println!("{:>6}  {:<40} {:>10.2}  stock {}", p.id, p.name, p.price, p.stock_quantity);
            }
            print_footer(&snap);
        }
        Command::Users { action } => {
            let snap = run_search::<User>(client, config.search.user_page_size, "fullName", &config, action).await?;
            for u in &snap.content {
                println!("{:>6}  {:<30} {:<30} {}", u.id, u.full_name, u.email, u.role);
            }
            print_footer(&snap);
        }
    }

    Ok(())
}

/// Build a one-shot listing from the command-line settings and fetch it.
async fn run_search<T>(
    client: Arc<dyn SearchSource<T>>,
    default_size: u32,
    default_sort: &str,
    config: &Config,
    action: ListAction,
) -> anyhow::Result<SearchSnapshot<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let ListAction::Search {
        term,
        page,
        size,
        sort,
        desc,
    } = action;

    let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
    let query = SearchQuery::new(size.unwrap_or(default_size), sort.as_deref().unwrap_or(default_sort))
        .with_term(term)
        .with_page(page)
        .with_direction(direction);

    let search = SearchController::new(client, query, config.search.debounce());
    search.refresh().await?;
    Ok(search.snapshot())
}

fn print_cart(cart: &CartSnapshot) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }
    for item in &cart.items {
        println!(
            "{:>6}  {:<40} {:>3} x {:>10.2} = {:>10.2}",
            item.cart_item_id, item.product_name, item.quantity, item.price_at_addition, item.subtotal
        );
    }
    println!("{} item(s), total {:.2}", cart.total_items, cart.total_price);
}

fn print_footer<T>(snap: &SearchSnapshot<T>) {
    println!(
        "Page {}/{} ({} result(s))",
        snap.query.page + 1,
        snap.total_pages.max(1),
        snap.total_elements
    );
}
