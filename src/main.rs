use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::{
    client::ApiClient,
    config::AppConfig,
    models::Product,
    params::{SortDirection, SortField},
    services::{auth_service, product_service::ProductForm, storefront::Storefront},
    session::SessionStore,
    state::AppState,
};

#[derive(Debug, Parser)]
#[command(name = "storefront")]
#[command(about = "Browse and manage the product catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that the API answers
    Ping,
    Login {
        username: String,
        password: String,
    },
    Register {
        username: String,
        password: String,
    },
    Logout,
    /// Toggle dark mode
    Theme,
    #[command(flatten)]
    Catalog(CatalogCommands),
}

/// Commands that need a logged-in session.
#[derive(Debug, Subcommand)]
enum CatalogCommands {
    /// List products, optionally filtered and sorted
    List {
        #[arg(short, long, default_value = "")]
        query: String,
        /// id, name, price or in_stock
        #[arg(short, long, default_value = "id")]
        sort: String,
        #[arg(long)]
        desc: bool,
    },
    Show {
        id: i64,
    },
    Add(ProductArgs),
    Update(ProductArgs),
    Delete {
        id: i64,
    },
    /// Order the selected products
    Checkout {
        /// Product id to order, repeatable
        #[arg(long = "select", required = true)]
        select: Vec<i64>,
        /// Quantity as <id>=<n>, repeatable
        #[arg(long = "qty")]
        qty: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct ProductArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    price: String,
    #[arg(long)]
    in_stock: bool,
}

impl From<ProductArgs> for ProductForm {
    fn from(args: ProductArgs) -> Self {
        Self {
            id: args.id,
            name: args.name,
            price: args.price,
            in_stock: args.in_stock,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let store = SessionStore::new(&config.session_path);
    let mut client = ApiClient::new(&config)?;
    let flags = auth_service::restore(&mut client, &store)
        .await
        .with_context(|| format!("reading session from {}", store.path().display()))?;

    match cli.command {
        Commands::Ping => {
            let welcome = client.ping().await?;
            println!("{}", welcome.message);
        }
        Commands::Login { username, password } => {
            let response = auth_service::login(&mut client, &store, &username, &password).await?;
            if response.message.is_empty() {
                println!("Logged in as {username}");
            } else {
                println!("{}", response.message);
            }
        }
        Commands::Register { username, password } => {
            let user = auth_service::register(&client, &username, &password).await?;
            println!("Registered user {} ({})", user.id, user.username);
        }
        Commands::Logout => {
            auth_service::logout(&mut client, &store).await?;
            println!("Logged out");
        }
        Commands::Theme => {
            let flags = store.update(|f| f.dark_mode = !f.dark_mode).await?;
            println!("Dark mode {}", if flags.dark_mode { "on" } else { "off" });
        }
        Commands::Catalog(command) => {
            auth_service::require_login(&flags)?;
            let mut app = Storefront::new(client, AppState::new(flags.dark_mode));
            run_catalog_command(&mut app, command).await?;
        }
    }

    Ok(())
}

async fn run_catalog_command(app: &mut Storefront, command: CatalogCommands) -> anyhow::Result<()> {
    match command {
        CatalogCommands::List { query, sort, desc } => {
            let ok = app.refresh().await;
            ensure(app, ok)?;
            let state = app.state_mut();
            state.set_query(query);
            let direction = if desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            state.set_sort(SortField::parse_lenient(&sort), direction);
            print_products(&state.view(), state.dark_mode);
        }
        CatalogCommands::Show { id } => {
            let product = app.fetch_one(id).await;
            let product = product.ok_or_else(|| failure(app))?;
            print_products(&[product], app.state().dark_mode);
        }
        CatalogCommands::Add(args) => {
            app.state_mut().form = args.into();
            let ok = app.save_product().await;
            ensure(app, ok)?;
        }
        CatalogCommands::Update(args) => {
            let ok = app.refresh().await;
            ensure(app, ok)?;
            let form = ProductForm::from(args);
            let id = form
                .id
                .trim()
                .parse::<i64>()
                .map_err(|_| anyhow!("id must be a whole number"))?;
            if !app.state_mut().begin_edit(id) {
                return Err(anyhow!("Product {id} not found"));
            }
            app.state_mut().form = form;
            let ok = app.save_product().await;
            ensure(app, ok)?;
        }
        CatalogCommands::Delete { id } => {
            let ok = app.refresh().await;
            ensure(app, ok)?;
            let ok = app.delete_product(id).await;
            ensure(app, ok)?;
            println!("Product {id} deleted");
        }
        CatalogCommands::Checkout { select, qty } => {
            let ok = app.refresh().await;
            ensure(app, ok)?;
            let state = app.state_mut();
            for id in select {
                if !state.products.iter().any(|p| p.id == id) {
                    return Err(anyhow!("Product {id} not found"));
                }
                if !state.cart.contains(id) {
                    state.toggle_select(id);
                }
            }
            for entry in qty {
                let (id, amount) = entry
                    .split_once('=')
                    .ok_or_else(|| anyhow!("quantity must look like <id>=<n>, got '{entry}'"))?;
                let id = id
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| anyhow!("invalid product id in '{entry}'"))?;
                state.set_quantity(id, amount);
            }
            let ok = app.checkout().await;
            ensure(app, ok)?;
        }
    }

    if let Some(message) = &app.state().message {
        println!("{message}");
    }
    Ok(())
}

fn ensure(app: &Storefront, ok: bool) -> anyhow::Result<()> {
    if ok { Ok(()) } else { Err(failure(app)) }
}

fn failure(app: &Storefront) -> anyhow::Error {
    anyhow!(
        "{}",
        app.state().error.as_deref().unwrap_or("Operation failed")
    )
}

fn print_products(products: &[Product], dark_mode: bool) {
    let header = format!("{:>6}  {:<24} {:>10}  {}", "ID", "Name", "Price", "In Stock");
    if dark_mode {
        println!("\x1b[1;97;40m{header}\x1b[0m");
    } else {
        println!("\x1b[1m{header}\x1b[0m");
    }
    for p in products {
        println!(
            "{:>6}  {:<24} {:>10}  {}",
            p.id,
            p.name.as_deref().unwrap_or("-"),
            format!("${:.2}", p.price),
            if p.in_stock { "Yes" } else { "No" }
        );
    }
    if products.is_empty() {
        println!("(no products)");
    }
}
