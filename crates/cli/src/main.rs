//! dropcart CLI - session migrations and catalog inspection.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! dropcart migrate
//!
//! # List products from the upstream catalog
//! dropcart catalog list --keywords headphones --sort price_asc
//!
//! # Show one product
//! dropcart catalog show 1
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the `PostgreSQL` session table
//! - `catalog list` - Query the upstream product listing
//! - `catalog show` - Fetch one product with its variants
//! - `catalog categories` - Fetch the category tree

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dropcart")]
#[command(author, version, about = "dropcart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session store table
    Migrate,
    /// Query the upstream catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    List {
        /// Free-text search
        #[arg(short, long)]
        keywords: Option<String>,

        /// Category ID
        #[arg(short, long)]
        category: Option<String>,

        /// Sort order (`price_asc`, `price_desc`, `name_asc`, `name_desc`)
        #[arg(short, long)]
        sort: Option<String>,

        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Products per page
        #[arg(long, default_value_t = dropcart_core::catalog::DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },
    /// Show one product
    Show {
        /// Product ID
        pid: String,
    },
    /// Show the category tree
    Categories,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                keywords,
                category,
                sort,
                page,
                page_size,
            } => {
                let query = commands::catalog::build_query(
                    keywords,
                    category,
                    sort.as_deref(),
                    page,
                    page_size,
                )?;
                commands::catalog::list(&query).await?;
            }
            CatalogAction::Show { pid } => commands::catalog::show(&pid).await?,
            CatalogAction::Categories => commands::catalog::categories().await?,
        },
    }
    Ok(())
}
