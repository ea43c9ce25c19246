//! Savor CLI - cart inspection and editing against the live service.
//!
//! # Usage
//!
//! ```bash
//! # Show the current cart
//! savor show
//!
//! # Add two of an item with an option
//! savor add m1 --quantity 2 --option o1 --price 50000 --title "Phở bò"
//!
//! # Set a line's quantity (0 removes it)
//! savor update l1 3
//!
//! # Remove a line
//! savor remove l1
//!
//! # Clear the whole cart, or one vendor's lines
//! savor clear
//! savor clear --vendor v1
//!
//! # Show the cart grouped by vendor
//! savor groups
//! ```
//!
//! Configuration comes from the environment (`SAVOR_API_BASE_URL`,
//! `SAVOR_API_TOKEN`), with `.env` support.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "savor")]
#[command(author, version, about = "Savor cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current cart
    Show,
    /// Add an item to the cart
    Add {
        /// Catalog item ID
        item_id: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Selected option IDs (repeatable)
        #[arg(short, long = "option")]
        options: Vec<String>,

        /// Item base price, for immediate local totals
        #[arg(short, long)]
        price: Option<rust_decimal::Decimal>,

        /// Item title, for display before the server confirms
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Set a line's quantity (0 removes the line)
    Update {
        /// Server-assigned line ID
        line_id: String,
        quantity: u32,
    },
    /// Remove a line from the cart
    Remove {
        /// Server-assigned line ID
        line_id: String,
    },
    /// Clear the cart, or one vendor's lines
    Clear {
        /// Only clear this vendor's lines
        #[arg(short, long)]
        vendor: Option<String>,
    },
    /// Show the cart grouped by vendor
    Groups,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), savor_client::CartError> {
    match cli.command {
        Commands::Show => commands::cart::show().await?,
        Commands::Add {
            item_id,
            quantity,
            options,
            price,
            title,
        } => commands::cart::add(&item_id, quantity, &options, price, title).await?,
        Commands::Update { line_id, quantity } => {
            commands::cart::update(&line_id, quantity).await?;
        }
        Commands::Remove { line_id } => commands::cart::remove(&line_id).await?,
        Commands::Clear { vendor } => commands::cart::clear(vendor.as_deref()).await?,
        Commands::Groups => commands::cart::groups().await?,
    }
    Ok(())
}
