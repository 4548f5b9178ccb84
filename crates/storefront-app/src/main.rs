//! Storefront CLI - drive the storefront state engine from a terminal.
//!
//! Commands:
//! - `storefront products` - List products, optionally filtered by a search term
//! - `storefront product` - Show one product
//! - `storefront login` - Sign in and persist the session
//! - `storefront logout` - Sign out and purge the stored session
//! - `storefront whoami` - Show the restored session
//! - `storefront cart-demo` - Add products to a cart and show the badge count

mod commands;
mod output;
mod setup;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{CartDemoArgs, LoginArgs, ProductArgs, ProductsArgs};

/// Storefront - client-side state and cache engine
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products(ProductsArgs),

    /// Show one product
    Product(ProductArgs),

    /// Sign in
    Login(LoginArgs),

    /// Sign out
    Logout,

    /// Show the current session
    Whoami,

    /// Add products to a cart
    CartDemo(CartDemoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = output::Output::new(cli.json);

    let ctx = match setup::Setup::load(cli.config.as_deref(), output) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Products(args) => commands::products::list(args, &ctx).await,
        Commands::Product(args) => commands::products::show(args, &ctx).await,
        Commands::Login(args) => commands::session::login(args, &ctx).await,
        Commands::Logout => commands::session::logout(&ctx),
        Commands::Whoami => commands::session::whoami(&ctx),
        Commands::CartDemo(args) => commands::cart::demo(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
