//! CLI command implementations.

pub mod cart;
pub mod products;
pub mod session;

use clap::Args;
use storefront_commerce::ProductId;

/// Arguments for the products command.
#[derive(Args)]
pub struct ProductsArgs {
    /// Case-insensitive search over title, description and category.
    #[arg(short, long)]
    pub search: Option<String>,
}

/// Arguments for the product command.
#[derive(Args)]
pub struct ProductArgs {
    /// Product id.
    pub id: ProductId,
}

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,

    #[arg(short, long)]
    pub password: String,
}

/// Arguments for the cart-demo command.
#[derive(Args)]
pub struct CartDemoArgs {
    /// Product ids to add, in order. Repeats increase the quantity.
    #[arg(required = true)]
    pub ids: Vec<ProductId>,
}
