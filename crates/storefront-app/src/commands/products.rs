//! Product listing commands.

use anyhow::{bail, Result};
use storefront_app::Intent;
use storefront_cache::CacheEntry;
use storefront_commerce::catalog::Product;

use super::{ProductArgs, ProductsArgs};
use crate::output::truncate;
use crate::setup::Setup;

/// Run the products command.
pub async fn list(args: ProductsArgs, ctx: &Setup) -> Result<()> {
    let entry = ctx.app.load_products().await?;
    settled_or_bail(&entry)?;

    if let Some(term) = args.search {
        ctx.app.dispatch(Intent::SetSearchTerm(term))?;
    }
    let Some(products) = ctx.app.product_view() else {
        bail!("Products could not be loaded. Please try again.");
    };

    if ctx.output.is_json() {
        ctx.output.json(products.as_ref());
        return Ok(());
    }

    let filter = ctx.app.filter();
    if filter.is_empty() {
        ctx.output.header("Products");
    } else {
        ctx.output.header(&format!("Products matching \"{}\"", filter.search_term));
    }
    if products.is_empty() {
        ctx.output.info("No products found.");
        return Ok(());
    }

    let widths = [4, 44, 10, 20];
    ctx.output.table_row(&["ID", "TITLE", "PRICE", "CATEGORY"], &widths);
    for product in products.iter() {
        ctx.output.table_row(
            &[
                product.id.to_string().as_str(),
                truncate(&product.title, widths[1]).as_str(),
                product.price.display().as_str(),
                product.category.as_str(),
            ],
            &widths,
        );
    }
    Ok(())
}

/// Run the product command.
pub async fn show(args: ProductArgs, ctx: &Setup) -> Result<()> {
    let entry = ctx.app.load_product(args.id).await?;
    settled_or_bail(&entry)?;
    let Some(product) = entry.value_as::<Product>() else {
        bail!("Product {} could not be loaded", args.id);
    };

    if ctx.output.is_json() {
        ctx.output.json(product.as_ref());
        return Ok(());
    }

    let rating = product.rating_or_default();
    ctx.output.header(&product.title);
    ctx.output.kv("Price", &product.price.display());
    ctx.output.kv("Category", &product.category);
    ctx.output.kv("Rating", &format!("{:.1} ({} reviews)", rating.rate, rating.count));
    if let Some(image) = &product.image {
        ctx.output.kv("Image", image);
    }
    if !product.description.is_empty() {
        println!("\n  {}", product.description);
    }
    Ok(())
}

fn settled_or_bail(entry: &CacheEntry) -> Result<()> {
    if let Some(error) = &entry.error {
        tracing::debug!(key = %entry.key, %error, "fetch failed");
        bail!("Something went wrong loading {}. Please try again.", entry.endpoint);
    }
    Ok(())
}
