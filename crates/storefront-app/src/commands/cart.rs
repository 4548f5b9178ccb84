//! Cart demo command.

use anyhow::{Context as _, Result};
use storefront_commerce::catalog::Product;

use super::CartDemoArgs;
use crate::setup::Setup;

/// Run the cart-demo command.
pub async fn demo(args: CartDemoArgs, ctx: &Setup) -> Result<()> {
    for id in args.ids {
        let entry = ctx.app.load_product(id).await?;
        let product = match (entry.value_as::<Product>(), &entry.error) {
            (Some(product), None) => product,
            (_, error) => {
                let reason = error.as_ref().map(ToString::to_string).unwrap_or_default();
                ctx.output.warn(&format!("Skipping product {id}: {reason}"));
                continue;
            }
        };
        ctx.app
            .add_to_cart(&product)
            .with_context(|| format!("Failed to add product {id}"))?;
    }

    let cart = ctx.app.cart();
    if ctx.output.is_json() {
        ctx.output.json(&cart.lines());
        return Ok(());
    }

    ctx.output.header(&format!("Cart ({})", cart.item_count()));
    let widths = [4, 40, 4, 10];
    ctx.output.table_row(&["ID", "TITLE", "QTY", "TOTAL"], &widths);
    for line in cart.lines() {
        ctx.output.table_row(
            &[
                line.product_id.to_string().as_str(),
                crate::output::truncate(&line.title, widths[1]).as_str(),
                line.quantity.to_string().as_str(),
                line.line_total().display().as_str(),
            ],
            &widths,
        );
    }
    ctx.output.kv("Subtotal", &cart.subtotal().display());
    Ok(())
}
