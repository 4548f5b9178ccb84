//! Storefront domain types and client-side state.
//!
//! - **Catalog**: Products and the product endpoints
//! - **Search**: Filter state and memoized derived views
//! - **Cart**: Locally owned cart with toast notifications
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_commerce::prelude::*;
//!
//! let view = DerivedView::<Product>::new();
//! let filter = FilterState::new("shirt");
//! let visible = view.get(&products, &filter);
//!
//! let cart = CartStore::new(notifier);
//! cart.add(product.id, &product.title, product.price, product.image.clone())?;
//! println!("{} items", cart.item_count());
//! ```

pub mod cart;
pub mod catalog;
pub mod error;
pub mod ids;
pub mod money;
pub mod search;

pub use error::CommerceError;
pub use ids::ProductId;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::ProductId;
    pub use crate::money::{Currency, Money};

    pub use crate::cart::{CartEvent, CartLine, CartStore};
    pub use crate::catalog::{Product, Rating};
    pub use crate::search::{DerivedView, FilterState, Searchable};
}
