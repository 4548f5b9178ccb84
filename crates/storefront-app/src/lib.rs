//! Storefront application root.
//!
//! [`AppContext`] is built once by the front end and owns every container:
//! the resource cache, the session, the cart and the search filter. UI code
//! sends [`Intent`]s through [`AppContext::dispatch`] and listens to the
//! merged [`StateEvent`] stream.
//!
//! # Example
//!
//! ```rust,ignore
//! let ctx = AppContext::builder(remote, storage).build()?;
//! ctx.hydrate();
//!
//! ctx.load_products().await?;
//! ctx.dispatch(Intent::SetSearchTerm("shirt".into()))?;
//! let visible = ctx.product_view();
//! ```

mod context;
mod error;
mod event;
mod filter;
mod intent;

pub use context::{AppContext, AppContextBuilder};
pub use error::{AppError, LoginError};
pub use event::StateEvent;
pub use filter::FilterStore;
pub use intent::Intent;
