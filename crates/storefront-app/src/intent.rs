//! Intents the UI dispatches into the context.

use storefront_auth::User;
use storefront_cache::{ResourceRequest, Tag};
use storefront_commerce::{Money, ProductId};

/// A request to change state.
///
/// Every container mutation goes through one of these; consumers never
/// touch a session or cache entry directly.
#[derive(Debug, Clone)]
pub enum Intent {
    LoginStart,
    LoginSuccess { token: String, user: User },
    LoginFailure,
    Logout,
    SetUser(User),
    SetSearchTerm(String),
    ClearSearchTerm,
    CartAdd {
        product_id: ProductId,
        title: String,
        unit_price: Money,
        image: Option<String>,
    },
    /// Start (or join) a query fetch. The result arrives as cache events.
    Fetch(ResourceRequest),
    Invalidate(Tag),
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::LoginStart => "loginStart",
            Intent::LoginSuccess { .. } => "loginSuccess",
            Intent::LoginFailure => "loginFailure",
            Intent::Logout => "logout",
            Intent::SetUser(_) => "setUser",
            Intent::SetSearchTerm(_) => "setSearchTerm",
            Intent::ClearSearchTerm => "clearSearchTerm",
            Intent::CartAdd { .. } => "cartAdd",
            Intent::Fetch(_) => "fetch",
            Intent::Invalidate(_) => "invalidate",
        }
    }
}
