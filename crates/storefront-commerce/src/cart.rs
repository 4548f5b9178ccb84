//! Locally owned shopping cart.
//!
//! The cart never touches the remote cache. Lines are unique by product;
//! adding a product already in the cart bumps its quantity.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use storefront_core::{EventBus, Notification, Notifier, Subscription};

use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::{Currency, Money};

const ADDED_TITLE: &str = "Added to cart!";
const FAILED_TITLE: &str = "Oops...";
const FAILED_TEXT: &str = "Something went wrong while adding to cart";

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    pub image: Option<String>,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(i64::from(self.quantity))
    }
}

/// Published after every applied add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEvent {
    pub line: CartLine,
    /// Sum of quantities after the add.
    pub item_count: u64,
}

/// The cart container.
pub struct CartStore {
    lines: Mutex<Vec<CartLine>>,
    notifier: Arc<dyn Notifier>,
    events: EventBus<CartEvent>,
}

impl CartStore {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            notifier,
            events: EventBus::new(),
        }
    }

    /// Add one unit of a product.
    ///
    /// The toast is best-effort: a failing notifier never undoes the add.
    pub fn add(
        &self,
        product_id: ProductId,
        title: &str,
        unit_price: Money,
        image: Option<String>,
    ) -> Result<CartLine, CommerceError> {
        let (line, item_count) = {
            let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
            let line = match lines.iter_mut().find(|l| l.product_id == product_id) {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(1)
                        .ok_or_else(|| CommerceError::Overflow(product_id.to_string()))?;
                    existing.clone()
                }
                None => {
                    let line = CartLine {
                        product_id,
                        title: title.to_string(),
                        unit_price,
                        image,
                        quantity: 1,
                    };
                    lines.push(line.clone());
                    line
                }
            };
            (line, count(&lines))
        };

        tracing::debug!(product = %line.product_id, quantity = line.quantity, item_count, "added to cart");
        self.events.emit(&CartEvent {
            line: line.clone(),
            item_count,
        });
        self.announce(&line.title);
        Ok(line)
    }

    fn announce(&self, title: &str) {
        let added = Notification::success(ADDED_TITLE, format!("{title} has been added to your cart"));
        let Err(error) = self.notifier.notify(added) else {
            return;
        };
        tracing::warn!(%error, "cart notification failed");

        if let Err(error) = self.notifier.notify(Notification::error(FAILED_TITLE, FAILED_TEXT)) {
            tracing::warn!(%error, "cart error notification failed");
        }
    }

    /// Snapshot of the cart lines, in insertion order.
    pub fn lines(&self) -> Vec<CartLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Total quantity across lines, shown on the cart badge.
    pub fn item_count(&self) -> u64 {
        count(&self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> Money {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(CartLine::line_total)
            .fold(Money::zero(Currency::USD), |acc, total| {
                acc.try_add(&total).unwrap_or(acc)
            })
    }

    pub fn is_empty(&self) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Listen to every add.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines())
            .finish_non_exhaustive()
    }
}

fn count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|l| u64::from(l.quantity)).sum()
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use storefront_core::{ChannelNotifier, NotificationLevel, NotifyError};

    use super::*;

    struct BrokenNotifier {
        attempts: Mutex<Vec<NotificationLevel>>,
    }

    impl Notifier for BrokenNotifier {
        fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
            self.attempts.lock().unwrap().push(notification.level);
            Err(NotifyError::Unavailable("no toast host".to_string()))
        }
    }

    fn price(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    #[test]
    fn test_add_same_product_increments() {
        let (notifier, _rx) = ChannelNotifier::new();
        let cart = CartStore::new(Arc::new(notifier));

        cart.add(ProductId::new(1), "Red Shirt", price(1999), None).unwrap();
        let line = cart.add(ProductId::new(1), "Red Shirt", price(1999), None).unwrap();

        assert_eq!(line.quantity, 2);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_distinct_products_get_lines() {
        let (notifier, _rx) = ChannelNotifier::new();
        let cart = CartStore::new(Arc::new(notifier));

        cart.add(ProductId::new(1), "Red Shirt", price(1999), None).unwrap();
        cart.add(ProductId::new(2), "Blue Hat", price(500), Some("hat.jpg".to_string()))
            .unwrap();
        cart.add(ProductId::new(2), "Blue Hat", price(500), None).unwrap();

        let lines = cart.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, ProductId::new(1));
        assert_eq!(lines[1].image.as_deref(), Some("hat.jpg"));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), price(2999));
    }

    #[tokio::test]
    async fn test_success_toast() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let cart = CartStore::new(Arc::new(notifier));

        cart.add(ProductId::new(1), "Red Shirt", price(1999), None).unwrap();

        let toast = rx.next().await.unwrap();
        assert_eq!(toast.level, NotificationLevel::Success);
        assert_eq!(toast.title, "Added to cart!");
        assert_eq!(toast.text, "Red Shirt has been added to your cart");
    }

    #[test]
    fn test_broken_notifier_does_not_block_add() {
        let notifier = Arc::new(BrokenNotifier {
            attempts: Mutex::new(Vec::new()),
        });
        let cart = CartStore::new(notifier.clone());

        let line = cart.add(ProductId::new(9), "Mug", price(300), None).unwrap();
        assert_eq!(line.quantity, 1);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(
            *notifier.attempts.lock().unwrap(),
            vec![NotificationLevel::Success, NotificationLevel::Error]
        );
    }

    #[test]
    fn test_events() {
        let (notifier, _rx) = ChannelNotifier::new();
        let cart = CartStore::new(Arc::new(notifier));
        let counts = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let counts = Arc::clone(&counts);
            cart.subscribe(move |event| counts.lock().unwrap().push(event.item_count))
        };

        cart.add(ProductId::new(1), "Red Shirt", price(1999), None).unwrap();
        cart.add(ProductId::new(1), "Red Shirt", price(1999), None).unwrap();

        assert_eq!(*counts.lock().unwrap(), vec![1, 2]);
    }
}
