//! Products and the catalog endpoints.

use serde::{Deserialize, Serialize};
use storefront_cache::{Endpoint, JsonTransform, ResourceRequest};

use crate::ids::ProductId;
use crate::money::{usd_decimal, Money};
use crate::search::Searchable;

/// Query for the full product list.
pub const GET_ALL_PRODUCTS: &str = "getAllProducts";

/// Query for one product by id.
pub const GET_PRODUCT_BY_ID: &str = "getProductById";

/// Tag provided by the product list.
pub const PRODUCTS_TAG: &str = "Products";

/// Rating shown for products the catalog has no rating for.
pub const DEFAULT_RATING: Rating = Rating {
    rate: 4.2,
    count: 156,
};

/// Customer rating summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u32,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "usd_decimal")]
    pub price: Money,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

impl Product {
    pub fn rating_or_default(&self) -> Rating {
        self.rating.unwrap_or(DEFAULT_RATING)
    }
}

impl Searchable for Product {
    fn search_fields(&self) -> [&str; 3] {
        [self.title.as_str(), self.description.as_str(), self.category.as_str()]
    }
}

/// Catalog endpoints to register on the cache.
pub fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::query(GET_ALL_PRODUCTS, "/products")
            .provides(PRODUCTS_TAG)
            .transform(JsonTransform::<Vec<Product>>::new(1)),
        Endpoint::query(GET_PRODUCT_BY_ID, "/products/{id}")
            .transform(JsonTransform::<Product>::new(1)),
    ]
}

pub fn all_products() -> ResourceRequest {
    ResourceRequest::new(GET_ALL_PRODUCTS)
}

pub fn product_by_id(id: ProductId) -> ResourceRequest {
    ResourceRequest::new(GET_PRODUCT_BY_ID).param("id", id)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_deserialize_catalog_product() {
        let product: Product = serde_json::from_value(json!({
            "id": 1,
            "title": "Fjallraven - Foldsack No. 1 Backpack, Fits 15 Laptops",
            "price": 109.95,
            "description": "Your perfect pack for everyday use",
            "category": "men's clothing",
            "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg",
            "rating": { "rate": 3.9, "count": 120 }
        }))
        .unwrap();

        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.price, Money::new(10995, Currency::USD));
        assert_eq!(product.rating_or_default().count, 120);
    }

    #[test]
    fn test_rating_default() {
        let product: Product =
            serde_json::from_value(json!({ "id": 2, "title": "Mug", "price": 5 })).unwrap();
        assert_eq!(product.rating_or_default(), DEFAULT_RATING);
        assert!(product.image.is_none());
    }

    #[test]
    fn test_product_request_key() {
        assert_eq!(
            product_by_id(ProductId::new(5)).key().as_str(),
            r#"getProductById({"id":"5"})"#
        );
        assert_eq!(all_products().key().as_str(), "getAllProducts()");
    }

    #[test]
    fn test_endpoints() {
        let endpoints = endpoints();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].provided_tags()[0].as_str(), PRODUCTS_TAG);
        assert!(endpoints[1].provided_tags().is_empty());
        assert_eq!(endpoints[1].path_params().collect::<Vec<_>>(), vec!["id"]);
    }
}
