//! Catalog domain types shared by the storage and HTTP layers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Physical condition of a listed product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "product_condition", rename_all = "lowercase")]
pub enum Condition {
    New,
    Used,
    Na,
}

/// Listing visibility. Inactive products stay in storage but are owned by
/// the seller-facing collaborators, not by catalog search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub url: String,
    pub sort_order: i32,
    pub is_display: bool,
}

/// A catalog product with its images and category eagerly attached.
///
/// `rating` is maintained by the feedback collaborator and is either absent
/// or in `[0, 5]`. Coordinates are degrees; the store is trusted to hold
/// valid ranges (lat in [-90, 90], lng in [-180, 180]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub condition: Condition,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ProductStatus,
    pub category_id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub quantity: i32,
    pub sold: i32,
    pub views: i64,
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub images: Vec<ProductImage>,
    pub display_image: Option<ProductImage>,
    pub category: Option<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> Product {
        Product {
            id: 7,
            name: "Cocoa sack".to_string(),
            price: Decimal::new(12_50, 2),
            condition: Condition::Used,
            kind: "offer".to_string(),
            status: ProductStatus::Active,
            category_id: Some(3),
            latitude: 6.5244,
            longitude: 3.3792,
            country: Some("NG".to_string()),
            city: Some("Lagos".to_string()),
            quantity: 10,
            sold: 2,
            views: 41,
            rating: Some(4.5),
            created_at: Utc::now(),
            images: vec![],
            display_image: None,
            category: Some(Category {
                id: 3,
                name: "Produce".to_string(),
            }),
        }
    }

    #[test]
    fn product_serializes_kind_as_type() {
        let json = serde_json::to_value(sample()).expect("serialize product");
        assert_eq!(json["type"].as_str(), Some("offer"));
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn condition_uses_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_string(&Condition::Na).expect("serialize"),
            "\"na\""
        );
        assert_eq!(
            serde_json::to_string(&ProductStatus::Active).expect("serialize"),
            "\"active\""
        );
    }
}
