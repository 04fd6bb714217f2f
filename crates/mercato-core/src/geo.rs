//! Great-circle distance math and the per-page proximity filter.

use crate::page::Page;
use crate::product::Product;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two (lat, lng) pairs in degrees.
///
/// Pure and symmetric. NaN inputs propagate as NaN; callers validate
/// coordinates before invoking.
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Proximity restriction applied to an already-paginated result page.
///
/// Distance cannot be pushed into the storage query, so the filter runs over
/// the current page's items only. Survivors keep their source order and the
/// page keeps the gateway's `total`/`per_page`/`current_page` metadata, which
/// therefore describe the unfiltered result set. A page may legitimately
/// come back short (or empty) without being the last page.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFilter {
    pub latitude: f64,
    pub longitude: f64,
    pub max_distance_km: f64,
    pub country: Option<String>,
}

impl GeoFilter {
    /// True when `product` is in the requester's country and within range.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        product.country.as_deref() == self.country.as_deref()
            && haversine_km(
                self.latitude,
                self.longitude,
                product.latitude,
                product.longitude,
            ) <= self.max_distance_km
    }

    /// Drops out-of-range items from the page, preserving pagination metadata.
    #[must_use]
    pub fn retain_nearby(&self, mut page: Page<Product>) -> Page<Product> {
        page.items.retain(|product| self.matches(product));
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Condition, ProductStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn product_at(id: i64, lat: f64, lng: f64, country: &str) -> Product {
        Product {
            id,
            name: format!("product-{id}"),
            price: Decimal::new(100, 0),
            condition: Condition::Na,
            kind: "offer".to_string(),
            status: ProductStatus::Active,
            category_id: None,
            latitude: lat,
            longitude: lng,
            country: Some(country.to_string()),
            city: None,
            quantity: 1,
            sold: 0,
            views: 0,
            rating: None,
            created_at: Utc::now(),
            images: vec![],
            display_image: None,
            category: None,
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert!(haversine_km(6.5244, 3.3792, 6.5244, 3.3792).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = haversine_km(6.5244, 3.3792, 9.0765, 7.3986);
        let ba = haversine_km(9.0765, 7.3986, 6.5244, 3.3792);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.05, "got {d}");
    }

    #[test]
    fn nan_coordinates_propagate() {
        assert!(haversine_km(f64::NAN, 0.0, 0.0, 0.0).is_nan());
    }

    #[test]
    fn retain_nearby_keeps_order_and_metadata() {
        let filter = GeoFilter {
            latitude: 0.0,
            longitude: 0.0,
            max_distance_km: 20.0,
            country: Some("NG".to_string()),
        };
        // ~2km, ~15km, ~40km north of the requester.
        let page = Page {
            items: vec![
                product_at(1, 0.017_99, 0.0, "NG"),
                product_at(2, 0.134_90, 0.0, "NG"),
                product_at(3, 0.359_73, 0.0, "NG"),
            ],
            current_page: 1,
            per_page: 15,
            total: 3,
        };

        let filtered = filter.retain_nearby(page);
        let ids: Vec<i64> = filtered.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(filtered.total, 3, "total stays the gateway's value");
        assert_eq!(filtered.per_page, 15);
        assert_eq!(filtered.current_page, 1);
    }

    #[test]
    fn retain_nearby_drops_foreign_country_even_when_close() {
        let filter = GeoFilter {
            latitude: 0.0,
            longitude: 0.0,
            max_distance_km: 20.0,
            country: Some("NG".to_string()),
        };
        let page = Page {
            items: vec![product_at(1, 0.01, 0.0, "GH")],
            current_page: 1,
            per_page: 15,
            total: 1,
        };

        assert!(filter.retain_nearby(page).items.is_empty());
    }
}
