//! Request parameters → validated search criteria → declarative filter.
//!
//! Everything here is pure: parsing either yields a [`SearchCriteria`] or a
//! field-level [`ValidationErrors`] list, and composing a [`ProductFilter`]
//! from criteria never performs I/O and never fails.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::GeoFilter;

/// Closed set of sortable orderings. Caller-supplied sort strings are parsed
/// into this enum and never reach the storage query as raw text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    PriceLowest,
    PriceHighest,
    Ratings,
    Views,
    #[default]
    CreatedAt,
}

impl SortKey {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "price_lowest" => Some(Self::PriceLowest),
            "price_highest" => Some(Self::PriceHighest),
            "ratings" => Some(Self::Ratings),
            "views" => Some(Self::Views),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

/// Closed set of ranking metrics for the top-products listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopMetric {
    #[default]
    Sold,
    Views,
    Ratings,
    Quantity,
    CreatedAt,
}

impl TopMetric {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "sold" => Some(Self::Sold),
            "views" => Some(Self::Views),
            "ratings" => Some(Self::Ratings),
            "quantity" => Some(Self::Quantity),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

/// One rejected request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All parameter rejections for a request, gathered before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{} invalid request parameter(s)", .0.len())]
pub struct ValidationErrors(pub Vec<FieldError>);

/// Untrusted catalog-search query string, exactly as received.
///
/// Every field is an optional string so that malformed values surface as 422
/// validation errors instead of extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchParams {
    pub country: Option<String>,
    #[serde(rename = "searchTerm")]
    pub search_term: Option<String>,
    pub category_id: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sort: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub distance: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Untrusted top-products query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTopParams {
    pub metric: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Validated, request-scoped search input. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub country: Option<String>,
    pub term: Option<String>,
    pub category_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub kind: Option<String>,
    pub sort: SortKey,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_km: Option<f64>,
    pub page: u32,
    pub per_page: Option<u32>,
}

/// Storage-executable filter/sort specification composed from criteria.
///
/// The distance restriction deliberately stays out of this type: the store
/// has no distance predicate, so proximity is applied per page afterwards
/// via [`GeoFilter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub country: Option<String>,
    pub term: Option<String>,
    pub category_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub kind: Option<String>,
    pub sort: SortKey,
}

/// Validated top-products input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopQuery {
    pub metric: TopMetric,
    pub kind: Option<String>,
    pub page: u32,
    pub per_page: Option<u32>,
}

impl SearchCriteria {
    /// Parses and validates raw request parameters.
    ///
    /// Blank strings count as absent. All invalid parameters are reported
    /// together rather than stopping at the first.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] naming every rejected field.
    pub fn parse(raw: RawSearchParams) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();

        let category_id = parse_opt(&mut errors, "category_id", raw.category_id, parse_i64);
        let min_price = parse_opt(&mut errors, "minPrice", raw.min_price, parse_decimal);
        let max_price = parse_opt(&mut errors, "maxPrice", raw.max_price, parse_decimal);
        let latitude = parse_opt(&mut errors, "lat", raw.lat, parse_f64);
        let longitude = parse_opt(&mut errors, "lng", raw.lng, parse_f64);
        let distance_km = parse_opt(&mut errors, "distance", raw.distance, parse_f64);
        let page = parse_opt(&mut errors, "page", raw.page, parse_u32);
        let per_page = parse_opt(&mut errors, "per_page", raw.per_page, parse_u32);

        if let Some(lat) = latitude {
            if !(-90.0..=90.0).contains(&lat) {
                push(&mut errors, "lat", "must be between -90 and 90 degrees");
            }
        }
        if let Some(lng) = longitude {
            if !(-180.0..=180.0).contains(&lng) {
                push(&mut errors, "lng", "must be between -180 and 180 degrees");
            }
        }
        if let Some(d) = distance_km {
            if d <= 0.0 {
                push(&mut errors, "distance", "must be a positive number of kilometers");
            }
        }
        if page == Some(0) {
            push(&mut errors, "page", "must be at least 1");
        }
        if per_page == Some(0) {
            push(&mut errors, "per_page", "must be at least 1");
        }

        let sort = match non_blank(raw.sort) {
            Some(value) => match SortKey::parse(&value) {
                Some(key) => key,
                None => {
                    push(&mut errors, "sort", "unknown sort key");
                    SortKey::default()
                }
            },
            None => SortKey::default(),
        };

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(Self {
            country: non_blank(raw.country),
            term: non_blank(raw.search_term),
            category_id,
            min_price,
            max_price,
            kind: non_blank(raw.kind),
            sort,
            latitude,
            longitude,
            distance_km,
            page: page.unwrap_or(1),
            per_page,
        })
    }

    /// Composes the storage-executable specification. Never fails.
    #[must_use]
    pub fn to_filter(&self) -> ProductFilter {
        ProductFilter {
            country: self.country.clone(),
            term: self.term.clone(),
            category_id: self.category_id,
            min_price: self.min_price,
            max_price: self.max_price,
            kind: self.kind.clone(),
            sort: self.sort,
        }
    }

    /// The proximity post-filter, present only when the requester supplied
    /// all of latitude, longitude and distance. With any of the three
    /// absent, geo filtering is skipped entirely.
    #[must_use]
    pub fn geo_filter(&self) -> Option<GeoFilter> {
        match (self.latitude, self.longitude, self.distance_km) {
            (Some(latitude), Some(longitude), Some(max_distance_km)) => Some(GeoFilter {
                latitude,
                longitude,
                max_distance_km,
                country: self.country.clone(),
            }),
            _ => None,
        }
    }
}

impl TopQuery {
    /// Parses and validates raw top-products parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] naming every rejected field.
    pub fn parse(raw: RawTopParams) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();

        let metric = match non_blank(raw.metric) {
            Some(value) => match TopMetric::parse(&value) {
                Some(metric) => metric,
                None => {
                    push(&mut errors, "metric", "unknown ranking metric");
                    TopMetric::default()
                }
            },
            None => TopMetric::default(),
        };

        let page = parse_opt(&mut errors, "page", raw.page, parse_u32);
        let per_page = parse_opt(&mut errors, "per_page", raw.per_page, parse_u32);
        if page == Some(0) {
            push(&mut errors, "page", "must be at least 1");
        }
        if per_page == Some(0) {
            push(&mut errors, "per_page", "must be at least 1");
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(Self {
            metric,
            kind: non_blank(raw.kind),
            page: page.unwrap_or(1),
            per_page,
        })
    }
}

fn push(errors: &mut Vec<FieldError>, field: &'static str, message: &str) {
    errors.push(FieldError {
        field,
        message: message.to_string(),
    });
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_opt<T>(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<String>,
    parse: fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = non_blank(value)?;
    match parse(&raw) {
        Some(parsed) => Some(parsed),
        None => {
            push(errors, field, "must be a number");
            None
        }
    }
}

fn parse_i64(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn parse_u32(raw: &str) -> Option<u32> {
    raw.parse().ok()
}

fn parse_f64(raw: &str) -> Option<f64> {
    raw.parse().ok().filter(|v: &f64| v.is_finite())
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    raw.parse().ok()
}
