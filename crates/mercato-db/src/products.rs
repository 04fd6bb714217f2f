//! Repository gateway for catalog products.
//!
//! Executes composed [`ProductFilter`] specifications against Postgres and
//! returns one page of candidates plus the total match count. Filters are
//! expressed as null-tolerant predicates so a single prepared statement
//! covers every combination of optional criteria. ORDER BY clauses come
//! from a match over the closed sort enums; caller-supplied strings never
//! reach the query text.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;

use mercato_core::{
    Category, Condition, Page, Product, ProductFilter, ProductImage, ProductStatus, SortKey,
    TopMetric, TopQuery,
};

use crate::DbError;

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.price, p.condition, p.type AS kind, p.status, \
     p.category_id, p.latitude, p.longitude, p.country, p.city, \
     p.quantity, p.sold, p.views, p.rating, p.created_at, \
     c.name AS category_name";

const SEARCH_PREDICATES: &str = "($1::TEXT IS NULL OR p.country = $1) \
     AND ($2::TEXT IS NULL OR p.name ILIKE '%' || $2 || '%') \
     AND ($3::BIGINT IS NULL OR p.category_id = $3) \
     AND ($4::NUMERIC IS NULL OR p.price >= $4) \
     AND ($5::NUMERIC IS NULL OR p.price <= $5) \
     AND ($6::TEXT IS NULL OR p.type = $6)";

/// Flat product row before images are attached.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: Decimal,
    condition: Condition,
    kind: String,
    status: ProductStatus,
    category_id: Option<i64>,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    city: Option<String>,
    quantity: i32,
    sold: i32,
    views: i64,
    rating: Option<f64>,
    created_at: chrono::DateTime<chrono::Utc>,
    category_name: Option<String>,
}

/// All ties break on insertion id so pagination is stable across requests.
fn order_clause(sort: SortKey) -> &'static str {
    match sort {
        SortKey::PriceLowest => "p.price ASC, p.id ASC",
        SortKey::PriceHighest => "p.price DESC, p.id ASC",
        SortKey::Ratings => "p.rating DESC NULLS LAST, p.id ASC",
        SortKey::Views => "p.views DESC, p.id ASC",
        SortKey::CreatedAt => "p.created_at DESC, p.id ASC",
    }
}

fn metric_clause(metric: TopMetric) -> &'static str {
    match metric {
        TopMetric::Sold => "p.sold DESC, p.id ASC",
        TopMetric::Views => "p.views DESC, p.id ASC",
        TopMetric::Ratings => "p.rating DESC NULLS LAST, p.id ASC",
        TopMetric::Quantity => "p.quantity DESC, p.id ASC",
        TopMetric::CreatedAt => "p.created_at DESC, p.id ASC",
    }
}

/// Executes a composed filter: one page of products (images, display image
/// and category eagerly attached) plus the total count across all pages.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails; pool-level failures
/// classify as storage-unavailable via [`DbError::is_unavailable`].
pub async fn search_products(
    pool: &PgPool,
    filter: &ProductFilter,
    page: u32,
    per_page: u32,
) -> Result<Page<Product>, DbError> {
    let order = order_clause(filter.sort);
    let select = format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         LEFT JOIN categories c ON c.id = p.category_id \
         WHERE {SEARCH_PREDICATES} \
         ORDER BY {order} \
         LIMIT $7 OFFSET $8"
    );

    let limit = i64::from(per_page);
    let offset = i64::from(page.saturating_sub(1)) * limit;

    let rows = sqlx::query_as::<_, ProductRow>(&select)
        .bind(filter.country.as_deref())
        .bind(filter.term.as_deref())
        .bind(filter.category_id)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.kind.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count = format!("SELECT COUNT(*) FROM products p WHERE {SEARCH_PREDICATES}");
    let total: i64 = sqlx::query_scalar(&count)
        .bind(filter.country.as_deref())
        .bind(filter.term.as_deref())
        .bind(filter.category_id)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.kind.as_deref())
        .fetch_one(pool)
        .await?;

    let items = attach_images(pool, rows).await?;

    Ok(Page {
        items,
        current_page: page,
        per_page,
        total: u64::try_from(total).unwrap_or(0),
    })
}

/// Fetches one product with its images and category, or `None` if the id is
/// unknown.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<Product>, DbError> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         LEFT JOIN categories c ON c.id = p.category_id \
         WHERE p.id = $1"
    );
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut items = attach_images(pool, vec![row]).await?;
    Ok(items.pop())
}

/// Up to four products from the same category, excluding the product itself.
/// Products without a category have no similar listing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn similar_products(pool: &PgPool, product: &Product) -> Result<Vec<Product>, DbError> {
    let Some(category_id) = product.category_id else {
        return Ok(Vec::new());
    };

    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         LEFT JOIN categories c ON c.id = p.category_id \
         WHERE p.category_id = $1 AND p.id <> $2 \
         ORDER BY p.created_at DESC, p.id ASC \
         LIMIT 4"
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(category_id)
        .bind(product.id)
        .fetch_all(pool)
        .await?;

    attach_images(pool, rows).await
}

/// One page of products ranked descending by the requested metric,
/// optionally restricted to a product type.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn top_products(
    pool: &PgPool,
    query: &TopQuery,
    per_page: u32,
) -> Result<Page<Product>, DbError> {
    let order = metric_clause(query.metric);
    let select = format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         LEFT JOIN categories c ON c.id = p.category_id \
         WHERE ($1::TEXT IS NULL OR p.type = $1) \
         ORDER BY {order} \
         LIMIT $2 OFFSET $3"
    );

    let limit = i64::from(per_page);
    let offset = i64::from(query.page.saturating_sub(1)) * limit;

    let rows = sqlx::query_as::<_, ProductRow>(&select)
        .bind(query.kind.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products p WHERE ($1::TEXT IS NULL OR p.type = $1)")
            .bind(query.kind.as_deref())
            .fetch_one(pool)
            .await?;

    let items = attach_images(pool, rows).await?;

    Ok(Page {
        items,
        current_page: query.page,
        per_page,
        total: u64::try_from(total).unwrap_or(0),
    })
}

/// Eager-loads images for the given rows and assembles domain products,
/// preserving row order.
async fn attach_images(pool: &PgPool, rows: Vec<ProductRow>) -> Result<Vec<Product>, DbError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT id, product_id, url, sort_order, is_display \
         FROM product_images \
         WHERE product_id = ANY($1) \
         ORDER BY product_id, sort_order, id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_product: HashMap<i64, Vec<ProductImage>> = HashMap::new();
    for image in images {
        by_product.entry(image.product_id).or_default().push(image);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let images = by_product.remove(&row.id).unwrap_or_default();
            let display_image = images.iter().find(|i| i.is_display).cloned();
            let category = match (row.category_id, row.category_name) {
                (Some(id), Some(name)) => Some(Category { id, name }),
                _ => None,
            };
            Product {
                id: row.id,
                name: row.name,
                price: row.price,
                condition: row.condition,
                kind: row.kind,
                status: row.status,
                category_id: row.category_id,
                latitude: row.latitude,
                longitude: row.longitude,
                country: row.country,
                city: row.city,
                quantity: row.quantity,
                sold: row.sold,
                views: row.views,
                rating: row.rating,
                created_at: row.created_at,
                images,
                display_image,
                category,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_order_clause_breaks_ties_on_id() {
        for sort in [
            SortKey::PriceLowest,
            SortKey::PriceHighest,
            SortKey::Ratings,
            SortKey::Views,
            SortKey::CreatedAt,
        ] {
            assert!(order_clause(sort).ends_with("p.id ASC"), "sort {sort:?}");
        }
        for metric in [
            TopMetric::Sold,
            TopMetric::Views,
            TopMetric::Ratings,
            TopMetric::Quantity,
            TopMetric::CreatedAt,
        ] {
            assert!(
                metric_clause(metric).ends_with("p.id ASC"),
                "metric {metric:?}"
            );
        }
    }
}
