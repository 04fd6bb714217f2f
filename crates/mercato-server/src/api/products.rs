//! Catalog search and product endpoints.
//!
//! `list_products` is the search pipeline: validate the raw query string,
//! compose the declarative filter, let the store page the candidates, then
//! apply the geo post-filter to the returned page. Storage failures and
//! validation failures both surface as typed [`ApiError`]s; nothing is
//! swallowed.

use axum::{
    extract::{Path, Query, State},
    http::Uri,
    Extension, Json,
};
use serde::Serialize;

use mercato_core::{Product, RawSearchParams, RawTopParams, SearchCriteria, TopQuery};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_per_page, ApiError, AppState, PageResponse};

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    product: Product,
    #[serde(rename = "similarProducts")]
    similar_products: Vec<Product>,
}

/// GET /api/v1/products — filtered, sorted, paginated catalog search with
/// optional geographic restriction.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    uri: Uri,
    Query(raw): Query<RawSearchParams>,
) -> Result<Json<PageResponse<Product>>, ApiError> {
    let criteria = SearchCriteria::parse(raw).map_err(ApiError::validation)?;
    let per_page = normalize_per_page(criteria.per_page, state.page_size);
    let filter = criteria.to_filter();

    let mut page = mercato_db::search_products(&state.pool, &filter, criteria.page, per_page)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    if let Some(geo) = criteria.geo_filter() {
        let fetched = page.items.len();
        page = geo.retain_nearby(page);
        tracing::debug!(
            request_id = %req_id.0,
            fetched,
            kept = page.items.len(),
            max_distance_km = geo.max_distance_km,
            "applied geo post-filter to current page"
        );
    }

    Ok(Json(PageResponse::new(page, &uri)))
}

/// GET /api/v1/products/{id} — product detail plus up to four products from
/// the same category.
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ProductDetail>, ApiError> {
    let product = mercato_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?
        .ok_or_else(|| ApiError::not_found("product not found"))?;

    let similar_products = mercato_db::similar_products(&state.pool, &product)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    Ok(Json(ProductDetail {
        product,
        similar_products,
    }))
}

/// GET /api/v1/products/top — products ranked descending by a closed metric
/// enum, optionally restricted to a product type.
pub(super) async fn top_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    uri: Uri,
    Query(raw): Query<RawTopParams>,
) -> Result<Json<PageResponse<Product>>, ApiError> {
    let query = TopQuery::parse(raw).map_err(ApiError::validation)?;
    let per_page = normalize_per_page(query.per_page, state.page_size);

    let page = mercato_db::top_products(&state.pool, &query, per_page)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    Ok(Json(PageResponse::new(page, &uri)))
}
