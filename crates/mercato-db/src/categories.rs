//! Read-only category listing used to populate filter UIs and to validate
//! category references.

use sqlx::PgPool;

use mercato_core::Category;

use crate::DbError;

/// Returns every category, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, DbError> {
    let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
