//! Visitor counter queries.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::MessDb;
use crate::error::StoreResult;
use crate::format::serialize_timestamp;

/// Count one more visit and return the new total.
///
/// A single upsert, so concurrent visits are never lost.
pub async fn increment_visitor_count(pool: &SqlitePool) -> StoreResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO visitor_count (id, "count", last_updated)
        VALUES (1, 1, ?)
        ON CONFLICT (id) DO UPDATE SET
            "count" = visitor_count."count" + 1,
            last_updated = excluded.last_updated
        RETURNING "count"
        "#,
    )
    .bind(serialize_timestamp("last_updated", Utc::now())?)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Current visit total; zero before the first visit.
pub async fn visitor_count(pool: &SqlitePool) -> StoreResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(r#"SELECT "count" FROM visitor_count WHERE id = 1"#)
        .fetch_optional(pool)
        .await?;

    Ok(count.unwrap_or(0))
}

impl MessDb {
    /// Count one more site visit and return the new total.
    pub async fn increment_visitor_count(&self) -> StoreResult<i64> {
        increment_visitor_count(self.pool()).await
    }

    /// Current site visit total.
    pub async fn visitor_count(&self) -> StoreResult<i64> {
        visitor_count(self.pool()).await
    }
}
