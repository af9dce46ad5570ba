//! Session queries.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::format::{SessionRow, SessionUserRow, serialize_timestamp};
use crate::models::{Session, SessionUpdate, User};

/// Create a session for an existing user.
pub async fn create_session(
    pool: &SqlitePool,
    session_token: &str,
    user_id: &str,
    expires: DateTime<Utc>,
) -> StoreResult<Session> {
    let id = Uuid::new_v4().to_string();
    let expires = serialize_timestamp("expires", expires)?;

    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        INSERT INTO sessions (id, session_token, user_id, expires)
        VALUES (?, ?, ?, ?)
        RETURNING id, session_token, user_id, expires
        "#,
    )
    .bind(&id)
    .bind(session_token)
    .bind(user_id)
    .bind(expires)
    .fetch_one(pool)
    .await?;

    debug!("Created session {} for user {}", id, user_id);
    row.into_session()
}

/// Get a session together with its owning user, in one query.
pub async fn get_session_and_user(
    pool: &SqlitePool,
    session_token: &str,
) -> StoreResult<Option<(User, Session)>> {
    let row = sqlx::query_as::<_, SessionUserRow>(
        r#"
        SELECT
            s.id,
            s.session_token,
            s.user_id,
            s.expires,
            u.name AS user_name,
            u.email AS user_email,
            u.email_verified AS user_email_verified,
            u.image AS user_image
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.session_token = ?
        "#,
    )
    .bind(session_token)
    .fetch_optional(pool)
    .await?;

    row.map(SessionUserRow::split).transpose()
}

/// Apply a partial update to a session.
///
/// Returns `None` if no session has this token.
pub async fn update_session(
    pool: &SqlitePool,
    update: SessionUpdate,
) -> StoreResult<Option<Session>> {
    let mut query = QueryBuilder::<Sqlite>::new("UPDATE sessions SET id = id");

    if let Some(user_id) = update.user_id {
        query.push(", user_id = ");
        query.push_bind(user_id);
    }
    if let Some(expires) = update.expires {
        query.push(", expires = ");
        query.push_bind(serialize_timestamp("expires", expires)?);
    }

    query.push(" WHERE session_token = ");
    query.push_bind(update.session_token);
    query.push(" RETURNING id, session_token, user_id, expires");

    let row = query
        .build_query_as::<SessionRow>()
        .fetch_optional(pool)
        .await?;

    row.map(SessionRow::into_session).transpose()
}

/// Delete a session by token. Deleting an absent session is not an error.
pub async fn delete_session(pool: &SqlitePool, session_token: &str) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM sessions WHERE session_token = ?")
        .bind(session_token)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        debug!("Deleted session");
    }
    Ok(())
}
