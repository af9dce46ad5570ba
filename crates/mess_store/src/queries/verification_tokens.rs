//! Verification token queries.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreResult;
use crate::format::{VerificationTokenRow, serialize_timestamp};
use crate::models::VerificationToken;

/// Store a new verification token.
///
/// Fails with a unique violation if the `(identifier, token)` pair exists.
pub async fn create_verification_token(
    pool: &SqlitePool,
    token: VerificationToken,
) -> StoreResult<VerificationToken> {
    let expires = serialize_timestamp("expires", token.expires)?;

    let row = sqlx::query_as::<_, VerificationTokenRow>(
        r#"
        INSERT INTO verification_tokens (identifier, token, expires)
        VALUES (?, ?, ?)
        RETURNING id, identifier, token, expires
        "#,
    )
    .bind(token.identifier)
    .bind(token.token)
    .bind(expires)
    .fetch_one(pool)
    .await?;

    debug!("Created verification token for {}", row.identifier);
    row.into_token()
}

/// Consume a verification token.
///
/// Deletes and returns the row in a single statement, so of several callers
/// racing on the same token at most one gets `Some`.
pub async fn use_verification_token(
    pool: &SqlitePool,
    identifier: &str,
    token: &str,
) -> StoreResult<Option<VerificationToken>> {
    let row = sqlx::query_as::<_, VerificationTokenRow>(
        r#"
        DELETE FROM verification_tokens
        WHERE identifier = ? AND token = ?
        RETURNING id, identifier, token, expires
        "#,
    )
    .bind(identifier)
    .bind(token)
    .fetch_optional(pool)
    .await?;

    if row.is_some() {
        debug!("Consumed verification token for {}", identifier);
    }
    row.map(VerificationTokenRow::into_token).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MessDb;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn magic_link() -> VerificationToken {
        VerificationToken {
            identifier: "diner@example.com".to_string(),
            token: "3f9c1e".to_string(),
            expires: Utc.timestamp_opt(1_900_000_000, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_token_single_use() {
        let db = MessDb::open_in_memory().await.unwrap();

        let created = create_verification_token(db.pool(), magic_link())
            .await
            .unwrap();
        assert_eq!(created, magic_link());

        let used = use_verification_token(db.pool(), "diner@example.com", "3f9c1e")
            .await
            .unwrap();
        assert_eq!(used, Some(magic_link()));

        for _ in 0..3 {
            let again = use_verification_token(db.pool(), "diner@example.com", "3f9c1e")
                .await
                .unwrap();
            assert!(again.is_none());
        }
    }

    #[tokio::test]
    async fn test_token_must_match_identifier() {
        let db = MessDb::open_in_memory().await.unwrap();
        create_verification_token(db.pool(), magic_link())
            .await
            .unwrap();

        let wrong = use_verification_token(db.pool(), "other@example.com", "3f9c1e")
            .await
            .unwrap();
        assert!(wrong.is_none());

        // The mismatched attempt did not consume it
        assert!(use_verification_token(db.pool(), "diner@example.com", "3f9c1e")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_duplicate_token_rejected() {
        let db = MessDb::open_in_memory().await.unwrap();
        create_verification_token(db.pool(), magic_link())
            .await
            .unwrap();
        let err = create_verification_token(db.pool(), magic_link())
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }
}
