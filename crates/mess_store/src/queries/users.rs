//! User queries.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::format::{UserRow, serialize_timestamp};
use crate::models::{NewUser, User, UserUpdate};

/// Insert a new user, generating an id unless the caller supplied one.
///
/// Fails with a unique violation if the email is already taken.
pub async fn create_user(pool: &SqlitePool, user: NewUser) -> StoreResult<User> {
    let id = user.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let email_verified = user
        .email_verified
        .map(|ts| serialize_timestamp("email_verified", ts))
        .transpose()?;

    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, name, email, email_verified, image)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, name, email, email_verified, image
        "#,
    )
    .bind(&id)
    .bind(user.name)
    .bind(user.email)
    .bind(email_verified)
    .bind(user.image)
    .fetch_one(pool)
    .await?;

    debug!("Created user {}", id);
    row.into_user()
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> StoreResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, email_verified, image FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::into_user).transpose()
}

/// Get a user by email address.
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> StoreResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, email_verified, image FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::into_user).transpose()
}

/// Get the user linked to a provider account.
pub async fn get_user_by_account(
    pool: &SqlitePool,
    provider_account_id: &str,
    provider: &str,
) -> StoreResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT u.id, u.name, u.email, u.email_verified, u.image
        FROM accounts a
        JOIN users u ON u.id = a.user_id
        WHERE a.provider = ? AND a.provider_account_id = ?
        "#,
    )
    .bind(provider)
    .bind(provider_account_id)
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::into_user).transpose()
}

/// Apply a partial update and return the stored user.
///
/// Fails with [`StoreError::NotFound`] if no user has this id.
pub async fn update_user(pool: &SqlitePool, update: UserUpdate) -> StoreResult<User> {
    // `id = id` keeps the statement valid when no field is set
    let mut query = QueryBuilder::<Sqlite>::new("UPDATE users SET id = id");

    if let Some(name) = update.name {
        query.push(", name = ");
        query.push_bind(name);
    }
    if let Some(email) = update.email {
        query.push(", email = ");
        query.push_bind(email);
    }
    if let Some(email_verified) = update.email_verified {
        query.push(", email_verified = ");
        let email_verified = email_verified
            .map(|ts| serialize_timestamp("email_verified", ts))
            .transpose()?;
        query.push_bind(email_verified);
    }
    if let Some(image) = update.image {
        query.push(", image = ");
        query.push_bind(image);
    }

    query.push(" WHERE id = ");
    query.push_bind(update.id.clone());
    query.push(" RETURNING id, name, email, email_verified, image");

    let row = query
        .build_query_as::<UserRow>()
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StoreError::not_found("user", &update.id))?;

    debug!("Updated user {}", update.id);
    row.into_user()
}

/// Delete a user. Their accounts and sessions go with them.
///
/// Deleting an id that does not exist is not an error.
pub async fn delete_user(pool: &SqlitePool, user_id: &str) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        debug!("Deleted user {}", user_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MessDb;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn diner(email: &str) -> NewUser {
        NewUser {
            id: None,
            name: Some("Priya".to_string()),
            email: Some(email.to_string()),
            email_verified: Some(Utc.timestamp_opt(1_700_000_000, 987_654_321).unwrap()),
            image: Some("https://lh3.googleusercontent.com/a/priya".to_string()),
        }
    }

    #[tokio::test]
    async fn test_user_roundtrip() {
        let db = MessDb::open_in_memory().await.unwrap();
        let input = diner("priya@example.com");

        let created = create_user(db.pool(), input.clone()).await.unwrap();
        assert!(Uuid::parse_str(&created.id).is_ok());

        let fetched = get_user(db.pool(), &created.id)
            .await
            .unwrap()
            .expect("user should exist");

        assert_eq!(fetched, created);
        assert_eq!(fetched.name, input.name);
        assert_eq!(fetched.email, input.email);
        assert_eq!(fetched.email_verified, input.email_verified);
        assert_eq!(fetched.image, input.image);

        let by_email = get_user_by_email(db.pool(), "priya@example.com")
            .await
            .unwrap();
        assert_eq!(by_email, Some(created));
    }

    #[tokio::test]
    async fn test_caller_supplied_id_is_kept() {
        let db = MessDb::open_in_memory().await.unwrap();
        let user = create_user(
            db.pool(),
            NewUser {
                id: Some("authjs-user-1".to_string()),
                ..diner("kept@example.com")
            },
        )
        .await
        .unwrap();

        assert_eq!(user.id, "authjs-user-1");
        assert!(get_user(db.pool(), "authjs-user-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_out_of_range_verification_writes_nothing() {
        let db = MessDb::open_in_memory().await.unwrap();
        let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();

        let err = create_user(
            db.pool(),
            NewUser {
                email_verified: Some(far),
                ..diner("far@example.com")
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::TimestampOutOfRange { .. }));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(get_user_by_email(db.pool(), "far@example.com")
            .await
            .unwrap()
            .is_none());

        // Updates are refused the same way and leave the row intact
        let user = create_user(db.pool(), diner("near@example.com")).await.unwrap();
        let err = update_user(db.pool(), UserUpdate::new(&user.id).email_verified(Some(far)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TimestampOutOfRange { .. }));
        assert_eq!(get_user(db.pool(), &user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let db = MessDb::open_in_memory().await.unwrap();
        assert!(get_user(db.pool(), "nope").await.unwrap().is_none());
        assert!(get_user_by_email(db.pool(), "nope@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = MessDb::open_in_memory().await.unwrap();
        create_user(db.pool(), diner("dup@example.com")).await.unwrap();

        let err = create_user(db.pool(), diner("dup@example.com"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_users_without_email_coexist() {
        let db = MessDb::open_in_memory().await.unwrap();
        create_user(db.pool(), NewUser::default()).await.unwrap();
        create_user(db.pool(), NewUser::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = MessDb::open_in_memory().await.unwrap();
        let created = create_user(db.pool(), diner("update@example.com"))
            .await
            .unwrap();

        let updated = update_user(
            db.pool(),
            UserUpdate::new(&created.id)
                .name(Some("Priya S".to_string()))
                .email_verified(None),
        )
        .await
        .unwrap();

        assert_eq!(updated.name.as_deref(), Some("Priya S"));
        assert!(updated.email_verified.is_none());
        // Untouched fields keep their values
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.image, created.image);

        let fetched = get_user(db.pool(), &created.id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_empty_update_returns_row() {
        let db = MessDb::open_in_memory().await.unwrap();
        let created = create_user(db.pool(), diner("empty@example.com"))
            .await
            .unwrap();

        let same = update_user(db.pool(), UserUpdate::new(&created.id))
            .await
            .unwrap();
        assert_eq!(same, created);
    }

    #[tokio::test]
    async fn test_update_missing_user_fails() {
        let db = MessDb::open_in_memory().await.unwrap();
        let err = update_user(db.pool(), UserUpdate::new("ghost").name(None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "user", .. }));
    }

    #[tokio::test]
    async fn test_delete_user_idempotent() {
        let db = MessDb::open_in_memory().await.unwrap();
        let created = create_user(db.pool(), diner("bye@example.com"))
            .await
            .unwrap();

        delete_user(db.pool(), &created.id).await.unwrap();
        assert!(get_user(db.pool(), &created.id).await.unwrap().is_none());

        // Second delete is a no-op
        delete_user(db.pool(), &created.id).await.unwrap();
        delete_user(db.pool(), "never-existed").await.unwrap();
    }
}
