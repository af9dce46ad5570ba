//! Provider account queries.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{Account, NewAccount};

/// Link a provider account to a user.
///
/// Fails with a unique violation if the `(provider, provider_account_id)`
/// pair is already linked, or a foreign key violation if the user is gone.
pub async fn link_account(pool: &SqlitePool, account: NewAccount) -> StoreResult<Account> {
    let id = Uuid::new_v4().to_string();

    let linked = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (
            id, user_id, type, provider, provider_account_id,
            refresh_token, access_token, expires_at, token_type,
            scope, id_token, session_state
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING
            id, user_id, type, provider, provider_account_id,
            refresh_token, access_token, expires_at, token_type,
            scope, id_token, session_state
        "#,
    )
    .bind(&id)
    .bind(account.user_id)
    .bind(account.account_type)
    .bind(account.provider)
    .bind(account.provider_account_id)
    .bind(account.refresh_token)
    .bind(account.access_token)
    .bind(account.expires_at)
    .bind(account.token_type)
    .bind(account.scope)
    .bind(account.id_token)
    .bind(account.session_state)
    .fetch_one(pool)
    .await?;

    debug!(
        "Linked {} account {} to user {}",
        linked.provider, linked.id, linked.user_id
    );
    Ok(linked)
}

/// Remove a provider account link. Unlinking an absent pair is not an error.
pub async fn unlink_account(
    pool: &SqlitePool,
    provider_account_id: &str,
    provider: &str,
) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM accounts WHERE provider = ? AND provider_account_id = ?")
        .bind(provider)
        .bind(provider_account_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        debug!("Unlinked {} account {}", provider, provider_account_id);
    }
    Ok(())
}

/// List the accounts linked to a user, ordered by provider.
pub async fn list_accounts_for_user(pool: &SqlitePool, user_id: &str) -> StoreResult<Vec<Account>> {
    let accounts = sqlx::query_as::<_, Account>(
        r#"
        SELECT
            id, user_id, type, provider, provider_account_id,
            refresh_token, access_token, expires_at, token_type,
            scope, id_token, session_state
        FROM accounts
        WHERE user_id = ?
        ORDER BY provider, provider_account_id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MessDb;
    use crate::models::{AccountType, NewUser};
    use crate::queries::{create_user, get_user_by_account};

    #[tokio::test]
    async fn test_link_google_account() {
        let db = MessDb::open_in_memory().await.unwrap();
        let user = create_user(db.pool(), NewUser::default()).await.unwrap();

        let mut account = NewAccount::oauth(&user.id, "google", "1089");
        account.access_token = Some("ya29.token".to_string());
        account.expires_at = Some(1_900_000_000);
        account.token_type = Some("Bearer".to_string());
        account.scope = Some("openid email profile".to_string());

        let linked = link_account(db.pool(), account).await.unwrap();
        assert_eq!(linked.user_id, user.id);
        assert_eq!(linked.account_type, AccountType::Oauth);
        assert_eq!(linked.access_token.as_deref(), Some("ya29.token"));
        assert_eq!(linked.expires_at, Some(1_900_000_000));
        assert!(linked.refresh_token.is_none());

        let found = get_user_by_account(db.pool(), "1089", "google")
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id.clone()));

        // Same provider account id under a different provider is unrelated
        assert!(get_user_by_account(db.pool(), "1089", "github")
            .await
            .unwrap()
            .is_none());

        let accounts = list_accounts_for_user(db.pool(), &user.id).await.unwrap();
        assert_eq!(accounts, vec![linked]);
    }

    #[tokio::test]
    async fn test_duplicate_link_then_relink() {
        let db = MessDb::open_in_memory().await.unwrap();
        let user = create_user(db.pool(), NewUser::default()).await.unwrap();
        let account = NewAccount::oauth(&user.id, "google", "42");

        link_account(db.pool(), account.clone()).await.unwrap();
        let err = link_account(db.pool(), account.clone()).await.unwrap_err();
        assert!(err.is_unique_violation());

        unlink_account(db.pool(), "42", "google").await.unwrap();
        assert!(get_user_by_account(db.pool(), "42", "google")
            .await
            .unwrap()
            .is_none());

        link_account(db.pool(), account).await.unwrap();
    }

    #[tokio::test]
    async fn test_link_requires_user() {
        let db = MessDb::open_in_memory().await.unwrap();
        let err = link_account(db.pool(), NewAccount::oauth("ghost", "google", "7"))
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_unlink_absent_is_noop() {
        let db = MessDb::open_in_memory().await.unwrap();
        unlink_account(db.pool(), "missing", "google").await.unwrap();
    }
}
