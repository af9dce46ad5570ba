//! The identity persistence surface used by the sign-in flow.
//!
//! `IdentityStore` is what an authentication orchestrator holds to persist
//! users, provider accounts, sessions and verification tokens. `MessDb`
//! implements it with one SQL statement per operation; the store's own
//! constraints settle races, and failures propagate unchanged.
//!
//! Reads report absence as `Ok(None)`. Deletes of absent rows succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::MessDb;
use crate::error::StoreResult;
use crate::models::{
    Account, NewAccount, NewUser, Session, SessionUpdate, User, UserUpdate, VerificationToken,
};
use crate::queries;

/// Identity persistence operations.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a user. Duplicate emails fail with a unique violation.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// The user linked to `(provider, provider_account_id)`.
    async fn get_user_by_account(
        &self,
        provider_account_id: &str,
        provider: &str,
    ) -> StoreResult<Option<User>>;

    /// Partial update; fails with `NotFound` if the user does not exist.
    async fn update_user(&self, user: UserUpdate) -> StoreResult<User>;

    async fn delete_user(&self, user_id: &str) -> StoreResult<()>;

    /// Link a provider account. Duplicate pairs fail with a unique violation.
    async fn link_account(&self, account: NewAccount) -> StoreResult<Account>;

    async fn unlink_account(&self, provider_account_id: &str, provider: &str) -> StoreResult<()>;

    async fn create_session(
        &self,
        session_token: &str,
        user_id: &str,
        expires: DateTime<Utc>,
    ) -> StoreResult<Session>;

    /// The session and its owning user, fetched in one round trip.
    async fn get_session_and_user(
        &self,
        session_token: &str,
    ) -> StoreResult<Option<(User, Session)>>;

    /// Partial update; `None` if the session does not exist.
    async fn update_session(&self, session: SessionUpdate) -> StoreResult<Option<Session>>;

    async fn delete_session(&self, session_token: &str) -> StoreResult<()>;

    async fn create_verification_token(
        &self,
        token: VerificationToken,
    ) -> StoreResult<VerificationToken>;

    /// Delete and return the token; `None` once it has been used.
    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> StoreResult<Option<VerificationToken>>;
}

#[async_trait]
impl IdentityStore for MessDb {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        queries::create_user(self.pool(), user).await
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        queries::get_user(self.pool(), id).await
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        queries::get_user_by_email(self.pool(), email).await
    }

    async fn get_user_by_account(
        &self,
        provider_account_id: &str,
        provider: &str,
    ) -> StoreResult<Option<User>> {
        queries::get_user_by_account(self.pool(), provider_account_id, provider).await
    }

    async fn update_user(&self, user: UserUpdate) -> StoreResult<User> {
        queries::update_user(self.pool(), user).await
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<()> {
        queries::delete_user(self.pool(), user_id).await
    }

    async fn link_account(&self, account: NewAccount) -> StoreResult<Account> {
        queries::link_account(self.pool(), account).await
    }

    async fn unlink_account(&self, provider_account_id: &str, provider: &str) -> StoreResult<()> {
        queries::unlink_account(self.pool(), provider_account_id, provider).await
    }

    async fn create_session(
        &self,
        session_token: &str,
        user_id: &str,
        expires: DateTime<Utc>,
    ) -> StoreResult<Session> {
        queries::create_session(self.pool(), session_token, user_id, expires).await
    }

    async fn get_session_and_user(
        &self,
        session_token: &str,
    ) -> StoreResult<Option<(User, Session)>> {
        queries::get_session_and_user(self.pool(), session_token).await
    }

    async fn update_session(&self, session: SessionUpdate) -> StoreResult<Option<Session>> {
        queries::update_session(self.pool(), session).await
    }

    async fn delete_session(&self, session_token: &str) -> StoreResult<()> {
        queries::delete_session(self.pool(), session_token).await
    }

    async fn create_verification_token(
        &self,
        token: VerificationToken,
    ) -> StoreResult<VerificationToken> {
        queries::create_verification_token(self.pool(), token).await
    }

    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> StoreResult<Option<VerificationToken>> {
        queries::use_verification_token(self.pool(), identifier, token).await
    }
}
