//! Identity entities as the sign-in flow sees them.
//!
//! These are the canonical in-memory shapes. Raw database rows live in
//! [`crate::format`] and are converted into these types there.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person who has signed in at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUID v4, generated on create)
    pub id: String,

    /// Display name from the provider profile
    pub name: Option<String>,

    /// Email address (unique when present)
    pub email: Option<String>,

    /// When the email address was verified
    pub email_verified: Option<DateTime<Utc>>,

    /// Avatar image URL
    pub image: Option<String>,
}

/// Payload for creating a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    /// Caller-assigned id; a UUID v4 is generated when absent
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

/// Partial update of a user, keyed by `id`.
///
/// Outer `None` leaves a column untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub id: String,
    pub name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub email_verified: Option<Option<DateTime<Utc>>>,
    pub image: Option<Option<String>>,
}

impl UserUpdate {
    /// An update for `id` that changes nothing yet.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }

    pub fn email(mut self, email: Option<String>) -> Self {
        self.email = Some(email);
        self
    }

    pub fn email_verified(mut self, email_verified: Option<DateTime<Utc>>) -> Self {
        self.email_verified = Some(email_verified);
        self
    }

    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = Some(image);
        self
    }
}

/// Kind of external identity an account links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// OAuth 2 provider (Google sign-in)
    Oauth,
    /// OpenID Connect provider
    Oidc,
    /// Passwordless email sign-in
    Email,
    /// WebAuthn credential
    Webauthn,
}

/// Link between a user and an identity at an external provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Unique identifier (UUID v4, generated on link)
    pub id: String,

    /// Owning user
    pub user_id: String,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub account_type: AccountType,

    /// Provider name, e.g. "google"
    pub provider: String,

    /// Account id assigned by the provider
    pub provider_account_id: String,

    pub refresh_token: Option<String>,
    pub access_token: Option<String>,

    /// Access token expiry as unix seconds, as the provider reports it
    pub expires_at: Option<i64>,

    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
}

/// Payload for linking an account. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub user_id: String,
    pub account_type: AccountType,
    pub provider: String,
    pub provider_account_id: String,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
}

impl NewAccount {
    /// An OAuth account link with no token set attached.
    pub fn oauth(
        user_id: impl Into<String>,
        provider: impl Into<String>,
        provider_account_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            account_type: AccountType::Oauth,
            provider: provider.into(),
            provider_account_id: provider_account_id.into(),
            refresh_token: None,
            access_token: None,
            expires_at: None,
            token_type: None,
            scope: None,
            id_token: None,
            session_state: None,
        }
    }
}

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier (UUID v4, generated on create)
    pub id: String,

    /// Opaque token held by the browser cookie
    pub session_token: String,

    /// Owning user
    pub user_id: String,

    /// When the session stops being valid
    pub expires: DateTime<Utc>,
}

impl Session {
    /// Check if this session has expired.
    pub fn is_expired(&self) -> bool {
        self.expires <= Utc::now()
    }
}

/// Partial update of a session, keyed by `session_token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub session_token: String,
    pub user_id: Option<String>,
    pub expires: Option<DateTime<Utc>>,
}

impl SessionUpdate {
    /// Extend (or shorten) a session to a new expiry.
    pub fn expires(session_token: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            session_token: session_token.into(),
            user_id: None,
            expires: Some(expires),
        }
    }
}

/// A single-use token proving control of an identifier (usually an email).
///
/// The storage row id is never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationToken {
    pub identifier: String,
    pub token: String,
    pub expires: DateTime<Utc>,
}

impl VerificationToken {
    /// Check if this token has expired.
    pub fn is_expired(&self) -> bool {
        self.expires <= Utc::now()
    }
}
