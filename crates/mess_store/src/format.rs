//! Row formatting between the database and identity entities.
//!
//! Rows come back from SQLite with timestamps as TEXT and, for joined
//! queries, with the related table's columns flattened under a prefix.
//! The row types here hold that raw shape; their conversions produce the
//! canonical entities in [`crate::models`]. Everything in this module is
//! pure: no I/O.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};

use crate::error::{StoreError, StoreResult};
use crate::models::{Session, User, VerificationToken};

/// Serialize a timestamp for storage.
///
/// Always nine fractional digits and a `Z` suffix: lossless, and fixed width
/// so stored values sort chronologically as strings. Years outside
/// 0000..=9999 have no RFC 3339 form and are rejected before anything is
/// written.
pub fn serialize_timestamp(
    column: &'static str,
    timestamp: DateTime<Utc>,
) -> StoreResult<String> {
    if !(0..=9999).contains(&timestamp.year()) {
        return Err(StoreError::TimestampOutOfRange { column, timestamp });
    }
    Ok(timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Parse a stored timestamp back into UTC.
///
/// Any RFC 3339 offset is accepted and normalized, so rows written by other
/// tools still read correctly.
pub fn parse_timestamp(column: &'static str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| StoreError::InvalidTimestamp {
            column,
            value: value.to_string(),
            source,
        })
}

fn parse_optional_timestamp(
    column: &'static str,
    value: Option<&str>,
) -> StoreResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(column, v)).transpose()
}

/// Database row for the users table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<String>,
    pub image: Option<String>,
}

impl UserRow {
    /// Convert database row to a User.
    pub fn into_user(self) -> StoreResult<User> {
        let email_verified =
            parse_optional_timestamp("email_verified", self.email_verified.as_deref())?;

        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            email_verified,
            image: self.image,
        })
    }
}

/// Database row for the sessions table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub id: String,
    pub session_token: String,
    pub user_id: String,
    pub expires: String,
}

impl SessionRow {
    /// Convert database row to a Session.
    pub fn into_session(self) -> StoreResult<Session> {
        Ok(Session {
            expires: parse_timestamp("expires", &self.expires)?,
            id: self.id,
            session_token: self.session_token,
            user_id: self.user_id,
        })
    }
}

/// A sessions row joined with its owning user.
///
/// User columns carry a `user_` prefix; the user id is the session's
/// `user_id`, since the join is on that column.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionUserRow {
    pub id: String,
    pub session_token: String,
    pub user_id: String,
    pub expires: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_email_verified: Option<String>,
    pub user_image: Option<String>,
}

impl SessionUserRow {
    /// Unwrap the joined row into its two sibling entities.
    pub fn split(self) -> StoreResult<(User, Session)> {
        let user = UserRow {
            id: self.user_id.clone(),
            name: self.user_name,
            email: self.user_email,
            email_verified: self.user_email_verified,
            image: self.user_image,
        }
        .into_user()?;

        let session = SessionRow {
            id: self.id,
            session_token: self.session_token,
            user_id: self.user_id,
            expires: self.expires,
        }
        .into_session()?;

        Ok((user, session))
    }
}

/// Database row for the verification_tokens table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationTokenRow {
    /// Storage-only row id; dropped on conversion.
    pub id: i64,
    pub identifier: String,
    pub token: String,
    pub expires: String,
}

impl VerificationTokenRow {
    /// Convert database row to a VerificationToken, stripping the row id.
    pub fn into_token(self) -> StoreResult<VerificationToken> {
        Ok(VerificationToken {
            expires: parse_timestamp("expires", &self.expires)?,
            identifier: self.identifier,
            token: self.token,
        })
    }
}
