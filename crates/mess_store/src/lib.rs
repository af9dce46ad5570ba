//! Mess Store - identity and visitor persistence for the mess website.
//!
//! This crate provides the storage the site's Google sign-in depends on:
//! - Users, provider account links, sessions and single-use verification
//!   tokens behind the [`IdentityStore`] trait
//! - Row formatting between SQLite rows and identity entities ([`format`])
//! - The site visitor counter
//!
//! # Architecture
//!
//! One SQLite database per site (or per tenant), opened as a [`MessDb`] and
//! handed to whatever needs it. There is no global connection.
//!
//! ```rust,ignore
//! use mess_store::{IdentityStore, MessDb, StoreConfig};
//!
//! let db = MessDb::connect(&StoreConfig::from_env()?).await?;
//! let user = db.get_user_by_email("diner@example.com").await?;
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod identity;
pub mod models;
pub mod queries;

pub use config::StoreConfig;
pub use db::MessDb;
pub use error::{StoreError, StoreResult};
pub use identity::IdentityStore;
pub use models::{
    Account, AccountType, NewAccount, NewUser, Session, SessionUpdate, User, UserUpdate,
    VerificationToken,
};
