//! Database query functions.
//!
//! Organized by table:
//! - `users`: User CRUD and the account join lookup
//! - `accounts`: Provider account linking
//! - `sessions`: Sessions and the session+user join
//! - `verification_tokens`: Single-use tokens
//! - `visitors`: Site visitor counter

mod accounts;
mod sessions;
mod users;
mod verification_tokens;
mod visitors;

pub use accounts::*;
pub use sessions::*;
pub use users::*;
pub use verification_tokens::*;
pub use visitors::*;
