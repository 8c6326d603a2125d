//! The single persisted login session.
//!
//! [`SessionStore`] is the source of truth for "is the user logged in".
//! Initialise it once at startup (`load()`), tear it down on logout
//! (`logout()`), and decide access only through [`SessionStore::is_valid`]
//! or [`SessionStore::load`]. Raw [`SessionData`] fields such as
//! `is_authenticated` say nothing about expiry on their own.
//!
//! Persistence is pluggable through [`SessionStorage`]. Every write replaces
//! the whole record, so readers see either the previous session, the new one,
//! or none.

mod error;
mod record;
mod storage;
mod store;

pub use error::SessionError;
pub use record::SessionData;
#[cfg(feature = "file-store")]
pub use storage::FileStorage;
pub use storage::{MemoryStorage, SessionStorage};
pub use store::SessionStore;
