//! Session Management Module
//!
//! In-memory session handles keyed by account id, the per-account locks that
//! serialize work on one account, and the on-disk client settings a login restores.

pub mod files;
pub mod locks;
pub mod store;

pub use files::SessionFiles;
pub use locks::{AccountGuard, AccountLocks};
pub use store::{SessionHandle, SessionStore};
