//! SQLite backend for the Folio content store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every mutation is a single
//! `IMMEDIATE` transaction executed inside one `Connection::call`.

mod encode;
mod schema;
mod slugs;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use slugs::MAX_SLUG_ATTEMPTS;
pub use store::SqliteStore;
