//! Core types and trait definitions for the Folio content engine.
//!
//! This crate depends on neither HTTP nor a database.
//! All other crates depend on it; storage backends implement
//! [`store::ContentStore`] on top of the pure logic defined here.

pub mod actor;
pub mod comment;
pub mod error;
pub mod lifecycle;
pub mod page;
pub mod post;
pub mod revision;
pub mod slug;
pub mod store;

pub use error::{Classify, Error, ErrorKind, Result};
