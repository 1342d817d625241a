//! Core types and trait definitions for the pandemic analytics service.
//!
//! No HTTP and no database code lives here; the engine, the SQLite store and
//! the API all build on these types.

// `RecordStore` impls use native `async fn`; the trait spells out `Send`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod measure;
pub mod memory;
pub mod policy;
pub mod record;
pub mod store;

pub use error::{Error, Result};
