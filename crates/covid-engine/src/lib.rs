//! The aggregation engine.
//!
//! Views are pure functions from filtered rows to a nested [`Value`]. The
//! only I/O happens in [`ViewCatalog::run`], which asks a
//! [`covid_core::store::RecordStore`] for rows and hands them to the view's
//! pipeline.

pub mod bucket;
pub mod catalog;
pub mod group;
pub mod pipeline;
pub mod rank;
pub mod ratio;
pub mod recovery;
pub mod value;

pub use bucket::MonthKey;
pub use catalog::{CatalogOptions, Param, ViewCatalog, ViewName, ViewParams, ViewSpec};
pub use value::{Mapping, Value};
