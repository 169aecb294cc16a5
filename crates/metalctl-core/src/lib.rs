//! The generic entity command engine behind metalctl.
//!
//! An [`EntityAdapter`] bridges one entity kind to the metal-api. On top
//! of it this crate provides the multi-document YAML reader, the
//! create-or-update apply engine, file-driven bulk operations, the
//! multi-key sorter and the edit round-trip. The CLI composes these
//! into command trees; nothing in here prints.

pub mod adapter;
pub mod apply;
pub mod bulk;
pub mod edit;
pub mod entities;
pub mod error;
pub mod ops;
pub mod sort;

pub use adapter::{Converted, EntityAdapter, Operation};
pub use apply::{ApplyHooks, ApplyOptions, ApplyOutcome, ApplyReport, NoHooks, apply};
pub use bulk::{BulkReader, Source};
pub use edit::edit;
pub use error::CoreError;
pub use sort::{SortKey, Sorter};
