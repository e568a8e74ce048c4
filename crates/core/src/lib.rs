#![warn(clippy::all, missing_docs)]

//! Core export engine for shelfsync.
//!
//! This crate mirrors a game library into a JSON snapshot: it builds one
//! normalized record per library item, resolves cover art through a
//! fallback chain, and merges the result against the previous snapshot so
//! that only changed records are rewritten.

pub mod artwork;
pub mod catalog;
pub mod config;
pub mod export;
pub mod library;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod snapshot;

pub use artwork::{CoverArtResolver, IgdbClient, MetadataClient, RunContext};
pub use catalog::{CatalogBuilder, Progress};
pub use config::AppConfig;
pub use export::{ExportPass, ExportStatus};
pub use library::{GameLibrary, JsonLibrary};
pub use models::{GameRecord, SourceGame};
pub use snapshot::SnapshotStore;
