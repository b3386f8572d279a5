//! Chart index data model
//!
//! This module holds the in-memory representation of a repository index and
//! the codec that moves it to and from its YAML interchange form.
//!
//! # Modules
//!
//! - [`catalog`]: `VersionCatalog` and `VersionRecord` (add, lookup, merge, sort)
//! - [`codec`]: Loading and writing index documents
//! - [`error`]: Error types for index operations
//! - [`semver`]: Version parsing and range constraints

pub mod catalog;
pub mod codec;
pub mod error;
pub mod semver;

pub use catalog::{VersionCatalog, VersionRecord};
pub use codec::{encode_index, load_index, load_index_file, write_index_file};
pub use error::IndexError;
