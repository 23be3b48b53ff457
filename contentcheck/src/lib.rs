//! Content model for security-content repositories.
//!
//! Path routing rules, loading of YAML/JSON content files, structural schema
//! validation, per-type semantic validators and the repository-wide stores
//! they consult.

pub mod check;
pub mod content_type;
pub mod document;
pub mod error;
pub mod loader;
pub mod patterns;
pub mod schema;
pub mod stores;
pub mod structure;
pub mod unifier;
pub mod validators;

// Re-export commonly used types
pub use check::{CheckResult, ContentCheck};
pub use content_type::{ContentType, FileLayout};
pub use document::ContentDocument;
pub use error::ContentError;
pub use loader::{ContentLoader, FsLoader};
pub use schema::SchemaSet;
pub use stores::{ConfJson, IdSet};
pub use structure::StructureValidator;
pub use unifier::{PackageUnifier, Unifier};
