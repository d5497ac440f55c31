//! Domain types
//!
//! - Newtypes for validated remote paths and case-folded snapshot keys
//! - The closed `Entry` sum type returned by remote listings
//! - Domain-specific error types

pub mod entry;
pub mod errors;
pub mod newtypes;

pub use entry::{DeletedEntry, Entry, FileEntry, FolderEntry};
pub use errors::DomainError;
pub use newtypes::{RemoteKey, RemotePath};
