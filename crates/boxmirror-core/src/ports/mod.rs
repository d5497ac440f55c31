//! Port definitions (hexagonal architecture interfaces)
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote storage operations (Dropbox, in-memory test stores)
//! - [`ILocalFileSystem`] - Local filesystem operations used by the reconciliation engine

pub mod local_filesystem;
pub mod remote_store;

pub use local_filesystem::{FileSystemState, ILocalFileSystem, LocalTree};
pub use remote_store::{IRemoteStore, ListPage};
