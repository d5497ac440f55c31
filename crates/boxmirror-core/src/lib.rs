//! boxmirror Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `Entry` (file/folder/tombstone), `RemotePath`, `RemoteKey`
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `ILocalFileSystem`
//! - **Configuration** - YAML configuration with defaults and validation
//!
//! # Architecture
//!
//! The domain module holds plain data with no I/O. Ports define the trait
//! interfaces that the reconciliation engine drives and that adapter
//! crates (`boxmirror-dropbox`, the filesystem adapter in `boxmirror-sync`)
//! implement.

pub mod config;
pub mod domain;
pub mod ports;
