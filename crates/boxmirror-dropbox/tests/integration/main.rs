//! Integration tests for boxmirror-dropbox
//!
//! Runs the client and the remote store against a wiremock server that
//! emulates the Dropbox RPC and content endpoints.

mod common;

mod test_file_ops;
mod test_listing;
