//! Fake Exchange server for integration testing
//!
//! Provides an in-process stand-in for the EWS transport: a folder
//! tree with received timestamps per folder, configurable version
//! rejections and bind failures, and a record of every call so tests
//! can assert on how the server was driven.
//!
//! ## Module layout
//!
//! - `tree` -- test data model (folders, messages, builder)
//! - `service` -- `Transport` / `MailService` implementations
//! - `tls` -- TLS listener with a self-signed certificate

pub mod service;
pub mod tls;
pub mod tree;

pub use service::{FakeExchange, FakeService};
pub use tls::FakeTlsServer;
pub use tree::TreeBuilder;
