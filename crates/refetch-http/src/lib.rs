//! HTTP transport layer for the refetch workspace.
//!
//! This crate owns everything that talks to the network:
//!
//! - **[`Transport`]** — The seam between the request controller and the
//!   wire. One operation: POST a JSON parameter object to a named endpoint
//!   and resolve to `Result<Value, Error>`. The returned future never
//!   panics; every failure mode becomes an [`Error`] value.
//!
//! - **[`HttpTransport`]** — The production implementation over
//!   `reqwest`. Joins endpoint paths onto a base URL, parses JSON
//!   responses, and maps non-2xx statuses into structured
//!   [`Error::Endpoint`] values.
//!
//! - **[`TransportConfig`]** — Timeout and TLS settings shared by anyone
//!   constructing a client.
//!
//! `refetch-core` consumes this crate through the [`Transport`] trait, so
//! tests can substitute a scripted transport without touching a socket.

pub mod client;
pub mod error;
pub mod transport;

pub use client::HttpTransport;
pub use error::Error;
pub use transport::{TlsMode, Transport, TransportConfig};
