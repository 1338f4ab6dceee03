//! Reactive request controller over an HTTP POST transport.
//!
//! This crate owns the state-management contract of the refetch
//! workspace:
//!
//! - **[`RequestController`]** — Wraps one named endpoint and exposes a
//!   `run` trigger plus observable loading/error/data state. Built in one
//!   of three execution modes, fixed and validated at construction:
//!   single (global cells), paginated (single plus page tracking and
//!   cached business parameters), or keyed-parallel (an independent
//!   [`RequestState`] bucket per key value).
//!
//! - **[`KeyedStateMap`]** — Lock-free reactive bucket store
//!   (`DashMap` + `tokio::sync::watch`). Buckets are replaced wholesale
//!   on every run, so observers never see a loading flag paired with a
//!   previous run's outcome.
//!
//! - **[`StateStream<T>`]** — Subscription handle vended by the
//!   controller. Exposes `current()` / `latest()` / `changed()` and a
//!   `Stream` adapter for reactive rendering.
//!
//! - **[`Params`]** — Owned parameter objects with pure field operations
//!   (no in-place mutation of caller data).
//!
//! - **[`Notifier`]** — Injected collaborator for transient user-visible
//!   error messages; [`TracingNotifier`] is the headless default.
//!
//! Transport failures never surface as rejections: a failed run settles
//! the error cell (or bucket), shows a notice, and invokes `on_error`.
//! Configuration errors ([`ConfigError`]) are the only fallible path, and
//! they are rejected before any request can fire.

pub mod config;
pub mod controller;
pub mod error;
pub mod notify;
pub mod pagination;
pub mod params;
pub mod state;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ErrorHandler, RequestOptions, SuccessHandler};
pub use controller::RequestController;
pub use error::ConfigError;
pub use notify::{NOTICE_DURATION, Notice, Notifier, Severity, TracingNotifier};
pub use pagination::PageInfo;
pub use params::Params;
pub use state::{BucketKey, KeyedStateMap, MapSnapshot, RequestState};
pub use stream::{StateStream, StateWatchStream};

// Transport surface, re-exported so consumers depend on one crate.
pub use refetch_http::{Error as RequestError, HttpTransport, TlsMode, Transport, TransportConfig};
