// ── Core error types ──
//
// Configuration errors are the only failures this crate raises to the
// caller. Transport failures never propagate: they are captured into the
// observable error cells and reported through the notifier.

use thiserror::Error;

/// Rejected controller configurations.
///
/// Detected when the controller is constructed, before any mount or
/// network call can fire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `paginated` and `data_key` were both set. The two execution modes
    /// are mutually exclusive.
    #[error("keyed-parallel requests cannot be paginated: unset `paginated` or `data_key`")]
    PaginatedKeyedConflict,
}
