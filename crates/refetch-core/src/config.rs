// ── Controller configuration ──
//
// `RequestOptions` is assembled by the consumer and handed to
// `RequestController::new`, immutable afterwards. The execution mode is
// derived from it as a tagged variant so the mutual-exclusion rule is
// checked once, up front.

use std::time::Duration;

use serde_json::Value;

use crate::error::ConfigError;
use crate::params::Params;

/// Invoked after state is updated on every successful run, with the
/// result and the parameters the run was issued with.
pub type SuccessHandler = Box<dyn Fn(&Value, &Params) + Send + Sync>;

/// Invoked after state is updated on every failed run.
pub type ErrorHandler = Box<dyn Fn(&refetch_http::Error) + Send + Sync>;

/// Configuration for a single [`RequestController`](crate::RequestController).
///
/// All fields are optional; the zero-value default is an auto-running,
/// unpaginated controller with no delay and no callbacks.
#[derive(Default)]
pub struct RequestOptions {
    /// Parameters for the automatic first run (ignored when `manual`).
    pub default_params: Option<Params>,
    /// Skip the automatic first run; the caller triggers `run` itself.
    /// Forced on whenever `data_key` is set.
    pub manual: bool,
    /// Activate paginated mode. Incompatible with `data_key`.
    pub paginated: bool,
    /// Minimum time between dispatch and result delivery. Responses that
    /// resolve faster are held back until the delay elapses, which keeps
    /// loading indicators from flickering; slow responses are not delayed
    /// further.
    pub loading_delay: Duration,
    /// Name of the parameter field that selects the per-key bucket.
    /// Setting it activates keyed-parallel mode.
    pub data_key: Option<String>,
    /// Success callback.
    pub on_success: Option<SuccessHandler>,
    /// Error callback.
    pub on_error: Option<ErrorHandler>,
}

impl std::fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOptions")
            .field("default_params", &self.default_params)
            .field("manual", &self.manual)
            .field("paginated", &self.paginated)
            .field("loading_delay", &self.loading_delay)
            .field("data_key", &self.data_key)
            .field("on_success", &self.on_success.as_ref().map(|_| ".."))
            .field("on_error", &self.on_error.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Execution mode, fixed at construction.
///
/// Deriving the mode is a total function over the options: every valid
/// combination maps to exactly one variant, and the one invalid
/// combination (keyed + paginated) is rejected here rather than asserted
/// at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mode {
    /// One global loading/data/error cell set.
    Single,
    /// Single mode plus page tracking and cached business parameters.
    Paginated,
    /// Independent state bucket per value of the named parameter field.
    Keyed(String),
}

impl Mode {
    pub(crate) fn from_options(options: &RequestOptions) -> Result<Self, ConfigError> {
        match (&options.data_key, options.paginated) {
            (Some(_), true) => Err(ConfigError::PaginatedKeyedConflict),
            (Some(field), false) => Ok(Self::Keyed(field.clone())),
            (None, true) => Ok(Self::Paginated),
            (None, false) => Ok(Self::Single),
        }
    }
}
