// ── User-facing error notification ──
//
// The notifier is an injected collaborator with a narrow interface, so
// consumers bind it to whatever toast/message widget their UI provides
// and tests can record what would have been shown.

use std::time::Duration;

use tracing::{info, warn};

/// How long a transient notice stays visible.
pub const NOTICE_DURATION: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// `None` when the error did not map to any known message (see
    /// [`classify`]).
    pub message: Option<String>,
    pub severity: Severity,
    pub duration: Duration,
}

impl Notice {
    pub fn error(message: Option<String>) -> Self {
        Self {
            message,
            severity: Severity::Error,
            duration: NOTICE_DURATION,
        }
    }
}

/// Shows transient messages to the user. Fire-and-forget; no return value.
pub trait Notifier: Send + Sync {
    fn show(&self, notice: Notice);
}

/// Default notifier: routes notices to the tracing subscriber.
///
/// Useful for headless consumers and as a stand-in until a UI binds its
/// own widget.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, notice: Notice) {
        let message = notice.message.as_deref().unwrap_or("(no message)");
        match notice.severity {
            Severity::Error | Severity::Warning => warn!(%message, "notice"),
            Severity::Info => info!(%message, "notice"),
        }
    }
}

/// Map a request error to the notice shown for it.
///
/// Matches literal "404"/"500" substrings of the rendered error text, the
/// same contract the upstream services encode their statuses with. A 404
/// gets generic network-failure wording; a 500 prefers the endpoint's own
/// nested message. Both substrings present means the 500 branch wins.
/// Every other error produces a notice with no message.
// TODO: map the remaining status codes once their notification copy is
// decided; substring matching on the error text should move to
// `Error::status()` at the same time.
pub(crate) fn classify(error: &refetch_http::Error) -> Notice {
    let text = error.to_string();
    let mut message = None;

    if text.contains("404") {
        message = Some("Network request failed".to_string());
    }
    if text.contains("500") {
        message = Some(
            error
                .detail()
                .map_or_else(system_error_fallback, String::from),
        );
    }

    Notice::error(message)
}

fn system_error_fallback() -> String {
    "System error, please contact an administrator".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use refetch_http::Error;

    fn endpoint_error(status: u16, detail: Option<&str>) -> Error {
        Error::Endpoint {
            status,
            message: detail.unwrap_or("request failed").to_string(),
            detail: detail.map(String::from),
        }
    }

    #[test]
    fn not_found_maps_to_network_failure() {
        let notice = classify(&endpoint_error(404, None));
        assert_eq!(notice.message.as_deref(), Some("Network request failed"));
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(notice.duration, NOTICE_DURATION);
    }

    #[test]
    fn server_error_prefers_endpoint_detail() {
        let notice = classify(&endpoint_error(500, Some("database unavailable")));
        assert_eq!(notice.message.as_deref(), Some("database unavailable"));
    }

    #[test]
    fn server_error_without_detail_uses_fallback() {
        let notice = classify(&endpoint_error(500, None));
        assert_eq!(
            notice.message.as_deref(),
            Some("System error, please contact an administrator")
        );
    }

    #[test]
    fn server_error_wins_when_both_substrings_present() {
        // "404" appears in the detail text, "500" in the status.
        let notice = classify(&endpoint_error(500, Some("upstream replied 404")));
        assert_eq!(notice.message.as_deref(), Some("upstream replied 404"));
    }

    #[test]
    fn unmapped_errors_carry_no_message() {
        let notice = classify(&endpoint_error(403, None));
        assert_eq!(notice.message, None);
        assert_eq!(notice.severity, Severity::Error);
    }
}
