#![allow(clippy::unwrap_used)]
// Integration tests for `RequestController` using a scripted transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use refetch_core::{
    BucketKey, ConfigError, Notice, Notifier, Params, RequestController, RequestError,
    RequestOptions, Transport,
};

// ── Test doubles ────────────────────────────────────────────────────

/// Transport that replays a queue of scripted responses and records
/// every request body it receives.
#[derive(Clone, Default)]
struct MockTransport {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    responses: Mutex<VecDeque<(Duration, Result<Value, RequestError>)>>,
    requests: Mutex<Vec<Value>>,
}

impl MockTransport {
    fn new() -> Self {
        Self::default()
    }

    fn respond_ok(&self, value: Value) {
        self.respond_ok_after(Duration::ZERO, value);
    }

    fn respond_ok_after(&self, delay: Duration, value: Value) {
        self.inner
            .responses
            .lock()
            .unwrap()
            .push_back((delay, Ok(value)));
    }

    fn respond_err(&self, error: RequestError) {
        self.inner
            .responses
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, Err(error)));
    }

    fn requests(&self) -> Vec<Value> {
        self.inner.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn send(&self, _endpoint: &str, params: Value) -> Result<Value, RequestError> {
        let (delay, outcome) = {
            self.inner.requests.lock().unwrap().push(params);
            self.inner
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("MockTransport: no scripted response left")
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

/// Notifier that records every notice it would have shown.
#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn params(value: Value) -> Params {
    Params::from_value(value).unwrap()
}

fn not_found() -> RequestError {
    RequestError::Endpoint {
        status: 404,
        message: "Not Found".into(),
        detail: None,
    }
}

fn server_error(detail: &str) -> RequestError {
    RequestError::Endpoint {
        status: 500,
        message: detail.into(),
        detail: Some(detail.into()),
    }
}

fn controller(
    options: RequestOptions,
    transport: MockTransport,
    notifier: Arc<RecordingNotifier>,
) -> RequestController<MockTransport> {
    RequestController::new("/api/list", options, transport, notifier).expect("valid configuration")
}

// ── Single mode ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn single_run_success_settles_cells_and_callbacks() {
    let transport = MockTransport::new();
    transport.respond_ok_after(Duration::from_millis(50), json!({ "rows": [1, 2] }));
    let notifier = Arc::new(RecordingNotifier::default());

    let successes: Arc<Mutex<Vec<(Value, Params)>>> = Arc::default();
    let recorded = Arc::clone(&successes);
    let options = RequestOptions {
        manual: true,
        on_success: Some(Box::new(move |data, params| {
            recorded.lock().unwrap().push((data.clone(), params.clone()));
        })),
        ..Default::default()
    };

    let ctrl = Arc::new(controller(options, transport, Arc::clone(&notifier)));
    let mut loading = ctrl.loading();

    let runner = Arc::clone(&ctrl);
    let handle =
        tokio::spawn(async move { runner.run(Some(params(json!({ "q": "ap" })))).await });

    // The loading cell goes true before the request resolves and false
    // exactly once when it settles.
    assert_eq!(loading.changed().await, Some(true));
    assert_eq!(loading.changed().await, Some(false));
    handle.await.unwrap();

    assert_eq!(
        ctrl.data_snapshot().as_deref(),
        Some(&json!({ "rows": [1, 2] }))
    );
    assert!(ctrl.error_snapshot().is_none());
    assert!(notifier.notices().is_empty());

    let calls = successes.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, json!({ "rows": [1, 2] }));
    assert_eq!(calls[0].1, params(json!({ "q": "ap" })));
}

#[tokio::test]
async fn single_run_failure_leaves_data_untouched() {
    let transport = MockTransport::new();
    transport.respond_ok(json!({ "v": 1 }));
    transport.respond_err(not_found());
    let notifier = Arc::new(RecordingNotifier::default());

    let errors: Arc<Mutex<Vec<String>>> = Arc::default();
    let recorded = Arc::clone(&errors);
    let options = RequestOptions {
        manual: true,
        on_error: Some(Box::new(move |err| {
            recorded.lock().unwrap().push(err.to_string());
        })),
        ..Default::default()
    };

    let ctrl = controller(options, transport, Arc::clone(&notifier));
    ctrl.run(None).await;
    assert_eq!(ctrl.data_snapshot().as_deref(), Some(&json!({ "v": 1 })));

    ctrl.run(None).await;

    // Data survives a failed run; only the error cell is written.
    assert_eq!(ctrl.data_snapshot().as_deref(), Some(&json!({ "v": 1 })));
    let err = ctrl.error_snapshot().expect("error cell set");
    assert_eq!(err.status(), Some(404));

    assert_eq!(errors.lock().unwrap().len(), 1);
    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message.as_deref(), Some("Network request failed"));
}

#[tokio::test]
async fn run_without_params_falls_back_to_defaults() {
    let transport = MockTransport::new();
    transport.respond_ok(json!([]));
    transport.respond_ok(json!([]));
    let options = RequestOptions {
        manual: true,
        default_params: Some(params(json!({ "q": "default" }))),
        ..Default::default()
    };

    let ctrl = controller(
        options,
        transport.clone(),
        Arc::new(RecordingNotifier::default()),
    );
    ctrl.run(None).await;
    ctrl.run(Some(params(json!({ "q": "explicit" })))).await;

    assert_eq!(
        transport.requests(),
        vec![json!({ "q": "default" }), json!({ "q": "explicit" })]
    );
}

#[tokio::test]
async fn per_call_callback_fires_on_success_only() {
    let transport = MockTransport::new();
    transport.respond_ok(json!({ "ok": true }));
    transport.respond_err(server_error("down"));

    let ctrl = controller(
        RequestOptions {
            manual: true,
            ..Default::default()
        },
        transport,
        Arc::new(RecordingNotifier::default()),
    );

    let mut seen = Vec::new();
    ctrl.run_with(None, |data, _| seen.push(data.clone())).await;
    ctrl.run_with(None, |data, _| seen.push(data.clone())).await;

    assert_eq!(seen, vec![json!({ "ok": true })]);
}

#[tokio::test]
async fn overlapping_runs_settle_last_completion_wins() {
    let transport = MockTransport::new();
    // First dispatch resolves last: its (stale) result overwrites the
    // second dispatch's fresher one. No in-flight tracking by design.
    transport.respond_ok_after(Duration::from_millis(100), json!("stale"));
    transport.respond_ok_after(Duration::from_millis(10), json!("fresh"));

    let ctrl = controller(
        RequestOptions {
            manual: true,
            ..Default::default()
        },
        transport,
        Arc::new(RecordingNotifier::default()),
    );

    tokio::join!(ctrl.run(None), ctrl.run(None));

    assert_eq!(ctrl.data_snapshot().as_deref(), Some(&json!("stale")));
}

// ── Loading delay ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn loading_delay_holds_back_fast_responses() {
    let transport = MockTransport::new();
    transport.respond_ok_after(Duration::from_millis(10), json!(1));

    let ctrl = controller(
        RequestOptions {
            manual: true,
            loading_delay: Duration::from_millis(200),
            ..Default::default()
        },
        transport,
        Arc::new(RecordingNotifier::default()),
    );

    let started = tokio::time::Instant::now();
    ctrl.run(None).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(200), "settled at {elapsed:?}");
    assert!(elapsed < Duration::from_millis(250), "settled at {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn loading_delay_does_not_penalize_slow_responses() {
    let transport = MockTransport::new();
    transport.respond_ok_after(Duration::from_millis(350), json!(1));

    let ctrl = controller(
        RequestOptions {
            manual: true,
            loading_delay: Duration::from_millis(200),
            ..Default::default()
        },
        transport,
        Arc::new(RecordingNotifier::default()),
    );

    let started = tokio::time::Instant::now();
    ctrl.run(None).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(350), "settled at {elapsed:?}");
    assert!(elapsed < Duration::from_millis(400), "settled at {elapsed:?}");
}

// ── Mount / automatic first run ─────────────────────────────────────

#[tokio::test]
async fn mount_runs_default_params_when_not_manual() {
    let transport = MockTransport::new();
    transport.respond_ok(json!([]));
    let options = RequestOptions {
        default_params: Some(params(json!({ "q": "boot" }))),
        ..Default::default()
    };

    let ctrl = controller(
        options,
        transport.clone(),
        Arc::new(RecordingNotifier::default()),
    );
    ctrl.mount().await;

    assert_eq!(transport.requests(), vec![json!({ "q": "boot" })]);
}

#[tokio::test]
async fn mount_is_a_no_op_when_manual() {
    let transport = MockTransport::new();
    let ctrl = controller(
        RequestOptions {
            manual: true,
            ..Default::default()
        },
        transport.clone(),
        Arc::new(RecordingNotifier::default()),
    );

    ctrl.mount().await;

    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn mount_merges_initial_page_position_when_paginated() {
    let transport = MockTransport::new();
    transport.respond_ok(json!({ "result": [], "total": 0 }));
    let options = RequestOptions {
        paginated: true,
        default_params: Some(params(json!({ "foo": "bar" }))),
        ..Default::default()
    };

    let ctrl = controller(
        options,
        transport.clone(),
        Arc::new(RecordingNotifier::default()),
    );
    ctrl.mount().await;

    assert_eq!(
        transport.requests(),
        vec![json!({ "foo": "bar", "pageNo": 1, "pageSize": 10 })]
    );
}

// ── Keyed-parallel mode ─────────────────────────────────────────────

#[tokio::test]
async fn keyed_run_settles_an_independent_bucket() {
    let transport = MockTransport::new();
    transport.respond_ok(json!({ "name": "morgan" }));
    let options = RequestOptions {
        data_key: Some("id".into()),
        ..Default::default()
    };

    let ctrl = controller(options, transport, Arc::new(RecordingNotifier::default()));
    ctrl.run(Some(params(json!({ "id": 7 })))).await;

    let bucket = ctrl.data_map().get(&BucketKey::Int(7)).expect("bucket");
    assert!(bucket.is_settled());
    assert_eq!(bucket.data.as_deref(), Some(&json!({ "name": "morgan" })));
    assert!(bucket.error.is_none());
}

#[tokio::test]
async fn keyed_run_failure_carries_exactly_the_error() {
    let transport = MockTransport::new();
    transport.respond_err(server_error("database unavailable"));
    let notifier = Arc::new(RecordingNotifier::default());
    let options = RequestOptions {
        data_key: Some("id".into()),
        ..Default::default()
    };

    let ctrl = controller(options, transport, Arc::clone(&notifier));
    ctrl.run(Some(params(json!({ "id": "u-1" })))).await;

    let bucket = ctrl
        .data_map()
        .get(&BucketKey::Text("u-1".into()))
        .expect("bucket");
    assert!(bucket.is_settled());
    assert!(bucket.data.is_none());
    assert_eq!(bucket.error.as_ref().unwrap().status(), Some(500));

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message.as_deref(), Some("database unavailable"));
}

#[tokio::test]
async fn keyed_run_without_the_field_uses_the_null_bucket() {
    let transport = MockTransport::new();
    transport.respond_ok(json!(1));
    let options = RequestOptions {
        data_key: Some("id".into()),
        ..Default::default()
    };

    let ctrl = controller(options, transport, Arc::new(RecordingNotifier::default()));
    ctrl.run(Some(params(json!({ "other": true })))).await;

    assert!(ctrl.data_map().get(&BucketKey::Null).is_some());
}

#[tokio::test]
async fn keyed_mode_never_fires_on_mount() {
    let transport = MockTransport::new();
    // `manual: false` is overridden: keyed-parallel mode cannot auto-run.
    let options = RequestOptions {
        manual: false,
        data_key: Some("id".into()),
        default_params: Some(params(json!({ "id": 1 }))),
        ..Default::default()
    };

    let ctrl = controller(
        options,
        transport.clone(),
        Arc::new(RecordingNotifier::default()),
    );
    ctrl.mount().await;

    assert!(transport.requests().is_empty());
    assert!(ctrl.data_map().is_empty());
}

// ── Paginated mode ──────────────────────────────────────────────────

#[tokio::test]
async fn paginated_run_tracks_pages_and_business_params() {
    let transport = MockTransport::new();
    transport.respond_ok(json!({ "result": ["a", "b"], "total": 42 }));
    transport.respond_ok(json!({ "result": ["c"], "total": 42 }));
    let notifier = Arc::new(RecordingNotifier::default());

    let successes: Arc<Mutex<Vec<(Value, Params)>>> = Arc::default();
    let recorded = Arc::clone(&successes);
    let options = RequestOptions {
        manual: true,
        paginated: true,
        on_success: Some(Box::new(move |data, params| {
            recorded.lock().unwrap().push((data.clone(), params.clone()));
        })),
        ..Default::default()
    };

    let ctrl = controller(options, transport.clone(), notifier);
    ctrl.run(Some(params(json!({ "pageNo": 2, "pageSize": 5, "foo": "bar" }))))
        .await;

    let page = ctrl.page_info();
    assert_eq!((page.page_no, page.page_size, page.total), (2, 5, 42));
    assert_eq!(ctrl.data_snapshot().as_deref(), Some(&json!(["a", "b"])));

    // `on_success` sees the nested result and the business parameters
    // with the paging fields stripped.
    {
        let calls = successes.lock().unwrap();
        assert_eq!(calls[0].0, json!(["a", "b"]));
        assert_eq!(calls[0].1, params(json!({ "foo": "bar" })));
    }

    // A page change re-issues the cached business parameters with the
    // new position and the previous page size.
    ctrl.change_page(Some(3), None).await;

    assert_eq!(
        transport.requests()[1],
        json!({ "foo": "bar", "pageNo": 3, "pageSize": 5 })
    );
    assert_eq!(ctrl.page_info().page_no, 3);
}

#[tokio::test]
async fn paginated_failure_keeps_page_state() {
    let transport = MockTransport::new();
    transport.respond_ok(json!({ "result": [1], "total": 9 }));
    transport.respond_err(not_found());
    let options = RequestOptions {
        manual: true,
        paginated: true,
        ..Default::default()
    };

    let ctrl = controller(options, transport, Arc::new(RecordingNotifier::default()));
    ctrl.run(Some(params(json!({ "pageNo": 1, "pageSize": 10 }))))
        .await;
    ctrl.run(Some(params(json!({ "pageNo": 2, "pageSize": 10 }))))
        .await;

    // The failed run settles the error cell but leaves data and page
    // tracking from the last success alone.
    assert_eq!(ctrl.data_snapshot().as_deref(), Some(&json!([1])));
    assert_eq!(ctrl.page_info().page_no, 1);
    assert!(ctrl.error_snapshot().is_some());
}

// ── Configuration validation ────────────────────────────────────────

#[tokio::test]
async fn keyed_and_paginated_is_rejected_before_any_request() {
    let transport = MockTransport::new();
    let options = RequestOptions {
        paginated: true,
        data_key: Some("id".into()),
        ..Default::default()
    };

    let err = RequestController::new(
        "/api/list",
        options,
        transport.clone(),
        Arc::new(RecordingNotifier::default()),
    )
    .err()
    .expect("configuration error");

    assert_eq!(err, ConfigError::PaginatedKeyedConflict);
    assert!(transport.requests().is_empty());
}
