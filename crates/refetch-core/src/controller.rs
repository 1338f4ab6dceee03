// ── Request controller ──
//
// Wraps one named endpoint with observable loading/error/data state and
// a `run` trigger. The execution mode (single, paginated, keyed-parallel)
// is fixed when the controller is built; each mode has its own run path.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use refetch_http::{Error, Transport};

use crate::config::{ErrorHandler, Mode, RequestOptions, SuccessHandler};
use crate::error::ConfigError;
use crate::notify::{Notifier, classify};
use crate::pagination::{PAGE_NO_FIELD, PAGE_SIZE_FIELD, PageInfo, RESULT_FIELD, TOTAL_FIELD};
use crate::params::Params;
use crate::state::{BucketKey, KeyedStateMap, RequestState};
use crate::stream::StateStream;

/// A data-fetching controller for one endpoint.
///
/// Construction fixes the execution mode and validates the configuration;
/// [`mount()`](Self::mount) fires the automatic first run; [`run()`](Self::run)
/// issues one request and settles the observable state. Request failures
/// never propagate to the caller: they land in the error cell (or bucket),
/// are shown through the injected [`Notifier`], and reported to the
/// `on_error` callback.
///
/// There is no in-flight tracking: overlapping runs race and the last
/// completion wins.
pub struct RequestController<T: Transport> {
    endpoint: String,
    transport: T,
    notifier: Arc<dyn Notifier>,
    mode: Mode,
    manual: bool,
    default_params: Option<Params>,
    loading_delay: Duration,
    on_success: Option<SuccessHandler>,
    on_error: Option<ErrorHandler>,

    // Observable cells (single and paginated modes).
    loading: watch::Sender<bool>,
    data: watch::Sender<Option<Arc<Value>>>,
    error: watch::Sender<Option<Arc<Error>>>,

    // Keyed-parallel buckets.
    data_map: KeyedStateMap,

    // Paginated mode: page position plus the cached business parameters
    // (the last run's parameters minus the paging fields).
    page_info: watch::Sender<PageInfo>,
    business_params: Mutex<Params>,
}

impl<T: Transport> RequestController<T> {
    /// Build a controller for `endpoint`.
    ///
    /// Rejects invalid configurations (keyed + paginated) here, before
    /// any mount or network call can fire. Keyed-parallel mode forces
    /// `manual`: per-key runs only make sense with caller-supplied keys,
    /// so there is nothing an automatic first run could fetch.
    pub fn new(
        endpoint: impl Into<String>,
        options: RequestOptions,
        transport: T,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let mode = Mode::from_options(&options)?;
        let manual = options.manual || matches!(mode, Mode::Keyed(_));

        let (loading, _) = watch::channel(false);
        let (data, _) = watch::channel(None);
        let (error, _) = watch::channel(None);
        let (page_info, _) = watch::channel(PageInfo::default());

        Ok(Self {
            endpoint: endpoint.into(),
            transport,
            notifier,
            mode,
            manual,
            default_params: options.default_params,
            loading_delay: options.loading_delay,
            on_success: options.on_success,
            on_error: options.on_error,
            loading,
            data,
            error,
            data_map: KeyedStateMap::new(),
            page_info,
            business_params: Mutex::new(Params::new()),
        })
    }

    /// The endpoint this controller targets.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Automatic initial run, to be invoked once when the owning UI unit
    /// attaches. No-op when `manual` (always the case in keyed mode).
    ///
    /// In paginated mode the default parameters are merged with the
    /// initial page position.
    pub async fn mount(&self) {
        if self.manual {
            return;
        }

        let params = if self.mode == Mode::Paginated {
            let defaults = self.default_params.clone().unwrap_or_default();
            Some(defaults.merged(&self.page_info.borrow().params()))
        } else {
            self.default_params.clone()
        };

        self.run(params).await;
    }

    // ── Run triggers ─────────────────────────────────────────────────

    /// Issue one request.
    ///
    /// In single and paginated modes a `None` parameter set falls back to
    /// the configured default parameters.
    pub async fn run(&self, params: Option<Params>) {
        self.run_with(params, |_, _| {}).await;
    }

    /// Issue one request with a per-call completion callback.
    ///
    /// The callback fires after `on_success`, on success only, and is not
    /// used in paginated mode.
    pub async fn run_with<F>(&self, params: Option<Params>, callback: F)
    where
        F: FnOnce(&Value, &Params) + Send,
    {
        match &self.mode {
            Mode::Keyed(field) => self.run_keyed(field, params, callback).await,
            Mode::Single => self.run_single(params, callback).await,
            Mode::Paginated => self.run_paginated(params).await,
        }
    }

    /// Re-issue the last paginated run with a new page position.
    ///
    /// Omitted values keep the current `page_no`/`page_size`. The cached
    /// business parameters are merged back in, so filters survive page
    /// changes. Only meaningful in paginated mode.
    pub async fn change_page(&self, page_no: Option<u32>, page_size: Option<u32>) {
        let page = *self.page_info.borrow();
        let params = self
            .cached_business_params()
            .with(PAGE_NO_FIELD, page_no.unwrap_or(page.page_no))
            .with(PAGE_SIZE_FIELD, page_size.unwrap_or(page.page_size));

        self.run(Some(params)).await;
    }

    // ── Mode-specific run paths ──────────────────────────────────────

    async fn run_keyed<F>(&self, field: &str, params: Option<Params>, callback: F)
    where
        F: FnOnce(&Value, &Params) + Send,
    {
        let key = BucketKey::from_field(params.as_ref().and_then(|p| p.get(field)));
        debug!(endpoint = %self.endpoint, key = %key, "dispatching keyed request");

        // Replace the bucket up front so observers see a clean pending
        // state, never a loading flag next to a previous run's outcome.
        self.data_map.put(key.clone(), RequestState::pending());

        let params = params.unwrap_or_default();
        match self.request(&params).await {
            Err(err) => {
                let err = Arc::new(err);
                self.data_map
                    .put(key, RequestState::failure(Arc::clone(&err)));
                self.report_failure(&err);
            }
            Ok(result) => {
                let result = Arc::new(result);
                self.data_map
                    .put(key, RequestState::success(Arc::clone(&result)));
                if let Some(on_success) = &self.on_success {
                    on_success(&result, &params);
                }
                callback(&result, &params);
            }
        }
    }

    async fn run_single<F>(&self, params: Option<Params>, callback: F)
    where
        F: FnOnce(&Value, &Params) + Send,
    {
        let params = self.effective_params(params);
        debug!(endpoint = %self.endpoint, "dispatching request");

        self.loading.send_replace(true);
        let outcome = self.request(&params).await;
        self.loading.send_replace(false);

        match outcome {
            Err(err) => {
                let err = Arc::new(err);
                self.error.send_replace(Some(Arc::clone(&err)));
                self.report_failure(&err);
            }
            Ok(result) => {
                let result = Arc::new(result);
                self.data.send_replace(Some(Arc::clone(&result)));
                if let Some(on_success) = &self.on_success {
                    on_success(&result, &params);
                }
                callback(&result, &params);
            }
        }
    }

    async fn run_paginated(&self, params: Option<Params>) {
        let params = self.effective_params(params);
        debug!(endpoint = %self.endpoint, "dispatching paginated request");

        self.loading.send_replace(true);
        let outcome = self.request(&params).await;
        self.loading.send_replace(false);

        match outcome {
            Err(err) => {
                let err = Arc::new(err);
                self.error.send_replace(Some(Arc::clone(&err)));
                self.report_failure(&err);
            }
            Ok(result) => {
                // Cache the business half of the parameters for page
                // changes; a copy, so the caller's set is never touched.
                let business = params.without(&[PAGE_NO_FIELD, PAGE_SIZE_FIELD]);
                *self
                    .business_params
                    .lock()
                    .expect("business params lock poisoned") = business.clone();

                // Page position comes from the request, total from the
                // response; paginated endpoints nest the page under
                // `result`.
                let list = Arc::new(result.get(RESULT_FIELD).cloned().unwrap_or(Value::Null));
                self.page_info.send_modify(|page| {
                    if let Some(n) = read_u32(&params, PAGE_NO_FIELD) {
                        page.page_no = n;
                    }
                    if let Some(n) = read_u32(&params, PAGE_SIZE_FIELD) {
                        page.page_size = n;
                    }
                    if let Some(total) = result.get(TOTAL_FIELD).and_then(Value::as_u64) {
                        page.total = total;
                    }
                });

                self.data.send_replace(Some(Arc::clone(&list)));
                if let Some(on_success) = &self.on_success {
                    on_success(&list, &business);
                }
            }
        }
    }

    // ── Request primitive ────────────────────────────────────────────

    /// One transport call, held back so it resolves no sooner than
    /// `loading_delay` after dispatch. Responses slower than the delay
    /// are delivered as-is.
    async fn request(&self, params: &Params) -> Result<Value, Error> {
        let started = Instant::now();
        let outcome = self
            .transport
            .send(&self.endpoint, params.clone().into_value())
            .await;

        if let Some(remaining) = self.loading_delay.checked_sub(started.elapsed()) {
            if !remaining.is_zero() {
                tokio::time::sleep(remaining).await;
            }
        }

        outcome
    }

    fn effective_params(&self, params: Option<Params>) -> Params {
        params
            .or_else(|| self.default_params.clone())
            .unwrap_or_default()
    }

    fn cached_business_params(&self) -> Params {
        self.business_params
            .lock()
            .expect("business params lock poisoned")
            .clone()
    }

    /// Notify and invoke the error callback; state is already settled.
    fn report_failure(&self, err: &Arc<Error>) {
        warn!(endpoint = %self.endpoint, error = %err, "request failed");
        self.notifier.show(classify(err));
        if let Some(on_error) = &self.on_error {
            on_error(err);
        }
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to the result cell.
    pub fn data(&self) -> StateStream<Option<Arc<Value>>> {
        StateStream::new(self.data.subscribe())
    }

    /// Subscribe to the loading cell.
    pub fn loading(&self) -> StateStream<bool> {
        StateStream::new(self.loading.subscribe())
    }

    /// Subscribe to the error cell.
    pub fn error(&self) -> StateStream<Option<Arc<Error>>> {
        StateStream::new(self.error.subscribe())
    }

    /// The keyed-parallel bucket store.
    pub fn data_map(&self) -> &KeyedStateMap {
        &self.data_map
    }

    /// Subscribe to page position changes.
    pub fn pagination(&self) -> StateStream<PageInfo> {
        StateStream::new(self.page_info.subscribe())
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn data_snapshot(&self) -> Option<Arc<Value>> {
        self.data.borrow().clone()
    }

    pub fn error_snapshot(&self) -> Option<Arc<Error>> {
        self.error.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn page_info(&self) -> PageInfo {
        *self.page_info.borrow()
    }
}

fn read_u32(params: &Params, field: &str) -> Option<u32> {
    params
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}
