// ── Observable request state ──
//
// `RequestState` is the per-scope outcome record; `KeyedStateMap` is the
// keyed-parallel store: lock-free concurrent buckets with push-based
// change notification via `watch` channels. Buckets are always replaced
// wholesale, so observers never see a loading flag paired with stale data.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::watch;

use crate::stream::StateStream;

/// Identifies one bucket in keyed-parallel mode.
///
/// Derived from the value of the configured key field in a run's
/// parameters. Runs whose parameters omit the field share the `Null`
/// bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketKey {
    Null,
    Int(i64),
    Text(String),
}

impl BucketKey {
    /// Derive a key from a parameter field value.
    pub(crate) fn from_field(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Null,
            Some(Value::Number(n)) => n
                .as_i64()
                .map_or_else(|| Self::Text(n.to_string()), Self::Int),
            Some(Value::String(s)) => Self::Text(s.clone()),
            Some(other) => Self::Text(other.to_string()),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// The outcome of the most recent request for one scope.
///
/// A settled state carries exactly one of `data`/`error`; a pending state
/// carries neither.
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    pub loading: bool,
    pub data: Option<Arc<Value>>,
    pub error: Option<Arc<refetch_http::Error>>,
}

impl RequestState {
    /// A run has been dispatched and nothing has completed yet.
    pub(crate) fn pending() -> Self {
        Self {
            loading: true,
            data: None,
            error: None,
        }
    }

    pub(crate) fn success(data: Arc<Value>) -> Self {
        Self {
            loading: false,
            data: Some(data),
            error: None,
        }
    }

    pub(crate) fn failure(error: Arc<refetch_http::Error>) -> Self {
        Self {
            loading: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.loading
    }
}

/// Whole-map snapshot type vended to subscribers.
pub type MapSnapshot = Arc<HashMap<BucketKey, Arc<RequestState>>>;

/// Reactive bucket store for keyed-parallel mode.
///
/// Buckets are created lazily on first use of a key, overwritten in full
/// on every subsequent run for that key, and never removed. Every write
/// bumps a version counter and rebuilds the snapshot that subscribers
/// receive.
pub struct KeyedStateMap {
    buckets: DashMap<BucketKey, Arc<RequestState>>,
    version: watch::Sender<u64>,
    snapshot: watch::Sender<MapSnapshot>,
}

impl KeyedStateMap {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(HashMap::new()));

        Self {
            buckets: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Replace the bucket for `key` wholesale.
    pub(crate) fn put(&self, key: BucketKey, state: RequestState) {
        self.buckets.insert(key, Arc::new(state));
        self.rebuild_snapshot();
        self.version.send_modify(|v| *v += 1);
    }

    /// Look up one bucket.
    pub fn get(&self, key: &BucketKey) -> Option<Arc<RequestState>> {
        self.buckets.get(key).map(|r| Arc::clone(r.value()))
    }

    /// The current whole-map snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> MapSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> StateStream<MapSnapshot> {
        StateStream::new(self.snapshot.subscribe())
    }

    /// Subscribe to the write counter. Bumped once per bucket write, so
    /// observers that only need "something changed" can watch a `u64`
    /// instead of cloning snapshots.
    pub fn version(&self) -> StateStream<u64> {
        StateStream::new(self.version.subscribe())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Collect all current snapshots into a fresh map and broadcast it.
    fn rebuild_snapshot(&self) {
        let map: HashMap<BucketKey, Arc<RequestState>> = self
            .buckets
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(map));
    }
}
