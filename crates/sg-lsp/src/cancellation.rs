//! Request cancellation (§5): a registry mapping JSON-RPC request IDs to
//! atomic cancellation flags, driven by incoming `$/cancelRequest`
//! notifications and consulted cooperatively by query routers and the
//! Analyzer's cancel handle.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

/// A single request's cancellation flag. Cloning shares the same
/// underlying flag.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

fn request_key(id: &Value) -> String {
    format!("{id:?}")
}

/// Thread-safe map from request ID to its cancellation token, guarded by
/// a single `parking_lot::Mutex` (held only for the short critical
/// sections of register/cancel/remove).
#[derive(Default)]
pub struct CancellationRegistry {
    tokens: Mutex<HashMap<String, CancellationToken>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh token for an in-flight request, returning it.
    pub fn register(&self, request_id: &Value) -> CancellationToken {
        let token = CancellationToken::new();
        self.tokens.lock().insert(request_key(request_id), token.clone());
        token
    }

    /// Handle a `$/cancelRequest` for `request_id`; no-op if unknown (the
    /// request may have already completed).
    pub fn cancel(&self, request_id: &Value) {
        if let Some(token) = self.tokens.lock().get(&request_key(request_id)) {
            token.cancel();
        }
    }

    pub fn is_cancelled(&self, request_id: &Value) -> bool {
        self.tokens.lock().get(&request_key(request_id)).map(CancellationToken::is_cancelled).unwrap_or(false)
    }

    /// Drop bookkeeping for a completed request.
    pub fn remove(&self, request_id: &Value) {
        self.tokens.lock().remove(&request_key(request_id));
    }

    pub fn active_count(&self) -> usize {
        self.tokens.lock().len()
    }
}

/// Adds a cancellation checkpoint: returns from the enclosing function
/// with `$err` when `$token` has been cancelled.
#[macro_export]
macro_rules! check_cancellation {
    ($token:expr, $err:expr) => {
        if $token.is_cancelled() {
            return $err;
        }
    };
}

/// RAII guard that removes a request's cancellation bookkeeping when the
/// request finishes, regardless of how the handler returns.
pub struct RequestCleanupGuard<'a> {
    registry: &'a CancellationRegistry,
    request_id: Option<Value>,
}

impl<'a> RequestCleanupGuard<'a> {
    pub fn new(registry: &'a CancellationRegistry, request_id: Value) -> Self {
        Self { registry, request_id: Some(request_id) }
    }
}

impl Drop for RequestCleanupGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.request_id.take() {
            self.registry.remove(&id);
        }
    }
}
