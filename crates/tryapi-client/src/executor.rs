//! Per-operation request execution with cancel-and-replace semantics

use crate::{ExecutedResponse, HttpTransport, Result};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tryapi_core::RequestDescriptor;
use tryapi_telemetry::{RequestSpanAttributes, trace_request_execution};

/// What happened to one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The response was received and cached
    Completed(ExecutedResponse),
    /// A newer execution or a clear replaced this one; its result was dropped
    Superseded,
}

#[derive(Debug)]
struct ExecutionEntry {
    generation: u64,
    token: CancellationToken,
    pending: bool,
    response: Option<ExecutedResponse>,
}

/// Runs requests keyed by operation identifier.
///
/// At most one execution is pending per key. Executing again cancels the
/// pending one instead of queueing behind it, and a completion is written to
/// the cache only if no newer execution or clear happened in the meantime.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    entries: Arc<DashMap<String, ExecutionEntry>>,
    generation: Arc<AtomicU64>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            entries: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Execute `request` for `key`, superseding any pending execution for it.
    pub async fn execute(&self, key: &str, request: &RequestDescriptor) -> Result<ExecutionOutcome> {
        let (generation, token) = self.begin(key);
        let started = Instant::now();

        let result = tokio::select! {
            _ = token.cancelled() => None,
            result = self.transport.send(request) => Some(result),
        };

        let outcome = match result {
            None => Ok(ExecutionOutcome::Superseded),
            Some(Ok(response)) => Ok(self.complete(key, generation, response)),
            Some(Err(e)) => {
                self.fail(key, generation);
                Err(e)
            }
        };

        trace_request_execution(RequestSpanAttributes {
            operation_id: key.to_string(),
            method: request.method.to_string(),
            url: request.url.to_string(),
            status: match &outcome {
                Ok(ExecutionOutcome::Completed(response)) => Some(response.status),
                _ => None,
            },
            outcome: match &outcome {
                Ok(ExecutionOutcome::Completed(_)) => "completed",
                Ok(ExecutionOutcome::Superseded) => "superseded",
                Err(_) => "failed",
            },
            elapsed_ms: started.elapsed().as_millis() as u64,
        });

        outcome
    }

    fn begin(&self, key: &str) -> (u64, CancellationToken) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| ExecutionEntry {
                generation,
                token: token.clone(),
                pending: false,
                response: None,
            });
        if entry.pending {
            debug!(key, superseded = entry.generation, "Cancelling pending execution");
            entry.token.cancel();
        }
        entry.generation = generation;
        entry.token = token.clone();
        entry.pending = true;

        (generation, token)
    }

    fn complete(&self, key: &str, generation: u64, response: ExecutedResponse) -> ExecutionOutcome {
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.generation == generation => {
                info!(key, status = response.status, "Request completed");
                entry.pending = false;
                entry.response = Some(response.clone());
                ExecutionOutcome::Completed(response)
            }
            _ => {
                debug!(key, generation, "Dropping stale response");
                ExecutionOutcome::Superseded
            }
        }
    }

    fn fail(&self, key: &str, generation: u64) {
        if let Some(mut entry) = self.entries.get_mut(key)
            && entry.generation == generation
        {
            entry.pending = false;
        }
    }

    /// Last response received for `key`.
    pub fn cached(&self, key: &str) -> Option<ExecutedResponse> {
        self.entries
            .get(key)
            .and_then(|entry| entry.response.clone())
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.pending)
            .unwrap_or(false)
    }

    /// Forget the response for `key` and cancel its pending execution.
    pub fn clear(&self, key: &str) {
        if let Some((_, entry)) = self.entries.remove(key) {
            entry.token.cancel();
        }
    }

    /// Forget every response, e.g. when another document is loaded.
    pub fn clear_all(&self) {
        for entry in self.entries.iter() {
            entry.token.cancel();
        }
        self.entries.clear();
    }
}
