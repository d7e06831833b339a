//! Async host for the coordinator
//!
//! Each execution runs on tokio's blocking pool, gated by a semaphore so at
//! most `max_concurrency` interpreters exist at once. A Lua state cannot be
//! interrupted from outside, so on timeout the runner stops waiting and
//! reports the failure; the abandoned thread holds its permit until it
//! finishes on its own.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::interpreter::{Coordinator, SandboxOptions};
use crate::types::{ExecutionRequest, ExecutionResponse};

#[derive(Debug, Clone)]
pub struct Runner {
    coordinator: Arc<Coordinator>,
    permits: Arc<Semaphore>,
    timeout: Option<Duration>,
}

impl Runner {
    pub fn new(options: SandboxOptions, max_concurrency: usize, timeout: Option<Duration>) -> Self {
        Self {
            coordinator: Arc::new(Coordinator::new(options)),
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let timeout = match config.executor.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        Ok(Self::new(
            config.sandbox_options()?,
            config.executor.max_concurrency,
            timeout,
        ))
    }

    /// Executions that could start right now without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run one request. Always produces a response with `elapsed_ms` set.
    pub async fn run(&self, request: ExecutionRequest) -> ExecutionResponse {
        let id = Uuid::new_v4();
        let started = Instant::now();

        let mut response = self
            .dispatch(request)
            .instrument(info_span!("execution", %id))
            .await;

        response.elapsed_ms = started.elapsed().as_millis() as u64;
        response
    }

    async fn dispatch(&self, request: ExecutionRequest) -> ExecutionResponse {
        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return ExecutionResponse::failed("runner is shut down"),
        };

        let coordinator = Arc::clone(&self.coordinator);
        let span = tracing::Span::current();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            span.in_scope(|| coordinator.execute(&request))
        });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "script timed out");
                    return ExecutionResponse::failed(format!(
                        "script timed out after {}ms",
                        limit.as_millis()
                    ));
                }
            },
            None => handle.await,
        };

        joined.unwrap_or_else(|err| {
            warn!(error = %err, "execution task failed");
            ExecutionResponse::failed(format!("execution aborted: {err}"))
        })
    }

    /// Stop accepting work. Pending and later calls fail fast.
    pub fn close(&self) {
        self.permits.close();
    }
}
