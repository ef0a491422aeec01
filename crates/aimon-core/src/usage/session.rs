//! One cancellable run of the usage data source.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::fetcher::{FetchError, UsageSource};

/// Raw data-source output, unparsed
pub type RawPayload = String;

/// How a session ended. Exactly one per session.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The source produced output
    Completed(RawPayload),
    /// The source failed
    Failed(FetchError),
    /// A newer session superseded this one; not an error
    Cancelled,
}

/// A single fetch attempt with cooperative cancellation.
pub struct FetchSession {
    generation: u64,
    source: Arc<dyn UsageSource>,
    timeout: Option<Duration>,
}

impl FetchSession {
    /// Create a session; nothing runs until [`FetchSession::run`]
    pub fn new(generation: u64, source: Arc<dyn UsageSource>, timeout: Option<Duration>) -> Self {
        Self {
            generation,
            source,
            timeout,
        }
    }

    /// Generation number assigned by the controller
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run the source to completion unless `cancel` fires first.
    ///
    /// Cancellation drops the in-flight fetch, which for [`super::CommandSource`]
    /// kills the child process.
    pub async fn run(self, cancel: CancellationToken) -> SessionOutcome {
        debug!(generation = self.generation, "Fetch session started");

        let fetch = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, self.source.fetch())
                    .await
                    .unwrap_or(Err(FetchError::Timeout(limit))),
                None => self.source.fetch().await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(generation = self.generation, "Fetch session cancelled");
                SessionOutcome::Cancelled
            }
            result = fetch => match result {
                Ok(payload) => SessionOutcome::Completed(payload),
                Err(e) => SessionOutcome::Failed(e),
            },
        }
    }
}
