use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, error, info, warn};

use crate::broker::{EventLog, LogMessage};
use crate::catalog;
use crate::categorizer::Ruleset;
use crate::error::{Result, TellerError};
use crate::models::TransactionEvent;
use crate::writer;

/// Backoff before re-polling after a transient failure, so an unavailable
/// store does not turn into a hot redelivery loop.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Cooperative cancellation flag, checked between messages. An in-flight
/// message always finishes classify → resolve → write → commit.
#[derive(Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, PartialEq)]
pub enum StopReason {
    Shutdown,
    Drained,
}

enum Outcome {
    Processed,
    Malformed(serde_json::Error),
    Retry(TellerError),
    Fatal(TellerError),
}

pub struct Consumer<L: EventLog> {
    log: L,
    conn: Connection,
    ruleset: Ruleset,
    poll_timeout: Duration,
    drain: bool,
    shutdown: Shutdown,
}

impl<L: EventLog> Consumer<L> {
    pub fn new(
        log: L,
        conn: Connection,
        ruleset: Ruleset,
        poll_timeout: Duration,
        drain: bool,
        shutdown: Shutdown,
    ) -> Self {
        Self { log, conn, ruleset, poll_timeout, drain, shutdown }
    }

    /// The ingestion loop: poll → deserialize → classify → resolve → write
    /// → commit. Returns `Ok` on shutdown or drain, `Err` only when faulted
    /// on an unrecoverable error.
    pub async fn run(&mut self) -> Result<StopReason> {
        info!("consumer started");
        loop {
            if self.shutdown.is_cancelled() {
                info!("shutdown requested, consumer stopping");
                return Ok(StopReason::Shutdown);
            }

            let polled = match self.log.poll(self.poll_timeout).await {
                Ok(polled) => polled,
                Err(e) => {
                    warn!(error = %e, "poll failed, backing off");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                    continue;
                }
            };
            let Some(msg) = polled else {
                if self.drain {
                    info!("log drained, consumer stopping");
                    return Ok(StopReason::Drained);
                }
                debug!("empty poll");
                continue;
            };

            match self.process(&msg) {
                Outcome::Processed => self.commit(&msg).await,
                Outcome::Malformed(e) => {
                    // A malformed payload never deserializes on retry;
                    // advance past it instead of wedging the partition.
                    warn!(offset = msg.offset, error = %e, "malformed payload, skipping");
                    self.commit(&msg).await;
                }
                Outcome::Retry(e) => {
                    warn!(
                        offset = msg.offset,
                        error = %e,
                        "processing failed, leaving message uncommitted for redelivery"
                    );
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Outcome::Fatal(e) => {
                    error!(offset = msg.offset, error = %e, "consumer faulted");
                    return Err(e);
                }
            }
        }
    }

    fn process(&self, msg: &LogMessage) -> Outcome {
        let event: TransactionEvent = match serde_json::from_str(&msg.payload) {
            Ok(event) => event,
            Err(e) => return Outcome::Malformed(e),
        };

        let category = self.ruleset.classify(event.description.as_deref().unwrap_or(""));
        let category_id = match catalog::resolve(&self.conn, category) {
            Ok(id) => id,
            Err(e @ TellerError::CatalogInconsistent(_)) => return Outcome::Fatal(e),
            Err(e) => return Outcome::Retry(e),
        };

        match writer::write(&self.conn, &event, category_id) {
            Ok(row_id) => {
                info!(offset = msg.offset, category, row_id, "transaction ingested");
                Outcome::Processed
            }
            Err(e) => Outcome::Retry(e),
        }
    }

    async fn commit(&mut self, msg: &LogMessage) {
        // A failed commit is not fatal: the message was fully processed and
        // will simply be redelivered, which is the documented duplicate
        // window of this pipeline.
        if let Err(e) = self.log.commit(msg).await {
            warn!(offset = msg.offset, error = %e, "offset commit failed, message may be redelivered");
            tokio::time::sleep(RETRY_BACKOFF).await;
        }
    }
}
