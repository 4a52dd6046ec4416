//! Commission worker actor.
//!
//! The executor hands each successful client order to this worker and moves
//! on. Jobs are processed one at a time in arrival order; a job that fails
//! inside the ledger is logged there and does not affect the next one.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use groupdesk_core::{AdvisorId, CommissionRate, OrderId};
use groupdesk_telemetry::Metrics;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::CommissionLedger;

/// One commission to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionJob {
    pub order_id: OrderId,
    pub advisor_id: AdvisorId,
    /// The client's snapshotted rate.
    pub rate: CommissionRate,
}

// ============================================================================
// CommissionMsg
// ============================================================================

#[derive(Debug)]
pub enum CommissionMsg {
    Track(CommissionJob),

    /// Reply once every earlier job has been processed.
    Flush(oneshot::Sender<()>),

    Shutdown,
}

// ============================================================================
// CommissionWorkerTask
// ============================================================================

pub struct CommissionWorkerTask {
    rx: mpsc::Receiver<CommissionMsg>,
    ledger: Arc<CommissionLedger>,
}

impl CommissionWorkerTask {
    pub async fn run(mut self) {
        debug!("Commission worker started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                CommissionMsg::Track(job) => {
                    self.ledger
                        .track_advisor_commission(job.order_id, job.advisor_id, job.rate)
                        .await;
                }
                CommissionMsg::Flush(reply) => {
                    let _ = reply.send(());
                }
                CommissionMsg::Shutdown => {
                    debug!("Commission worker shutting down");
                    break;
                }
            }
        }
    }
}

// ============================================================================
// CommissionTrackerHandle
// ============================================================================

#[derive(Clone, Debug)]
pub struct CommissionTrackerHandle {
    tx: mpsc::Sender<CommissionMsg>,
}

impl CommissionTrackerHandle {
    /// Queue a job without waiting. A full or closed queue drops the job
    /// with a warning.
    pub fn track(&self, job: CommissionJob) {
        let order_id = job.order_id.clone();
        if let Err(e) = self.try_track(job) {
            warn!(order_id = %order_id, error = %e, "Commission job dropped");
            Metrics::commission_skipped("queue_full");
        }
    }

    pub fn try_track(&self, job: CommissionJob) -> LedgerResult<()> {
        self.tx
            .try_send(CommissionMsg::Track(job))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => LedgerError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => LedgerError::Closed,
            })
    }

    /// Wait until every job queued before this call has been processed.
    pub async fn flush(&self) -> LedgerResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(CommissionMsg::Flush(reply_tx))
            .await
            .map_err(|_| LedgerError::Closed)?;
        reply_rx.await.map_err(|_| LedgerError::Closed)
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(CommissionMsg::Shutdown).await;
    }
}

/// Spawn the commission worker.
pub fn spawn_commission_worker(
    ledger: Arc<CommissionLedger>,
    capacity: usize,
) -> (CommissionTrackerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = CommissionWorkerTask { rx, ledger };
    let join = tokio::spawn(task.run());
    (CommissionTrackerHandle { tx }, join)
}
