//! Staged progress indicator for an in-flight send.
//!
//! The endpoint reports nothing until it answers, so progress is simulated:
//! a background task walks through fixed stages on a timer and stalls at the
//! last one. `finish` jumps to 100 once the send has resolved, whatever the
//! outcome. Progress never decreases.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub label: &'static str,
}

pub const STARTING: ProgressUpdate = ProgressUpdate {
    percent: 0,
    label: "Starting...",
};

pub const COMPLETE: ProgressUpdate = ProgressUpdate {
    percent: 100,
    label: "Complete!",
};

/// Reached in order while the request is outstanding.
pub const STAGES: [ProgressUpdate; 4] = [
    ProgressUpdate {
        percent: 20,
        label: "Validating phone numbers...",
    },
    ProgressUpdate {
        percent: 40,
        label: "Preparing messages...",
    },
    ProgressUpdate {
        percent: 60,
        label: "Connecting to SMS service...",
    },
    ProgressUpdate {
        percent: 80,
        label: "Sending messages...",
    },
];

pub struct ProgressIndicator {
    tx: Arc<watch::Sender<ProgressUpdate>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressIndicator {
    /// Start advancing one stage per `interval`.
    pub fn start(interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(STARTING);
        let tx = Arc::new(tx);
        let cancel = CancellationToken::new();

        let task = {
            let tx = Arc::clone(&tx);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                for stage in STAGES {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(interval) => {}
                    }
                    tx.send_if_modified(|current| advance(current, stage));
                }
            })
        };

        Self { tx, cancel, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressUpdate> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ProgressUpdate {
        *self.tx.borrow()
    }

    /// Stop the stage timer and report completion.
    pub async fn finish(mut self) -> ProgressUpdate {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            debug!("Progress task ended abnormally: {}", e);
        }
        self.tx.send_replace(COMPLETE);
        COMPLETE
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Move forward to `next`; never backwards.
fn advance(current: &mut ProgressUpdate, next: ProgressUpdate) -> bool {
    if next.percent > current.percent {
        *current = next;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_walks_stages_in_order_then_stalls() {
        let indicator = ProgressIndicator::start(Duration::from_millis(800));
        assert_eq!(indicator.current(), STARTING);

        let mut rx = indicator.subscribe();
        let mut seen = Vec::new();
        for _ in 0..STAGES.len() {
            rx.changed().await.unwrap();
            seen.push(*rx.borrow_and_update());
        }
        assert_eq!(seen, STAGES.to_vec());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(indicator.current().percent, 80);

        assert_eq!(indicator.finish().await, COMPLETE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_before_first_stage_jumps_to_complete() {
        let indicator = ProgressIndicator::start(Duration::from_millis(800));
        let rx = indicator.subscribe();

        assert_eq!(indicator.finish().await, COMPLETE);
        assert_eq!(*rx.borrow(), COMPLETE);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut current = STAGES[2];
        assert!(!advance(&mut current, STAGES[1]));
        assert_eq!(current, STAGES[2]);
        assert!(advance(&mut current, COMPLETE));
        assert_eq!(current.percent, 100);
    }
}
