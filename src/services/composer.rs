//! Campaign composer: validate a draft, send it while reporting progress,
//! and record the resulting campaign.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::defaults::default_progress_interval;
use crate::services::campaign_store::CampaignStore;
use crate::services::progress::{ProgressIndicator, ProgressUpdate};
use crate::services::recipients::{RecipientPipeline, ValidationError};
use crate::services::sender::{CampaignSender, SendError};
use crate::types::{Campaign, MessageSegmentation, RecipientSummary, SendRequest};

/// What the user is about to send
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub message: String,
    pub numbers: Vec<String>,
}

impl Draft {
    pub fn new(message: impl Into<String>, numbers: Vec<String>) -> Self {
        Self {
            message: message.into(),
            numbers,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Send(#[from] SendError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub campaign: Campaign,
    pub message_length: usize,
    pub segmentation: MessageSegmentation,
    pub summary: RecipientSummary,
    /// False when the send succeeded but recording it locally failed
    pub stored: bool,
}

pub struct Composer {
    pipeline: RecipientPipeline,
    sender: Arc<dyn CampaignSender>,
    store: Arc<CampaignStore>,
    progress_interval: Duration,
}

impl Composer {
    pub fn new(
        pipeline: RecipientPipeline,
        sender: Arc<dyn CampaignSender>,
        store: Arc<CampaignStore>,
    ) -> Self {
        Self {
            pipeline,
            sender,
            store,
            progress_interval: default_progress_interval(),
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn pipeline(&self) -> &RecipientPipeline {
        &self.pipeline
    }

    pub async fn submit(&self, draft: Draft) -> Result<SubmitOutcome, SubmitError> {
        self.submit_observed(draft, |_| {}).await
    }

    /// Validate, send and record. `on_progress` sees every stage the
    /// indicator reaches and always ends at 100, success or failure.
    /// Nothing is sent when validation fails.
    pub async fn submit_observed<F>(
        &self,
        draft: Draft,
        mut on_progress: F,
    ) -> Result<SubmitOutcome, SubmitError>
    where
        F: FnMut(ProgressUpdate) + Send,
    {
        self.pipeline
            .validate_submission(&draft.message, &draft.numbers)?;

        let segmentation = self.pipeline.segment_message(&draft.message);
        let summary = self.pipeline.summarize(&draft.numbers);
        info!(
            recipients = summary.total,
            valid = summary.valid,
            parts = segmentation.part_count,
            "Submitting campaign"
        );

        let request = SendRequest::new(draft.message, draft.numbers);

        let indicator = ProgressIndicator::start(self.progress_interval);
        let mut rx = indicator.subscribe();
        on_progress(*rx.borrow_and_update());

        let send = self.sender.send(&request);
        tokio::pin!(send);

        let result = loop {
            tokio::select! {
                result = &mut send => break result,
                changed = rx.changed() => {
                    if changed.is_ok() {
                        on_progress(*rx.borrow_and_update());
                    }
                }
            }
        };

        on_progress(indicator.finish().await);

        let receipt = result.inspect_err(|e| warn!("Campaign send failed: {}", e))?;

        let stored = match self.store.save_campaign(receipt.campaign.clone()) {
            Ok(_) => true,
            Err(e) => {
                error!(campaign_id = %receipt.campaign.id, "Failed to record campaign: {}", e);
                false
            }
        };

        Ok(SubmitOutcome {
            campaign: receipt.campaign,
            message_length: receipt.message_length,
            segmentation,
            summary,
            stored,
        })
    }
}
