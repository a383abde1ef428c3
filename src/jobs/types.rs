use crate::tutor::types::VisualizationPayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

pub const QUEUED_PROGRESS: u8 = 5;
pub const RUNNING_PROGRESS: u8 = 25;
pub const DONE_PROGRESS: u8 = 100;

pub const NOT_FOUND_MESSAGE: &str = "Diagram job not found";

// JobStatus — lifecycle of a diagram job; not_found is only ever synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Error,
    NotFound,
}

impl JobStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::NotFound)
    }

    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running) | (Self::Running, Self::Completed | Self::Error)
        )
    }
}

// DiagramJob — observable state of one background visualization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramJob {
    pub id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub question: Option<String>,
    pub visualization: Option<VisualizationPayload>,
    pub error: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DiagramJob {
    pub fn queued(id: impl Into<String>, question: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            progress: QUEUED_PROGRESS,
            question: Some(question.into()),
            visualization: None,
            error: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::NotFound,
            progress: 0,
            question: None,
            visualization: None,
            error: Some(NOT_FOUND_MESSAGE.to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    /// Apply a transition; illegal ones leave the job untouched.
    pub(crate) fn advance(&mut self, next: JobStatus, progress: u8) -> bool {
        if !self.status.can_transition_to(next) {
            tracing::warn!(job_id = %self.id, from = %self.status, to = %next, "rejected job transition");
            return false;
        }
        self.status = next;
        self.progress = progress;
        self.updated_at = Some(Utc::now());
        true
    }

    pub(crate) fn complete(&mut self, payload: VisualizationPayload) -> bool {
        if !self.advance(JobStatus::Completed, DONE_PROGRESS) {
            return false;
        }
        self.visualization = Some(payload);
        self.error = None;
        true
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.advance(JobStatus::Error, DONE_PROGRESS) {
            return false;
        }
        self.error = Some(message.into());
        true
    }
}
