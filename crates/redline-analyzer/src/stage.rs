//! Pipeline state machine
//!
//! One analysis request moves strictly forward through the stages below.
//! The only early exit is `Received -> Failed`, taken when ingestion or
//! segmentation cannot produce clauses.

use redline_core::{RedlineError, Result};
use tracing::{info, warn};

/// Stage of one analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Segmented,
    Classified,
    Scored,
    Explained,
    Assembled,
    Failed,
}

impl PipelineStage {
    /// Stage that legally follows this one on the success path
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            Self::Received => Some(Self::Segmented),
            Self::Segmented => Some(Self::Classified),
            Self::Classified => Some(Self::Scored),
            Self::Scored => Some(Self::Explained),
            Self::Explained => Some(Self::Assembled),
            Self::Assembled | Self::Failed => None,
        }
    }

    pub fn can_transition_to(&self, to: PipelineStage) -> bool {
        match (self, to) {
            (Self::Received, Self::Failed) => true,
            (from, to) => from.next() == Some(to),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Assembled | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Segmented => "SEGMENTED",
            Self::Classified => "CLASSIFIED",
            Self::Scored => "SCORED",
            Self::Explained => "EXPLAINED",
            Self::Assembled => "ASSEMBLED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks and logs the stage of one request
#[derive(Debug)]
pub struct StageTracker {
    filename: String,
    stage: PipelineStage,
}

impl StageTracker {
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        info!(file = %filename, stage = %PipelineStage::Received, "Analysis received");
        Self {
            filename,
            stage: PipelineStage::Received,
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Move to `to`, rejecting anything but the next legal stage
    pub fn advance(&mut self, to: PipelineStage) -> Result<()> {
        if !self.stage.can_transition_to(to) {
            return Err(RedlineError::InvalidTransition {
                from: self.stage.to_string(),
                to: to.to_string(),
            });
        }

        info!(file = %self.filename, from = %self.stage, to = %to, "Pipeline transition");
        self.stage = to;
        Ok(())
    }

    /// Record a request-fatal error and hand it back to the caller
    pub fn fail(&mut self, error: RedlineError) -> RedlineError {
        if let Err(e) = self.advance(PipelineStage::Failed) {
            return e;
        }
        warn!(file = %self.filename, error = %error, "Analysis failed");
        error
    }
}
