use std::fmt;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

/// Progress of one assessment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Transcribing,
    Normalizing,
    Assessing,
    Scoring,
    Complete,
    Failed(String),
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Transcribing => "transcribing",
            Self::Normalizing => "normalizing",
            Self::Assessing => "assessing",
            Self::Scoring => "scoring",
            Self::Complete => "complete",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed(_))
    }

    fn successor(&self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::Transcribing),
            Self::Transcribing => Some(Self::Normalizing),
            Self::Normalizing => Some(Self::Assessing),
            Self::Assessing => Some(Self::Scoring),
            Self::Scoring => Some(Self::Complete),
            Self::Complete | Self::Failed(_) => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Tracks and logs the stage transitions of a single run.
#[derive(Debug)]
pub struct PipelineRun {
    id: String,
    stage: PipelineStage,
    started: Instant,
}

impl PipelineRun {
    pub fn start() -> Self {
        let run = Self {
            id: Uuid::new_v4().simple().to_string(),
            stage: PipelineStage::Received,
            started: Instant::now(),
        };
        info!(run_id = %run.id, stage = run.stage.name(), "Assessment started");
        run
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stage(&self) -> &PipelineStage {
        &self.stage
    }

    /// Move to the next stage. Terminal runs stay where they are.
    pub fn advance(&mut self) -> &PipelineStage {
        if let Some(next) = self.stage.successor() {
            info!(
                run_id = %self.id,
                from = self.stage.name(),
                to = next.name(),
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "Assessment stage transition"
            );
            self.stage = next;
        }
        &self.stage
    }

    /// Mark the run failed, returning the stage that was active.
    pub fn fail(&mut self, reason: impl Into<String>) -> PipelineStage {
        let reason = reason.into();
        let active = self.stage.clone();
        if !active.is_terminal() {
            warn!(
                run_id = %self.id,
                stage = active.name(),
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "Assessment failed: {}",
                reason
            );
            self.stage = PipelineStage::Failed(reason);
        }
        active
    }
}
