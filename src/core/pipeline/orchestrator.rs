use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use super::stage::{PipelineRun, PipelineStage};
use crate::core::assessment::{AssessmentError, PronunciationAssessor};
use crate::core::audio::{self, AudioBlob, ConversionError};
use crate::core::scoring::{BandScore, BandScorer, ScoringError};
use crate::core::stt::{Transcriber, TranscriptionError};

/// Combined result returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub whisper_result: Value,
    pub pronunciation_result: Value,
    #[serde(rename = "IELTS_band_score")]
    pub ielts_band_score: BandScore,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Audio conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Pronunciation assessment failed: {0}")]
    Assessment(#[from] AssessmentError),

    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),
}

impl PipelineError {
    /// The stage that was running when the error occurred.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Transcription(_) => PipelineStage::Transcribing,
            Self::Conversion(_) => PipelineStage::Normalizing,
            Self::Assessment(_) => PipelineStage::Assessing,
            Self::Scoring(_) => PipelineStage::Scoring,
        }
    }

    /// True when the failure comes from missing credentials or endpoints
    /// rather than from the request or an upstream service.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Transcription(TranscriptionError::Configuration(_))
                | Self::Assessment(AssessmentError::Configuration(_))
                | Self::Scoring(ScoringError::Configuration(_))
        )
    }
}

/// Runs transcription, normalization, assessment and scoring for one upload.
#[derive(Clone)]
pub struct AssessmentPipeline {
    transcriber: Arc<dyn Transcriber>,
    assessor: Arc<dyn PronunciationAssessor>,
    scorer: Arc<dyn BandScorer>,
}

impl AssessmentPipeline {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        assessor: Arc<dyn PronunciationAssessor>,
        scorer: Arc<dyn BandScorer>,
    ) -> Self {
        Self {
            transcriber,
            assessor,
            scorer,
        }
    }

    fn failed(run: &mut PipelineRun, error: impl Into<PipelineError>) -> PipelineError {
        let error = error.into();
        run.fail(error.to_string());
        error
    }

    pub async fn run(&self, audio: AudioBlob) -> Result<AssessmentReport, PipelineError> {
        let mut run = PipelineRun::start();

        run.advance();
        let transcription = self
            .transcriber
            .transcribe(&audio)
            .await
            .map_err(|e| Self::failed(&mut run, e))?;

        run.advance();
        let data = audio.data.clone();
        let normalized = tokio::task::spawn_blocking(move || audio::normalize(&data))
            .await
            .map_err(|e| Self::failed(&mut run, ConversionError::Task(e.to_string())))?
            .map_err(|e| Self::failed(&mut run, e))?;

        run.advance();
        let assessment = self
            .assessor
            .assess(&transcription.text, normalized)
            .await
            .map_err(|e| Self::failed(&mut run, e))?;

        run.advance();
        let band = self
            .scorer
            .score(&transcription.text, assessment.pron_score)
            .await
            .map_err(|e| Self::failed(&mut run, e))?;

        run.advance();
        info!(
            run_id = run.id(),
            pron_score = assessment.pron_score,
            band = %band,
            "Assessment complete"
        );

        Ok(AssessmentReport {
            whisper_result: transcription.raw,
            pronunciation_result: assessment.raw,
            ielts_band_score: band,
        })
    }
}
