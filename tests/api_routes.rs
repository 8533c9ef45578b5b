//! Route tests
//!
//! Drives the public router end to end with in-process stand-ins for every
//! upstream service.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use bytes::Bytes;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use pronunciation_gateway::core::assessment::{
    AssessmentError, AssessmentOutput, PronunciationAssessor,
};
use pronunciation_gateway::core::audio::{AudioBlob, NormalizedAudio};
use pronunciation_gateway::core::pipeline::AssessmentPipeline;
use pronunciation_gateway::core::scoring::{BandScore, BandScorer, ScoringError};
use pronunciation_gateway::core::stt::{Transcriber, TranscriptionError, TranscriptionOutput};
use pronunciation_gateway::core::token::{TokenError, TokenIssuer};
use pronunciation_gateway::core::tts::{
    CancellationReason, SpeechSynthesizer, SynthesisError, SynthesisOutput,
};
use pronunciation_gateway::{ServerConfig, handlers, routes, state::AppState};

const BOUNDARY: &str = "gateway-test-boundary";

struct FixedTranscriber {
    fail: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &AudioBlob) -> Result<TranscriptionOutput, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TranscriptionError::Upstream {
                status: 500,
                body: "whisper unavailable".to_string(),
            });
        }
        Ok(TranscriptionOutput {
            text: "nothing goes as planned".to_string(),
            raw: json!({ "text": "nothing goes as planned" }),
        })
    }
}

struct FixedAssessor {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PronunciationAssessor for FixedAssessor {
    async fn assess(
        &self,
        reference_text: &str,
        audio: NormalizedAudio,
    ) -> Result<AssessmentOutput, AssessmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(reference_text, "nothing goes as planned");
        assert!(audio.frames() > 0);
        Ok(AssessmentOutput {
            pron_score: 82.0,
            raw: json!({
                "RecognitionStatus": "Success",
                "NBest": [{ "PronScore": 82.0 }]
            }),
        })
    }
}

struct FixedScorer;

#[async_trait]
impl BandScorer for FixedScorer {
    async fn score(&self, _transcript: &str, pron_score: f64) -> Result<BandScore, ScoringError> {
        assert_eq!(pron_score, 82.0);
        Ok(BandScore::parse("7").unwrap())
    }
}

struct FixedTokens {
    fail: bool,
}

#[async_trait]
impl TokenIssuer for FixedTokens {
    async fn issue_token(&self) -> Result<String, TokenError> {
        if self.fail {
            Err(TokenError::Upstream {
                status: 401,
                body: "bad key".to_string(),
            })
        } else {
            Ok("speech-token".to_string())
        }
    }
}

struct FixedSynthesizer {
    fail: bool,
}

#[async_trait]
impl SpeechSynthesizer for FixedSynthesizer {
    async fn synthesize_with_word_boundaries(
        &self,
        text: &str,
    ) -> Result<SynthesisOutput, SynthesisError> {
        if self.fail {
            return Err(SynthesisError::Canceled {
                reason: CancellationReason::Error,
                details: "connection closed".to_string(),
            });
        }
        assert_eq!(text, "Hello world");
        Ok(SynthesisOutput {
            audio: Bytes::from_static(b"RIFF-sentence"),
            word_offsets_ms: vec![100.0, 512.5],
        })
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes, SynthesisError> {
        if self.fail {
            return Err(SynthesisError::Canceled {
                reason: CancellationReason::EndOfStream,
                details: "no audio".to_string(),
            });
        }
        assert_eq!(text, "planned");
        Ok(Bytes::from_static(b"RIFF-word"))
    }
}

struct Harness {
    app: Router,
    transcriptions: Arc<AtomicUsize>,
    assessments: Arc<AtomicUsize>,
}

fn harness(fail: bool) -> Harness {
    let transcriptions = Arc::new(AtomicUsize::new(0));
    let assessments = Arc::new(AtomicUsize::new(0));
    let pipeline = AssessmentPipeline::new(
        Arc::new(FixedTranscriber {
            fail,
            calls: transcriptions.clone(),
        }),
        Arc::new(FixedAssessor {
            calls: assessments.clone(),
        }),
        Arc::new(FixedScorer),
    );
    let state = AppState::from_parts(
        ServerConfig::default(),
        pipeline,
        Arc::new(FixedTokens { fail }),
        Arc::new(FixedSynthesizer { fail }),
    );
    let app = Router::new()
        .route("/health", get(handlers::api::health_check))
        .merge(routes::api::create_api_router())
        .with_state(state);

    Harness {
        app,
        transcriptions,
        assessments,
    }
}

/// Half a second of a 440 Hz tone at 16 kHz mono.
fn tone_wav() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for n in 0..8000 {
            let t = n as f32 / 16000.0;
            let sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
            writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: audio/wav\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn form_request(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = harness(false)
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn test_ackaud_returns_merged_report() {
    let harness = harness(false);
    let wav = tone_wav();
    let request = multipart_request(
        "/ackaud",
        multipart_body(&[("audio", Some("recording.wav"), &wav)]),
    );

    let response = harness.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["whisper_result"]["text"], "nothing goes as planned");
    assert_eq!(body["pronunciation_result"]["NBest"][0]["PronScore"], 82.0);
    assert_eq!(body["IELTS_band_score"], "7");
    assert_eq!(harness.transcriptions.load(Ordering::SeqCst), 1);
    assert_eq!(harness.assessments.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ackaud_without_audio_is_bad_request() {
    let harness = harness(false);
    let request = multipart_request(
        "/ackaud",
        multipart_body(&[("reftext", None, b"hello")]),
    );

    let response = harness.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("No audio"));
    assert_eq!(harness.transcriptions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ackaud_with_empty_audio_is_bad_request() {
    let harness = harness(false);
    let request = multipart_request(
        "/ackaud",
        multipart_body(&[("audio", Some("empty.wav"), b"")]),
    );

    let response = harness.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.transcriptions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ackaud_rejects_non_multipart_body() {
    let response = harness(false)
        .app
        .oneshot(form_request("/ackaud", "audio=abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ackaud_pipeline_failure_is_server_error() {
    let harness = harness(true);
    let wav = tone_wav();
    let request = multipart_request(
        "/ackaud",
        multipart_body(&[("audio", Some("recording.wav"), &wav)]),
    );

    let response = harness.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Transcription failed"));
    assert_eq!(harness.transcriptions.load(Ordering::SeqCst), 1);
    assert_eq!(harness.assessments.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_gettoken_returns_token() {
    let response = harness(false)
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/gettoken")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "at": "speech-token" }));
}

#[tokio::test]
async fn test_gettoken_upstream_failure_is_bad_gateway() {
    let response = harness(true)
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/gettoken")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_gettts_returns_audio_with_offsets() {
    let response = harness(false)
        .app
        .oneshot(form_request("/gettts", "reftext=Hello+world"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=sound.wav"
    );
    let offsets: Vec<f64> =
        serde_json::from_str(headers["offsets"].to_str().unwrap()).unwrap();
    assert_eq!(offsets, vec![100.0, 512.5]);
    assert_eq!(body_bytes(response).await, Bytes::from_static(b"RIFF-sentence"));
}

#[tokio::test]
async fn test_gettts_accepts_multipart_text() {
    let response = harness(false)
        .app
        .oneshot(multipart_request(
            "/gettts",
            multipart_body(&[("reftext", None, b"Hello world")]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("offsets").is_some());
}

#[tokio::test]
async fn test_gettts_failure_reports_unsuccessful() {
    let response = harness(true)
        .app
        .oneshot(form_request("/gettts", "reftext=Hello+world"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": false }));
}

#[tokio::test]
async fn test_gettts_without_reftext_reports_unsuccessful() {
    let response = harness(false)
        .app
        .oneshot(form_request("/gettts", "other=value"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": false }));
}

#[tokio::test]
async fn test_getttsforword_returns_audio_without_offsets() {
    let response = harness(false)
        .app
        .oneshot(form_request("/getttsforword", "word=planned"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("offsets").is_none());
    assert_eq!(body_bytes(response).await, Bytes::from_static(b"RIFF-word"));
}

#[tokio::test]
async fn test_getttsforword_failure_reports_unsuccessful() {
    let response = harness(true)
        .app
        .oneshot(form_request("/getttsforword", "word=planned"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": false }));
}
