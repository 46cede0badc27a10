//! End-to-end chat flow through the router
//!
//! The first tests wire the real stage backends against mock remote services;
//! the concurrency test uses in-process stages so each reply's audio carries
//! its own text.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tower::ServiceExt;

use voice_relay_config::{Settings, TtsStrategy};
use voice_relay_core::ArtifactStore;
use voice_relay_pipeline::mock::{MockGenerator, MockStt, MockTts};
use voice_relay_pipeline::ChatPipeline;
use voice_relay_server::{create_router, AppState};

struct Remotes {
    gemini: ServerGuard,
    whisper: ServerGuard,
    cloud_tts: ServerGuard,
}

impl Remotes {
    async fn start() -> Self {
        Self {
            gemini: Server::new_async().await,
            whisper: Server::new_async().await,
            cloud_tts: Server::new_async().await,
        }
    }

    fn settings(&self, audio_dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.generation.api_key = Some("gemini-key".into());
        settings.generation.endpoint = self.gemini.url();
        settings.stt.endpoint = self.whisper.url();
        settings.tts.strategy = TtsStrategy::GoogleCloud;
        settings.tts.cloud.endpoint = self.cloud_tts.url();
        settings.tts.cloud.api_key = Some("tts-key".into());
        settings.storage.audio_dir = audio_dir.display().to_string();
        settings.observability.metrics_enabled = false;
        settings
    }
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn text_request(text: &str) -> Request<Body> {
    let body = format!("input_text={}", text.replace(' ', "+"));
    Request::builder()
        .method("POST")
        .uri("/chat/text")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn audio_request(content: &[u8]) -> Request<Body> {
    let boundary = "chatflow";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"speech.wav\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: audio/wav\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/chat/audio")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Path part of an absolute audio URL
fn audio_path(audio_url: &str) -> String {
    let name = audio_url.rsplit('/').next().unwrap();
    format!("/audio/{}", name)
}

async fn fetch(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn gemini_reply(text: &str) -> String {
    json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
}

#[tokio::test]
async fn text_round_trip_with_remote_backends() {
    let mut remotes = Remotes::start().await;
    let gemini = remotes
        .gemini
        .mock("POST", "/v1beta/models/gemini-pro:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "gemini-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_reply("Deep breaths, you got this"))
        .create_async()
        .await;
    let tts = remotes
        .cloud_tts
        .mock("POST", "/v1/text:synthesize")
        .match_query(Matcher::UrlEncoded("key".into(), "tts-key".into()))
        .match_body(Matcher::PartialJson(
            json!({"input": {"text": "Deep breaths, you got this"}}),
        ))
        .with_status(200)
        .with_body(json!({"audioContent": BASE64.encode(b"ID3reply")}).to_string())
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = AppState::from_settings(remotes.settings(dir.path()))
        .await
        .unwrap();
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(text_request("I feel anxious today"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["message"], "I feel anxious today");
    assert_eq!(json["response"], "Deep breaths, you got this");
    let audio_url = json["audio_url"].as_str().unwrap();
    assert!(audio_url.ends_with("-response_google.mp3"));

    let audio = fetch(&app, &audio_path(audio_url)).await;
    assert_eq!(audio.status(), StatusCode::OK);
    assert_eq!(audio.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(body_bytes(audio).await, b"ID3reply");

    gemini.assert_async().await;
    tts.assert_async().await;
}

#[tokio::test]
async fn audio_round_trip_with_remote_backends() {
    let mut remotes = Remotes::start().await;
    let _health = remotes
        .whisper
        .mock("GET", "/health")
        .with_status(200)
        .create_async()
        .await;
    let whisper = remotes
        .whisper
        .mock("POST", "/v1/audio/transcriptions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"text": " I can't sleep lately "}"#)
        .create_async()
        .await;
    let _gemini = remotes
        .gemini
        .mock("POST", "/v1beta/models/gemini-pro:generateContent")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;
    let _tts = remotes
        .cloud_tts
        .mock("POST", "/v1/text:synthesize")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(
            json!({"input": {"text": "Error: Gemini API is not responding."}}),
        ))
        .with_status(200)
        .with_body(json!({"audioContent": BASE64.encode(b"ID3sentinel")}).to_string())
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = AppState::from_settings(remotes.settings(dir.path()))
        .await
        .unwrap();
    let app = create_router(state);

    let response = app.clone().oneshot(audio_request(b"RIFFfake")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["message"], "I can't sleep lately");
    assert_eq!(json["response"], "Error: Gemini API is not responding.");

    let audio = fetch(&app, &audio_path(json["audio_url"].as_str().unwrap())).await;
    assert_eq!(body_bytes(audio).await, b"ID3sentinel");
    whisper.assert_async().await;
}

#[tokio::test]
async fn blank_transcript_never_reaches_generation() {
    let mut remotes = Remotes::start().await;
    let _whisper = remotes
        .whisper
        .mock("POST", "/v1/audio/transcriptions")
        .with_status(200)
        .with_body(r#"{"text": "   "}"#)
        .create_async()
        .await;
    let gemini = remotes
        .gemini
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = AppState::from_settings(remotes.settings(dir.path()))
        .await
        .unwrap();
    let app = create_router(state);

    let response = app.oneshot(audio_request(b"RIFF")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No speech detected");
    gemini.assert_async().await;
}

#[tokio::test]
async fn concurrent_requests_keep_their_own_audio() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path(), "http://127.0.0.1:8000");
    let pipeline = ChatPipeline::new(
        Arc::new(MockStt::new("")),
        Arc::new(MockGenerator::echo()),
        Arc::new(MockTts::new(store.clone())),
        store,
    );
    let app = create_router(AppState::new(Settings::default(), pipeline));

    let requests = ["first message", "second message", "third message"];
    let responses = send_concurrently(&app, &requests).await;

    let mut urls = Vec::new();
    for (text, json) in requests.iter().zip(responses) {
        assert_eq!(json["message"], *text);
        let url = json["audio_url"].as_str().unwrap().to_string();

        let audio = fetch(&app, &audio_path(&url)).await;
        assert_eq!(audio.status(), StatusCode::OK);
        assert_eq!(body_bytes(audio).await, format!("Echo: {}", text).into_bytes());
        urls.push(url);
    }

    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), requests.len());
}

/// Fire all text requests at once and collect their JSON bodies in order
async fn send_concurrently(app: &Router, texts: &[&str]) -> Vec<serde_json::Value> {
    let handles: Vec<_> = texts
        .iter()
        .map(|text| {
            let app = app.clone();
            let request = text_request(text);
            tokio::spawn(async move {
                let response = app.oneshot(request).await.unwrap();
                assert_eq!(response.status(), StatusCode::OK);
                body_json(response).await
            })
        })
        .collect();

    let mut bodies = Vec::with_capacity(handles.len());
    for handle in handles {
        bodies.push(handle.await.unwrap());
    }
    bodies
}

#[tokio::test]
async fn missing_gemini_key_fails_startup() {
    let remotes = Remotes::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut settings = remotes.settings(dir.path());
    settings.generation.api_key = None;

    assert!(settings.validate().is_err());
    assert!(AppState::from_settings(settings).await.is_err());
}
