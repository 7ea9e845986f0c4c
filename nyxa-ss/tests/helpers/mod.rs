//! Shared test utilities for nyxa-ss integration tests
//!
//! - Fake OCR engines (fixed text, failing)
//! - Synthetic screenshots built with the `image` crate
//! - Multipart body builder and router helpers

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgba, RgbaImage};
use nyxa_common::events::EventBus;
use nyxa_ss::services::{OcrEngine, OcrError, OcrOutput, ProgressCallback, ScreenshotClassifier};
use nyxa_ss::{build_router, AppState};
use serde_json::Value;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Multipart boundary used by `multipart_body`
pub const BOUNDARY: &str = "nyxa-test-boundary";

/// What the fake engine was asked to read
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub language: String,
    pub mean_luminance: f64,
}

/// Returns fixed text and records every call
pub struct FixedTextEngine {
    text: String,
    confidence: f32,
    calls: Mutex<Vec<Recognition>>,
}

impl FixedTextEngine {
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            text: text.into(),
            confidence: 91.0,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Recognition> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrEngine for FixedTextEngine {
    fn name(&self) -> &'static str {
        "fixed-text"
    }

    async fn recognize(
        &self,
        image_png: &[u8],
        language: &str,
        progress: &ProgressCallback,
    ) -> Result<OcrOutput, OcrError> {
        progress(0);
        let decoded = image::load_from_memory_with_format(image_png, ImageFormat::Png)
            .map_err(|e| OcrError::ParseError(e.to_string()))?
            .to_rgba8();
        self.calls.lock().unwrap().push(Recognition {
            language: language.to_string(),
            mean_luminance: nyxa_ss::services::image_preprocessor::mean_luminance(&decoded),
        });
        progress(100);
        Ok(OcrOutput {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}

/// Always fails like a missing binary
pub struct FailingEngine;

#[async_trait]
impl OcrEngine for FailingEngine {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn recognize(
        &self,
        _image_png: &[u8],
        _language: &str,
        _progress: &ProgressCallback,
    ) -> Result<OcrOutput, OcrError> {
        Err(OcrError::BinaryNotFound("tesseract".into()))
    }
}

/// Solid-colour PNG screenshot
pub fn png_screenshot(gray: u8) -> Vec<u8> {
    let image = RgbaImage::from_pixel(32, 16, Rgba([gray, gray, gray, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Light-theme screenshot
pub fn light_png() -> Vec<u8> {
    png_screenshot(235)
}

/// Dark-theme screenshot
pub fn dark_png() -> Vec<u8> {
    png_screenshot(20)
}

/// Multipart body with one file field
pub fn multipart_body(field: &str, file_name: &str, mime: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Router and state wired to the given OCR engine
pub fn test_app(engine: Arc<dyn OcrEngine>) -> (Router, AppState) {
    test_app_with_limit(engine, 32 * 1024 * 1024)
}

pub fn test_app_with_limit(engine: Arc<dyn OcrEngine>, max_request_bytes: usize) -> (Router, AppState) {
    let classifier = Arc::new(ScreenshotClassifier::new(engine));
    let state = AppState::new(classifier, EventBus::new(100), max_request_bytes);
    (build_router(state.clone()), state)
}

/// Send a request and return status plus JSON body (Null when empty)
pub async fn send(app: &Router, request: Request<Body>) -> (axum::http::StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn upload(session_id: &str, file_name: &str, mime: &str, bytes: &[u8]) -> Request<Body> {
    upload_field(session_id, "screenshot", file_name, mime, bytes)
}

pub fn upload_field(
    session_id: &str,
    field: &str,
    file_name: &str,
    mime: &str,
    bytes: &[u8],
) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/flow/{}/upload", session_id))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, file_name, mime, bytes)))
        .unwrap()
}

/// Create a session and move it to Verification; returns its id
pub async fn session_in_verification(app: &Router) -> String {
    let (_, created) = send(app, post("/flow")).await;
    let session_id = created["session_id"].as_str().unwrap().to_string();
    send(app, post(&format!("/flow/{}/start", session_id))).await;
    session_id
}

/// Poll until the session has left Processing
pub async fn wait_for_settled(app: &Router, session_id: &str) -> Value {
    for _ in 0..200 {
        let (_, snapshot) = send(app, get(&format!("/flow/{}", session_id))).await;
        if snapshot["step"] != "processing" {
            return snapshot;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("session {} stuck in processing", session_id);
}
