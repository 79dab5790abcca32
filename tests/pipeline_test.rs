//! 取り込み → Base64 → 解析 → レポート の一連の流れ（モックTransport）

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use leaf_doctor::analyzer::{self, AnalysisClient, HttpRequest, HttpResponse, Transport};
use leaf_doctor::config::Config;
use leaf_doctor::error::{LeafDoctorError, Result};
use leaf_doctor::export::pdf;
use leaf_doctor::ingest;
use leaf_doctor_common::encoding;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

const MILDEW_BODY: &str = r#"{"candidates":[{"content":{"parts":[{"text":"Leaf shows powdery mildew."}]}}]}"#;

struct MockEndpoint {
    status: u16,
    body: String,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockEndpoint {
    fn new(status: u16, body: &str) -> Self {
        Self { status, body: body.to_string(), requests: Arc::default() }
    }

    /// クライアントに渡した後も送信内容を見られるようにする
    fn log(&self) -> Arc<Mutex<Vec<HttpRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl Transport for MockEndpoint {
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        Ok(HttpResponse { status: self.status, body: self.body.clone() })
    }
}

fn config() -> Config {
    Config {
        api_key: Some("mock-key".into()),
        endpoint: "https://mock.test/v1beta/models/vision:generateContent".into(),
        key_in_query: true,
        timeout_seconds: Some(5),
        font_path: None,
    }
}

fn write_jpeg(dir: &std::path::Path) -> std::path::PathBuf {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(48, 32, Rgb([60, 150, 70])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg).unwrap();
    let path = dir.join("leaf.jpg");
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn test_upload_jpeg_end_to_end() {
    let dir = tempdir().expect("Failed to create temp dir");
    let upload = ingest::load_image(&write_jpeg(dir.path())).unwrap();

    let client = AnalysisClient::with_transport(&config(), MockEndpoint::new(200, MILDEW_BODY)).unwrap();
    let (decoded, diagnosis) = analyzer::diagnose(&client, &upload, false).await.expect("解析に失敗");

    assert_eq!(diagnosis.analysis, "Leaf shows powdery mildew.");
    assert!(diagnosis.medicines.is_empty());
    assert_eq!(diagnosis.confidence, None);
    assert_eq!((decoded.width, decoded.height), (48, 32));

    let report = pdf::compose(&decoded, &diagnosis.analysis, &[], &Default::default()).unwrap();
    assert!(report.document.text_stream().contains("Leaf shows powdery mildew."));
}

#[tokio::test]
async fn test_request_carries_exact_image_bytes() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_jpeg(dir.path());
    let original = std::fs::read(&path).unwrap();
    let upload = ingest::load_image(&path).unwrap();

    let mock = MockEndpoint::new(200, MILDEW_BODY);
    let log = mock.log();
    let client = AnalysisClient::with_transport(&config(), mock).unwrap();
    analyzer::diagnose(&client, &upload, false).await.unwrap();

    let requests = log.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://mock.test/v1beta/models/vision:generateContent?key=mock-key");

    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["text"], leaf_doctor_common::LEAF_ANALYSIS_INSTRUCTION);
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
    let data = parts[1]["inlineData"]["data"].as_str().unwrap();
    assert_eq!(encoding::decode(data).unwrap(), original);
}

#[tokio::test]
async fn test_unsupported_image_never_reaches_endpoint() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("leaf.png");
    std::fs::write(&path, b"GIF89a not really").unwrap();
    let upload = ingest::load_image(&path).unwrap();

    let mock = MockEndpoint::new(200, MILDEW_BODY);
    let log = mock.log();
    let client = AnalysisClient::with_transport(&config(), mock).unwrap();
    let result = analyzer::diagnose(&client, &upload, false).await;
    assert!(matches!(result, Err(LeafDoctorError::UnsupportedFormat(_))));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_endpoint_error_is_reported() {
    let dir = tempdir().expect("Failed to create temp dir");
    let upload = ingest::load_image(&write_jpeg(dir.path())).unwrap();

    let client = AnalysisClient::with_transport(
        &config(),
        MockEndpoint::new(403, r#"{"error":{"message":"API key not valid"}}"#),
    )
    .unwrap();

    match analyzer::diagnose(&client, &upload, false).await {
        Err(LeafDoctorError::AnalysisUnavailable { status, body }) => {
            assert_eq!(status, Some(403));
            assert!(body.contains("API key not valid"));
        }
        other => panic!("unexpected: {:?}", other.map(|(_, d)| d)),
    }
}

#[tokio::test]
async fn test_structured_diagnosis_feeds_record() {
    let dir = tempdir().expect("Failed to create temp dir");
    let upload = ingest::load_image(&write_jpeg(dir.path())).unwrap();

    let text = "```json\n{\"analysis\":\"Leaf rust on upper surface.\",\"medicines\":[\"Sulfur spray\",\"Neem oil\"],\"confidence\":0.66}\n```";
    let body = serde_json::json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] });
    let client = AnalysisClient::with_transport(&config(), MockEndpoint::new(200, &body.to_string())).unwrap();

    let (decoded, diagnosis) = analyzer::diagnose(&client, &upload, true).await.unwrap();
    assert_eq!(diagnosis.medicines, vec!["Sulfur spray".to_string(), "Neem oil".to_string()]);

    let record = analyzer::build_record(&upload, &decoded, &diagnosis, "2026-10-19 09:30:00");
    assert_eq!(record.file_name, "leaf.jpg");
    assert_eq!(record.mime_type, "image/jpeg");
    assert_eq!(record.confidence, Some(0.66));
    assert_eq!(record.analysis, "Leaf rust on upper surface.");
}
