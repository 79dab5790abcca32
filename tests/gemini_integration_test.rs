//! 実エンドポイントを叩くテスト（GEMINI_API_KEY 未設定ならスキップ）

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use leaf_doctor::analyzer::{self, AnalysisClient};
use leaf_doctor::config::Config;
use leaf_doctor::ingest::UploadedImage;
use std::io::Cursor;

fn live_config() -> Option<Config> {
    let config = Config::default().with_env(|name| std::env::var(name).ok());
    match config.require_api_key() {
        Ok(_) => Some(config),
        Err(_) => {
            eprintln!("GEMINI_API_KEY not set; skipping integration test");
            None
        }
    }
}

#[tokio::test]
async fn gemini_ask_integration() {
    let Some(config) = live_config() else { return };
    let client = AnalysisClient::new(&config).expect("client");

    let answer = client
        .ask("Reply with one short sentence: what is powdery mildew?")
        .await
        .expect("ask failed");
    assert!(!answer.trim().is_empty());
}

#[tokio::test]
async fn gemini_leaf_integration() {
    let Some(config) = live_config() else { return };
    let client = AnalysisClient::new(&config).expect("client");

    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
        if (x + y) % 9 == 0 { Rgb([235, 235, 225]) } else { Rgb([40, 140, 50]) }
    }));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg).unwrap();
    let upload = UploadedImage::from_bytes("synthetic-leaf.jpg", bytes, Some("image/jpeg"));

    let (_, diagnosis) = analyzer::diagnose(&client, &upload, true).await.expect("diagnose failed");
    assert!(!diagnosis.analysis.trim().is_empty());
}
