//! 診断結果の型定義
//!
//! CLIとライブラリ利用側で共有される型:
//! - Diagnosis: JSONモードで得た構造化診断
//! - AnalysisRecord: 1回の解析の保存用レコード

use serde::{Deserialize, Serialize};

/// 構造化された診断結果
///
/// `confidence` はモデルが返した値のみ。返さなければ None。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Diagnosis {
    pub analysis: String,
    pub medicines: Vec<String>,
    pub confidence: Option<f32>,
}

impl Diagnosis {
    /// 信頼度を 0.0〜1.0 に揃える
    ///
    /// 1 を超える整数（2〜100）はパーセント表記とみなして換算する。
    /// `1.5` のような小数や範囲外の値は意味が決められないので捨てる。
    pub fn normalized(mut self) -> Self {
        self.confidence = match self.confidence {
            Some(c) if (0.0..=1.0).contains(&c) => Some(c),
            Some(c) if c.fract() == 0.0 && (1.0..=100.0).contains(&c) => Some(c / 100.0),
            _ => None,
        };
        self.medicines.retain(|m| !m.trim().is_empty());
        self
    }
}

/// 解析レコード（--output で保存）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub file_name: String,

    #[serde(default)]
    pub mime_type: String,

    #[serde(default)]
    pub width: u32,

    #[serde(default)]
    pub height: u32,

    /// 診断本文
    pub analysis: String,

    #[serde(default)]
    pub medicines: Vec<String>,

    #[serde(default)]
    pub confidence: Option<f32>,

    /// 解析日時（"YYYY-MM-DD HH:MM:SS"）
    #[serde(default)]
    pub analyzed_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnosis_defaults() {
        let d: Diagnosis = serde_json::from_str(r#"{"analysis":"Rust fungus"}"#).unwrap();
        assert_eq!(d.analysis, "Rust fungus");
        assert!(d.medicines.is_empty());
        assert_eq!(d.confidence, None);
    }

    #[test]
    fn test_normalized_confidence() {
        let d = Diagnosis { confidence: Some(0.82), ..Default::default() }.normalized();
        assert_eq!(d.confidence, Some(0.82));

        let d = Diagnosis { confidence: Some(90.0), ..Default::default() }.normalized();
        assert!((d.confidence.unwrap() - 0.9).abs() < 1e-6);

        let d = Diagnosis { confidence: Some(-3.0), ..Default::default() }.normalized();
        assert_eq!(d.confidence, None);

        let d = Diagnosis { confidence: Some(1.5), ..Default::default() }.normalized();
        assert_eq!(d.confidence, None);

        let d = Diagnosis { confidence: Some(100.0), ..Default::default() }.normalized();
        assert_eq!(d.confidence, Some(1.0));

        let d = Diagnosis { confidence: Some(250.0), ..Default::default() }.normalized();
        assert_eq!(d.confidence, None);
    }

    #[test]
    fn test_normalized_drops_blank_medicines() {
        let d = Diagnosis {
            medicines: vec!["Neem oil".into(), " ".into(), "".into()],
            ..Default::default()
        }
        .normalized();
        assert_eq!(d.medicines, vec!["Neem oil".to_string()]);
    }

    #[test]
    fn test_record_camel_case() {
        let record = AnalysisRecord {
            file_name: "leaf.jpg".into(),
            analysis: "Healthy".into(),
            analyzed_at: "2026-10-19 10:00:00".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"fileName\":\"leaf.jpg\""));
        assert!(json.contains("\"analyzedAt\""));
    }
}
