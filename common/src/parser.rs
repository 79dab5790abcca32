//! モデル応答テキストのパーサー
//!
//! JSONモードでもモデルは ```json フェンスや前置きを付けることがあるので、
//! まずJSON部分を切り出してから構造化する。

use crate::error::{Error, Result};
use crate::types::Diagnosis;

/// 応答テキストからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. エラー
///
/// # Examples
/// ```
/// use leaf_doctor_common::extract_json;
///
/// let response = "Sure! {\"analysis\": \"healthy\"}";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"analysis\": \"healthy\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

/// 構造化診断をパース
pub fn parse_diagnosis(response: &str) -> Result<Diagnosis> {
    let json_str = extract_json(response)?;
    let diagnosis: Diagnosis = serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("診断JSONパースエラー: {}", e)))?;

    if diagnosis.analysis.trim().is_empty() {
        return Err(Error::Parse("analysis が空です".into()));
    }
    Ok(diagnosis.normalized())
}
