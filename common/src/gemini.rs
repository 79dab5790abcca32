//! generateContent API のワイヤ形式
//!
//! リクエスト: `{contents:[{parts:[{text}|{inlineData:{mimeType,data}}]}]}`
//! レスポンス: `{candidates:[{content:{parts:[{text}, ...]}}, ...]}`
//!
//! HTTP送受信は持たない（CLI側のTransportに任せる）。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// generateContent リクエスト
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub response_mime_type: String,
}

impl GenerateRequest {
    /// 指示文1つ + 画像1つ
    pub fn with_image(instruction: &str, mime_type: &str, encoded_image: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: instruction.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: encoded_image.to_string(),
                        },
                    },
                ],
            }],
            generation_config: None,
        }
    }

    /// テキストのみ（質問応答用）
    pub fn text_only(text: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part::Text {
                    text: text.to_string(),
                }],
            }],
            generation_config: None,
        }
    }

    /// JSONで返答させる
    pub fn json_mode(mut self) -> Self {
        self.generation_config = Some(GenerationConfig {
            temperature: 0.1,
            response_mime_type: "application/json".to_string(),
        });
        self
    }
}

/// generateContent レスポンス
///
/// 形が崩れていても `MalformedResponse` として扱えるよう全て省略可能にしている
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    /// 先頭候補の先頭パートのテキスト
    pub fn first_text(&self) -> Result<&str> {
        let candidates = self.candidates.as_ref().ok_or_else(|| {
            let reason = self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref())
                .map(|r| format!(" (blocked: {})", r))
                .unwrap_or_default();
            Error::MalformedResponse(format!("`candidates` missing{}", reason))
        })?;

        let text = candidates
            .first()
            .ok_or_else(|| Error::MalformedResponse("`candidates` is empty".into()))?
            .content
            .as_ref()
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .ok_or_else(|| Error::MalformedResponse("first candidate has no text part".into()))?;

        if text.trim().is_empty() {
            return Err(Error::MalformedResponse("first candidate text is empty".into()));
        }
        Ok(text)
    }
}

/// レスポンス本文からテキストを取り出す
pub fn extract_text(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("body is not JSON: {}", e)))?;
    response.first_text().map(str::to_string)
}
