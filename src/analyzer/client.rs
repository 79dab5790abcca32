//! 解析APIクライアント
//!
//! - analyze: 指示文1つ + 画像1つ → テキスト
//! - ask: テキスト1つ → テキスト
//! - diagnose_structured: JSONモードで構造化診断
//!
//! リトライなし。非2xxは `AnalysisUnavailable`、形が違えば `MalformedResponse`。

use super::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::config::Config;
use crate::error::{LeafDoctorError, Result};
use leaf_doctor_common::{
    build_structured_instruction, extract_text, parse_diagnosis, Diagnosis, GenerateRequest,
};
use std::time::Duration;
use tracing::debug;

pub struct AnalysisClient<T: Transport = ReqwestTransport> {
    transport: T,
    endpoint: String,
    api_key: String,
    key_in_query: bool,
    timeout: Option<Duration>,
}

impl AnalysisClient<ReqwestTransport> {
    /// APIキーが無ければ `MissingApiKey`
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl<T: Transport> AnalysisClient<T> {
    pub fn with_transport(config: &Config, transport: T) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            transport,
            endpoint: config.endpoint.clone(),
            api_key,
            key_in_query: config.key_in_query,
            timeout: config.timeout_seconds.map(Duration::from_secs),
        })
    }

    /// 画像を解析してテキストを返す
    pub async fn analyze(&self, encoded_image: &str, mime_type: &str, instruction: &str) -> Result<String> {
        let request = GenerateRequest::with_image(instruction, mime_type, encoded_image);
        self.generate(&request).await
    }

    /// 自由質問（画像なし）
    pub async fn ask(&self, question: &str) -> Result<String> {
        let request = GenerateRequest::text_only(question);
        self.generate(&request).await
    }

    /// JSONモードで構造化診断を取得
    pub async fn diagnose_structured(&self, encoded_image: &str, mime_type: &str) -> Result<Diagnosis> {
        let instruction = build_structured_instruction();
        let request = GenerateRequest::with_image(&instruction, mime_type, encoded_image).json_mode();
        let text = self.generate(&request).await?;
        parse_diagnosis(&text).map_err(|e| LeafDoctorError::MalformedResponse(e.to_string()))
    }

    /// キーはクエリとしてエンコードして付ける（既存のクエリは残す）
    fn request_url(&self) -> Result<String> {
        if !self.key_in_query {
            return Ok(self.endpoint.clone());
        }
        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| LeafDoctorError::Config(format!("エンドポイントURLが不正です: {}", e)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url.to_string())
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let body = serde_json::to_string(request)?;
        debug!("generateContent: {} bytes → {}", body.len(), self.endpoint);

        let http_request = HttpRequest {
            url: self.request_url()?,
            bearer_token: (!self.key_in_query).then(|| self.api_key.clone()),
            body,
        };

        let call = self.transport.post_json(http_request);
        let response = match self.timeout {
            // 待つのをやめるだけで、リモート側の処理は取り消されない
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                LeafDoctorError::AnalysisUnavailable {
                    status: None,
                    body: format!("{}秒以内に応答がありませんでした", limit.as_secs()),
                }
            })??,
            None => call.await?,
        };

        debug!("generateContent: HTTP {} ({} bytes)", response.status, response.body.len());

        if !response.is_success() {
            return Err(LeafDoctorError::AnalysisUnavailable {
                status: Some(response.status),
                body: response.body,
            });
        }

        Ok(extract_text(&response.body)?)
    }
}
