//! HTTP送受信の境界
//!
//! 解析クライアントはこのトレイト越しにPOSTする。本番は reqwest、テストはモック。

use crate::error::{LeafDoctorError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// JSON POST 1回分
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub bearer_token: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// ステータスに関わらず応答を返す。接続できなかった場合のみ Err
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest による実装
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, "application/json")
            .body(request.body);

        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| LeafDoctorError::AnalysisUnavailable {
            status: e.status().map(|s| s.as_u16()),
            body: e.without_url().to_string(),
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| LeafDoctorError::AnalysisUnavailable {
            status: Some(status),
            body: format!("レスポンス本文の読み取りに失敗: {}", e),
        })?;

        Ok(HttpResponse { status, body })
    }
}
