//! 图像处理服务客户端
//!
//! 所有请求都是 `POST <base_url><endpoint>`，请求体与响应体均为 JSON。
//! 客户端只负责传输：拿到状态码和 JSON 响应体即返回，不解读 `success`

use futures::future::BoxFuture;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};

/// 服务响应：HTTP 状态码 + JSON 响应体
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceReply {
    pub status: u16,
    pub body: Value,
}

impl ServiceReply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

/// 与处理服务之间的传输通道
///
/// 生产环境使用 [`ProcessingClient`]，测试中替换为内存实现
pub trait ServiceTransport: Send + Sync {
    fn post_json<'a>(
        &'a self,
        endpoint: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, AppResult<ServiceReply>>;
}

/// 基于 reqwest 的处理服务客户端
#[derive(Debug, Clone)]
pub struct ProcessingClient {
    base_url: String,
    client: reqwest::Client,
}

impl ProcessingClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            base_url: config.service_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send(&self, endpoint: &str, body: &Value) -> AppResult<ServiceReply> {
        let url = self.url_for(endpoint);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::network_failed(endpoint, e))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::network_failed(endpoint, e))?;

        debug!("响应 {} ({} 字节)", status, bytes.len());

        let body = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::malformed_response(endpoint, format!("HTTP {} 响应不是 JSON: {}", status, e))
        })?;

        Ok(ServiceReply { status, body })
    }
}

impl ServiceTransport for ProcessingClient {
    fn post_json<'a>(
        &'a self,
        endpoint: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, AppResult<ServiceReply>> {
        Box::pin(self.send(endpoint, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = Config {
            service_base_url: "http://localhost:5000/".to_string(),
            ..Config::default()
        };
        let client = ProcessingClient::new(&config).unwrap();
        assert_eq!(
            client.url_for("/api/process_filter_chain"),
            "http://localhost:5000/api/process_filter_chain"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let config = Config {
            service_base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..Config::default()
        };
        let client = ProcessingClient::new(&config).unwrap();

        let err = client
            .post_json("/api/reset_image", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }
}
