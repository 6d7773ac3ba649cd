//! 单项操作服务 - 业务能力层
//!
//! 对一张图做一次特征提取 / 滤波 / 变换，或对两张图做特征匹配，
//! 以及重置和下载当前图像。
//! 参数经注册表补全后发送；只负责请求和应答，不记录历史

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::{ServiceReply, ServiceTransport};
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{OperationDomain, ParameterMap, TaskOutcome};
use crate::services::schema_registry::ParameterSchemaRegistry;
use crate::utils::truncate_text;

const MATCH_FEATURES_ENDPOINT: &str = "/api/match_features";
const RESET_IMAGE_ENDPOINT: &str = "/api/reset_image";
const RESET_BATCH_ENDPOINT: &str = "/api/reset_batch_processor";
const DOWNLOAD_IMAGE_ENDPOINT: &str = "/api/download_image";

/// 默认的比率阈值
pub const DEFAULT_RATIO_THRESHOLD: f64 = 0.75;

fn single_endpoint(domain: OperationDomain) -> &'static str {
    match domain {
        OperationDomain::Feature => "/api/extract_features",
        OperationDomain::Filter => "/api/apply_filter",
        OperationDomain::Transform => "/api/apply_transformation",
    }
}

/// 特征匹配方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchingMethod {
    #[default]
    #[serde(rename = "FLANN")]
    Flann,
    #[serde(rename = "BF_SIFT_RATIO")]
    BfSiftRatio,
    #[serde(rename = "BF_ORB_RATIO")]
    BfOrbRatio,
}

impl MatchingMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchingMethod::Flann => "FLANN",
            MatchingMethod::BfSiftRatio => "BF_SIFT_RATIO",
            MatchingMethod::BfOrbRatio => "BF_ORB_RATIO",
        }
    }
}

impl fmt::Display for MatchingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 下载时取哪个处理器上的当前图像
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorType {
    #[default]
    Filter,
    Transform,
    Features,
    /// 未经处理的原图
    Original,
}

impl ProcessorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessorType::Filter => "filter",
            ProcessorType::Transform => "transform",
            ProcessorType::Features => "features",
            ProcessorType::Original => "original",
        }
    }
}

impl fmt::Display for ProcessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 待下载的图像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedImage {
    /// base64 图像数据
    pub image_data: String,
    pub filename: String,
}

/// 单项操作的结果
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub domain: OperationDomain,
    pub kind: String,
    /// 实际发送的参数
    pub parameters: ParameterMap,
    pub outcome: TaskOutcome,
    /// 完整响应体，供界面展示统计信息
    pub body: Value,
}

/// 特征匹配结果
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub method: MatchingMethod,
    pub matches_image: Option<String>,
    pub matcher_id: Option<String>,
    pub statistics: Option<Value>,
}

/// 单项操作服务
pub struct SingleOperationService {
    transport: Arc<dyn ServiceTransport>,
    registry: ParameterSchemaRegistry,
}

impl SingleOperationService {
    pub fn new(transport: Arc<dyn ServiceTransport>) -> Self {
        Self {
            transport,
            registry: ParameterSchemaRegistry::new(),
        }
    }

    pub async fn extract_features(
        &self,
        image_id: Option<&str>,
        kind: &str,
        overrides: &ParameterMap,
    ) -> AppResult<OperationResult> {
        self.apply(OperationDomain::Feature, image_id, kind, overrides)
            .await
    }

    pub async fn apply_filter(
        &self,
        image_id: Option<&str>,
        kind: &str,
        overrides: &ParameterMap,
    ) -> AppResult<OperationResult> {
        self.apply(OperationDomain::Filter, image_id, kind, overrides)
            .await
    }

    pub async fn apply_transformation(
        &self,
        image_id: Option<&str>,
        kind: &str,
        overrides: &ParameterMap,
    ) -> AppResult<OperationResult> {
        self.apply(OperationDomain::Transform, image_id, kind, overrides)
            .await
    }

    /// 对某一类别执行一次操作
    pub async fn apply(
        &self,
        domain: OperationDomain,
        image_id: Option<&str>,
        kind: &str,
        overrides: &ParameterMap,
    ) -> AppResult<OperationResult> {
        let image_id = require_image(image_id)?;
        let parameters = self.registry.resolve(domain, kind, overrides);

        let mut body = json!({
            "image_id": image_id,
            "parameters": parameters,
        });
        body[domain.discriminant_field()] = Value::String(kind.to_string());

        let endpoint = single_endpoint(domain);
        info!("🔧 {}: {} ({})", domain.name(), kind, image_id);
        let body = self.call(endpoint, &body).await?;
        let outcome = TaskOutcome::from_value(kind, &body, Some(domain));
        if let Some(image) = &outcome.image {
            debug!("结果图像: {}", truncate_text(image, 48));
        }

        Ok(OperationResult {
            domain,
            kind: kind.to_string(),
            parameters,
            outcome,
            body,
        })
    }

    /// 两张图之间的特征匹配
    pub async fn match_features(
        &self,
        primary: Option<&str>,
        secondary: Option<&str>,
        method: MatchingMethod,
        ratio_threshold: f64,
    ) -> AppResult<MatchResult> {
        let image_id1 = require_image(primary)?;
        let image_id2 = secondary
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::SecondImageMissing)?;

        let request = json!({
            "image_id1": image_id1,
            "image_id2": image_id2,
            "matching_method": method,
            "parameters": {"ratio_threshold": ratio_threshold},
        });

        info!("🔗 特征匹配: {} ↔ {} ({})", image_id1, image_id2, method);
        let body = self.call(MATCH_FEATURES_ENDPOINT, &request).await?;

        Ok(MatchResult {
            method,
            matches_image: string_field(&body, "matches_image"),
            matcher_id: string_field(&body, "matcher_id"),
            statistics: body.get("statistics").filter(|v| !v.is_null()).cloned(),
        })
    }

    /// 把图片恢复为原图，返回原图数据
    pub async fn reset_image(&self, image_id: Option<&str>) -> AppResult<Option<String>> {
        let image_id = require_image(image_id)?;
        let request = json!({"image_id": image_id, "processor_type": "all"});

        let body = self.call(RESET_IMAGE_ENDPOINT, &request).await?;
        Ok(string_field(&body, "image_data"))
    }

    /// 重置服务端的批处理状态（链式结果回到原图）
    pub async fn reset_batch_processor(&self, image_id: Option<&str>) -> AppResult<String> {
        let image_id = require_image(image_id)?;
        let request = json!({"image_id": image_id});

        let body = self.call(RESET_BATCH_ENDPOINT, &request).await?;
        Ok(string_field(&body, "message").unwrap_or_else(|| "已重置".to_string()))
    }

    /// 取出某个处理器上的当前图像用于保存
    pub async fn download_image(
        &self,
        image_id: Option<&str>,
        processor_type: ProcessorType,
    ) -> AppResult<DownloadedImage> {
        let image_id = require_image(image_id)?;
        let request = json!({"image_id": image_id, "processor_type": processor_type});

        info!("💾 下载图像: {} ({})", image_id, processor_type);
        let body = self.call(DOWNLOAD_IMAGE_ENDPOINT, &request).await?;
        let image_data = string_field(&body, "image_data").ok_or_else(|| {
            AppError::malformed_response(DOWNLOAD_IMAGE_ENDPOINT, "响应缺少 image_data")
        })?;
        let filename = string_field(&body, "filename")
            .unwrap_or_else(|| format!("processed_image_{}.png", image_id));

        Ok(DownloadedImage {
            image_data,
            filename,
        })
    }

    async fn call(&self, endpoint: &str, request: &Value) -> AppResult<Value> {
        let reply = self.transport.post_json(endpoint, request).await?;
        check_success(endpoint, reply)
    }
}

fn require_image(image_id: Option<&str>) -> AppResult<&str> {
    image_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ValidationError::NoImageSelected.into())
}

/// 只认 `success: true`；否则取 `error`，没有时报告状态码
fn check_success(endpoint: &str, reply: ServiceReply) -> AppResult<Value> {
    let success = reply
        .body
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if success {
        return Ok(reply.body);
    }

    let message = string_field(&reply.body, "error")
        .unwrap_or_else(|| format!("HTTP {}", reply.status));
    warn!("⚠️ 服务返回失败 ({}): {}", endpoint, message);
    Err(AppError::service(endpoint, message))
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}
