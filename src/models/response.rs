//! 处理服务的响应结构

use serde::Deserialize;
use serde_json::Value;

use crate::models::operation::OperationDomain;

/// 批处理响应信封
///
/// 扇出模式与链式模式共用一个结构，字段按模式取用；错误响应（HTTP 4xx/5xx）
/// 通常只带 `error`，`success` 缺省为 false
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBatchResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    /// 扇出结果：task_id → 结果；混合模式下按类别分组
    pub results: Option<Value>,
    /// 服务端自带的对比信息（客户端会重新计算）
    pub comparison: Option<Value>,
    pub total_tasks: Option<usize>,
    pub total_operations: Option<usize>,
    pub processing_time: Option<f64>,
    /// 链式结果
    pub result_image: Option<String>,
    pub chain_length: Option<usize>,
    pub applied_to_current: Option<bool>,
}

/// 单个任务的原始产出
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub task_id: String,
    /// 混合模式下标注任务类别
    pub domain: Option<OperationDomain>,
    /// base64 图片
    pub image: Option<String>,
    /// 关键点 / 特征数量
    pub keypoint_count: Option<usize>,
    pub features: Option<Value>,
}

impl TaskOutcome {
    /// 从单个任务的结果值解析
    ///
    /// 结果可能是 base64 字符串、带 `result_image` 的对象，或 null（该任务失败）
    pub fn from_value(task_id: &str, value: &Value, domain: Option<OperationDomain>) -> Self {
        let mut outcome = TaskOutcome {
            task_id: task_id.to_string(),
            domain,
            image: None,
            keypoint_count: None,
            features: None,
        };

        match value {
            Value::String(image) => outcome.image = Some(image.clone()),
            Value::Object(obj) => {
                outcome.image = obj
                    .get("result_image")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                outcome.features = obj.get("features").filter(|v| !v.is_null()).cloned();
                outcome.keypoint_count = obj
                    .get("keypoints")
                    .and_then(|v| v.as_array())
                    .map(Vec::len)
                    .or_else(|| count_from_features(outcome.features.as_ref()));
            }
            _ => {}
        }

        outcome
    }
}

/// 从特征统计中找出数量字段
fn count_from_features(features: Option<&Value>) -> Option<usize> {
    let features = features?;
    ["keypoints_count", "corners_detected", "blobs_count"]
        .iter()
        .find_map(|key| features.get(*key).and_then(|v| v.as_u64()))
        .map(|count| count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_body_defaults_to_failure() {
        let response: RawBatchResponse =
            serde_json::from_value(json!({"error": "Image not found"})).unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Image not found"));
    }

    #[test]
    fn test_outcome_from_feature_object() {
        let value = json!({
            "result_image": "aGVsbG8=",
            "keypoints": [{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0}],
            "features": {"keypoints_count": 99}
        });
        let outcome = TaskOutcome::from_value("task_0", &value, None);
        assert_eq!(outcome.image.as_deref(), Some("aGVsbG8="));
        assert_eq!(outcome.keypoint_count, Some(2));
    }

    #[test]
    fn test_outcome_count_falls_back_to_feature_stats() {
        let value = json!({"result_image": null, "keypoints": null, "features": {"corners_detected": 17}});
        let outcome = TaskOutcome::from_value("task_1", &value, None);
        assert_eq!(outcome.image, None);
        assert_eq!(outcome.keypoint_count, Some(17));
    }

    #[test]
    fn test_outcome_from_string_and_null() {
        let image = TaskOutcome::from_value("task_2", &json!("Zm9v"), None);
        assert_eq!(image.image.as_deref(), Some("Zm9v"));
        assert_eq!(image.keypoint_count, None);

        let failed = TaskOutcome::from_value("task_3", &Value::Null, None);
        assert_eq!(failed.image, None);
        assert_eq!(failed.keypoint_count, None);
    }
}
