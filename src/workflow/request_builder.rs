//! 批处理请求构建 - 流程层
//!
//! (模式, 任务列表, 图片, 是否作用于当前图) → 一个请求。
//! 前置条件不满足时不构建任何请求

use serde_json::{Map, Value};

use crate::error::{AppResult, ValidationError};
use crate::models::{BatchMode, Task};

/// 一次批处理请求
///
/// 持有任务的副本，构建之后对任务列表的修改不会影响本次请求
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub mode: BatchMode,
    pub image_id: String,
    pub apply_to_current: bool,
    pub tasks: Vec<Task>,
}

impl BatchRequest {
    pub fn endpoint(&self) -> &'static str {
        self.mode.endpoint()
    }

    /// 请求体
    ///
    /// ```json
    /// {"image_id": "...", "apply_to_current": true, "<payload field>": [...]}
    /// ```
    pub fn body(&self) -> Value {
        let tasks = self
            .tasks
            .iter()
            .map(|task| task.to_wire(self.mode))
            .collect();

        let mut body = Map::new();
        body.insert("image_id".to_string(), Value::String(self.image_id.clone()));
        body.insert(
            "apply_to_current".to_string(),
            Value::Bool(self.apply_to_current),
        );
        body.insert(self.mode.payload_field().to_string(), Value::Array(tasks));
        Value::Object(body)
    }

    /// 按请求顺序排列的任务标识
    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|task| task.id.to_string()).collect()
    }
}

/// 请求构建器
pub struct BatchRequestBuilder;

impl BatchRequestBuilder {
    /// 构建请求
    ///
    /// 未选择图片或任务列表为空时返回校验错误
    pub fn build(
        mode: BatchMode,
        tasks: &[Task],
        image_id: Option<&str>,
        apply_to_current: bool,
    ) -> AppResult<BatchRequest> {
        let image_id = image_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::NoImageSelected)?;

        if tasks.is_empty() {
            return Err(ValidationError::EmptyTaskList { mode }.into());
        }

        Ok(BatchRequest {
            mode,
            image_id: image_id.to_string(),
            apply_to_current,
            tasks: tasks.to_vec(),
        })
    }
}
