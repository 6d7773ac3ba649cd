//! 批处理任务

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::models::operation::{BatchMode, OperationDomain};
use crate::models::parameter::ParameterMap;

/// 任务标识
///
/// 由任务列表按单调递增的序号分配，会话内不复用，外部表示为 `task_<n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(seq: u64) -> Self {
        Self(seq)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task_{}", self.0)
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 单个任务
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub domain: OperationDomain,
    /// 具体操作种类，如 `sift`、`gaussian_blur`
    pub discriminant: String,
    pub parameters: ParameterMap,
}

impl Task {
    /// 转换为发送给处理服务的 JSON 结构
    pub fn to_wire(&self, mode: BatchMode) -> Value {
        let mut obj = Map::new();
        obj.insert("task_id".to_string(), Value::String(self.id.to_string()));

        if mode == BatchMode::MixedOperations {
            obj.insert(
                "operation_type".to_string(),
                Value::String(self.domain.mixed_operation_type().to_string()),
            );
        }

        obj.insert(
            self.domain.discriminant_field().to_string(),
            Value::String(self.discriminant.clone()),
        );
        obj.insert(
            "parameters".to_string(),
            Value::Object(
                self.parameters
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
        );

        let tag = if mode == BatchMode::MixedOperations {
            "mixed"
        } else {
            self.domain.task_type_tag()
        };
        obj.insert("type".to_string(), Value::String(tag.to_string()));

        Value::Object(obj)
    }
}
