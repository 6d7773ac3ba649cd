//! 批处理计划（TOML 文件）
//!
//! ```toml
//! name = "特征对比"
//! image_id = "3f2a..."
//! mode = "multiple_features"
//! apply_to_current = true
//!
//! [[tasks]]
//! kind = "orb"
//! parameters = { n_features = 800 }
//!
//! [[tasks]]
//! kind = "fast_corners"
//! ```

use serde::Deserialize;

use crate::models::operation::{BatchMode, OperationDomain};
use crate::models::parameter::ParameterMap;

/// 一个批处理计划
#[derive(Debug, Clone, Deserialize)]
pub struct BatchPlan {
    pub name: Option<String>,
    pub image_id: String,
    pub mode: BatchMode,
    /// 未设置时使用配置中的默认值
    pub apply_to_current: Option<bool>,
    #[serde(default)]
    pub tasks: Vec<PlanTask>,
    /// 加载时写入，不来自文件内容
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl BatchPlan {
    /// 用于日志的名称：优先 `name`，其次文件名
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.file_path.clone())
            .unwrap_or_else(|| self.mode.name().to_string())
    }
}

/// 计划中的单个任务
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanTask {
    /// 仅混合模式需要；缺省取模式隐含的类别
    pub domain: Option<OperationDomain>,
    /// 缺省取该类别的默认操作种类
    pub kind: Option<String>,
    #[serde(default)]
    pub parameters: ParameterMap,
}
