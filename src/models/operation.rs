//! 操作类别与批处理模式
//!
//! `BatchMode` 决定请求字段名、目标端点以及结果形态，映射关系是固定表

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// 操作类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationDomain {
    /// 特征提取
    Feature,
    /// 图像滤波
    Filter,
    /// 几何变换
    Transform,
}

impl OperationDomain {
    pub const ALL: [OperationDomain; 3] = [
        OperationDomain::Feature,
        OperationDomain::Filter,
        OperationDomain::Transform,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationDomain::Feature => "feature",
            OperationDomain::Filter => "filter",
            OperationDomain::Transform => "transform",
        }
    }

    /// 任务中承载具体操作种类的字段名
    pub fn discriminant_field(self) -> &'static str {
        match self {
            OperationDomain::Feature => "feature_type",
            OperationDomain::Filter => "filter_type",
            OperationDomain::Transform => "transformation_type",
        }
    }

    /// 任务 `type` 字段的取值
    pub fn task_type_tag(self) -> &'static str {
        match self {
            OperationDomain::Feature => "feature",
            OperationDomain::Filter => "filter",
            OperationDomain::Transform => "transformation",
        }
    }

    /// 混合模式下 `operation_type` 字段的取值
    pub fn mixed_operation_type(self) -> &'static str {
        match self {
            OperationDomain::Feature => "feature_extraction",
            OperationDomain::Filter => "image_filtering",
            OperationDomain::Transform => "geometric_transformation",
        }
    }

    /// 混合模式响应中按类别分组的键
    pub fn mixed_results_key(self) -> &'static str {
        match self {
            OperationDomain::Feature => "features",
            OperationDomain::Filter => "filters",
            OperationDomain::Transform => "transformations",
        }
    }

    /// 新建任务时使用的默认操作种类
    pub fn default_kind(self) -> &'static str {
        match self {
            OperationDomain::Feature => "sift",
            OperationDomain::Filter => "gaussian_blur",
            OperationDomain::Transform => "rotation",
        }
    }

    /// 中文名称
    pub fn name(self) -> &'static str {
        match self {
            OperationDomain::Feature => "特征提取",
            OperationDomain::Filter => "图像滤波",
            OperationDomain::Transform => "几何变换",
        }
    }
}

impl fmt::Display for OperationDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结果形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// 每个任务独立产出一个结果
    FanOut,
    /// 任务依次作用于同一张图，只有最终结果
    Chain,
    /// 混合类别的逐任务结果
    Heterogeneous,
}

/// 批处理模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    MultipleFeatures,
    MultipleFilters,
    MultipleTransformations,
    FilterChain,
    TransformationChain,
    MixedOperations,
}

impl BatchMode {
    pub const ALL: [BatchMode; 6] = [
        BatchMode::MultipleFeatures,
        BatchMode::MultipleFilters,
        BatchMode::MultipleTransformations,
        BatchMode::FilterChain,
        BatchMode::TransformationChain,
        BatchMode::MixedOperations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BatchMode::MultipleFeatures => "multiple_features",
            BatchMode::MultipleFilters => "multiple_filters",
            BatchMode::MultipleTransformations => "multiple_transformations",
            BatchMode::FilterChain => "filter_chain",
            BatchMode::TransformationChain => "transformation_chain",
            BatchMode::MixedOperations => "mixed_operations",
        }
    }

    /// 从字符串解析模式（精确匹配）
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == s)
    }

    /// 模式隐含的任务类别（混合模式默认新建特征任务）
    pub fn domain(self) -> OperationDomain {
        match self {
            BatchMode::MultipleFeatures | BatchMode::MixedOperations => OperationDomain::Feature,
            BatchMode::MultipleFilters | BatchMode::FilterChain => OperationDomain::Filter,
            BatchMode::MultipleTransformations | BatchMode::TransformationChain => {
                OperationDomain::Transform
            }
        }
    }

    /// 是否接受某类任务
    pub fn accepts(self, domain: OperationDomain) -> bool {
        self == BatchMode::MixedOperations || self.domain() == domain
    }

    /// 请求体中承载任务列表的字段名
    pub fn payload_field(self) -> &'static str {
        match self {
            BatchMode::MultipleFeatures => "feature_tasks",
            BatchMode::MultipleFilters => "filter_tasks",
            BatchMode::MultipleTransformations => "transform_tasks",
            BatchMode::FilterChain => "filter_chain",
            BatchMode::TransformationChain => "transform_chain",
            BatchMode::MixedOperations => "operations",
        }
    }

    /// 目标端点
    pub fn endpoint(self) -> &'static str {
        match self {
            BatchMode::MultipleFeatures => "/api/process_multiple_features",
            BatchMode::MultipleFilters => "/api/process_multiple_filters",
            BatchMode::MultipleTransformations => "/api/process_multiple_transformations",
            BatchMode::FilterChain => "/api/process_filter_chain",
            BatchMode::TransformationChain => "/api/process_transformation_chain",
            BatchMode::MixedOperations => "/api/process_mixed_operations",
        }
    }

    pub fn result_shape(self) -> ResultShape {
        match self {
            BatchMode::FilterChain | BatchMode::TransformationChain => ResultShape::Chain,
            BatchMode::MixedOperations => ResultShape::Heterogeneous,
            _ => ResultShape::FanOut,
        }
    }

    pub fn is_chain(self) -> bool {
        self.result_shape() == ResultShape::Chain
    }

    /// 中文名称
    pub fn name(self) -> &'static str {
        match self {
            BatchMode::MultipleFeatures => "多特征提取",
            BatchMode::MultipleFilters => "多滤波对比",
            BatchMode::MultipleTransformations => "多变换对比",
            BatchMode::FilterChain => "滤波链",
            BatchMode::TransformationChain => "变换链",
            BatchMode::MixedOperations => "混合操作",
        }
    }
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim()).ok_or_else(|| ValidationError::UnknownBatchMode(s.to_string()))
    }
}
