//! 参数定义与参数值

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 参数值
///
/// 反序列化时依次尝试 布尔 → 整数 → 浮点 → 文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::Bool(v) => serde_json::Value::Bool(*v),
            ParamValue::Int(v) => serde_json::Value::from(*v),
            ParamValue::Float(v) => serde_json::Value::from(*v),
            ParamValue::Text(v) => serde_json::Value::String(v.clone()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// 参数名 → 参数值（按名称排序，保证请求体稳定）
pub type ParameterMap = BTreeMap<String, ParamValue>;

/// 参数种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Numeric,
    Boolean,
    Enum,
}

/// 参数定义
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDef {
    pub name: &'static str,
    pub kind: ParameterKind,
    pub default: ParamValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ParamValue>,
}

impl ParameterDef {
    /// 整数滑块
    pub fn int(name: &'static str, default: i64, min: i64, max: i64) -> Self {
        Self {
            name,
            kind: ParameterKind::Numeric,
            default: ParamValue::Int(default),
            min: Some(min as f64),
            max: Some(max as f64),
            step: Some(1.0),
            options: Vec::new(),
        }
    }

    /// 浮点滑块
    pub fn float(name: &'static str, default: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            name,
            kind: ParameterKind::Numeric,
            default: ParamValue::Float(default),
            min: Some(min),
            max: Some(max),
            step: Some(step),
            options: Vec::new(),
        }
    }

    /// 复选框
    pub fn boolean(name: &'static str, default: bool) -> Self {
        Self {
            name,
            kind: ParameterKind::Boolean,
            default: ParamValue::Bool(default),
            min: None,
            max: None,
            step: None,
            options: Vec::new(),
        }
    }

    /// 下拉选择
    pub fn choice(name: &'static str, default: ParamValue, options: Vec<ParamValue>) -> Self {
        Self {
            name,
            kind: ParameterKind::Enum,
            default,
            min: None,
            max: None,
            step: None,
            options,
        }
    }

    /// 检查值的种类是否与定义相符（不检查范围）
    pub fn accepts(&self, value: &ParamValue) -> bool {
        match self.kind {
            ParameterKind::Numeric => value.as_f64().is_some(),
            ParameterKind::Boolean => matches!(value, ParamValue::Bool(_)),
            ParameterKind::Enum => self.options.iter().any(|option| match (option, value) {
                (ParamValue::Int(a), ParamValue::Float(b)) => (*a as f64) == *b,
                _ => option == value,
            }),
        }
    }
}
