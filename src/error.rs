use thiserror::Error;

use crate::models::{BatchMode, OperationDomain};

/// 应用程序错误类型
///
/// 批处理链路上的所有错误在控制器边界终止，不做自动重试
#[derive(Debug, Error)]
pub enum AppError {
    /// 本地校验失败（发起网络请求之前）
    #[error("校验失败: {0}")]
    Validation(#[from] ValidationError),
    /// 传输层错误
    #[error("网络错误: {0}")]
    Network(#[from] NetworkError),
    /// 服务端返回 success: false，消息原样透传
    #[error("{message}")]
    Service { endpoint: String, message: String },
    /// 已有批处理在执行中
    #[error("已有批处理任务正在执行，请等待其完成")]
    Busy,
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 本地校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// 未选择图片
    #[error("请先上传并选择一张图片")]
    NoImageSelected,
    /// 特征匹配需要第二张图片
    #[error("特征匹配需要两张图片，请先选择第二张图片")]
    SecondImageMissing,
    /// 当前模式下任务列表为空
    #[error("请先为 {mode} 添加任务")]
    EmptyTaskList { mode: BatchMode },
    /// 任务类别与批处理模式不符
    #[error("模式 {mode} 不接受 {domain} 类任务")]
    DomainMismatch {
        mode: BatchMode,
        domain: OperationDomain,
    },
    /// 无法识别的批处理模式
    #[error("未知的批处理模式: {0}")]
    UnknownBatchMode(String),
}

/// 传输层错误
#[derive(Debug, Error)]
pub enum NetworkError {
    /// 请求未能完成（连接失败、超时等）
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 响应无法解析为预期结构
    #[error("响应格式错误 ({endpoint}): {reason}")]
    MalformedResponse { endpoint: String, reason: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端初始化失败: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 批处理计划解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建请求失败错误
    pub fn network_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Network(NetworkError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建响应格式错误
    pub fn malformed_response(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Network(NetworkError::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        })
    }

    /// 创建服务端错误
    pub fn service(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Service {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为发起请求前的本地错误
    pub fn is_local(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::Busy)
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
