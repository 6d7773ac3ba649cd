use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::error::{AppError, AppResult, ConfigError};

/// 未指定 `CV_BATCH_CONFIG` 时尝试读取的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "cv_batch.toml";

/// 程序配置
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// 处理服务地址
    pub service_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 批处理计划（TOML）存放目录
    pub plan_folder: String,
    /// 输出报告文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 批处理结果是否默认作用于当前图像
    pub apply_to_current: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 120,
            plan_folder: "batch_plans".to_string(),
            output_log_file: "batch_output.txt".to_string(),
            verbose_logging: false,
            apply_to_current: true,
        }
    }
}

/// 配置文件内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    service_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    plan_folder: Option<String>,
    output_log_file: Option<String>,
    verbose_logging: Option<bool>,
    apply_to_current: Option<bool>,
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 默认值 + 配置文件（+ 环境变量）
    ///
    /// 配置文件路径取自 `CV_BATCH_CONFIG`，未设置时读取当前目录下的
    /// `cv_batch.toml`（不存在则跳过）
    pub fn load() -> AppResult<Self> {
        let config = match std::env::var("CV_BATCH_CONFIG") {
            Ok(path) => Self::from_toml_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(DEFAULT_CONFIG_FILE)?
            }
            Err(_) => Self::default(),
        };
        config.with_env_overrides()
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str, path: &str) -> AppResult<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source,
        })?;

        let default = Self::default();
        Ok(Self {
            service_base_url: file.service_base_url.unwrap_or(default.service_base_url),
            request_timeout_secs: file
                .request_timeout_secs
                .unwrap_or(default.request_timeout_secs),
            plan_folder: file.plan_folder.unwrap_or(default.plan_folder),
            output_log_file: file.output_log_file.unwrap_or(default.output_log_file),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
            apply_to_current: file.apply_to_current.unwrap_or(default.apply_to_current),
        })
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> AppResult<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        Ok(Self {
            service_base_url: lookup("SERVICE_BASE_URL").unwrap_or(self.service_base_url),
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            plan_folder: lookup("PLAN_FOLDER").unwrap_or(self.plan_folder),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
            apply_to_current: parse_var(&lookup, "APPLY_TO_CURRENT", "bool")?
                .unwrap_or(self.apply_to_current),
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    expected_type: &str,
) -> AppResult<Option<T>> {
    match lookup(var_name) {
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
        None => Ok(None),
    }
}
