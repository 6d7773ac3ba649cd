//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化日志（级别取自 `RUST_LOG`，默认 info）
///
/// 重复调用时保留第一次安装的订阅者
pub fn init() {
    init_with_default("info");
}

/// 详细模式下默认级别为 debug
pub fn init_verbose(verbose: bool) {
    init_with_default(if verbose { "debug" } else { "info" });
}

fn init_with_default(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
