use anyhow::{Context, Result};
/// 日志工具模块
///
/// 启动横幅、计划进度、最终统计，以及输出报告文件
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;

use crate::config::Config;
use crate::services::HistoryEntry;

/// 初始化报告文件（覆盖旧内容）
///
/// # 参数
/// - `log_file_path`: 报告文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n批处理报告 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入报告文件: {}", log_file_path))?;
    Ok(())
}

/// 向报告文件追加一行
pub fn append_report_line(log_file_path: &str, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开报告文件: {}", log_file_path))?;
    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%H:%M:%S"),
        line
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批处理计划模式");
    info!("🌐 处理服务: {}", config.service_base_url);
    info!("⏱️ 请求超时: {} 秒", config.request_timeout_secs);
    info!("{}", "=".repeat(60));
}

/// 记录计划加载信息
pub fn log_plans_loaded(total: usize, folder: &str) {
    info!("✓ 在 {} 中找到 {} 个批处理计划", folder, total);
    info!("💡 计划依次执行，同一时间只有一个批处理在途\n");
}

/// 记录计划开始信息
///
/// # 参数
/// - `index`: 计划序号（从 1 开始）
/// - `total`: 计划总数
/// - `name`: 计划名称
/// - `task_count`: 任务数
pub fn log_plan_start(index: usize, total: usize, name: &str, task_count: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始执行第 {}/{} 个计划: {}", index, total, name);
    info!("📄 任务数: {}", task_count);
    info!("{}", "=".repeat(60));
}

/// 记录计划完成信息
pub fn log_plan_complete(index: usize, summary: &str) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 个计划完成: {}", index, summary);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息与历史记录
pub fn print_final_stats<'a>(
    success: usize,
    failed: usize,
    total: usize,
    history: impl Iterator<Item = &'a HistoryEntry>,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部计划执行完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("🕘 最近操作:");
    for entry in history {
        info!("   {}", entry.summary_line());
    }
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示（如 base64 图片）
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("iVBORw0KGgo", 4), "iVBO...");
        assert_eq!(truncate_text("短文本", 10), "短文本");
    }

    #[test]
    fn test_report_file_lines() {
        let path = std::env::temp_dir().join(format!("cv_batch_report_{}.txt", std::process::id()));
        let path = path.to_str().unwrap();

        init_log_file(path).unwrap();
        append_report_line(path, "滤波链 完成，共 3 步").unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.trim_end().ends_with("滤波链 完成，共 3 步"));

        let _ = fs::remove_file(path);
    }
}
