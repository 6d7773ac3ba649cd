//! 通知接口
//!
//! 成功/失败消息的出口。界面层实现自己的通知方式，命令行下写入日志

use std::sync::Mutex;
use tracing::{error, info};

/// 通知接收方
pub trait Notifier: Send + Sync {
    fn report_success(&self, message: &str);
    fn report_failure(&self, message: &str);
}

/// 通过 tracing 输出通知
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn report_success(&self, message: &str) {
        info!("✅ {}", message);
    }

    fn report_failure(&self, message: &str) {
        error!("❌ {}", message);
    }
}

/// 一条已发出的通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure(String),
}

/// 把通知收集起来，供调用方事后查看
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    fn push(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

impl Notifier for CollectingNotifier {
    fn report_success(&self, message: &str) {
        self.push(Notice::Success(message.to_string()));
    }

    fn report_failure(&self, message: &str) {
        self.push(Notice::Failure(message.to_string()));
    }
}
