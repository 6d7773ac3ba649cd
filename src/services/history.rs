//! 操作历史 - 业务能力层
//!
//! 有界、新的在前的操作记录，容量固定为 10，溢出时丢弃最旧的一条

use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// 历史记录容量
pub const HISTORY_CAPACITY: usize = 10;

/// 一条历史记录
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub operation: String,
    pub details: String,
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    /// 显示用的单行文本
    pub fn summary_line(&self) -> String {
        format!(
            "[{}] {} - {}",
            self.timestamp.format("%H:%M:%S"),
            self.operation,
            self.details
        )
    }
}

/// 操作历史
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
        }
    }

    /// 在头部插入一条记录
    pub fn record(
        &mut self,
        operation: impl Into<String>,
        details: impl Into<String>,
    ) -> &HistoryEntry {
        self.entries.push_front(HistoryEntry {
            operation: operation.into(),
            details: details.into(),
            timestamp: Local::now(),
        });
        self.entries.truncate(HISTORY_CAPACITY);
        &self.entries[0]
    }

    /// 按新到旧的顺序遍历（可重复遍历）
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> + Clone + '_ {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eleventh_entry_evicts_oldest() {
        let mut ledger = HistoryLedger::new();
        for i in 1..=11 {
            ledger.record(format!("op{}", i), "");
        }

        assert_eq!(ledger.len(), HISTORY_CAPACITY);
        let ops: Vec<_> = ledger.entries().map(|e| e.operation.as_str()).collect();
        assert_eq!(ops.first(), Some(&"op11"));
        assert_eq!(ops.last(), Some(&"op2"));
        assert!(!ops.contains(&"op1"));
    }

    #[test]
    fn test_entries_can_be_restarted() {
        let mut ledger = HistoryLedger::new();
        ledger.record("特征提取", "sift");
        ledger.record("图像滤波", "canny");

        let iter = ledger.entries();
        assert_eq!(iter.clone().count(), 2);
        assert_eq!(iter.map(|e| e.details.as_str()).collect::<Vec<_>>(), ["canny", "sift"]);
    }

    #[test]
    fn test_record_returns_head() {
        let mut ledger = HistoryLedger::new();
        let entry = ledger.record("重置图像", "已恢复原图").clone();
        assert_eq!(ledger.latest(), Some(&entry));
        assert!(entry.summary_line().ends_with("重置图像 - 已恢复原图"));
    }
}
