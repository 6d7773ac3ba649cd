//! 结果汇总 - 业务能力层
//!
//! 把服务返回的原始响应整理成可直接显示的视图：
//!
//! - 链式模式：最终图像与链长度，不产生对比信息
//! - 多特征模式：逐任务结果 + 数量对比（最大/最小/平均/最佳任务）
//! - 其他扇出模式（含混合）：逐任务结果 + 操作总数
//!
//! 纯函数，不触碰任务列表和历史记录

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{BatchMode, OperationDomain, RawBatchResponse, ResultShape, TaskOutcome};

/// 对比信息
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonSummary {
    /// 多特征模式的数量统计
    Features {
        max_count: usize,
        min_count: usize,
        avg_count: f64,
        best_task_id: String,
    },
    /// 其余扇出模式只统计操作数
    Totals { total_operations: usize },
}

/// 链式结果
#[derive(Debug, Clone, PartialEq)]
pub struct ChainView {
    pub final_image: String,
    pub chain_length: usize,
    pub applied_to_current: bool,
}

/// 扇出结果
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutView {
    /// 按任务列表顺序排列
    pub outcomes: Vec<TaskOutcome>,
    pub processing_time: Option<f64>,
}

impl FanOutView {
    pub fn outcome(&self, task_id: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.task_id == task_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchView {
    Chain(ChainView),
    FanOut(FanOutView),
}

/// 汇总结果
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub mode: BatchMode,
    pub view: BatchView,
    pub comparison: Option<ComparisonSummary>,
}

impl Aggregate {
    /// 一句话摘要，用于通知与报告
    pub fn summary(&self) -> String {
        match (&self.view, &self.comparison) {
            (BatchView::Chain(chain), _) => {
                format!("{} 完成，共 {} 步", self.mode.name(), chain.chain_length)
            }
            (
                BatchView::FanOut(_),
                Some(ComparisonSummary::Features {
                    max_count,
                    min_count,
                    avg_count,
                    best_task_id,
                }),
            ) => format!(
                "{} 完成，最多 {} / 最少 {} / 平均 {:.1}，最佳 {}",
                self.mode.name(),
                max_count,
                min_count,
                avg_count,
                best_task_id
            ),
            (BatchView::FanOut(_), Some(ComparisonSummary::Totals { total_operations })) => {
                format!("{} 完成，共 {} 个操作", self.mode.name(), total_operations)
            }
            (BatchView::FanOut(view), None) => {
                format!("{} 完成，{} 个结果", self.mode.name(), view.outcomes.len())
            }
        }
    }
}

/// 汇总服务响应
///
/// `task_order` 为请求中任务的顺序，决定结果排列和并列时的取舍
pub fn aggregate(
    mode: BatchMode,
    raw: &RawBatchResponse,
    task_order: &[String],
) -> AppResult<Aggregate> {
    match mode.result_shape() {
        ResultShape::Chain => aggregate_chain(mode, raw, task_order),
        ResultShape::FanOut | ResultShape::Heterogeneous => aggregate_fan_out(mode, raw, task_order),
    }
}

fn aggregate_chain(
    mode: BatchMode,
    raw: &RawBatchResponse,
    task_order: &[String],
) -> AppResult<Aggregate> {
    let final_image = raw
        .result_image
        .clone()
        .ok_or_else(|| AppError::malformed_response(mode.endpoint(), "缺少 result_image"))?;

    Ok(Aggregate {
        mode,
        view: BatchView::Chain(ChainView {
            final_image,
            chain_length: raw.chain_length.unwrap_or(task_order.len()),
            applied_to_current: raw.applied_to_current.unwrap_or(false),
        }),
        comparison: None,
    })
}

fn aggregate_fan_out(
    mode: BatchMode,
    raw: &RawBatchResponse,
    task_order: &[String],
) -> AppResult<Aggregate> {
    let results = match &raw.results {
        Some(Value::Object(results)) => results,
        Some(_) => {
            return Err(AppError::malformed_response(
                mode.endpoint(),
                "results 不是对象",
            ))
        }
        None => return Err(AppError::malformed_response(mode.endpoint(), "缺少 results")),
    };

    let unordered = if mode == BatchMode::MixedOperations {
        flatten_mixed(results)
    } else {
        results
            .iter()
            .map(|(task_id, value)| TaskOutcome::from_value(task_id, value, None))
            .collect()
    };
    let outcomes = order_outcomes(unordered, task_order);

    debug!("{} 汇总 {} 个任务结果", mode, outcomes.len());

    let comparison = if mode == BatchMode::MultipleFeatures {
        compare_feature_counts(&outcomes)
    } else {
        let total_operations = if task_order.is_empty() {
            outcomes.len()
        } else {
            task_order.len()
        };
        Some(ComparisonSummary::Totals { total_operations })
    };

    Ok(Aggregate {
        mode,
        view: BatchView::FanOut(FanOutView {
            outcomes,
            processing_time: raw.processing_time,
        }),
        comparison,
    })
}

/// 混合模式的结果按类别分组，展开并标注类别
fn flatten_mixed(results: &Map<String, Value>) -> Vec<TaskOutcome> {
    let grouped = OperationDomain::ALL
        .iter()
        .any(|domain| results.contains_key(domain.mixed_results_key()));

    if !grouped {
        return results
            .iter()
            .map(|(task_id, value)| TaskOutcome::from_value(task_id, value, None))
            .collect();
    }

    OperationDomain::ALL
        .iter()
        .filter_map(|domain| {
            results
                .get(domain.mixed_results_key())
                .and_then(Value::as_object)
                .map(|group| (*domain, group))
        })
        .flat_map(|(domain, group)| {
            group
                .iter()
                .map(move |(task_id, value)| TaskOutcome::from_value(task_id, value, Some(domain)))
        })
        .collect()
}

/// 按请求顺序排列；请求中没有的任务追加在末尾（按标识排序）
fn order_outcomes(mut unordered: Vec<TaskOutcome>, task_order: &[String]) -> Vec<TaskOutcome> {
    let mut ordered = Vec::with_capacity(unordered.len());
    for task_id in task_order {
        if let Some(pos) = unordered.iter().position(|o| &o.task_id == task_id) {
            ordered.push(unordered.swap_remove(pos));
        }
    }
    unordered.sort_by(|a, b| a.task_id.cmp(&b.task_id));
    ordered.extend(unordered);
    ordered
}

/// 特征数量对比；没有任何数量时不产生对比
///
/// 并列最大时取顺序在前的任务
fn compare_feature_counts(outcomes: &[TaskOutcome]) -> Option<ComparisonSummary> {
    let counted: Vec<(&str, usize)> = outcomes
        .iter()
        .filter_map(|o| o.keypoint_count.map(|count| (o.task_id.as_str(), count)))
        .collect();

    let (&(first_id, first_count), rest) = counted.split_first()?;

    let mut best = (first_id, first_count);
    let mut min_count = first_count;
    let mut sum = first_count;
    for &(task_id, count) in rest {
        if count > best.1 {
            best = (task_id, count);
        }
        min_count = min_count.min(count);
        sum += count;
    }

    Some(ComparisonSummary::Features {
        max_count: best.1,
        min_count,
        avg_count: sum as f64 / counted.len() as f64,
        best_task_id: best.0.to_string(),
    })
}
