//! 编排控制器 - 编排层
//!
//! ## 职责
//!
//! 每个会话构造一次，持有该会话的全部状态，并把各组件串成用户看到的流程：
//!
//! 1. **选择模式**：切换模式即清空任务列表
//! 2. **组织任务**：新增 / 删除 / 编辑，参数默认值来自注册表
//! 3. **发送**：构建请求 → 调度 → 汇总
//! 4. **记录**：成功时写入历史并通知；失败时只通知
//!
//! 失败（校验、网络、服务）都在这里终止：不重试，任务列表和历史保持原样，
//! 调度器的占用标记在任何路径上都会释放

use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::{ProcessingClient, ServiceTransport};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{BatchMode, BatchPlan, OperationDomain, ParameterMap};
use crate::services::{
    aggregate, Aggregate, DownloadedImage, EditRequest, EditResponse, HistoryLedger, MatchResult,
    MatchingMethod, Notifier, OperationResult, ProcessorType, SingleOperationService,
    TaskListModel, TaskRow, TracingNotifier,
};
use crate::workflow::{BatchDispatcher, BatchRequestBuilder};

/// 批处理历史的操作名
pub const BATCH_HISTORY_LABEL: &str = "批量处理";

/// 会话上下文
pub struct OrchestrationController {
    tasks: TaskListModel,
    history: HistoryLedger,
    dispatcher: BatchDispatcher,
    single_ops: SingleOperationService,
    notifier: Arc<dyn Notifier>,
    primary_image: Option<String>,
    secondary_image: Option<String>,
    apply_to_current: bool,
    last_result: Option<Aggregate>,
}

impl OrchestrationController {
    pub fn new(transport: Arc<dyn ServiceTransport>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            tasks: TaskListModel::new(BatchMode::MultipleFeatures),
            history: HistoryLedger::new(),
            dispatcher: BatchDispatcher::new(transport.clone()),
            single_ops: SingleOperationService::new(transport),
            notifier,
            primary_image: None,
            secondary_image: None,
            apply_to_current: true,
            last_result: None,
        }
    }

    /// 连接真实处理服务，通知写入日志
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = ProcessingClient::new(config)?;
        let mut controller = Self::new(Arc::new(client), Arc::new(TracingNotifier));
        controller.apply_to_current = config.apply_to_current;
        Ok(controller)
    }

    // ========== 状态 ==========

    pub fn mode(&self) -> BatchMode {
        self.tasks.mode()
    }

    pub fn tasks(&self) -> &TaskListModel {
        &self.tasks
    }

    pub fn task_rows(&self) -> Vec<TaskRow> {
        self.tasks.rows()
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn last_result(&self) -> Option<&Aggregate> {
        self.last_result.as_ref()
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.primary_image.as_deref()
    }

    pub fn apply_to_current(&self) -> bool {
        self.apply_to_current
    }

    /// 触发按钮是否可用
    pub fn can_dispatch(&self) -> bool {
        !self.dispatcher.is_busy() && self.primary_image.is_some() && !self.tasks.is_empty()
    }

    // ========== 图片与选项 ==========

    pub fn select_image(&mut self, image_id: impl Into<String>) {
        self.primary_image = Some(image_id.into());
    }

    pub fn select_second_image(&mut self, image_id: impl Into<String>) {
        self.secondary_image = Some(image_id.into());
    }

    pub fn set_apply_to_current(&mut self, apply: bool) {
        self.apply_to_current = apply;
    }

    // ========== 任务列表 ==========

    /// 切换批处理模式，任务列表随之清空
    pub fn select_mode(&mut self, mode: BatchMode) {
        if mode != self.tasks.mode() {
            info!("🔀 切换批处理模式: {} → {}", self.tasks.mode(), mode);
        }
        self.tasks.set_mode(mode);
        self.last_result = None;
    }

    pub fn add_task(&mut self) -> String {
        self.tasks.add_task().id.to_string()
    }

    pub fn add_task_in(&mut self, domain: OperationDomain) -> AppResult<String> {
        Ok(self.tasks.add_task_in(domain)?.id.to_string())
    }

    pub fn remove_task(&mut self, index: usize) {
        self.tasks.remove_task(index);
    }

    pub fn edit_request(&self, index: usize) -> Option<EditRequest> {
        self.tasks.edit_request(index)
    }

    pub fn apply_edit(&mut self, response: EditResponse) -> bool {
        self.tasks.apply_edit(response)
    }

    pub fn clear_tasks(&mut self) {
        self.tasks.clear();
    }

    /// 载入一个批处理计划：切换模式、选图、逐条加入任务
    ///
    /// 任一任务不合法时任务列表被清空
    pub fn apply_plan(&mut self, plan: &BatchPlan, default_apply_to_current: bool) -> AppResult<()> {
        self.select_mode(plan.mode);
        self.select_image(plan.image_id.clone());
        self.apply_to_current = plan.apply_to_current.unwrap_or(default_apply_to_current);

        for entry in &plan.tasks {
            let domain = entry.domain.unwrap_or_else(|| plan.mode.domain());
            let kind = entry.kind.as_deref().unwrap_or_else(|| domain.default_kind());
            if let Err(e) = self.tasks.add_configured(domain, kind, &entry.parameters) {
                self.tasks.clear();
                return Err(e);
            }
        }

        debug!("计划 {} 载入 {} 个任务", plan.display_name(), self.tasks.len());
        Ok(())
    }

    // ========== 批处理 ==========

    /// 执行当前任务列表
    ///
    /// 成功：保存汇总结果，写入历史，发出成功通知。
    /// 失败：只发出失败通知
    pub async fn run_batch(&mut self) -> AppResult<&Aggregate> {
        match self.execute_batch().await {
            Ok(result) => {
                self.history.record(
                    BATCH_HISTORY_LABEL,
                    format!("{}: {} 个任务", result.mode.name(), self.tasks.len()),
                );
                self.notifier.report_success(&result.summary());
                Ok(self.last_result.insert(result))
            }
            Err(e) => {
                self.notifier.report_failure(&e.to_string());
                Err(e)
            }
        }
    }

    async fn execute_batch(&self) -> AppResult<Aggregate> {
        let request = BatchRequestBuilder::build(
            self.tasks.mode(),
            self.tasks.tasks(),
            self.primary_image.as_deref(),
            self.apply_to_current,
        )?;

        let raw = self.dispatcher.dispatch(&request).await?;
        aggregate(request.mode, &raw, &request.task_ids())
    }

    // ========== 单项操作 ==========

    pub async fn apply_single(
        &mut self,
        domain: OperationDomain,
        kind: &str,
        overrides: &ParameterMap,
    ) -> AppResult<OperationResult> {
        let result = self
            .single_ops
            .apply(domain, self.primary_image.as_deref(), kind, overrides)
            .await;
        self.settle(result, domain.name(), |r| format!("类型: {}", r.kind))
    }

    pub async fn extract_features(
        &mut self,
        kind: &str,
        overrides: &ParameterMap,
    ) -> AppResult<OperationResult> {
        self.apply_single(OperationDomain::Feature, kind, overrides)
            .await
    }

    pub async fn apply_filter(
        &mut self,
        kind: &str,
        overrides: &ParameterMap,
    ) -> AppResult<OperationResult> {
        self.apply_single(OperationDomain::Filter, kind, overrides)
            .await
    }

    pub async fn apply_transformation(
        &mut self,
        kind: &str,
        overrides: &ParameterMap,
    ) -> AppResult<OperationResult> {
        self.apply_single(OperationDomain::Transform, kind, overrides)
            .await
    }

    pub async fn match_features(
        &mut self,
        method: MatchingMethod,
        ratio_threshold: f64,
    ) -> AppResult<MatchResult> {
        let result = self
            .single_ops
            .match_features(
                self.primary_image.as_deref(),
                self.secondary_image.as_deref(),
                method,
                ratio_threshold,
            )
            .await;
        self.settle(result, "特征匹配", |r| format!("方法: {}", r.method))
    }

    /// 恢复原图，返回原图数据
    pub async fn reset_image(&mut self) -> AppResult<Option<String>> {
        let result = self
            .single_ops
            .reset_image(self.primary_image.as_deref())
            .await;
        self.settle(result, "重置图像", |_| "恢复为原图".to_string())
    }

    /// 重置服务端批处理状态，清除上一次的批处理结果
    pub async fn reset_batch_processor(&mut self) -> AppResult<String> {
        let result = self
            .single_ops
            .reset_batch_processor(self.primary_image.as_deref())
            .await;
        if result.is_ok() {
            self.last_result = None;
        }
        self.settle(result, "重置批处理", |message| message.clone())
    }

    /// 取当前图像用于保存
    pub async fn download_image(
        &mut self,
        processor_type: ProcessorType,
    ) -> AppResult<DownloadedImage> {
        let result = self
            .single_ops
            .download_image(self.primary_image.as_deref(), processor_type)
            .await;
        self.settle(result, "下载图像", |image| image.filename.clone())
    }

    /// 成功写历史并通知，失败只通知
    fn settle<T>(
        &mut self,
        result: AppResult<T>,
        label: &str,
        detail: impl FnOnce(&T) -> String,
    ) -> AppResult<T> {
        match &result {
            Ok(value) => {
                let entry = self.history.record(label, detail(value));
                let message = format!("{}成功", entry.operation);
                self.notifier.report_success(&message);
            }
            Err(e) => self.notifier.report_failure(&e.to_string()),
        }
        result
    }

    /// 当前是否有批处理在途
    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }
}
