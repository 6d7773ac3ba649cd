//! 批处理调度 - 流程层
//!
//! 每次调用只发出一个请求，并保证同一时间最多只有一个批处理在执行。
//! 只解读响应顶层的 `success`，其余内容原样交给结果汇总

use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, error, info, warn};

use crate::clients::ServiceTransport;
use crate::error::{AppError, AppResult};
use crate::models::RawBatchResponse;
use crate::workflow::request_builder::BatchRequest;

/// 批处理调度器
pub struct BatchDispatcher {
    transport: Arc<dyn ServiceTransport>,
    /// 只有一个许可；许可随请求的 future 一起释放
    in_flight: Semaphore,
}

impl BatchDispatcher {
    pub fn new(transport: Arc<dyn ServiceTransport>) -> Self {
        Self {
            transport,
            in_flight: Semaphore::new(1),
        }
    }

    /// 是否有批处理正在执行（界面据此禁用触发按钮）
    pub fn is_busy(&self) -> bool {
        self.in_flight.available_permits() == 0
    }

    /// 发送请求
    ///
    /// 已有请求在途时立即返回 [`AppError::Busy`]，不发出第二个请求
    pub async fn dispatch(&self, request: &BatchRequest) -> AppResult<RawBatchResponse> {
        let _permit = self.acquire()?;

        let endpoint = request.endpoint();
        info!(
            "🚀 发送批处理: {} ({} 个任务) → {}",
            request.mode,
            request.tasks.len(),
            endpoint
        );

        let reply = self
            .transport
            .post_json(endpoint, &request.body())
            .await
            .map_err(|e| {
                error!("❌ 批处理请求失败: {}", e);
                e
            })?;

        let response: RawBatchResponse = serde_json::from_value(reply.body).map_err(|e| {
            AppError::malformed_response(endpoint, format!("无法解析响应: {}", e))
        })?;

        if !response.success {
            let message = response
                .error
                .clone()
                .unwrap_or_else(|| format!("HTTP {}", reply.status));
            warn!("⚠️ 服务返回失败 ({}): {}", endpoint, message);
            return Err(AppError::service(endpoint, message));
        }

        debug!(
            "批处理完成: total_tasks={:?} total_operations={:?} processing_time={:?}",
            response.total_tasks, response.total_operations, response.processing_time
        );
        if let Some(comparison) = &response.comparison {
            debug!("服务端对比信息: {}", comparison);
        }
        Ok(response)
    }

    fn acquire(&self) -> AppResult<SemaphorePermit<'_>> {
        self.in_flight.try_acquire().map_err(|_| {
            warn!("⏳ 已有批处理在执行，本次请求被拒绝");
            AppError::Busy
        })
    }
}
