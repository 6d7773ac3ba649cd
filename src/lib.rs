//! # CV Batch Orchestrator
//!
//! 图像处理工作台的客户端批处理编排：为操作种类生成参数模式、维护任务列表、
//! 以六种批处理模式之一调用处理服务，并汇总对比返回结果。
//! 像素级算法全部在外部处理服务中执行。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 传输层（Clients）
//! - `clients/` - 与处理服务之间唯一的通道
//! - `ServiceTransport` - 传输接口，测试中可替换
//! - `ProcessingClient` - 基于 reqwest 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 每个模块只做一件事
//! - `ParameterSchemaRegistry` - 参数模式与默认值
//! - `TaskListModel` - 任务列表与任务标识
//! - `ResultAggregator` - 结果汇总与对比（`aggregate`）
//! - `HistoryLedger` - 最近 10 条操作记录
//! - `SingleOperationService` - 单项操作与特征匹配
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 一次批处理往返
//! - `BatchRequestBuilder` - 校验并构建请求
//! - `BatchDispatcher` - 发送请求，保证同一时间只有一个批处理在途
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/controller` - 会话上下文，串起 模式 → 任务 → 发送 → 汇总 → 记录
//! - `orchestrator/plan_runner` - 逐个执行 TOML 批处理计划
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ProcessingClient, ServiceReply, ServiceTransport};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{BatchMode, BatchPlan, OperationDomain, ParamValue, ParameterMap, Task, TaskId};
pub use orchestrator::{App, OrchestrationController, RunStats};
pub use services::{
    aggregate, Aggregate, BatchView, ComparisonSummary, HistoryLedger, Notifier,
    ParameterSchemaRegistry, TaskListModel,
};
pub use workflow::{BatchDispatcher, BatchRequest, BatchRequestBuilder};
