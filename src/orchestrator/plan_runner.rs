//! 批处理计划执行器 - 编排层
//!
//! ## 职责
//!
//! 程序入口使用的顶层编排：
//!
//! 1. **初始化**：创建报告文件、连接处理服务
//! 2. **批量加载**：扫描计划目录中的所有 TOML 计划
//! 3. **依次执行**：同一个控制器逐个载入并执行计划（同一时间只有一个批处理在途）
//! 4. **统计**：每个计划写一行报告，最后输出统计与历史记录

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::BatchPlan;
use crate::orchestrator::controller::OrchestrationController;
use crate::utils::logging::{
    append_report_line, init_log_file, log_plan_complete, log_plan_start, log_plans_loaded,
    log_startup, print_final_stats,
};

/// 应用主结构
pub struct App {
    config: Config,
    controller: OrchestrationController,
}

/// 执行统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

impl App {
    /// 初始化应用（连接真实处理服务）
    pub async fn initialize(config: Config) -> Result<Self> {
        let controller = OrchestrationController::from_config(&config)?;
        Self::with_controller(config, controller)
    }

    /// 使用已构造好的控制器
    pub fn with_controller(config: Config, controller: OrchestrationController) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(&config);
        Ok(Self { config, controller })
    }

    pub fn controller(&self) -> &OrchestrationController {
        &self.controller
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<RunStats> {
        let plans = self.load_plans().await?;

        if plans.is_empty() {
            warn!("⚠️ 没有找到批处理计划，程序结束");
            return Ok(RunStats::default());
        }

        log_plans_loaded(plans.len(), &self.config.plan_folder);

        let stats = self.run_all_plans(&plans).await?;

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            self.controller.history().entries(),
            &self.config.output_log_file,
        );

        Ok(stats)
    }

    async fn load_plans(&self) -> Result<Vec<BatchPlan>> {
        info!("\n📁 正在扫描批处理计划...");
        Ok(crate::models::load_all_plans(&self.config.plan_folder).await?)
    }

    async fn run_all_plans(&mut self, plans: &[BatchPlan]) -> Result<RunStats> {
        let mut stats = RunStats {
            total: plans.len(),
            ..Default::default()
        };

        for (idx, plan) in plans.iter().enumerate() {
            let plan_index = idx + 1;
            let name = plan.display_name();
            log_plan_start(plan_index, plans.len(), &name, plan.tasks.len());

            match self.run_plan(plan).await {
                Ok(summary) => {
                    stats.success += 1;
                    log_plan_complete(plan_index, &summary);
                    append_report_line(
                        &self.config.output_log_file,
                        &format!("✅ {} | {}", name, summary),
                    )?;
                }
                Err(e) => {
                    stats.failed += 1;
                    error!("[计划 {}] ❌ 执行失败: {}", plan_index, e);
                    append_report_line(
                        &self.config.output_log_file,
                        &format!("❌ {} | {}", name, e),
                    )?;
                }
            }
        }

        Ok(stats)
    }

    async fn run_plan(&mut self, plan: &BatchPlan) -> AppResult<String> {
        self.controller
            .apply_plan(plan, self.config.apply_to_current)?;
        let result = self.controller.run_batch().await?;
        Ok(result.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockTransport;
    use crate::services::CollectingNotifier;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_runs_each_plan_and_writes_report() {
        let dir = std::env::temp_dir().join(format!("cv_batch_runner_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("01_chain.toml"),
            "image_id = \"img\"\nmode = \"filter_chain\"\n[[tasks]]\nkind = \"canny\"\n[[tasks]]\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("02_empty.toml"),
            "image_id = \"img\"\nmode = \"multiple_filters\"\n",
        )
        .unwrap();

        let report = dir.join("report.txt");
        let config = Config {
            plan_folder: dir.to_string_lossy().to_string(),
            output_log_file: report.to_string_lossy().to_string(),
            ..Config::default()
        };

        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({"success": true, "result_image": "X", "chain_length": 2}));
        let controller =
            OrchestrationController::new(transport.clone(), Arc::new(CollectingNotifier::new()));

        let mut app = App::with_controller(config, controller).unwrap();
        let stats = app.run().await.unwrap();

        assert_eq!(
            stats,
            RunStats {
                success: 1,
                failed: 1,
                total: 2
            }
        );
        assert_eq!(transport.call_count(), 1);
        assert_eq!(app.controller().history().len(), 1);

        let content = std::fs::read_to_string(&report).unwrap();
        assert!(content.contains("滤波链 完成，共 2 步"));
        assert!(content.contains("❌"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
