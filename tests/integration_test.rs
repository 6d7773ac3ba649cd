use cv_batch_orchestrator::error::ValidationError;
use cv_batch_orchestrator::logger;
use cv_batch_orchestrator::services::{CollectingNotifier, Notice};
use cv_batch_orchestrator::{
    AppError, AppResult, BatchDispatcher, BatchMode, BatchRequestBuilder, BatchView,
    ComparisonSummary, Config, OperationDomain, OrchestrationController, ServiceReply,
    ServiceTransport, TaskListModel,
};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// 内存中的处理服务
#[derive(Default)]
struct FakeService {
    replies: Mutex<VecDeque<Value>>,
    calls: Mutex<Vec<(String, Value)>>,
    gate: Option<Arc<Notify>>,
}

impl FakeService {
    fn replying(bodies: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(bodies.into()),
            ..Self::default()
        })
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ServiceTransport for FakeService {
    fn post_json<'a>(
        &'a self,
        endpoint: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, AppResult<ServiceReply>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), body.clone()));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let body = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| json!({"success": true}));
            Ok(ServiceReply::ok(body))
        })
    }
}

#[tokio::test]
async fn test_mixed_batch_end_to_end() {
    let service = FakeService::replying(vec![json!({
        "success": true,
        "results": {
            "features": {"task_0": {"result_image": "ZmVhdA==", "keypoints": [{}, {}, {}, {}]}},
            "filters": {"task_1": "Zmls"},
            "transformations": {"task_2": null}
        },
        "total_operations": 3
    })]);
    let notifier = Arc::new(CollectingNotifier::new());
    let mut controller = OrchestrationController::new(service.clone(), notifier.clone());

    controller.select_mode(BatchMode::MixedOperations);
    controller.select_image("img-42");
    controller.add_task_in(OperationDomain::Feature).unwrap();
    controller.add_task_in(OperationDomain::Filter).unwrap();
    controller.add_task_in(OperationDomain::Transform).unwrap();

    let result = controller.run_batch().await.unwrap().clone();

    let calls = service.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/api/process_mixed_operations");
    let operations = calls[0].1["operations"].as_array().unwrap();
    assert_eq!(operations.len(), 3);
    assert_eq!(operations[1]["operation_type"], "image_filtering");
    assert_eq!(operations[2]["transformation_type"], "rotation");
    assert_eq!(operations[0]["type"], "mixed");

    let BatchView::FanOut(view) = &result.view else {
        panic!("expected fan-out view");
    };
    let ids: Vec<_> = view.outcomes.iter().map(|o| o.task_id.as_str()).collect();
    assert_eq!(ids, ["task_0", "task_1", "task_2"]);
    assert_eq!(view.outcomes[0].keypoint_count, Some(4));
    assert_eq!(view.outcomes[2].image, None);
    assert_eq!(
        result.comparison,
        Some(ComparisonSummary::Totals { total_operations: 3 })
    );

    assert_eq!(controller.history().len(), 1);
    assert!(matches!(notifier.notices()[0], Notice::Success(_)));
}

#[tokio::test]
async fn test_edit_then_dispatch_uses_new_kind() {
    let service = FakeService::replying(vec![json!({"success": true, "result_image": "X", "chain_length": 2})]);
    let mut controller =
        OrchestrationController::new(service.clone(), Arc::new(CollectingNotifier::new()));

    controller.select_mode(BatchMode::FilterChain);
    controller.select_image("img");
    controller.add_task();
    controller.add_task();

    let request = controller.edit_request(1).unwrap();
    assert_eq!(request.domain, OperationDomain::Filter);
    assert!(controller.apply_edit(request.answer("median_blur")));

    controller.run_batch().await.unwrap();

    let chain = service.calls()[0].1["filter_chain"].clone();
    assert_eq!(chain[0]["filter_type"], "gaussian_blur");
    assert_eq!(chain[1]["filter_type"], "median_blur");
    // 编辑不会改动原有参数
    assert_eq!(chain[1]["parameters"]["sigma"], 0.0);
}

#[tokio::test]
async fn test_mode_switch_discards_tasks_but_not_ids() {
    let service = FakeService::replying(Vec::new());
    let mut controller = OrchestrationController::new(service, Arc::new(CollectingNotifier::new()));

    controller.add_task();
    controller.add_task();
    controller.select_mode(BatchMode::MultipleTransformations);
    assert!(controller.tasks().is_empty());

    let id = controller.add_task();
    assert_eq!(id, "task_2");
}

#[tokio::test]
async fn test_validation_failure_never_reaches_service() {
    let service = FakeService::replying(Vec::new());
    let mut controller =
        OrchestrationController::new(service.clone(), Arc::new(CollectingNotifier::new()));
    controller.select_image("img");

    let err = controller.run_batch().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::EmptyTaskList { .. })
    ));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_one_batch_in_flight() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(FakeService {
        gate: Some(gate.clone()),
        ..FakeService::default()
    });
    let dispatcher = BatchDispatcher::new(service.clone());

    let mut list = TaskListModel::new(BatchMode::MultipleFilters);
    list.add_task();
    let request = BatchRequestBuilder::build(list.mode(), list.tasks(), Some("img"), true).unwrap();

    let mut pending = Box::pin(dispatcher.dispatch(&request));
    assert!(futures::poll!(pending.as_mut()).is_pending());

    assert!(matches!(
        dispatcher.dispatch(&request).await,
        Err(AppError::Busy)
    ));
    assert_eq!(service.calls().len(), 1);

    gate.notify_one();
    assert!(pending.await.is_ok());
    assert!(!dispatcher.is_busy());
}

#[tokio::test]
#[ignore] // 需要运行中的处理服务：CV_TEST_IMAGE_ID=<id> cargo test -- --ignored
async fn test_live_filter_batch() {
    logger::init();

    let config = Config::from_env().expect("读取配置失败");
    let image_id = std::env::var("CV_TEST_IMAGE_ID").expect("需要设置 CV_TEST_IMAGE_ID");

    let mut controller = OrchestrationController::from_config(&config).expect("创建控制器失败");
    controller.select_mode(BatchMode::MultipleFilters);
    controller.select_image(image_id);
    controller.add_task();
    controller.add_task();

    let result = controller.run_batch().await.expect("批处理失败");
    assert_eq!(
        result.comparison,
        Some(ComparisonSummary::Totals { total_operations: 2 })
    );
}
