pub mod history;
pub mod notifier;
pub mod result_aggregator;
pub mod schema_registry;
pub mod single_ops;
pub mod task_list;

pub use history::{HistoryEntry, HistoryLedger, HISTORY_CAPACITY};
pub use notifier::{CollectingNotifier, Notice, Notifier, TracingNotifier};
pub use result_aggregator::{
    aggregate, Aggregate, BatchView, ChainView, ComparisonSummary, FanOutView,
};
pub use schema_registry::ParameterSchemaRegistry;
pub use single_ops::{
    DownloadedImage, MatchResult, MatchingMethod, OperationResult, ProcessorType,
    SingleOperationService,
};
pub use task_list::{EditRequest, EditResponse, TaskListModel, TaskRow};
