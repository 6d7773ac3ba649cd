pub mod loaders;
pub mod operation;
pub mod parameter;
pub mod plan;
pub mod response;
pub mod task;

pub use loaders::{load_all_plans, load_plan_file};
pub use operation::{BatchMode, OperationDomain, ResultShape};
pub use parameter::{ParamValue, ParameterDef, ParameterKind, ParameterMap};
pub use plan::{BatchPlan, PlanTask};
pub use response::{RawBatchResponse, TaskOutcome};
pub use task::{Task, TaskId};
