pub mod controller;
pub mod plan_runner;

pub use controller::OrchestrationController;
pub use plan_runner::{App, RunStats};
