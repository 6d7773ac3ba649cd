pub mod dispatcher;
pub mod request_builder;

pub use dispatcher::BatchDispatcher;
pub use request_builder::{BatchRequest, BatchRequestBuilder};
