pub mod processing_client;

#[cfg(test)]
pub(crate) mod mock;

pub use processing_client::{ProcessingClient, ServiceReply, ServiceTransport};
