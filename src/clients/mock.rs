//! 测试用的内存传输
//!
//! 记录每一次调用；可预置应答，也可在应答前挂起，直到测试放行

use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::clients::{ServiceReply, ServiceTransport};
use crate::error::AppResult;

#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<AppResult<ServiceReply>>>,
    calls: Mutex<Vec<(String, Value)>>,
    gate: Option<Arc<Notify>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次应答前等待 `gate` 放行
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_reply(&self, reply: AppResult<ServiceReply>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_json(&self, body: Value) {
        self.push_reply(Ok(ServiceReply::ok(body)));
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ServiceTransport for MockTransport {
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

            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ServiceReply::ok(json!({"success": true}))))
        })
    }
}
