//! Scripted in-process transport for tests.
//!
//! Enabled with the `testing` feature.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lyceum_types::Principal;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::transport::Transport;

type Responder = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// One call observed by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: Operation,
    pub args: Vec<Value>,
    pub principal: Option<Principal>,
}

/// Transport answering from per-operation responders.
///
/// Operations without a responder fail with a remote error naming the
/// operation. [`MockTransport::hold`] parks calls until released, which is
/// how tests keep a request in flight.
#[derive(Default)]
pub struct MockTransport {
    responders: Mutex<HashMap<Operation, Responder>>,
    gates: Mutex<HashMap<Operation, Arc<Notify>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `operation` with `value`.
    pub fn respond(&self, operation: Operation, value: Value) {
        self.respond_with(operation, move |_| Ok(value.clone()));
    }

    /// Answer `operation` by calling `f` with the call arguments.
    pub fn respond_with<F>(&self, operation: Operation, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.responders.lock().insert(operation, Arc::new(f));
    }

    /// Fail `operation` with a remote error carrying `message`.
    pub fn fail(&self, operation: Operation, message: &str) {
        let message = message.to_string();
        self.respond_with(operation, move |_| Err(Error::Remote(message.clone())));
    }

    /// Park calls to `operation` until the returned handle is notified.
    /// Each `notify_one` releases one call.
    pub fn hold(&self, operation: Operation) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(operation, gate.clone());
        gate
    }

    /// Stop parking calls to `operation`.
    pub fn release(&self, operation: Operation) {
        if let Some(gate) = self.gates.lock().remove(&operation) {
            gate.notify_waiters();
        }
    }

    /// All calls observed so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls observed for `operation`.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Wait until at least `n` calls to `operation` have been observed.
    pub async fn wait_for_calls(&self, operation: Operation, n: usize) {
        for _ in 0..500 {
            if self.call_count(operation) >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("timed out waiting for {n} calls to {operation}");
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(
        &self,
        operation: Operation,
        args: Vec<Value>,
        principal: Option<&Principal>,
    ) -> Result<Value> {
        self.calls.lock().push(RecordedCall {
            operation,
            args: args.clone(),
            principal: principal.cloned(),
        });

        let gate = self.gates.lock().get(&operation).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let responder = self.responders.lock().get(&operation).cloned();
        match responder {
            Some(f) => f(&args),
            None => Err(Error::Remote(format!("no mock response for {operation}"))),
        }
    }
}
