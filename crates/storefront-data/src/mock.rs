//! In-memory remote for development and testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::{Method, Remote, RemoteCall, RemoteError};

type Route = (Method, String);

/// Scriptable remote.
///
/// Responses are queued per `(method, path)`. Each call consumes the front
/// of the queue; the last queued response is sticky and answers every later
/// call. The response is chosen when the call arrives, so call order fixes
/// which response each caller gets even while the remote is paused.
#[derive(Default)]
pub struct MockRemote {
    routes: Mutex<HashMap<Route, VecDeque<Result<Value, RemoteError>>>>,
    calls: Mutex<Vec<RemoteCall>>,
    paused: AtomicBool,
    resume: Notify,
}

impl MockRemote {
    /// Create a mock with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a route.
    pub fn on(&self, method: Method, path: impl Into<String>, response: Result<Value, RemoteError>) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((method, path.into()))
            .or_default()
            .push_back(response);
    }

    /// Queue a successful response for a route.
    pub fn ok(&self, method: Method, path: impl Into<String>, payload: Value) {
        self.on(method, path, Ok(payload));
    }

    /// Queue an error status for a route.
    pub fn status(&self, method: Method, path: impl Into<String>, status: u16, message: &str) {
        self.on(
            method,
            path,
            Err(RemoteError::Status {
                status,
                message: message.to_string(),
            }),
        );
    }

    /// Hold every call until [`MockRemote::resume`] is called.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Release held calls.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.resume.notify_waiters();
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls received for a path.
    pub fn call_count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.path == path)
            .count()
    }

    fn next_response(&self, call: &RemoteCall) -> Result<Value, RemoteError> {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes.get_mut(&(call.method, call.path.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(|| not_found(call)),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| not_found(call)),
            None => not_found(call),
        }
    }

    async fn wait_while_paused(&self) {
        loop {
            let resumed = self.resume.notified();
            if !self.paused.load(Ordering::SeqCst) {
                return;
            }
            resumed.await;
        }
    }
}

fn not_found(call: &RemoteCall) -> Result<Value, RemoteError> {
    Err(RemoteError::Status {
        status: 404,
        message: format!("no mock route for {} {}", call.method, call.path),
    })
}

#[async_trait]
impl Remote for MockRemote {
    async fn send(&self, call: RemoteCall) -> Result<Value, RemoteError> {
        let response = self.next_response(&call);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);

        self.wait_while_paused().await;
        response
    }
}
