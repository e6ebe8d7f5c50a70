//! Test helper utilities: a scripted in-memory transport

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use procmine_client::services::transport::{Transport, TransportError};
use reqwest::Url;
use serde_json::Value;
use tokio::time::Instant;

/// One request seen by the transport.
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub at: Instant,
}

enum Reply {
    Json(Value),
    Fail(TransportError),
    After(Duration, Value),
}

/// Transport answering from per-path queues of scripted replies.
///
/// Replies are consumed in order. A path with nothing left fails with a
/// connection error, so unexpected calls show up as test failures.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn reply(&self, path: &str, body: Value) -> &Self {
        self.push(path, Reply::Json(body))
    }

    pub fn reply_after(&self, path: &str, delay: Duration, body: Value) -> &Self {
        self.push(path, Reply::After(delay, body))
    }

    pub fn fail(&self, path: &str, err: TransportError) -> &Self {
        self.push(path, Reply::Fail(err))
    }

    pub fn refuse(&self, path: &str) -> &Self {
        self.fail(path, TransportError::Connection("connection refused".to_string()))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls_to(path).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_json(&self, url: &Url, query: &[(String, String)]) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            path: url.path().to_string(),
            query: query.to_vec(),
            at: Instant::now(),
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(url.path())
            .and_then(|queue| queue.pop_front());

        match reply {
            Some(Reply::Json(body)) => Ok(body),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::After(delay, body)) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            None => Err(TransportError::Connection(format!(
                "no reply scripted for {}",
                url.path()
            ))),
        }
    }
}

pub fn base_url() -> Url {
    Url::parse("http://miner.test:5000/").unwrap()
}
