//! Shared helpers for unit tests.

pub mod socket_guard;

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::fetch::{FetchError, Fetcher, RequestOptions};

#[derive(Debug, Clone)]
enum Scripted {
    Body(Vec<u8>),
    Status(u16),
}

impl Scripted {
    fn respond(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match self {
            Self::Body(body) => Ok(body.clone()),
            Self::Status(status) => Err(FetchError::http_status(url, *status)),
        }
    }
}

/// In-memory [`Fetcher`] with canned responses.
///
/// Routes match on URL suffix and answer every time. Unrouted requests pop
/// the queue in order; once it is empty they fail with HTTP 500.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    queue: Mutex<VecDeque<Scripted>>,
    routes: Mutex<HashMap<String, Scripted>>,
    requests: Mutex<Vec<(String, RequestOptions)>>,
}

#[allow(clippy::unwrap_used)]
impl ScriptedFetcher {
    pub fn with_bodies<I, B>(bodies: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        let fetcher = Self::default();
        for body in bodies {
            fetcher.push_body(body);
        }
        fetcher
    }

    pub fn push_body(&self, body: impl Into<Vec<u8>>) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Scripted::Body(body.into()));
    }

    pub fn push_status(&self, status: u16) {
        self.queue.lock().unwrap().push_back(Scripted::Status(status));
    }

    pub fn route(&self, suffix: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .insert(suffix.into(), Scripted::Body(body.into()));
    }

    pub fn route_status(&self, suffix: impl Into<String>, status: u16) {
        self.routes
            .lock()
            .unwrap()
            .insert(suffix.into(), Scripted::Status(status));
    }

    /// URLs requested so far, in call order.
    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Options sent with each request, in call order.
    pub fn options(&self) -> Vec<RequestOptions> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, options)| options.clone())
            .collect()
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, options: &RequestOptions) -> Result<Vec<u8>, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), options.clone()));

        let routed = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(suffix, _)| url.ends_with(suffix.as_str()))
            .map(|(_, scripted)| scripted.clone());
        if let Some(scripted) = routed {
            return scripted.respond(url);
        }

        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(scripted) => scripted.respond(url),
            None => Err(FetchError::http_status(url, 500)),
        }
    }
}
