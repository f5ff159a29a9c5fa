//! Scripted fetcher for worker tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use keel_core::error::{KeelError, Result};
use keel_core::traits::Fetcher;
use keel_core::types::{Request, Response};

/// How the mock answers a path.
#[derive(Clone, Debug)]
pub enum Route {
    Respond(Response),
    Status(u16),
    Fail,
    Slow(Duration, Response),
}

impl Route {
    pub fn ok(body: &'static str) -> Self {
        Route::Respond(Response::ok_with(body))
    }
}

/// Fetcher answering by URL path. Unknown paths fail like a dropped connection.
#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<Request>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, path: &str, route: Route) {
        self.routes.lock().insert(path.to_string(), route);
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.calls.lock().iter().filter(|r| r.url.path() == path).count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.calls.lock().push(request.clone());
        let route = self.routes.lock().get(request.url.path()).cloned();

        let response = match route {
            Some(Route::Respond(response)) => response,
            Some(Route::Status(status)) => Response::new(status, "error"),
            Some(Route::Slow(delay, response)) => {
                tokio::time::sleep(delay).await;
                response
            }
            Some(Route::Fail) | None => {
                return Err(KeelError::network(&request.url, "connection refused"))
            }
        };
        Ok(response.with_url(request.url.clone()))
    }
}
