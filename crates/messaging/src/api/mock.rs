//! In-memory transport for tests and offline runs
//!
//! Routes are keyed by method and path (query strings are ignored for
//! matching but recorded). A route either replays a queue of canned
//! replies, where the last reply repeats once the queue drains, or calls a
//! handler closure.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::ApiError;

/// A canned reply
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(ApiResponse),
    NetworkError(String),
}

impl From<ApiResponse> for MockReply {
    fn from(response: ApiResponse) -> Self {
        MockReply::Response(response)
    }
}

type Handler = Box<dyn Fn(&ApiRequest) -> MockReply + Send + Sync>;

enum Route {
    Queue(VecDeque<MockReply>),
    Handler(Handler),
}

/// Scripted [`Transport`] that records every request it receives
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for a route
    pub fn on(&self, method: Method, path: &str, reply: impl Into<MockReply>) -> &Self {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (method, path.to_string());
        match routes.get_mut(&key) {
            Some(Route::Queue(queue)) => queue.push_back(reply.into()),
            _ => {
                routes.insert(key, Route::Queue(VecDeque::from([reply.into()])));
            }
        }
        self
    }

    /// Answer a route with a closure
    pub fn on_fn<F>(&self, method: Method, path: &str, handler: F) -> &Self
    where
        F: Fn(&ApiRequest) -> MockReply + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((method, path.to_string()), Route::Handler(Box::new(handler)));
        self
    }

    /// All requests received so far, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received for a route
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let reply = {
            let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            match routes.get_mut(&(request.method, request.path.clone())) {
                Some(Route::Queue(queue)) => {
                    if queue.len() > 1 {
                        queue.pop_front()
                    } else {
                        queue.front().cloned()
                    }
                }
                Some(Route::Handler(handler)) => Some(handler(request)),
                None => None,
            }
        };

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::NetworkError(message)) => Err(ApiError::Network(message)),
            None => Ok(ApiResponse::json(
                404,
                serde_json::json!({"error": format!("No mock route for {} {}", request.method, request.path)}),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_queue_then_repeat_last() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/x", ApiResponse::json(500, json!({})))
            .on(Method::Get, "/x", ApiResponse::json(200, json!({})));

        let request = ApiRequest::get("/x");
        assert_eq!(mock.execute(&request).unwrap().status, 500);
        assert_eq!(mock.execute(&request).unwrap().status, 200);
        assert_eq!(mock.execute(&request).unwrap().status, 200);
        assert_eq!(mock.count(Method::Get, "/x"), 3);
    }

    #[test]
    fn test_unknown_route_is_404() {
        let mock = MockTransport::new();
        let response = mock.execute(&ApiRequest::post("/nope")).unwrap();
        assert_eq!(response.status, 404);
        assert!(response.error_message().unwrap().contains("/nope"));
    }

    #[test]
    fn test_network_error_reply() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/x", MockReply::NetworkError("refused".into()));
        assert!(matches!(
            mock.execute(&ApiRequest::get("/x")),
            Err(ApiError::Network(_))
        ));
    }
}
