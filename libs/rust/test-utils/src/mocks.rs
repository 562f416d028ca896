//! Mock implementations for testing.
//!
//! [`MockTransport`] answers requests from a routing table keyed on method
//! and exact URL and records every request it sees, so tests can assert
//! on call counts as well as outcomes.

use async_trait::async_trait;
use keyvault_lookup::LookupContext;
use keyvault_lookup::auth::token_url;
use keyvault_lookup::secrets::secret_url;
use lookup_common::{HttpError, HttpRequest, HttpResponse, HttpResult, HttpTransport};
use serde_json::{Value, json};
use std::sync::Mutex;

/// Scripted answer for one route.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with a JSON body
    Json(Value),
    /// 200 with an empty body
    Empty,
    /// Non-2xx status
    Status(u16),
    /// Failure before any response (connect error, timeout)
    Failure(String),
}

#[derive(Debug)]
struct Route {
    method: &'static str,
    url: String,
    reply: MockReply,
}

/// Mock HTTP transport for testing.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Create a transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. Later routes for the same method and URL are ignored.
    #[must_use]
    pub fn route(mut self, method: &'static str, url: impl Into<String>, reply: MockReply) -> Self {
        self.routes.push(Route {
            method,
            url: url.into(),
            reply,
        });
        self
    }

    /// Token endpoint for `tenant` issues `access_token`.
    ///
    /// # Panics
    ///
    /// Panics if `tenant` does not form a valid URL.
    #[must_use]
    pub fn token(self, tenant: &str, access_token: &str) -> Self {
        self.route(
            "POST",
            token_url(tenant).expect("tenant forms a valid token url"),
            MockReply::Json(json!({
                "token_type": "Bearer",
                "expires_in": "3599",
                "resource": "https://vault.azure.net",
                "access_token": access_token,
            })),
        )
    }

    /// Token endpoint for `tenant` answers with `reply`.
    ///
    /// # Panics
    ///
    /// Panics if `tenant` does not form a valid URL.
    #[must_use]
    pub fn token_reply(self, tenant: &str, reply: MockReply) -> Self {
        self.route(
            "POST",
            token_url(tenant).expect("tenant forms a valid token url"),
            reply,
        )
    }

    /// Secret `name` in vault `host` answers with `reply`.
    ///
    /// # Panics
    ///
    /// Panics if `host` does not form a valid URL.
    #[must_use]
    pub fn secret(self, host: &str, name: &str, reply: MockReply) -> Self {
        self.route(
            "GET",
            secret_url(host, name).expect("host forms a valid secret url"),
            reply,
        )
    }

    /// Every request seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().clone()
    }

    /// Number of requests seen so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().len()
    }

    /// Number of token requests seen so far.
    #[must_use]
    pub fn token_calls(&self) -> usize {
        self.lock()
            .iter()
            .filter(|r| r.method.as_str() == "POST" && r.url.contains("/oauth2/token"))
            .count()
    }

    /// Number of secret fetches seen so far.
    #[must_use]
    pub fn secret_calls(&self) -> usize {
        self.lock()
            .iter()
            .filter(|r| r.method.as_str() == "GET" && r.url.contains("/secrets/"))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HttpRequest>> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
        let method = request.method.as_str().to_string();
        let url = request.url.clone();
        let parse_json = request.accept_json;
        self.lock().push(request);

        let route = self
            .routes
            .iter()
            .find(|r| r.method == method && r.url == url)
            .ok_or_else(|| HttpError::other(format!("no mock route for {method} {url}")))?;

        match &route.reply {
            MockReply::Json(body) => HttpResponse::from_body(200, body.to_string(), parse_json),
            MockReply::Empty => HttpResponse::from_body(200, "", parse_json),
            MockReply::Status(status) => Err(HttpError::status(*status, Vec::new(), "")),
            MockReply::Failure(msg) => Err(HttpError::other(msg.clone())),
        }
    }
}

/// Context that keeps every explanation for later inspection.
#[derive(Debug, Default)]
pub struct RecordingContext {
    messages: Mutex<Vec<String>>,
}

impl RecordingContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All explanations so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Whether any explanation contains `needle`.
    #[must_use]
    pub fn explained(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

impl LookupContext for RecordingContext {
    fn explain(&self, message: &dyn Fn() -> String) {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(message());
    }
}
