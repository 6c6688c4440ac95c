use crate::api::envelope::Envelope;
use crate::error::ApiError;
use crate::storage::session::Session;
use crate::utils::error_helpers::*;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const LOGIN_PATH: &str = "/auth/login";
const USER_AGENT: &str = concat!("shopdesk/", env!("CARGO_PKG_VERSION"));

/// Receives redirect requests issued by the client, e.g. after an unauthorized response.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that only logs; used when no UI layer is attached.
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        log::info!("Redirect requested to {}", path);
    }
}

/// One backend call: method, path relative to the base URL, query and JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Adds a query parameter; empty values mean "no filter" and are skipped.
    pub fn query(mut self, key: &str, value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        if !value.is_empty() {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn query_pairs<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .fold(self, |req, (k, v)| req.query(k.as_ref(), v))
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP client for the shop backend.
///
/// Attaches the session's bearer token, normalizes the response envelope and
/// handles unauthorized responses by clearing the session and requesting a
/// redirect to the login page. No retries.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
    session: Session,
    navigator: Arc<dyn Navigator>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, session, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        session: Session,
        timeout_secs: u64,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| convert_request_error(e, "client_init", timeout_secs))?;

        let base_url: String = base_url.into();
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            session,
            navigator: Arc::new(LogNavigator),
        })
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.token().is_some()
    }

    pub fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);

        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }

        request
    }

    /// Perform one call and return the envelope of a successful response.
    pub async fn call(&self, request: ApiRequest) -> Result<Envelope, ApiError> {
        let ApiRequest {
            method,
            path,
            query,
            body,
        } = request;
        let endpoint = path;
        log::debug!("{} {} {:?}", method, endpoint, query);

        let mut builder = self.build_request(method, &endpoint);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| convert_request_error(e, &endpoint, self.timeout_secs))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| convert_request_error(e, &endpoint, self.timeout_secs))?;
        log::debug!("{} -> {}", endpoint, status);

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(&endpoint);
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
                endpoint,
                server_message: body_message(&text).unwrap_or_default(),
            });
        }

        if !status.is_success() {
            let message = http_error_message(status, &text);
            log::warn!("{} failed with {}: {}", endpoint, status, message);
            return Err(ApiError::Api {
                status: status.as_u16(),
                endpoint,
                message,
            });
        }

        let envelope: Envelope =
            serde_json::from_str(&text).map_err(|e| convert_json_error(e, &endpoint))?;
        envelope.into_success(status.as_u16(), &endpoint)
    }

    fn handle_unauthorized(&self, endpoint: &str) {
        log::warn!("{} returned 401, clearing session", endpoint);
        if let Err(e) = self.session.clear() {
            log::error!("Failed to clear session after 401: {}", e);
        }
        self.navigator.navigate(LOGIN_PATH);
    }
}

fn body_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
