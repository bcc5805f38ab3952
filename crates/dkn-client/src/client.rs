//! REST client
//!
//! Wraps a [`Transport`] with the platform's request conventions:
//! - URLs are built from the configured origin
//! - JSON headers on every call, bearer token from the session store
//! - Unparseable bodies become `null`
//! - Non-2xx responses become [`ApiError::Http`]; a 401 first invokes the
//!   registered unauthorized handler

use crate::config::ClientConfig;
use crate::error::{ApiError, TransportError, STATUS_UNAUTHORIZED};
use crate::records::decode_list;
use crate::session::SessionStore;
use crate::transport::{HttpRequest, Method, ReqwestTransport, Transport};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Callback run when the server rejects the session
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

/// Join a path onto an origin.
///
/// Absolute `http(s)://` paths pass through. A missing leading `/` is
/// added, and when the origin already ends in `/api` an `/api/` path prefix
/// is not repeated.
#[must_use]
pub fn build_url(origin: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    let origin = origin.trim_end_matches('/');
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    match path.strip_prefix("/api") {
        Some(rest) if origin.ends_with("/api") && rest.starts_with('/') => format!("{origin}{rest}"),
        _ => format!("{origin}{path}"),
    }
}

/// Per-call overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Bearer token used instead of the stored one
    pub bearer: Option<String>,
    /// Extra headers; same-named defaults are replaced
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// With explicit bearer token
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// With extra header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Client for the platform REST API
#[derive(Clone)]
pub struct ApiClient {
    origin: String,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    on_unauthorized: Option<UnauthorizedHandler>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("origin", &self.origin)
            .field("session", &self.session)
            .field("on_unauthorized", &self.on_unauthorized.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create client for an origin
    #[must_use]
    pub fn new(
        origin: impl Into<String>,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        Self {
            origin,
            transport,
            session,
            on_unauthorized: None,
        }
    }

    /// Create client over `reqwest` from configuration
    ///
    /// # Errors
    /// - `TransportError` if the HTTP client cannot be built
    pub fn from_config(
        config: &ClientConfig,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::new(config.api_origin(), Arc::new(transport), session))
    }

    /// With handler invoked on every 401, before the error is returned
    #[must_use]
    pub fn with_unauthorized_handler(mut self, handler: UnauthorizedHandler) -> Self {
        self.on_unauthorized = Some(handler);
        self
    }

    /// With a 401 handler that clears the session store
    #[must_use]
    pub fn logout_on_unauthorized(self) -> Self {
        let session = Arc::clone(&self.session);
        self.with_unauthorized_handler(Arc::new(move || {
            warn!("session rejected by server, signing out");
            if let Err(err) = session.clear() {
                warn!(error = %err, "failed to clear session");
            }
        }))
    }

    /// Origin without trailing `/`
    #[inline]
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Session store
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Absolute URL for a path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url(&self.origin, path)
    }

    fn headers(&self, options: &RequestOptions) -> Vec<(String, String)> {
        let mut headers: IndexMap<String, String> = IndexMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());

        if let Some(token) = options.bearer.clone().or_else(|| self.session.token()) {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }

        for (name, value) in &options.headers {
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            headers.insert(name.clone(), value.clone());
        }

        headers.into_iter().collect()
    }

    /// Send a request and return the parsed JSON body
    ///
    /// # Errors
    /// - `ApiError::Network` if no response arrived
    /// - `ApiError::Http` for a non-2xx status
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Value, ApiError> {
        let request = HttpRequest {
            method,
            url: self.url(path),
            headers: self.headers(options),
            body,
        };
        debug!(%method, url = %request.url, "api request");

        let response = self.transport.send(request).await.map_err(|err| {
            warn!(%method, path, error = %err, "api request failed");
            ApiError::from(err)
        })?;

        let body = serde_json::from_str(&response.body).unwrap_or(Value::Null);

        if response.is_success() {
            return Ok(body);
        }

        if response.status == STATUS_UNAUTHORIZED {
            warn!(%method, path, "unauthorized response");
            if let Some(handler) = &self.on_unauthorized {
                handler();
            }
        }

        Err(ApiError::from_response(response.status, body))
    }

    /// `GET` decoded into `T`
    ///
    /// # Errors
    /// - `ApiError` from the request, or `ApiError::Decode` if the body does not fit `T`
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self
            .request(Method::Get, path, None, &RequestOptions::default())
            .await?;
        serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// `GET` a list; a non-array body is an empty list
    ///
    /// # Errors
    /// - `ApiError` from the request
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let value = self
            .request(Method::Get, path, None, &RequestOptions::default())
            .await?;
        Ok(decode_list(value))
    }

    /// Send a JSON body
    ///
    /// # Errors
    /// - `ApiError` from the request, or `ApiError::Decode` if `body` does not serialize
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body).map_err(|err| ApiError::Decode(err.to_string()))?;
        self.request(method, path, Some(body), &RequestOptions::default())
            .await
    }

    /// Send without a body
    ///
    /// # Errors
    /// - `ApiError` from the request
    pub async fn call(&self, method: Method, path: &str) -> Result<Value, ApiError> {
        self.request(method, path, None, &RequestOptions::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportErrorKind;
    use crate::session::MemorySessionStore;
    use crate::transport::{HttpResponse, MockTransport};
    use dkn_access::User;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client_with(transport: MockTransport, session: Arc<MemorySessionStore>) -> ApiClient {
        ApiClient::new("https://dkn.example/", Arc::new(transport), session)
    }

    #[test]
    fn url_building() {
        assert_eq!(build_url("https://h", "/api/me"), "https://h/api/me");
        assert_eq!(build_url("https://h/", "api/me"), "https://h/api/me");
        assert_eq!(build_url("https://h/api", "/api/me"), "https://h/api/me");
        assert_eq!(build_url("https://h/api/", "/api/me"), "https://h/api/me");
        assert_eq!(build_url("https://h/api", "/apiary"), "https://h/api/apiary");
        assert_eq!(
            build_url("https://h/api", "https://other/x"),
            "https://other/x"
        );
    }

    #[tokio::test]
    async fn attaches_json_headers_and_stored_token() {
        let session = Arc::new(MemorySessionStore::with_session("stored", User::new(1, "A")));
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.url == "https://dkn.example/api/me"
                    && req.header("content-type") == Some("application/json")
                    && req.header("accept") == Some("application/json")
                    && req.header("authorization") == Some("Bearer stored")
                    && req.body.is_none()
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::json(200, &json!({"id": 1}))));

        let client = client_with(transport, session);
        let body = client.call(Method::Get, "/api/me").await.unwrap();
        assert_eq!(body, json!({"id": 1}));
    }

    #[tokio::test]
    async fn explicit_bearer_overrides_stored() {
        let session = Arc::new(MemorySessionStore::with_session("stored", User::new(1, "A")));
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.header("Authorization") == Some("Bearer explicit")
                    && req.header("X-Trace") == Some("1")
            })
            .returning(|_| Ok(HttpResponse::new(200, "[]")));

        let client = client_with(transport, session);
        let options = RequestOptions::default()
            .with_bearer("explicit")
            .with_header("X-Trace", "1");
        client
            .request(Method::Get, "/api/roles", None, &options)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn no_token_no_authorization_header() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.header("Authorization").is_none())
            .returning(|_| Ok(HttpResponse::new(200, "")));

        let client = client_with(transport, Arc::new(MemorySessionStore::new()));
        let body = client.call(Method::Get, "/api/roles").await.unwrap();
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn error_shapes() {
        let mut transport = MockTransport::new();
        let mut responses = vec![
            HttpResponse::json(404, &json!({"message": "Document not found"})),
            HttpResponse::new(500, "<html>oops</html>"),
        ]
        .into_iter();
        transport
            .expect_send()
            .times(2)
            .returning(move |_| Ok(responses.next().unwrap()));

        let client = client_with(transport, Arc::new(MemorySessionStore::new()));

        let err = client.call(Method::Get, "/api/documents/9").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Document not found");

        let err = client.call(Method::Get, "/api/documents").await.unwrap_err();
        assert_eq!(err.to_string(), "API error: 500");
        assert_eq!(err.body(), Some(&Value::Null));
    }

    #[tokio::test]
    async fn unauthorized_runs_handler_once_per_401() {
        let session = Arc::new(MemorySessionStore::with_session("old", User::new(1, "A")));
        let calls = Arc::new(AtomicUsize::new(0));
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(HttpResponse::json(401, &json!({"message": "Token expired"}))));

        let counter = Arc::clone(&calls);
        let client = client_with(transport, Arc::clone(&session))
            .with_unauthorized_handler(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        let err = client.call(Method::Get, "/api/me").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.token().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn logout_handler_clears_session() {
        let session = Arc::new(MemorySessionStore::with_session("old", User::new(1, "A")));
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(HttpResponse::new(401, "")));

        let client = client_with(transport, Arc::clone(&session)).logout_on_unauthorized();
        client.call(Method::Get, "/api/documents").await.unwrap_err();
        assert_eq!(session.token(), None);
        assert_eq!(session.user(), None);
    }

    #[tokio::test]
    async fn network_failure_has_no_status() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_| {
            Err(TransportError::new(
                TransportErrorKind::Connect,
                "connection refused",
            ))
        });

        let client = client_with(transport, Arc::new(MemorySessionStore::new()));
        let err = client.call(Method::Get, "/api/me").await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn list_decoding_tolerates_objects() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(HttpResponse::json(200, &json!({"items": []}))));

        let client = client_with(transport, Arc::new(MemorySessionStore::new()));
        let tags: Vec<crate::records::Tag> = client.get_list("/api/tags").await.unwrap();
        assert!(tags.is_empty());
    }
}
