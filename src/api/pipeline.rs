// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request pipeline wrapped around every backend call.
//!
//! For each call, in order:
//! 1. request interceptors run in list order (bearer injection lives here)
//! 2. the transport sends the request
//! 3. response interceptors run in list order (401 → forced logout)
//! 4. non-2xx statuses are classified into [`ClientError`]
//! 5. one structured log record is emitted with method, path, status and
//!    duration
//!
//! Step 3 completes before the error is returned, so a caller that sees
//! `Unauthorized` can rely on the session already being ANONYMOUS.

use std::sync::Arc;
use std::time::Instant;

use http::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::transport::HttpClient;
use crate::error::{ClientError, Result};
use crate::session::SessionState;

/// A composable step around each request.
pub trait Interceptor: Send + Sync {
    fn on_request(&self, _request: &mut Request<String>) {}

    fn on_response(&self, _method: &Method, _uri: &Uri, _response: &Response<String>) {}
}

/// Attaches the session's bearer token and logs out on 401.
///
/// Requests whose path ends with one of `exempt_paths` are left untouched
/// in both directions (the login exchange is inherently unauthenticated).
pub struct BearerAuth {
    session: Arc<SessionState>,
    exempt_paths: Vec<String>,
}

impl BearerAuth {
    pub fn new(session: Arc<SessionState>) -> Self {
        Self {
            session,
            exempt_paths: Vec::new(),
        }
    }

    pub fn exempt(mut self, path: impl Into<String>) -> Self {
        self.exempt_paths.push(path.into());
        self
    }

    fn is_exempt(&self, uri: &Uri) -> bool {
        self.exempt_paths
            .iter()
            .any(|p| uri.path().ends_with(p.as_str()))
    }
}

impl Interceptor for BearerAuth {
    fn on_request(&self, request: &mut Request<String>) {
        if self.is_exempt(request.uri()) {
            return;
        }

        // No credential: send anyway, the backend decides.
        let Some(credential) = self.session.credential() else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {}", credential.token)) {
            Ok(value) => {
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("Stored token is not a valid header value, sending unauthenticated"),
        }
    }

    fn on_response(&self, method: &Method, uri: &Uri, response: &Response<String>) {
        if response.status() == StatusCode::UNAUTHORIZED && !self.is_exempt(uri) {
            tracing::warn!(method = %method, path = %uri.path(), "Received 401, logging out");
            self.session.force_logout();
        }
    }
}

/// Ordered interceptor chain over a transport.
#[derive(Clone)]
pub struct RequestPipeline {
    transport: Arc<dyn HttpClient>,
    base_url: String,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl RequestPipeline {
    pub fn new(transport: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            interceptors: Vec::new(),
        }
    }

    /// Append an interceptor; it runs after those already added.
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The interceptor chain, for callers that stream instead of buffering.
    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Send a request through the full pipeline.
    pub async fn send(&self, mut request: Request<String>) -> Result<Response<String>> {
        for interceptor in &self.interceptors {
            interceptor.on_request(&mut request);
        }

        let method = request.method().clone();
        let uri = request.uri().clone();
        let started = Instant::now();

        let result = self.transport.send(request).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    method = %method,
                    path = %uri.path(),
                    error = %e,
                    duration_ms,
                    "HTTP request failed"
                );
                return Err(e);
            }
        };

        for interceptor in &self.interceptors {
            interceptor.on_response(&method, &uri, &response);
        }

        let status = response.status();
        if status.is_success() {
            tracing::info!(
                method = %method,
                path = %uri.path(),
                status = status.as_u16(),
                duration_ms,
                "HTTP response"
            );
            return Ok(response);
        }

        let err = ClientError::from_status(status, response.into_body());
        tracing::warn!(
            method = %method,
            path = %uri.path(),
            status = status.as_u16(),
            kind = ?err.kind(),
            duration_ms,
            "HTTP error response"
        );
        Err(err)
    }

    /// Build a JSON request for `path_and_query` relative to the base URL.
    pub fn request(&self, method: Method, path_and_query: &str, body: String) -> Result<Request<String>> {
        Request::builder()
            .method(method)
            .uri(self.url(path_and_query))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .map_err(|e| ClientError::ClientTransportError(format!("Invalid request: {}", e)))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let request = self.request(Method::GET, path_and_query, String::new())?;
        let response = self.send(request).await?;
        decode_json(response)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_string(body).map_err(|e| ClientError::Unknown {
            status: None,
            body: format!("Failed to encode request body: {}", e),
        })?;
        let request = self.request(Method::POST, path, body)?;
        let response = self.send(request).await?;
        decode_json(response)
    }
}

/// Decode a 2xx body; an undecodable body keeps its status and text.
pub fn decode_json<T: DeserializeOwned>(response: Response<String>) -> Result<T> {
    let status = response.status();
    let body = response.into_body();
    serde_json::from_str(&body).map_err(|e| {
        tracing::warn!(status = status.as_u16(), error = %e, "Response body did not match expected shape");
        ClientError::Unknown {
            status: Some(status.as_u16()),
            body,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::{mock_response, MockTransport};
    use crate::error::ErrorKind;
    use crate::models::Profile;
    use crate::session::{SessionStatus, TokenStore};
    use crate::storage::MemoryStore;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    fn authenticated_session() -> (Arc<SessionState>, String) {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "ada" }),
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();
        let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
        tokens
            .save(
                &token,
                &Profile {
                    name: "Ada".into(),
                    email: "ada@example.com".into(),
                },
            )
            .unwrap();
        (Arc::new(SessionState::restore(tokens)), token)
    }

    fn pipeline(transport: &MockTransport, session: &Arc<SessionState>) -> RequestPipeline {
        RequestPipeline::new(Arc::new(transport.clone()), "http://api.test")
            .with_interceptor(BearerAuth::new(session.clone()).exempt("/users/auth/google"))
    }

    #[tokio::test]
    async fn test_bearer_header_injected() {
        let (session, token) = authenticated_session();
        let transport = MockTransport::always(StatusCode::OK, "[]");

        let _: Vec<serde_json::Value> = pipeline(&transport, &session)
            .get_json("/f1/sessions?limit=1")
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].headers.get(AUTHORIZATION).unwrap(),
            &format!("Bearer {}", token)
        );
        assert_eq!(requests[0].uri.to_string(), "http://api.test/f1/sessions?limit=1");
    }

    #[tokio::test]
    async fn test_exchange_endpoint_is_not_authenticated() {
        let (session, _) = authenticated_session();
        let transport = MockTransport::always(StatusCode::OK, "{}");

        let _: serde_json::Value = pipeline(&transport, &session)
            .post_json("/users/auth/google", &serde_json::json!({ "auth_token": "c" }))
            .await
            .unwrap();

        assert!(transport.requests()[0].headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_anonymous_request_is_still_sent() {
        let session = Arc::new(SessionState::restore(TokenStore::new(Arc::new(
            MemoryStore::new(),
        ))));
        let transport = MockTransport::always(StatusCode::OK, "[]");

        let _: Vec<u8> = pipeline(&transport, &session)
            .get_json("/f1/sessions")
            .await
            .unwrap();

        assert_eq!(transport.request_count(), 1);
        assert!(transport.requests()[0].headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_401_logs_out_before_error_returns() {
        let (session, _) = authenticated_session();
        let transport = MockTransport::always(StatusCode::UNAUTHORIZED, "expired");

        let err = pipeline(&transport, &session)
            .get_json::<serde_json::Value>("/f1/guess/1")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.body(), Some("expired"));
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert!(session.tokens().read().is_none());
    }

    #[tokio::test]
    async fn test_other_statuses_are_classified_without_logout() {
        let (session, _) = authenticated_session();

        for (status, kind) in [
            (StatusCode::FORBIDDEN, ErrorKind::Forbidden),
            (StatusCode::NOT_FOUND, ErrorKind::NotFound),
            (StatusCode::BAD_GATEWAY, ErrorKind::ServerError),
            (StatusCode::BAD_REQUEST, ErrorKind::Unknown),
        ] {
            let transport = MockTransport::always(status, "detail");
            let err = pipeline(&transport, &session)
                .get_json::<serde_json::Value>("/f1/sessions")
                .await
                .unwrap_err();
            assert_eq!(err.kind(), kind);
            assert_eq!(err.body(), Some("detail"));
        }

        assert_eq!(session.status(), SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn test_transport_failure_is_classified() {
        let (session, _) = authenticated_session();
        let transport =
            MockTransport::new(|_| Err(ClientError::ClientTransportError("refused".into())));

        let err = pipeline(&transport, &session)
            .get_json::<serde_json::Value>("/f1/sessions")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ClientTransportError);
        assert_eq!(session.status(), SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_unknown() {
        let (session, _) = authenticated_session();
        let transport = MockTransport::new(|_| Ok(mock_response(StatusCode::OK, "<html>")));

        let err = pipeline(&transport, &session)
            .get_json::<Vec<u64>>("/f1/sessions")
            .await
            .unwrap_err();

        match err {
            ClientError::Unknown { status, body } => {
                assert_eq!(status, Some(200));
                assert_eq!(body, "<html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_interceptors_run_in_order() {
        struct Tag(&'static str);
        impl Interceptor for Tag {
            fn on_request(&self, request: &mut Request<String>) {
                let body = request.body_mut();
                body.push_str(self.0);
            }
        }

        let transport = MockTransport::always(StatusCode::OK, "null");
        let pipeline = RequestPipeline::new(Arc::new(transport.clone()), "http://api.test")
            .with_interceptor(Tag("a"))
            .with_interceptor(Tag("b"));

        let request = pipeline.request(Method::POST, "/x", String::new()).unwrap();
        pipeline.send(request).await.unwrap();

        assert_eq!(transport.requests()[0].body, "ab");
    }
}
