// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP transport abstraction.
//!
//! The pipeline talks to the network through [`HttpClient`] so that request
//! ordering and 401 handling can be tested without sockets.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};

use crate::error::{ClientError, Result};

/// Sends one HTTP request and waits for the complete response.
pub trait HttpClient: Send + Sync {
    fn send(&self, request: Request<String>) -> BoxFuture<'_, Result<Response<String>>>;
}

/// Production transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::ClientTransportError(format!("HTTP client init failed: {}", e)))?;
        Ok(Self { http })
    }

    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl HttpClient for ReqwestTransport {
    fn send(&self, request: Request<String>) -> BoxFuture<'_, Result<Response<String>>> {
        Box::pin(async move {
            let (parts, body) = request.into_parts();

            let response = self
                .http
                .request(parts.method, parts.uri.to_string())
                .headers(parts.headers)
                .body(body)
                .send()
                .await
                .map_err(|e| ClientError::ClientTransportError(e.to_string()))?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .text()
                .await
                .map_err(|e| ClientError::ClientTransportError(e.to_string()))?;

            let mut out = Response::new(body);
            *out.status_mut() = status;
            *out.headers_mut() = headers;
            Ok(out)
        })
    }
}

/// A request as seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: String,
}

type Handler = dyn Fn(&RecordedRequest) -> Result<Response<String>> + Send + Sync;

/// Offline transport that records requests and answers from a handler.
#[derive(Clone)]
pub struct MockTransport {
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Result<Response<String>> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer every request with `status` and `body`.
    pub fn always(status: StatusCode, body: &str) -> Self {
        let body = body.to_string();
        Self::new(move |_| Ok(mock_response(status, &body)))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl HttpClient for MockTransport {
    fn send(&self, request: Request<String>) -> BoxFuture<'_, Result<Response<String>>> {
        let (parts, body) = request.into_parts();
        let recorded = RecordedRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        };
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded.clone());

        let result = (self.handler)(&recorded);
        Box::pin(async move { result })
    }
}

/// Build a canned response.
pub fn mock_response(status: StatusCode, body: &str) -> Response<String> {
    let mut response = Response::new(body.to_string());
    *response.status_mut() = status;
    response
}
