// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live standings updates over server-sent events.
//!
//! One connection, one sequence. Each event's `data` is passed through
//! verbatim. The first transport error (or the server hanging up) ends the
//! sequence with a single [`ClientError::StreamTerminated`]; there is no
//! reconnect. Callers tearing down must [`LiveUpdates::close`] (or drop) the
//! sequence to release the connection.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use http::header::ACCEPT;
use http::{Method, Request, Response};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::{paths, Interceptor, RequestPipeline};
use crate::error::{ClientError, Result};

const CHANNEL_CAPACITY: usize = 32;

/// Opens live update streams.
#[derive(Clone)]
pub struct LiveUpdateChannel {
    http: reqwest::Client,
    url: String,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl LiveUpdateChannel {
    /// Share the pipeline's interceptors so the stream gets the same bearer
    /// and 401 handling as every other call.
    pub fn new(pipeline: &RequestPipeline, connect_timeout: Duration) -> Result<Self> {
        // No overall timeout: the stream is meant to stay open.
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientError::ClientTransportError(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            url: pipeline.url(paths::SESSION_STANDING_SSE),
            interceptors: pipeline.interceptors().to_vec(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the stream.
    pub async fn connect(&self) -> Result<LiveUpdates> {
        let mut request = Request::builder()
            .method(Method::GET)
            .uri(&self.url)
            .header(ACCEPT, "text/event-stream")
            .body(String::new())
            .map_err(|e| ClientError::ClientTransportError(format!("Invalid request: {}", e)))?;

        for interceptor in &self.interceptors {
            interceptor.on_request(&mut request);
        }

        let (parts, _) = request.into_parts();
        let started = Instant::now();

        let response = self
            .http
            .get(&self.url)
            .headers(parts.headers)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(path = %parts.uri.path(), error = %e, "Live update connect failed");
                ClientError::ClientTransportError(e.to_string())
            })?;

        let status = response.status();
        let duration_ms = started.elapsed().as_millis() as u64;

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let mut stub = Response::new(String::new());
            *stub.status_mut() = status;
            for interceptor in &self.interceptors {
                interceptor.on_response(&parts.method, &parts.uri, &stub);
            }

            let err = ClientError::from_status(status, body);
            tracing::warn!(
                path = %parts.uri.path(),
                status = status.as_u16(),
                kind = ?err.kind(),
                duration_ms,
                "Live update stream rejected"
            );
            return Err(err);
        }

        tracing::info!(
            path = %parts.uri.path(),
            status = status.as_u16(),
            duration_ms,
            "Live update stream opened"
        );

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(forward_events(response, tx));

        Ok(LiveUpdates {
            rx,
            task: Some(task),
            terminated: false,
        })
    }
}

async fn forward_events(response: reqwest::Response, tx: mpsc::Sender<Result<String>>) {
    let mut events = Box::pin(response.bytes_stream().eventsource());

    while let Some(event) = events.next().await {
        match event {
            Ok(event) => {
                if tx.send(Ok(event.data)).await.is_err() {
                    // Receiver closed
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Live update stream error");
                let _ = tx
                    .send(Err(ClientError::StreamTerminated(e.to_string())))
                    .await;
                return;
            }
        }
    }

    tracing::info!("Live update stream closed by server");
    let _ = tx
        .send(Err(ClientError::StreamTerminated(
            "Server closed the stream".to_string(),
        )))
        .await;
}

/// A single live update sequence. Not restartable.
pub struct LiveUpdates {
    rx: mpsc::Receiver<Result<String>>,
    task: Option<JoinHandle<()>>,
    terminated: bool,
}

impl LiveUpdates {
    /// Release the connection. Safe to call repeatedly; nothing is yielded
    /// afterwards.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Live update stream released");
        }
        self.rx.close();
        self.terminated = true;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub async fn next_message(&mut self) -> Option<Result<String>> {
        self.next().await
    }
}

impl Stream for LiveUpdates {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }

        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(Err(e))) => {
                this.close();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.close();
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl Drop for LiveUpdates {
    fn drop(&mut self) {
        self.close();
    }
}
