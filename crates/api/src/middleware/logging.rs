//! Request logging built on `tower_http::trace`.
//!
//! Every request produces a "Received new request" event when it arrives
//! and a "Request completed" event carrying the status code and latency.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::{Request, Response, header};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, OnRequest, OnResponse, TraceLayer};
use tracing::Span;

pub type RequestLoggingLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, DefaultMakeSpan, LogRequest, LogResponse>;

/// Build the logging layer applied around the whole router.
pub fn request_logging() -> RequestLoggingLayer {
    TraceLayer::new_for_http()
        .on_request(LogRequest)
        .on_response(LogResponse)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequest;

impl<B> OnRequest<B> for LogRequest {
    fn on_request(&mut self, request: &Request<B>, _span: &Span) {
        let remote_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let user_agent = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        tracing::info!(
            method = %request.method(),
            path = %request.uri().path(),
            remote_addr = %remote_addr,
            user_agent,
            "Received new request"
        );
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogResponse;

impl<B> OnResponse<B> for LogResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        tracing::info!(
            status_code = response.status().as_u16(),
            duration_ms = latency.as_millis() as u64,
            duration = ?latency,
            "Request completed"
        );
    }
}
