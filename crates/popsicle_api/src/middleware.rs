//! Cross-cutting request middleware.
//!
//! # Responsibility
//! - Log every incoming request line.
//! - Log status and wall time once the handler finished.
//! - Turn handler panics into a 500 problem document.

use std::any::Any;
use std::time::Instant;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::{error, info};
use popsicle_core::sanitize_message;

use crate::error::ProblemDetails;

const MAX_PANIC_DETAIL_CHARS: usize = 160;
pub const PANIC_TITLE: &str = "An error occurred while processing your request.";

pub async fn log_requests(request: Request, next: Next) -> Response {
    info!(
        "event=http_request module=api method={} path={}",
        request.method(),
        request.uri().path()
    );
    next.run(request).await
}

pub async fn time_requests(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    info!(
        "event=http_response module=api method={} path={} status={} duration_ms={}",
        method,
        path,
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}

/// Response factory for `CatchPanicLayer`.
pub fn problem_for_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };
    let detail = sanitize_message(&message, MAX_PANIC_DETAIL_CHARS);

    error!("event=http_panic module=api status=500 detail={detail}");
    ProblemDetails::new(StatusCode::INTERNAL_SERVER_ERROR, PANIC_TITLE)
        .with_detail(detail)
        .into_response()
}
