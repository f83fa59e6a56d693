use actix_web::http::StatusCode;
use actix_web::web::Bytes;
use actix_web::HttpResponse;
use engine::StoreError;
use futures_util::{Stream, StreamExt};
use log::{error, warn};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use validator::ValidationErrors;

pub fn success<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "success",
        "message": message,
        "data": data
    }))
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Created().json(json!({
        "status": "success",
        "message": message,
        "data": data
    }))
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "status": "error",
        "message": message.into()
    }))
}

pub fn store_error_response(err: &StoreError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("Store request failed: {}", err);
    } else {
        warn!("Store rejected request: {}", err);
    }
    error_response(status, err.to_string())
}

/// Server-sent events: one `data:` frame per snapshot.
pub fn sse_response<S, T>(snapshots: S) -> HttpResponse
where
    S: Stream<Item = Vec<T>> + 'static,
    T: Serialize,
{
    let frames = snapshots.map(|snapshot| {
        let payload = serde_json::to_string(&snapshot).unwrap_or_else(|e| {
            warn!("Failed to encode snapshot: {}", e);
            "[]".to_string()
        });
        Ok::<_, Infallible>(Bytes::from(format!("data: {}\n\n", payload)))
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(frames)
}

pub fn validation_error_response(errors: &ValidationErrors) -> HttpResponse {
    error_response(StatusCode::BAD_REQUEST, errors.to_string())
}
