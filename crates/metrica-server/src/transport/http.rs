//! Update and query handlers.
//!
//! Bodies arrive as raw bytes: the envelope decoder needs them untouched to
//! verify the signature before anything is parsed.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;

use metrica_core::error::MetricaError;
use metrica_core::protocol::compress::gunzip;
use metrica_core::protocol::record::MetricQuery;
use metrica_core::protocol::CONTENT_ENCODING_GZIP;

use crate::app_state::AppState;
use crate::storage::Storage;
use crate::transport::codec::{envelope_headers, record_response, ApiError};

/// `POST /updates/`: envelope batch.
pub async fn updates(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let metrics = state
        .decoder()
        .decode_batch(&body, &envelope_headers(&headers))?;

    state.storage().batch_update(&metrics).await?;

    tracing::debug!(count = metrics.len(), "batch stored");
    Ok(StatusCode::OK)
}

/// `POST /update/`: one envelope record; answers with the stored value.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let metric = state
        .decoder()
        .decode_one(&body, &envelope_headers(&headers))?;

    let storage = state.storage();
    storage.update(&metric).await?;
    let stored = storage.get(metric.kind(), metric.name()).await?;

    record_response(&stored)
}

/// `POST /value/`: `{"id","type"}` lookup.
pub async fn value(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let gzipped = envelope_headers(&headers)
        .content_encoding
        .is_some_and(|v| v.contains(CONTENT_ENCODING_GZIP));
    let raw = if gzipped {
        gunzip(&body)?
    } else {
        body.to_vec()
    };

    let query: MetricQuery = serde_json::from_slice(&raw)
        .map_err(|e| MetricaError::BadRequest(format!("invalid query json: {e}")))?;

    let metric = state.storage().get(query.kind()?, &query.id).await?;
    record_response(&metric)
}

/// `GET /ping`: database health.
pub async fn ping(State(state): State<AppState>) -> StatusCode {
    if state.storage().check_connection().await {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
