//! HTTP <-> envelope glue.
//!
//! - request headers => `EnvelopeHeaders` (borrowed, no copies)
//! - `MetricaError` => status from `ErrorCode::http_status` + JSON `{code,msg}`
//! - stored metric => JSON record response

use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use metrica_core::error::MetricaError;
use metrica_core::protocol::envelope::EnvelopeHeaders;
use metrica_core::protocol::record::encode_record;
use metrica_core::protocol::{CONTENT_TYPE_JSON, HEADER_SIGNATURE};
use metrica_core::Metric;

pub fn envelope_headers(headers: &HeaderMap) -> EnvelopeHeaders<'_> {
    EnvelopeHeaders {
        content_encoding: headers.get(CONTENT_ENCODING).and_then(|v| v.to_str().ok()),
        signature: headers.get(HEADER_SIGNATURE).and_then(|v| v.to_str().ok()),
    }
}

/// Error side of every handler.
#[derive(Debug)]
pub struct ApiError(pub MetricaError);

impl From<MetricaError> for ApiError {
    fn from(e: MetricaError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(code = code.as_str(), error = %self.0, "request failed");
        } else {
            tracing::warn!(code = code.as_str(), error = %self.0, "request rejected");
        }

        let body = json!({
            "code": code.as_str(),
            "msg": self.0.to_string(),
        });
        (status, [(CONTENT_TYPE, CONTENT_TYPE_JSON)], body.to_string()).into_response()
    }
}

pub fn record_response(metric: &Metric) -> Result<Response, ApiError> {
    let body = encode_record(metric)?;
    Ok((StatusCode::OK, [(CONTENT_TYPE, CONTENT_TYPE_JSON)], body).into_response())
}
