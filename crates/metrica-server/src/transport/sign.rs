//! Response signing.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use metrica_core::protocol::HEADER_SIGNATURE;

use crate::app_state::AppState;

/// Buffers the response body and sets `HashSHA256` over it. Empty bodies are
/// left unsigned.
pub async fn sign_response(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let resp = next.run(req).await;
    let Some(signer) = state.signer() else {
        return resp;
    };

    let (mut parts, body) = resp.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "buffer response for signing failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if !bytes.is_empty() {
        let header = signer.sign(&bytes).and_then(|sig| {
            let name = HeaderName::from_bytes(HEADER_SIGNATURE.as_bytes());
            let value = HeaderValue::from_str(&sig);
            match (name, value) {
                (Ok(name), Ok(value)) => Ok((name, value)),
                _ => Err(metrica_core::MetricaError::Internal(
                    "signature header not representable".into(),
                )),
            }
        });
        match header {
            Ok((name, value)) => {
                parts.headers.insert(name, value);
            }
            Err(e) => {
                tracing::error!(error = %e, "response signing failed");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    Response::from_parts(parts, Body::from(bytes))
}
