//! Shared HTTP plumbing for the service clients.

use serde::Deserialize;

use earlyedge_core::error::ServiceError;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// FastAPI-style error body.
#[derive(Deserialize)]
struct DetailBody {
    detail: serde_json::Value,
}

pub(crate) fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .expect("failed to build HTTP client")
}

/// Map a transport-level reqwest error into the service error taxonomy.
pub(crate) fn map_send_error(e: reqwest::Error, timeout_secs: u64) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout(timeout_secs)
    } else {
        ServiceError::Network(e.to_string())
    }
}

/// Turn a non-2xx response into `ServiceError::Api`, pulling the message
/// out of a `{"detail": ...}` body when the service provides one.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<DetailBody>(&body)
        .map(|d| match d.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or(body);

    Err(ServiceError::Api { status, message })
}
