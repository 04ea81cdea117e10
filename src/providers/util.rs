use std::time::Duration;

use reqwest::StatusCode;

use crate::core::error::{Error, Result};

/// Builds the HTTP client providers share. Requests carry the app's
/// user agent and the configured timeout; expiry surfaces as
/// `ProviderUnavailable` through the send error.
pub fn http_client(timeout: Duration, provider: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("fxwallet/0.1")
        .timeout(timeout)
        .build()
        .map_err(|e| Error::ProviderUnavailable {
            provider: provider.to_string(),
            reason: e.to_string(),
        })
}

/// Maps a non-success HTTP status to the provider error taxonomy.
/// 401/403 mean a rejected credential, 429 and 5xx mean the service
/// is unavailable, anything else non-2xx is an unexpected response.
pub fn status_error(provider: &str, status: StatusCode) -> Option<Error> {
    if status.is_success() {
        return None;
    }
    let reason = format!("HTTP {status}");
    let provider = provider.to_string();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Some(Error::ProviderAuthError { provider, reason });
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Some(Error::ProviderUnavailable { provider, reason });
    }
    Some(Error::ProviderMalformedResponse { provider, reason })
}

/// Wraps a network-level send failure.
pub fn send_error(provider: &str, err: reqwest::Error) -> Error {
    Error::ProviderUnavailable {
        provider: provider.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(status_error("x", StatusCode::OK).is_none());
        assert!(matches!(
            status_error("x", StatusCode::UNAUTHORIZED),
            Some(Error::ProviderAuthError { .. })
        ));
        assert!(matches!(
            status_error("x", StatusCode::FORBIDDEN),
            Some(Error::ProviderAuthError { .. })
        ));
        assert!(matches!(
            status_error("x", StatusCode::TOO_MANY_REQUESTS),
            Some(Error::ProviderUnavailable { .. })
        ));
        assert!(matches!(
            status_error("x", StatusCode::BAD_GATEWAY),
            Some(Error::ProviderUnavailable { .. })
        ));
        assert!(matches!(
            status_error("x", StatusCode::NOT_FOUND),
            Some(Error::ProviderMalformedResponse { .. })
        ));
    }
}
