use thiserror::Error;

/// Failure of a single call to the translation provider.
///
/// Never escapes the `Translator`: every variant degrades to the source text.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Network error, timeout, or 5xx response.
    #[error("translation provider unavailable: {0}")]
    Unavailable(String),

    /// 429 or another 4xx response (quota, rate limit, rejected key).
    #[error("translation provider rejected request ({status}): {body}")]
    QuotaExceeded { status: u16, body: String },

    /// Response body could not be decoded or did not match the request.
    #[error("malformed translation provider response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status.is_server_error() {
            ProviderError::Unavailable(format!("{}: {}", status, body))
        } else {
            ProviderError::QuotaExceeded {
                status: status.as_u16(),
                body,
            }
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::Unavailable(err.to_string())
        }
    }
}

/// The persistent cache store could not be reached or rejected a query.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("cache store returned an invalid row: {0}")]
    InvalidRow(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_server_errors_are_unavailable() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = ProviderError::from_status(status, "down".to_string());
            assert!(matches!(err, ProviderError::Unavailable(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_client_errors_are_quota_exceeded() {
        for status in [
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::FORBIDDEN,
            StatusCode::BAD_REQUEST,
        ] {
            let err = ProviderError::from_status(status, "no".to_string());
            assert!(
                matches!(err, ProviderError::QuotaExceeded { status: s, .. } if s == status.as_u16()),
                "{:?}",
                err
            );
        }
    }

    #[test]
    fn test_display_mentions_status() {
        let err = ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down".to_string());
        let message = err.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("slow down"));
    }
}
