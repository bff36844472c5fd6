use std::time::Duration;

/// Coarse classification surfaced to callers and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network failure, timeout or a 5xx from the service.
    ServiceUnavailable,
    /// Auth, quota or bad-request rejections.
    ServiceRejected,
    /// The service answered but the body had an unexpected shape.
    MalformedResponse,
}

/// Typed failure of one completion-service call.
/// Callers treat every variant as "no content produced"; nothing is retried.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("authentication rejected: {0}")]
    AuthRejected(String),
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("request rejected: {0}")]
    BadRequest(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unavailable(_) => ErrorCategory::ServiceUnavailable,
            Self::AuthRejected(_) | Self::RateLimited { .. } | Self::BadRequest(_) => {
                ErrorCategory::ServiceRejected
            }
            Self::MalformedResponse(_) => ErrorCategory::MalformedResponse,
        }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::AuthRejected(_) => "auth_rejected",
            Self::RateLimited { .. } => "rate_limited",
            Self::BadRequest(_) => "bad_request",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    /// Classify a non-success HTTP status code.
    pub fn from_status(status: u16, body: String, retry_after: Option<Duration>) -> Self {
        match status {
            401 | 403 => Self::AuthRejected(body),
            429 => Self::RateLimited { retry_after },
            500..=599 => Self::Unavailable(format!("server error {status}: {body}")),
            400..=499 => Self::BadRequest(format!("status {status}: {body}")),
            _ => Self::MalformedResponse(format!("unexpected status {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_mapping() {
        assert!(matches!(
            ServiceError::from_status(401, "unauthorized".into(), None),
            ServiceError::AuthRejected(_)
        ));
        assert!(matches!(
            ServiceError::from_status(403, "forbidden".into(), None),
            ServiceError::AuthRejected(_)
        ));
        assert!(matches!(
            ServiceError::from_status(400, "bad".into(), None),
            ServiceError::BadRequest(_)
        ));
        assert!(matches!(
            ServiceError::from_status(402, "insufficient balance".into(), None),
            ServiceError::BadRequest(_)
        ));
        assert!(matches!(
            ServiceError::from_status(503, "down".into(), None),
            ServiceError::Unavailable(_)
        ));
    }

    #[test]
    fn rate_limit_keeps_retry_hint() {
        let err = ServiceError::from_status(429, String::new(), Some(Duration::from_secs(3)));
        match err {
            ServiceError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(3)));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn categories() {
        assert_eq!(
            ServiceError::Unavailable("tcp".into()).category(),
            ErrorCategory::ServiceUnavailable
        );
        assert_eq!(
            ServiceError::AuthRejected("key".into()).category(),
            ErrorCategory::ServiceRejected
        );
        assert_eq!(
            ServiceError::RateLimited { retry_after: None }.category(),
            ErrorCategory::ServiceRejected
        );
        assert_eq!(
            ServiceError::MalformedResponse("no choices".into()).category(),
            ErrorCategory::MalformedResponse
        );
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(ServiceError::BadRequest("x".into()).error_kind(), "bad_request");
        assert_eq!(
            ServiceError::RateLimited { retry_after: None }.error_kind(),
            "rate_limited"
        );
    }
}
