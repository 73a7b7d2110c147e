/// Classified completion failure. The pipeline turns any of these into an
/// error reply carrying the display message.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Request or connect deadline elapsed
    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },
    /// Connection refused, DNS failure, reset, etc.
    #[error("{provider} request error: {message}")]
    Network {
        provider: &'static str,
        message: String,
    },
    /// Non-2xx response
    #[error("{provider} API error: {status} {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} response missing content")]
    EmptyReply { provider: &'static str },
}

impl CompletionError {
    pub fn from_reqwest(provider: &'static str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout { provider }
        } else if error.is_decode() {
            Self::Decode {
                provider,
                message: error.to_string(),
            }
        } else {
            Self::Network {
                provider,
                message: error.to_string(),
            }
        }
    }

    pub fn from_status(provider: &'static str, status: u16, body: &str) -> Self {
        Self::Status {
            provider,
            status,
            body: truncate_body(body),
        }
    }
}

fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 300;
    let trimmed = body.trim();
    if trimmed.chars().count() > LIMIT {
        format!("{}...", trimmed.chars().take(LIMIT).collect::<String>())
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let error = CompletionError::from_status("Groq", 500, &body);
        let CompletionError::Status { body, status, .. } = error else {
            panic!("expected status error");
        };
        assert_eq!(status, 500);
        assert_eq!(body.chars().count(), 303);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn test_status_error_message_mentions_provider_and_code() {
        let error = CompletionError::from_status("Groq", 401, "invalid api key");
        assert_eq!(error.to_string(), "Groq API error: 401 invalid api key");
    }

    #[test]
    fn test_empty_reply_message() {
        let error = CompletionError::EmptyReply { provider: "Groq" };
        assert_eq!(error.to_string(), "Groq response missing content");
    }
}
