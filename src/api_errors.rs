use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_STATUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{3})\s").expect("leading status pattern is valid")
});

/// Failure reported by the remote portfolio API.
///
/// The classification signal is either a leading 3-digit token in the message
/// (`"404 Not Found"`) or an explicit status taken from the HTTP response.
#[derive(Debug, Clone, PartialEq, Display)]
#[display("{message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(Some(status), message)
    }

    /// A failure that never reached the server (DNS, refused connection, timeout).
    pub fn offline(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    /// The HTTP-like status used to classify this failure.
    ///
    /// A status embedded at the start of the message wins over the explicit one.
    pub fn status(&self) -> Option<u16> {
        LEADING_STATUS
            .captures(&self.message)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u16>().ok())
            .or(self.status)
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_token_takes_priority() {
        let err = ApiError::with_status(500, "404 Not Found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn falls_back_to_explicit_status() {
        let err = ApiError::with_status(405, r#"{"detail":"Method Not Allowed"}"#);
        assert_eq!(err.status(), Some(405));
    }

    #[test]
    fn token_must_be_followed_by_whitespace() {
        let err = ApiError::offline("4040 records");
        assert_eq!(err.status(), None);
    }
}
