//! Error types for gateway calls
//!
//! Separates failures where no answer came back (transport) from answers the
//! platform refused (rejected) and answers that could not be read (decode).

/// Gateway call failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a response (connect, timeout, TLS)
    #[error("transport error: {0}")]
    Transport(String),

    /// The platform answered with a non-success status
    #[error("platform rejected request with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// The response body was not the expected JSON
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The gateway is missing credentials or an endpoint
    #[error("gateway not configured: {0}")]
    NotConfigured(String),
}

impl GatewayError {
    /// Create rejected error
    #[inline]
    #[must_use]
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Check if no response was received
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if the platform refused the request
    #[inline]
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// HTTP status of a rejected request
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::rejected(status.as_u16(), err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
