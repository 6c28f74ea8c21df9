use cab_core::HierarchyError;

/// Failure of a backend call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status. Not retried.
    #[error("HTTP error! status: {status} ({endpoint})")]
    Transport { status: u16, endpoint: &'static str },

    /// Connection-level failure.
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server reported an `exception`.
    #[error("cannot {operation}: {message}")]
    Application {
        operation: &'static str,
        message: String,
    },

    /// The payload is not the JSON we expected.
    #[error("cannot decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The request body could not be serialized.
    #[error("cannot encode {operation} request: {source}")]
    Encode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A picker label that names no known train number.
    #[error("unknown train number: {0}")]
    UnknownTrainNumber(String),
}

impl ApiError {
    /// Message of a server-side `exception`, if that is what this is.
    pub fn exception(&self) -> Option<&str> {
        match self {
            ApiError::Application { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encode_failures_name_the_request() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let detail = source.to_string();
        let err = ApiError::Encode {
            operation: "getCplxAction",
            source,
        };
        assert_eq!(
            err.to_string(),
            format!("cannot encode getCplxAction request: {detail}")
        );
        assert_eq!(err.exception(), None);
    }
}
