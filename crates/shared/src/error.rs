//! Failure taxonomy shared by every layer of the oracle.

/// Errors raised by backend calls, local media handling and tool runs.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Generation failed: {message}")]
    Generation { message: String },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation failed: {message}")]
    Operation { message: String },

    #[error("Network failure: {message}")]
    Network { message: String },

    #[error("Backend error {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("A request is already in flight for this conversation")]
    Busy,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {attempts} status checks")]
    TimedOut { attempts: u32 },
}

pub type Result<T> = std::result::Result<T, OracleError>;

impl OracleError {
    pub fn auth(message: impl Into<String>) -> Self {
        OracleError::Authentication {
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        OracleError::Generation {
            message: message.into(),
        }
    }

    pub fn operation(message: impl Into<String>) -> Self {
        OracleError::Operation {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        OracleError::Network {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        OracleError::InvalidInput {
            message: message.into(),
        }
    }

    /// Message shown to the user in place of a result.
    pub fn user_message(&self) -> String {
        match self {
            OracleError::Authentication { .. } => format!(
                "I couldn't connect to the AI service - there may be an issue with the API key.\n\nError: {}",
                self
            ),
            OracleError::Api { status: 429, .. } => format!(
                "The AI service is temporarily busy. Please wait a moment and try again.\n\nError: {}",
                self
            ),
            OracleError::Network { .. } => format!(
                "I'm having trouble connecting to the internet. Please check your network connection.\n\nError: {}",
                self
            ),
            OracleError::InvalidInput { message } => message.clone(),
            OracleError::Busy => "Please wait for the current answer to finish.".to_string(),
            OracleError::Cancelled => "Cancelled.".to_string(),
            _ => format!(
                "Sorry, I ran into an issue. Here's what happened:\n\n{}",
                self
            ),
        }
    }
}

impl From<serde_json::Error> for OracleError {
    fn from(err: serde_json::Error) -> Self {
        OracleError::generation(format!("malformed backend payload: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_shown_verbatim() {
        let err = OracleError::invalid_input("Please upload an image to edit.");
        assert_eq!(err.user_message(), "Please upload an image to edit.");
    }

    #[test]
    fn test_auth_and_rate_limit_phrasing() {
        assert!(OracleError::auth("missing key")
            .user_message()
            .contains("API key"));
        let busy = OracleError::Api {
            status: 429,
            detail: "quota".into(),
        };
        assert!(busy.user_message().contains("temporarily busy"));
    }

    #[test]
    fn test_io_conversion() {
        let err: OracleError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, OracleError::Io(_)));
    }
}
