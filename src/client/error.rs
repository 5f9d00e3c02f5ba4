use std::path::PathBuf;

use reqwest::StatusCode;

/// Everything that can go wrong when using the [FinanceClient](super::FinanceClient).
///
/// Every variant displays as a single line suitable for showing to the user.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be received.
    #[error("Could not reach the finance server: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the username or password.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// The server answered with an error status.
    #[error("{detail}")]
    Api {
        /// The HTTP status code of the response.
        status: StatusCode,
        /// The server's explanation of the error.
        detail: String,
    },

    /// The server answered with a body the client does not understand.
    #[error("Unexpected response from the finance server: {0}")]
    MalformedResponse(String),

    /// A request that needs a token was attempted without logging in.
    #[error("Not logged in. Log in first.")]
    NotLoggedIn,

    /// A form field could not be converted to the type the API expects.
    #[error("{0}")]
    InvalidInput(String),

    /// The session file could not be read or written.
    #[error("Could not access the session file {}: {source}", path.display())]
    SessionFile {
        /// The location of the session file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The session file exists but does not contain a valid session.
    #[error("The session file {} is corrupt: {source}", path.display())]
    CorruptSession {
        /// The location of the session file.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_json::Error,
    },
}

impl ClientError {
    /// The HTTP status of the error response, if the server sent one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::LoginFailed(_) => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }
}
