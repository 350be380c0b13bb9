use thiserror::Error;

/// Failures talking to the chat-completion or music catalog services.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{service} answered with status {status}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("malformed response: {0}")]
    MalformedPayload(String),
}
