use reqwest::StatusCode;
use shared::domain::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid username or password")]
    AuthFailure,
    #[error("no active session")]
    SessionAbsent,
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Http { status: StatusCode, message: String },
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
