use thiserror::Error;

/// Failures surfaced by session operations.
///
/// Recognition failures never appear here: they are absorbed inside
/// `recognize_and_record` and only logged.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid profile: {0}")]
    InvalidProfile(&'static str),

    #[error("invalid username")]
    InvalidUsername,

    #[error("invalid username or password")]
    AuthenticationFailed,

    #[error("username already registered: {0}")]
    DuplicateUser(String),

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}
