use thiserror::Error;

#[derive(Debug, Error)]
pub enum YookassaApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Could not reach the YooKassa API: {0}")]
    Transport(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Gave up after {attempts} attempts. Last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: Box<YookassaApiError> },
    #[error("Invalid payment id: {0}")]
    InvalidPaymentId(String),
}

impl YookassaApiError {
    /// Whether repeating the same request could reasonably succeed. Timeouts, connection failures and 5xx responses
    /// are transient. Everything else, notably 4xx responses, is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::QueryError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status of the response that caused this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::QueryError { status, .. } => Some(*status),
            Self::RetriesExhausted { last_error, .. } => last_error.status(),
            _ => None,
        }
    }
}
