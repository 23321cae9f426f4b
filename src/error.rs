use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] mysql::Error),

    #[error("invalid connection url: {0}")]
    Url(#[from] mysql::UrlError),

    #[error("not connected to a database")]
    NotConnected,

    #[error("failed to fetch {what}: {source}")]
    Metadata {
        what: String,
        #[source]
        source: Box<Error>,
    },

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Usage(String),

    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T = ()> = std::result::Result<T, Error>;

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage(message.into())
    }

    pub fn metadata(what: impl Into<String>, source: Error) -> Self {
        Error::Metadata {
            what: what.into(),
            source: Box::new(source),
        }
    }
}
