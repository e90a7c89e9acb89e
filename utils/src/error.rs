use thiserror::Error;

/// Result type used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("{message}")]
    WithSource {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error(transparent)]
    LoggerSetup(#[from] log::SetLoggerError),
}

impl Error {
    /// Create an error from a plain message.
    pub fn new(message: &str) -> Self {
        Error::Message(message.into())
    }

    /// Wrap an underlying error with a context message.
    pub fn with_source(message: &str, source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Error::WithSource {
            message: message.into(),
            source,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Error::new("configuration lock poisoned")
    }
}
