use thiserror::Error;

/// Errors that can occur in the selection core
#[derive(Error, Debug)]
pub enum SelectError {
    #[error("no protocol supports the selection parameters")]
    NoProtocols,

    #[error("no protocol available for {param} at message length {msg_length}")]
    Unsupported { param: String, msg_length: usize },

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SelectError>;

/// Why a protocol opted out of a parameter combination during `init`.
///
/// A single failing protocol is not fatal to selection; it is excluded
/// from the candidate set for these parameters and logged at debug level.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("parameters not supported")]
    Unsupported,

    #[error("{0}")]
    Failed(String),
}
