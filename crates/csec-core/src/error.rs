use thiserror::Error;

pub type CsecResult<T> = Result<T, CsecError>;

#[derive(Debug, Error)]
pub enum CsecError {
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
