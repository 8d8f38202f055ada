use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no such algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("{0} does not search skeletons one at a time")]
    NotPerSkeleton(&'static str),

    #[error("place count must be at least 2, got {0}")]
    InvalidPlaceCount(usize),

    #[error("bad argument: {0}")]
    Argument(#[from] pico_args::Error),

    #[error("unexpected arguments: {0}")]
    UnusedArguments(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed message: {0}")]
    Wire(String),

    #[error("{what} {value} does not fit the wire format")]
    OutOfRange { what: &'static str, value: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
