use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
