use crate::{PoolError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PickerError {
    #[error("default dataset unavailable: {0}")]
    ResourceLoadFailure(String),
    #[error("could not read uploaded file: {0}")]
    FileParseFailure(String),
    #[error("could not read saved state: {0}")]
    PersistenceReadFailure(String),
    #[error("could not save state: {0}")]
    PersistenceWriteFailure(#[from] StoreError),
    #[error("all items have been drawn")]
    PoolExhausted,
    #[error("a draw is in progress")]
    Busy,
    #[error("pool error: {0}")]
    Pool(PoolError),
}

impl From<PoolError> for PickerError {
    fn from(value: PoolError) -> Self {
        match value {
            PoolError::Exhausted => Self::PoolExhausted,
            other => Self::Pool(other),
        }
    }
}
