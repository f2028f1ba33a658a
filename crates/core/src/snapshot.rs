use crate::Item;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Serializable copy of the pool used for persistence.
///
/// Older saves used `items` / `removedItems`; both spellings are accepted on
/// read, the current names are always written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    #[serde(alias = "items")]
    pub remaining: Vec<Item>,
    #[serde(alias = "removedItems")]
    pub drawn: Vec<Item>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub fn encode(state: &PoolState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(state)?)
}

pub fn decode(text: &str) -> Result<PoolState, SnapshotError> {
    Ok(serde_json::from_str(text)?)
}
