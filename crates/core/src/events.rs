use crate::Item;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    Dataset,
    Synthetic,
    Upload,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PickerEvent {
    Restored { remaining: usize, drawn: usize },
    Loaded { source: LoadSource, count: usize },
    SpinStarted { target: u32 },
    Settled { item: Item, remaining: usize },
    Reset { remaining: usize },
    Exhausted,
    UploadRejected { reason: String },
    PersistenceFailed { reason: String },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<PickerEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: PickerEvent) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PickerEvent> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
