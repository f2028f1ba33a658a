use crate::{Item, PoolState, RandomSource};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("all items have been drawn")]
    Exhausted,
    #[error("index {index} out of range for {len} remaining items")]
    InvalidIndex { index: usize, len: usize },
    #[error("item {0} is not in the remaining pool")]
    UnknownItem(u32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolCounts {
    pub remaining: usize,
    pub drawn: usize,
}

/// Partition of the loaded items into `remaining` and `drawn`.
///
/// The two sequences never share an id. `drawn` keeps draw order, most
/// recent last.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Pool {
    remaining: Vec<Item>,
    drawn: Vec<Item>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        let mut pool = Self::new();
        pool.load(items);
        pool
    }

    /// Replaces the pool with `items`, renumbering ids `1..=N` in source
    /// order, and clears the drawn history.
    pub fn load(&mut self, items: Vec<Item>) {
        self.remaining = items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| Item::new(idx as u32 + 1, item.value))
            .collect();
        self.drawn.clear();
    }

    pub fn remaining(&self) -> &[Item] {
        &self.remaining
    }

    pub fn drawn(&self) -> &[Item] {
        &self.drawn
    }

    pub fn counts(&self) -> PoolCounts {
        PoolCounts {
            remaining: self.remaining.len(),
            drawn: self.drawn.len(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Chooses a uniformly random index into `remaining` without removing it.
    pub fn pick_index(&self, rng: &mut dyn RandomSource) -> Result<usize, PoolError> {
        if self.remaining.is_empty() {
            return Err(PoolError::Exhausted);
        }
        Ok(rng.index(self.remaining.len()))
    }

    pub fn draw(&mut self, rng: &mut dyn RandomSource) -> Result<Item, PoolError> {
        let index = self.pick_index(rng)?;
        self.draw_at(index)
    }

    pub fn draw_at(&mut self, index: usize) -> Result<Item, PoolError> {
        if self.remaining.is_empty() {
            return Err(PoolError::Exhausted);
        }
        if index >= self.remaining.len() {
            return Err(PoolError::InvalidIndex {
                index,
                len: self.remaining.len(),
            });
        }
        let item = self.remaining.remove(index);
        self.drawn.push(item.clone());
        Ok(item)
    }

    /// Moves the remaining item with `id` to the end of `drawn`.
    pub fn take(&mut self, id: u32) -> Result<Item, PoolError> {
        let index = self
            .remaining
            .iter()
            .position(|item| item.id == id)
            .ok_or(PoolError::UnknownItem(id))?;
        self.draw_at(index)
    }

    /// Appends every drawn item, in draw order, after the existing
    /// remaining items.
    pub fn reset(&mut self) {
        self.remaining.append(&mut self.drawn);
    }

    pub fn snapshot(&self) -> PoolState {
        PoolState {
            remaining: self.remaining.clone(),
            drawn: self.drawn.clone(),
        }
    }

    /// Replaces the pool wholesale. Repeated ids are dropped, and an id
    /// present in both halves stays in `drawn`. Returns how many entries
    /// were dropped.
    pub fn restore(&mut self, state: PoolState) -> usize {
        let mut seen = HashSet::new();
        let mut dropped = 0usize;
        let mut drawn = Vec::with_capacity(state.drawn.len());
        for item in state.drawn {
            if seen.insert(item.id) {
                drawn.push(item);
            } else {
                dropped += 1;
            }
        }
        let mut remaining = Vec::with_capacity(state.remaining.len());
        for item in state.remaining {
            if seen.insert(item.id) {
                remaining.push(item);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(dropped, "dropped duplicate ids while restoring pool");
        }
        self.remaining = remaining;
        self.drawn = drawn;
        dropped
    }
}
