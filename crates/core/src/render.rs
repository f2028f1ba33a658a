use crate::{Item, PoolCounts};
use serde::{Deserialize, Serialize};

pub const PROMPT_LABEL: &str = "Who's up next?";
pub const EMPTY_HISTORY_LABEL: &str = "Nothing drawn yet";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStyle {
    /// Three most recent draws, newest first.
    LastThree,
    /// Every draw, newest first, with its 1-based draw ordinal.
    #[default]
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub ordinal: usize,
    pub value: String,
}

pub fn history_entries(drawn: &[Item], style: HistoryStyle) -> Vec<HistoryEntry> {
    let limit = match style {
        HistoryStyle::LastThree => 3,
        HistoryStyle::Full => drawn.len(),
    };
    drawn
        .iter()
        .enumerate()
        .rev()
        .take(limit)
        .map(|(idx, item)| HistoryEntry {
            ordinal: idx + 1,
            value: item.value.clone(),
        })
        .collect()
}

/// Classes carried by the trigger control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VisualState {
    pub spinning: bool,
    pub selected: bool,
    pub bounce: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "slots", rename_all = "snake_case")]
pub enum SlotDisplay {
    #[default]
    Prompt,
    Reel(Vec<Option<String>>),
}

impl SlotDisplay {
    pub fn from_items(items: &[Option<Item>]) -> Self {
        Self::Reel(
            items
                .iter()
                .map(|item| item.as_ref().map(|item| item.value.clone()))
                .collect(),
        )
    }

    /// Labels for each slot, the prompt sitting in the centre.
    pub fn labels(&self, slots: usize) -> Vec<String> {
        match self {
            Self::Prompt => (0..slots)
                .map(|idx| {
                    if idx == slots / 2 {
                        PROMPT_LABEL.to_string()
                    } else {
                        String::new()
                    }
                })
                .collect(),
            Self::Reel(values) => (0..slots)
                .map(|idx| values.get(idx).cloned().flatten().unwrap_or_default())
                .collect(),
        }
    }
}

/// Everything the picker pushes to a front end after a change.
pub trait Renderer {
    fn show_counts(&mut self, counts: PoolCounts);
    fn show_history(&mut self, entries: &[HistoryEntry]);
    fn show_slots(&mut self, display: &SlotDisplay);
    fn set_visual(&mut self, visual: VisualState);
    fn notify(&mut self, notice: &str);
}

/// Renderer that keeps the latest of everything, for front ends that
/// draw on their own schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayModel {
    pub counts: PoolCounts,
    pub history: Vec<HistoryEntry>,
    pub slots: SlotDisplay,
    pub visual: VisualState,
    pub notice: Option<String>,
}

impl DisplayModel {
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}

impl Renderer for DisplayModel {
    fn show_counts(&mut self, counts: PoolCounts) {
        self.counts = counts;
    }

    fn show_history(&mut self, entries: &[HistoryEntry]) {
        self.history = entries.to_vec();
    }

    fn show_slots(&mut self, display: &SlotDisplay) {
        self.slots = display.clone();
    }

    fn set_visual(&mut self, visual: VisualState) {
        self.visual = visual;
    }

    fn notify(&mut self, notice: &str) {
        self.notice = Some(notice.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawn() -> Vec<Item> {
        ["A", "B", "C", "D"]
            .iter()
            .enumerate()
            .map(|(idx, value)| Item::new(idx as u32 + 1, *value))
            .collect()
    }

    #[test]
    fn full_history_is_newest_first_with_ordinals() {
        let entries = history_entries(&drawn(), HistoryStyle::Full);
        let labels: Vec<_> = entries
            .iter()
            .map(|entry| format!("{} #{}", entry.value, entry.ordinal))
            .collect();
        assert_eq!(labels, vec!["D #4", "C #3", "B #2", "A #1"]);
    }

    #[test]
    fn last_three_history() {
        let entries = history_entries(&drawn(), HistoryStyle::LastThree);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].value, "D");
        assert_eq!(entries[2].value, "B");
        assert!(history_entries(&[], HistoryStyle::LastThree).is_empty());
    }

    #[test]
    fn prompt_sits_in_centre() {
        assert_eq!(
            SlotDisplay::Prompt.labels(3),
            vec![String::new(), PROMPT_LABEL.to_string(), String::new()]
        );
        let reel = SlotDisplay::from_items(&[None, Some(Item::new(1, "X")), None]);
        assert_eq!(reel.labels(3), vec!["", "X", ""]);
    }
}
