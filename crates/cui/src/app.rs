use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use picker_core::{
    DrawRequest, HistoryStyle, LoadSource, Picker, PickerEvent, VisualState, EMPTY_HISTORY_LABEL,
};
use picker_data::{open_picker, read_upload, FileStore, PickerConfig};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const MAX_EVENT_LOG: usize = 200;

pub struct App {
    pub config: PickerConfig,
    pub picker: Picker<FileStore>,
    pub event_log: VecDeque<String>,
    pub status_line: String,
    pub show_help: bool,
    pub history_open: bool,
    pub upload_prompt: Option<String>,
    pub should_quit: bool,
    wake_at: Option<Instant>,
}

impl App {
    pub fn bootstrap(config: PickerConfig) -> Self {
        let picker = open_picker(&config, Utc::now());
        let mut app = Self {
            config,
            picker,
            event_log: VecDeque::new(),
            status_line: "ready".to_string(),
            show_help: false,
            history_open: true,
            upload_prompt: None,
            should_quit: false,
            wake_at: None,
        };
        app.flush_events();
        app
    }

    /// When the animator next wants a tick, if ever.
    pub fn next_wake(&self) -> Option<Instant> {
        self.wake_at
    }

    pub fn on_tick(&mut self) {
        if let Some(at) = self.wake_at {
            if Instant::now() >= at {
                self.advance();
            }
        }
    }

    pub fn draw(&mut self) {
        match self.picker.request_draw(Utc::now()) {
            DrawRequest::Started => {
                self.push_status("spinning...");
                self.advance();
            }
            DrawRequest::Ignored => {}
            DrawRequest::Exhausted => {}
        }
        self.flush_events();
    }

    pub fn reset(&mut self) {
        if self.picker.reset(Utc::now()).is_ok() {
            self.push_status("pool reset");
        }
        self.flush_events();
    }

    pub fn open_upload_prompt(&mut self) {
        self.upload_prompt = Some(String::new());
    }

    pub fn handle_upload_prompt_key(&mut self, key: KeyEvent) -> bool {
        let Some(input) = self.upload_prompt.as_mut() else {
            return false;
        };
        match key.code {
            KeyCode::Esc => {
                self.upload_prompt = None;
                self.push_status("upload cancelled");
            }
            KeyCode::Enter => {
                let resolved = resolve_upload_path(input.trim());
                self.upload_prompt = None;
                match resolved {
                    Ok(path) => self.upload_from(path),
                    Err(err) => self.push_status(err),
                }
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(ch) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    input.push(ch);
                }
            }
            _ => {}
        }
        true
    }

    fn upload_from(&mut self, path: PathBuf) {
        let read = read_upload(&path).map_err(|err| format!("{err:#}"));
        match self.picker.upload(read, Utc::now()) {
            Ok(count) => self.push_status(format!("loaded {count} items from {}", path.display())),
            Err(err) => tracing::warn!(error = %err, path = %path.display(), "upload failed"),
        }
        self.flush_events();
    }

    fn advance(&mut self) {
        self.wake_at = self
            .picker
            .advance(Utc::now())
            .map(|delay| Instant::now() + Duration::from_millis(delay));
        self.flush_events();
    }

    pub fn visual(&self) -> VisualState {
        self.picker.renderer().visual
    }

    pub fn slot_labels(&self) -> Vec<String> {
        self.picker
            .renderer()
            .slots
            .labels(self.config.animation.slots)
    }

    pub fn history_lines(&self) -> Vec<String> {
        let history = &self.picker.renderer().history;
        if history.is_empty() {
            return vec![EMPTY_HISTORY_LABEL.to_string()];
        }
        history
            .iter()
            .map(|entry| match self.picker.history_style() {
                HistoryStyle::Full => format!("#{:<3} {}", entry.ordinal, entry.value),
                HistoryStyle::LastThree => entry.value.clone(),
            })
            .collect()
    }

    /// History rows for the side panel; nothing while it is collapsed.
    pub fn visible_history(&self) -> Vec<String> {
        if self.history_open {
            self.history_lines()
        } else {
            Vec::new()
        }
    }

    pub fn history_title(&self) -> &'static str {
        if self.history_open {
            "Drawn [h: hide]"
        } else {
            "Drawn [h: show]"
        }
    }

    pub fn push_status(&mut self, value: impl Into<String>) {
        self.status_line = value.into();
    }

    fn flush_events(&mut self) {
        if let Some(notice) = self.picker.renderer_mut().take_notice() {
            self.status_line = notice;
        }
        let drained: Vec<_> = self.picker.events().drain().collect();
        for event in drained {
            self.push_event_line(format_event(&event));
        }
    }

    fn push_event_line(&mut self, line: String) {
        if self.event_log.len() >= MAX_EVENT_LOG {
            let _ = self.event_log.pop_front();
        }
        self.event_log.push_back(line);
    }
}

fn resolve_upload_path(input: &str) -> Result<PathBuf, String> {
    if input.is_empty() {
        return Err("no file given".to_string());
    }
    Ok(PathBuf::from(input))
}

pub fn format_event(event: &PickerEvent) -> String {
    match event {
        PickerEvent::Restored { remaining, drawn } => {
            format!("restored saved state: {remaining} remaining, {drawn} drawn")
        }
        PickerEvent::Loaded { source, count } => {
            let source = match source {
                LoadSource::Dataset => "dataset",
                LoadSource::Synthetic => "generated items",
                LoadSource::Upload => "upload",
            };
            format!("loaded {count} items from {source}")
        }
        PickerEvent::SpinStarted { .. } => "spin started".to_string(),
        PickerEvent::Settled { item, remaining } => {
            format!("drew {} (#{}), {remaining} left", item.value, item.id)
        }
        PickerEvent::Reset { remaining } => format!("reset: {remaining} items back in the pool"),
        PickerEvent::Exhausted => "pool exhausted".to_string(),
        PickerEvent::UploadRejected { reason } => format!("upload rejected: {reason}"),
        PickerEvent::PersistenceFailed { reason } => format!("state not saved: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picker_core::Item;

    #[test]
    fn resolve_upload_path_uses_input() {
        let out = resolve_upload_path("lists/names.csv").expect("path");
        assert_eq!(out, PathBuf::from("lists/names.csv"));
    }

    #[test]
    fn resolve_upload_path_errors_on_empty_input() {
        assert!(resolve_upload_path("").is_err());
    }

    fn scratch_config(tag: &str) -> PickerConfig {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let base = std::env::temp_dir().join(format!(
            "picker_cui_{tag}_{}_{}",
            std::process::id(),
            nanos
        ));
        PickerConfig {
            dataset_path: base.with_extension("csv"),
            state_path: base.with_extension("json"),
            synthetic_count: 4,
            seed: Some(3),
            ..PickerConfig::default()
        }
    }

    #[test]
    fn history_panel_collapses_and_expands() {
        let config = scratch_config("history");
        let state_path = config.state_path.clone();
        let mut app = App::bootstrap(config);
        assert_eq!(app.visible_history(), vec![EMPTY_HISTORY_LABEL.to_string()]);

        crate::actions::dispatch(&mut app, crate::input::InputAction::ToggleHistory);
        assert!(!app.history_open);
        assert!(app.visible_history().is_empty());
        assert_eq!(app.history_title(), "Drawn [h: show]");

        crate::actions::dispatch(&mut app, crate::input::InputAction::ToggleHistory);
        assert!(app.history_open);
        assert_eq!(app.visible_history().len(), 1);
        let _ = std::fs::remove_file(state_path);
    }

    #[test]
    fn formats_settled_event() {
        let line = format_event(&PickerEvent::Settled {
            item: Item::new(4, "Dana"),
            remaining: 9,
        });
        assert_eq!(line, "drew Dana (#4), 9 left");
    }
}
