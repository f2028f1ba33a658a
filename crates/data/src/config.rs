use anyhow::Context;
use picker_core::{AnimationConfig, HistoryStyle, PickerOptions, StoreVariant, SYNTHETIC_COUNT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "0.0.0.0:7878";
pub const DEFAULT_DATASET: &str = "assets/names.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub dataset_path: PathBuf,
    pub state_path: PathBuf,
    pub store: StoreVariant,
    pub history: HistoryStyle,
    pub seed: Option<u64>,
    pub animation: AnimationConfig,
    pub synthetic_count: usize,
    /// Byte ceiling for cookie-variant saves. Unset means unlimited.
    pub cookie_max_bytes: Option<usize>,
    pub bind: String,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            state_path: default_state_path().unwrap_or_else(|| PathBuf::from(".picker_state.json")),
            store: StoreVariant::default(),
            history: HistoryStyle::default(),
            seed: None,
            animation: AnimationConfig::default(),
            synthetic_count: SYNTHETIC_COUNT,
            cookie_max_bytes: None,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl PickerConfig {
    pub fn options(&self) -> PickerOptions {
        PickerOptions {
            animation: self.animation,
            history: self.history,
            synthetic_count: self.synthetic_count,
        }
    }
}

pub fn default_state_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".picker_state.json"))
}

pub fn load_config_file(path: &Path) -> anyhow::Result<PickerConfig> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(config)
}

/// Config from `PICKER_CONFIG` (or defaults), then `PICKER_STATE` and
/// `PICKER_DATASET` overrides.
pub fn load_config() -> anyhow::Result<PickerConfig> {
    let mut config = match std::env::var_os("PICKER_CONFIG") {
        Some(path) => load_config_file(Path::new(&path))?,
        None => PickerConfig::default(),
    };
    if let Some(path) = std::env::var_os("PICKER_STATE") {
        config.state_path = PathBuf::from(path);
    }
    if let Some(path) = std::env::var_os("PICKER_DATASET") {
        config.dataset_path = PathBuf::from(path);
    }
    Ok(config)
}
