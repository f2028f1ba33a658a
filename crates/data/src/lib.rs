//! Filesystem side of the picker: dataset files, the state jar and config.

pub mod config;
pub mod load;
pub mod store;

pub use config::*;
pub use load::*;
pub use store::*;

use chrono::{DateTime, Utc};
use picker_core::{DisplayModel, Persistence, Picker, RandomSource, RngState};

/// Builds a picker wired to the configured state file and dataset.
pub fn open_picker(config: &PickerConfig, now: DateTime<Utc>) -> Picker<FileStore, DisplayModel> {
    let rng: Box<dyn RandomSource> = match config.seed {
        Some(seed) => Box::new(RngState::from_seed(seed)),
        None => Box::new(RngState::from_entropy()),
    };
    let persistence = Persistence::new(FileStore::new(&config.state_path), config.store)
        .with_size_limit(config.cookie_max_bytes);
    let dataset = config.dataset_path.clone();
    Picker::bootstrap(
        persistence,
        rng,
        DisplayModel::default(),
        config.options(),
        now,
        move || fetch_dataset(&dataset),
    )
}
