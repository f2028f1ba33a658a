//! Picker state and reveal logic. Keep this crate free of IO and platform concerns.

pub mod animator;
pub mod dataset;
pub mod error;
pub mod events;
pub mod item;
pub mod picker;
pub mod pool;
pub mod render;
pub mod rng;
pub mod snapshot;
pub mod store;

pub use animator::{AnimationConfig, Animator, Frame, Phase, Request, Step, Target, Tick};
pub use dataset::*;
pub use error::*;
pub use events::*;
pub use item::*;
pub use picker::*;
pub use pool::*;
pub use render::*;
pub use rng::*;
pub use snapshot::PoolState;
pub use store::*;
