use crate::{Item, Pool, PoolError, RandomSource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub duration_ms: u64,
    pub bounce_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Progress after which the centre slot shows the real result.
    pub pin_threshold: f64,
    pub slots: usize,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 3000,
            bounce_ms: 1000,
            min_delay_ms: 50,
            max_delay_ms: 300,
            pin_threshold: 0.8,
            slots: 3,
        }
    }
}

/// The item a spin will land on, chosen before the animation starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub index: usize,
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub slots: Vec<Option<Item>>,
    pub progress: f64,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Frame(Frame),
    Commit(Target),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Spinning { started_at: u64, target: Target },
    Settled { settled_at: u64, item: Item },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Started(Target),
    Ignored,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Idle,
    Frame(Frame),
    /// Spin finished this step; the target must be committed to the pool.
    Settle(Target),
    Bounce { remaining_ms: u64 },
    BounceEnded,
}

pub fn ease_out_quart(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(4)
}

pub fn progress(elapsed_ms: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 1.0;
    }
    (elapsed_ms as f64 / duration_ms as f64).min(1.0)
}

/// Wait before the next tick. Grows with progress so the reel slows down.
pub fn next_delay(progress: f64, config: &AnimationConfig) -> u64 {
    let eased = config.max_delay_ms as f64 * ease_out_quart(progress);
    eased.max(config.min_delay_ms as f64) as u64
}

/// Pure tick: what the display shows `elapsed_ms` into a spin, or the
/// commit once the duration is reached.
pub fn frame_at(
    elapsed_ms: u64,
    target: &Target,
    remaining: &[Item],
    rng: &mut dyn RandomSource,
    config: &AnimationConfig,
) -> Tick {
    let p = progress(elapsed_ms, config.duration_ms);
    if p >= 1.0 {
        return Tick::Commit(target.clone());
    }
    let mut slots: Vec<Option<Item>> = (0..config.slots)
        .map(|_| {
            if remaining.is_empty() {
                None
            } else {
                remaining.get(rng.index(remaining.len())).cloned()
            }
        })
        .collect();
    if p > config.pin_threshold {
        if let Some(centre) = slots.get_mut(config.slots / 2) {
            *centre = Some(target.item.clone());
        }
    }
    Tick::Frame(Frame {
        slots,
        progress: p,
        delay_ms: next_delay(p, config),
    })
}

/// `idle -> spinning -> settled -> idle`. Holds no pool state; the caller
/// commits the target when [`Step::Settle`] comes back.
#[derive(Debug, Clone)]
pub struct Animator {
    config: AnimationConfig,
    phase: Phase,
}

impl Animator {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.phase, Phase::Spinning { .. })
    }

    pub fn request(&mut self, now_ms: u64, pool: &Pool, rng: &mut dyn RandomSource) -> Request {
        if self.is_spinning() {
            return Request::Ignored;
        }
        let index = match pool.pick_index(rng) {
            Ok(index) => index,
            Err(PoolError::Exhausted) => return Request::Exhausted,
            Err(_) => return Request::Ignored,
        };
        let Some(item) = pool.remaining().get(index).cloned() else {
            return Request::Ignored;
        };
        let target = Target { index, item };
        self.phase = Phase::Spinning {
            started_at: now_ms,
            target: target.clone(),
        };
        Request::Started(target)
    }

    pub fn tick(&mut self, now_ms: u64, pool: &Pool, rng: &mut dyn RandomSource) -> Step {
        match &self.phase {
            Phase::Idle => Step::Idle,
            Phase::Spinning { started_at, target } => {
                let elapsed = now_ms.saturating_sub(*started_at);
                match frame_at(elapsed, target, pool.remaining(), rng, &self.config) {
                    Tick::Frame(frame) => Step::Frame(frame),
                    Tick::Commit(target) => {
                        self.phase = Phase::Settled {
                            settled_at: now_ms,
                            item: target.item.clone(),
                        };
                        Step::Settle(target)
                    }
                }
            }
            Phase::Settled { settled_at, .. } => {
                let shown = now_ms.saturating_sub(*settled_at);
                if shown >= self.config.bounce_ms {
                    self.phase = Phase::Idle;
                    Step::BounceEnded
                } else {
                    Step::Bounce {
                        remaining_ms: self.config.bounce_ms - shown,
                    }
                }
            }
        }
    }
}
