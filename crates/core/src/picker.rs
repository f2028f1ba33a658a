use crate::animator::{AnimationConfig, Animator, Frame, Phase, Request, Step, Target};
use crate::dataset::{parse_items, synthetic_items, SYNTHETIC_COUNT};
use crate::{
    history_entries, DisplayModel, EventBus, HistoryStyle, Item, KeyValueStore, LoadSource,
    Persistence, PickerError, PickerEvent, Pool, PoolState, RandomSource, Renderer, SlotDisplay,
    VisualState,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

pub const EXHAUSTED_NOTICE: &str = "All items have been drawn!";
pub const UPLOAD_FAILED_NOTICE: &str = "Could not read the file.";
pub const BUSY_NOTICE: &str = "Wait for the current draw to finish.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Restored,
    Dataset,
    Synthetic,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickerOptions {
    pub animation: AnimationConfig,
    pub history: HistoryStyle,
    pub synthetic_count: usize,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            animation: AnimationConfig::default(),
            history: HistoryStyle::default(),
            synthetic_count: SYNTHETIC_COUNT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRequest {
    Started,
    Ignored,
    Exhausted,
}

/// Every frame of one spin followed by the item it settled on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpinReplay {
    pub frames: Vec<Frame>,
    pub result: Item,
}

/// The picker widget: pool, reveal animator and persistence, owned in one
/// place and driven by whoever holds it.
pub struct Picker<S, V = DisplayModel> {
    pool: Pool,
    animator: Animator,
    persistence: Persistence<S>,
    rng: Box<dyn RandomSource>,
    renderer: V,
    history: HistoryStyle,
    visual: VisualState,
    events: EventBus,
    origin: Origin,
}

fn millis(at: DateTime<Utc>) -> u64 {
    at.timestamp_millis().max(0) as u64
}

impl<S: KeyValueStore, V: Renderer> Picker<S, V> {
    /// Restores the saved state, or loads the default dataset, or falls
    /// back to synthetic items when the dataset cannot be read.
    pub fn bootstrap<F>(
        persistence: Persistence<S>,
        rng: Box<dyn RandomSource>,
        renderer: V,
        options: PickerOptions,
        now: DateTime<Utc>,
        fetch_default: F,
    ) -> Self
    where
        F: FnOnce() -> Result<String, PickerError>,
    {
        let mut picker = Self {
            pool: Pool::new(),
            animator: Animator::new(options.animation),
            persistence,
            rng,
            renderer,
            history: options.history,
            visual: VisualState::default(),
            events: EventBus::default(),
            origin: Origin::Synthetic,
        };

        match picker.persistence.try_load(now) {
            Ok(Some(state)) => {
                picker.pool.restore(state);
                picker.origin = Origin::Restored;
                let counts = picker.pool.counts();
                info!(
                    remaining = counts.remaining,
                    drawn = counts.drawn,
                    "restored saved picker state"
                );
                picker.events.push(PickerEvent::Restored {
                    remaining: counts.remaining,
                    drawn: counts.drawn,
                });
                picker.renderer.show_slots(&SlotDisplay::Prompt);
                picker.render_all();
                return picker;
            }
            Ok(None) => {}
            Err(err) => {
                let err = PickerError::PersistenceReadFailure(err.to_string());
                warn!(error = %err, "ignoring saved picker state");
                picker.events.push(PickerEvent::PersistenceFailed {
                    reason: err.to_string(),
                });
            }
        }

        let loaded = fetch_default().and_then(|text| {
            let items = parse_items(&text);
            if items.is_empty() {
                Err(PickerError::ResourceLoadFailure(
                    "dataset has no items".to_string(),
                ))
            } else {
                Ok(items)
            }
        });
        let (items, source) = match loaded {
            Ok(items) => (items, LoadSource::Dataset),
            Err(err) => {
                warn!(
                    error = %err,
                    count = options.synthetic_count,
                    "falling back to synthetic items"
                );
                (
                    synthetic_items(options.synthetic_count),
                    LoadSource::Synthetic,
                )
            }
        };
        picker.origin = match source {
            LoadSource::Dataset => Origin::Dataset,
            _ => Origin::Synthetic,
        };
        picker.install(items, source, now);
        picker
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn renderer(&self) -> &V {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut V {
        &mut self.renderer
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn visual(&self) -> VisualState {
        self.visual
    }

    pub fn history_style(&self) -> HistoryStyle {
        self.history
    }

    pub fn is_spinning(&self) -> bool {
        self.animator.is_spinning()
    }

    pub fn snapshot(&self) -> PoolState {
        self.pool.snapshot()
    }

    pub fn request_draw(&mut self, now: DateTime<Utc>) -> DrawRequest {
        match self
            .animator
            .request(millis(now), &self.pool, self.rng.as_mut())
        {
            Request::Ignored => {
                debug!("draw request ignored while spinning");
                DrawRequest::Ignored
            }
            Request::Exhausted => {
                info!("draw requested with an empty pool");
                self.renderer.notify(EXHAUSTED_NOTICE);
                self.events.push(PickerEvent::Exhausted);
                DrawRequest::Exhausted
            }
            Request::Started(target) => {
                debug!(id = target.item.id, index = target.index, "spin started");
                self.visual = VisualState {
                    spinning: true,
                    selected: false,
                    bounce: false,
                };
                self.renderer.set_visual(self.visual);
                self.events.push(PickerEvent::SpinStarted {
                    target: target.item.id,
                });
                DrawRequest::Started
            }
        }
    }

    /// Runs one animation step. Returns how long to wait before the next
    /// call, or `None` once the animator is idle.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Option<u64> {
        match self.step(now) {
            Step::Frame(frame) => Some(frame.delay_ms),
            Step::Settle(_) => Some(self.animator.config().bounce_ms),
            Step::Bounce { remaining_ms } => Some(remaining_ms),
            Step::Idle | Step::BounceEnded => None,
        }
    }

    /// Plays the current spin to settlement on virtual time, each frame
    /// advancing the clock by its own delay.
    pub fn simulate_spin(&mut self) -> Option<SpinReplay> {
        let Phase::Spinning { started_at, .. } = self.animator.phase() else {
            return None;
        };
        let mut at = *started_at;
        let mut frames = Vec::new();
        loop {
            let when = DateTime::<Utc>::from_timestamp_millis(at as i64)?;
            match self.step(when) {
                Step::Frame(frame) => {
                    at += frame.delay_ms.max(1);
                    frames.push(frame);
                }
                Step::Settle(target) => {
                    return Some(SpinReplay {
                        frames,
                        result: target.item,
                    });
                }
                _ => return None,
            }
        }
    }

    pub fn reset(&mut self, now: DateTime<Utc>) -> Result<(), PickerError> {
        self.ensure_idle()?;
        self.pool.reset();
        self.visual.selected = false;
        self.renderer.set_visual(self.visual);
        self.renderer.show_slots(&SlotDisplay::Prompt);
        self.render_all();
        let remaining = self.pool.counts().remaining;
        info!(remaining, "pool reset");
        self.events.push(PickerEvent::Reset { remaining });
        self.persist(now);
        Ok(())
    }

    /// Replaces the pool with an uploaded list. A failed read or an empty
    /// list leaves the current pool untouched.
    pub fn upload(
        &mut self,
        read: Result<String, String>,
        now: DateTime<Utc>,
    ) -> Result<usize, PickerError> {
        self.ensure_idle()?;
        match read {
            Ok(text) => self.replace_from_text(&text, now),
            Err(reason) => Err(self.upload_failed(reason)),
        }
    }

    /// Text with no usable lines is rejected like an unreadable file.
    pub fn replace_from_text(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, PickerError> {
        self.ensure_idle()?;
        let items = parse_items(text);
        if items.is_empty() {
            return Err(self.upload_failed("upload contains no items"));
        }
        let count = items.len();
        self.origin = Origin::Upload;
        self.visual.selected = false;
        self.renderer.set_visual(self.visual);
        self.install(items, LoadSource::Upload, now);
        Ok(count)
    }

    pub fn upload_failed(&mut self, reason: impl Into<String>) -> PickerError {
        let reason = reason.into();
        warn!(reason = %reason, "upload rejected");
        self.renderer.notify(UPLOAD_FAILED_NOTICE);
        self.events.push(PickerEvent::UploadRejected {
            reason: reason.clone(),
        });
        PickerError::FileParseFailure(reason)
    }

    fn ensure_idle(&mut self) -> Result<(), PickerError> {
        if self.animator.is_spinning() {
            self.renderer.notify(BUSY_NOTICE);
            return Err(PickerError::Busy);
        }
        Ok(())
    }

    fn install(&mut self, items: Vec<Item>, source: LoadSource, now: DateTime<Utc>) {
        self.pool.load(items);
        let count = self.pool.counts().remaining;
        info!(?source, count, "pool loaded");
        self.events.push(PickerEvent::Loaded { source, count });
        self.renderer.show_slots(&SlotDisplay::Prompt);
        self.render_all();
        self.persist(now);
    }

    fn step(&mut self, now: DateTime<Utc>) -> Step {
        let step = self
            .animator
            .tick(millis(now), &self.pool, self.rng.as_mut());
        match &step {
            Step::Frame(frame) => self
                .renderer
                .show_slots(&SlotDisplay::from_items(&frame.slots)),
            Step::Settle(target) => self.settle(target, now),
            Step::BounceEnded => {
                self.visual.bounce = false;
                self.renderer.set_visual(self.visual);
            }
            Step::Idle | Step::Bounce { .. } => {}
        }
        step
    }

    fn settle(&mut self, target: &Target, now: DateTime<Utc>) {
        let item = match self.pool.take(target.item.id) {
            Ok(item) => item,
            Err(err) => {
                warn!(error = %err, "spin target vanished before settlement");
                return;
            }
        };
        self.visual = VisualState {
            spinning: false,
            selected: true,
            bounce: true,
        };
        self.renderer.set_visual(self.visual);
        let slots = self.animator.config().slots;
        let reel: Vec<Option<Item>> = (0..slots)
            .map(|idx| (idx == slots / 2).then(|| item.clone()))
            .collect();
        self.renderer.show_slots(&SlotDisplay::from_items(&reel));
        self.render_all();
        let remaining = self.pool.counts().remaining;
        info!(id = item.id, value = %item.value, remaining, "draw settled");
        self.events.push(PickerEvent::Settled { item, remaining });
        self.persist(now);
    }

    fn render_all(&mut self) {
        self.renderer.show_counts(self.pool.counts());
        let history = history_entries(self.pool.drawn(), self.history);
        self.renderer.show_history(&history);
    }

    fn persist(&mut self, now: DateTime<Utc>) {
        if let Err(err) = self.persistence.save(&self.pool.snapshot(), now) {
            let err = PickerError::from(err);
            warn!(error = %err, "picker state not persisted");
            self.events.push(PickerEvent::PersistenceFailed {
                reason: err.to_string(),
            });
        }
    }
}
