//! Scene state and the per-tick update.
//!
//! Everything here is deterministic given the injected RNG, the `now`
//! instants passed to [`Scene::tick`] and the frame source.

use crate::melt::capture::FrameSource;
use crate::melt::composite::RgbaBuffer;
use crate::melt::icons::IconSet;
use crate::melt::settings::MeltSettings;
use crate::melt::sprite::{Bounds, EdgePolicy, Sprite};
use crate::melt::state::{can_transition_phase, Phase};
use rand::Rng;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    pub tremor_duration: Duration,
    pub spawn_probability: f64,
    pub max_sprites: Option<usize>,
    pub edge: EdgePolicy,
    pub bounce_late_spawns: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::from(&MeltSettings::default())
    }
}

impl From<&MeltSettings> for SceneConfig {
    fn from(settings: &MeltSettings) -> Self {
        Self {
            tremor_duration: settings.tremor_duration(),
            spawn_probability: settings.spawn_probability.clamp(0.0, 1.0),
            max_sprites: settings.max_sprites,
            edge: if settings.clamp_on_bounce {
                EdgePolicy::Clamp
            } else {
                EdgePolicy::Overshoot
            },
            bounce_late_spawns: settings.bounce_late_spawns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub captured: bool,
    pub entered_bouncing: bool,
    pub spawned: bool,
}

#[derive(Debug)]
pub struct Scene<R> {
    bounds: Bounds,
    config: SceneConfig,
    rng: R,
    phase: Phase,
    started_at: Instant,
    background: Option<RgbaBuffer>,
    sprites: VecDeque<Sprite>,
    capture_failing: bool,
}

impl<R> Scene<R> {
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn background(&self) -> Option<&RgbaBuffer> {
        self.background.as_ref()
    }

    /// Live sprites, oldest first. Draw order follows this order.
    pub fn sprites(&self) -> &VecDeque<Sprite> {
        &self.sprites
    }

    pub fn sprites_mut(&mut self) -> &mut VecDeque<Sprite> {
        &mut self.sprites
    }

    /// Releases the background and every sprite image. Safe before the first
    /// tick and safe to repeat.
    pub fn teardown(&mut self) {
        self.background = None;
        for sprite in &mut self.sprites {
            sprite.dispose();
        }
        self.sprites.clear();
    }
}

impl<R: Rng> Scene<R> {
    pub fn new(bounds: Bounds, config: SceneConfig, started_at: Instant, rng: R) -> Self {
        Self {
            bounds,
            config,
            rng,
            phase: Phase::Tremor,
            started_at,
            background: None,
            sprites: VecDeque::new(),
            capture_failing: false,
        }
    }

    pub fn tick<S: FrameSource + ?Sized>(
        &mut self,
        now: Instant,
        source: &mut S,
        icons: &IconSet,
    ) -> TickReport {
        let captured = self.recapture(source);
        let entered_bouncing = self.advance_phase(now);
        let spawned = self.maybe_spawn(icons);

        let bounds = self.bounds;
        let edge = self.config.edge;
        for sprite in &mut self.sprites {
            sprite.update(bounds, edge, &mut self.rng);
        }

        TickReport {
            captured,
            entered_bouncing,
            spawned,
        }
    }

    fn recapture<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> bool {
        // drop the old snapshot before taking the next one
        self.background = None;
        match source.capture() {
            Ok(frame) => {
                if self.capture_failing {
                    tracing::info!("desktop capture recovered");
                    self.capture_failing = false;
                }
                self.background = Some(frame);
                true
            }
            Err(err) => {
                if !self.capture_failing {
                    tracing::warn!(?err, "desktop capture failed; skipping frames until it recovers");
                    self.capture_failing = true;
                }
                false
            }
        }
    }

    fn advance_phase(&mut self, now: Instant) -> bool {
        if self.phase.is_bouncing() || self.elapsed(now) < self.config.tremor_duration {
            return false;
        }
        debug_assert!(can_transition_phase(self.phase, Phase::Bouncing));
        self.phase = Phase::Bouncing;
        for sprite in &mut self.sprites {
            sprite.start_bouncing(&mut self.rng);
        }
        tracing::debug!(sprites = self.sprites.len(), "entering bounce phase");
        true
    }

    fn maybe_spawn(&mut self, icons: &IconSet) -> bool {
        let probability = self.config.spawn_probability;
        if icons.is_empty() || probability.is_nan() || probability <= 0.0 {
            return false;
        }
        if !self.rng.gen_bool(probability.min(1.0)) {
            return false;
        }
        let image = icons.pick(&mut self.rng);
        self.spawn_sprite(image);
        true
    }

    /// Places a new sprite at a random on-screen position.
    pub fn spawn_sprite(&mut self, image: RgbaBuffer) {
        let (x, y) = self.bounds.random_spawn_point(&mut self.rng);
        let mut sprite = Sprite::spawn(image, x, y, &mut self.rng);
        if self.phase.is_bouncing() && self.config.bounce_late_spawns {
            sprite.start_bouncing(&mut self.rng);
        }
        tracing::debug!(x, y, total = self.sprites.len() + 1, "spawned sprite");
        self.push_sprite(sprite);
    }

    pub fn push_sprite(&mut self, mut sprite: Sprite) {
        if let Some(cap) = self.config.max_sprites {
            if cap == 0 {
                sprite.dispose();
                return;
            }
            while self.sprites.len() >= cap {
                let Some(mut oldest) = self.sprites.pop_front() else {
                    break;
                };
                oldest.dispose();
            }
        }
        self.sprites.push_back(sprite);
    }
}
