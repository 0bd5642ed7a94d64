use crate::melt::composite::RgbaBuffer;
use rand::Rng;

/// Edge length of every sprite, used for spawn bounds, reflection bounds and
/// the draw box alike.
pub const SPRITE_SIZE: i32 = 32;

const TREMOR_STEP: i32 = 1;
const BOUNCE_SPEED: i32 = 6;
const STALLED_AXIS_SPEED: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn max_sprite_x(self) -> i32 {
        self.width - SPRITE_SIZE
    }

    pub fn max_sprite_y(self) -> i32 {
        self.height - SPRITE_SIZE
    }

    /// Random top-left corner that keeps a whole sprite on screen. Degenerate
    /// bounds smaller than a sprite collapse to the origin.
    pub fn random_spawn_point<R: Rng + ?Sized>(self, rng: &mut R) -> (i32, i32) {
        let pick = |max: i32, rng: &mut R| if max > 0 { rng.gen_range(0..max) } else { 0 };
        let x = pick(self.max_sprite_x(), rng);
        let y = pick(self.max_sprite_y(), rng);
        (x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionMode {
    Tremor,
    Bouncing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgePolicy {
    /// Reflect without correcting the position; a sprite may sit past the
    /// edge for a frame before its reversed velocity brings it back.
    #[default]
    Overshoot,
    /// Reflect and pull the position back onto the edge.
    Clamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub mode: MotionMode,
    image: Option<RgbaBuffer>,
}

fn jitter<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(-TREMOR_STEP..=TREMOR_STEP) as f32
}

/// A zero roll would leave the sprite stuck on that axis, so it becomes a
/// fixed positive speed instead of being rerolled.
fn axis_speed_from_roll(roll: i32) -> f32 {
    match roll {
        0 => STALLED_AXIS_SPEED,
        v => v as f32,
    }
}

fn bounce_component<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    axis_speed_from_roll(rng.gen_range(-BOUNCE_SPEED..=BOUNCE_SPEED))
}

impl Sprite {
    pub fn spawn<R: Rng + ?Sized>(image: RgbaBuffer, x: i32, y: i32, rng: &mut R) -> Self {
        Self {
            x: x as f32,
            y: y as f32,
            vx: jitter(rng),
            vy: jitter(rng),
            mode: MotionMode::Tremor,
            image: Some(image),
        }
    }

    pub fn start_bouncing<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.mode = MotionMode::Bouncing;
        self.vx = bounce_component(rng);
        self.vy = bounce_component(rng);
    }

    pub fn update<R: Rng + ?Sized>(&mut self, bounds: Bounds, edge: EdgePolicy, rng: &mut R) {
        match self.mode {
            MotionMode::Tremor => {
                self.x += jitter(rng);
                self.y += jitter(rng);
            }
            MotionMode::Bouncing => {
                self.x += self.vx;
                self.y += self.vy;
                let max_x = bounds.max_sprite_x() as f32;
                let max_y = bounds.max_sprite_y() as f32;
                if self.x < 0.0 || self.x > max_x {
                    self.vx = -self.vx;
                    if edge == EdgePolicy::Clamp {
                        self.x = self.x.clamp(0.0, max_x.max(0.0));
                    }
                }
                if self.y < 0.0 || self.y > max_y {
                    self.vy = -self.vy;
                    if edge == EdgePolicy::Clamp {
                        self.y = self.y.clamp(0.0, max_y.max(0.0));
                    }
                }
            }
        }
    }

    pub fn is_bouncing(&self) -> bool {
        self.mode == MotionMode::Bouncing
    }

    /// Draw position, rounded to whole pixels.
    pub fn draw_origin(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    pub fn image(&self) -> Option<&RgbaBuffer> {
        self.image.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.image.is_none()
    }

    pub fn dispose(&mut self) {
        self.image = None;
    }
}
