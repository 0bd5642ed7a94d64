use crate::melt::capture::{DesktopCapture, FrameSource};
use crate::melt::icons::IconSet;
use crate::melt::keyboard_hook::KeyboardHook;
use crate::melt::monitor::{pointer_on_monitor, resolve_cursor_position};
use crate::melt::overlay::{pump_messages, OverlayWindow};
use crate::melt::render::RenderFrameBuffer;
use crate::melt::scene::{Scene, SceneConfig, TickReport};
use crate::melt::settings::MeltSettings;
use crate::melt::sprite::Bounds;
use crate::melt::state::{can_transition, SessionLifecycle};
use crate::melt::timer::TickTimer;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

const MAX_IDLE_SLEEP: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    UserRequest,
}

pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// One prank run: the scene, where its frames come from and when it ticks.
/// Windowing and input live outside so the session can be driven headless.
pub struct MeltSession<S: FrameSource> {
    scene: Scene<StdRng>,
    icons: IconSet,
    source: S,
    timer: TickTimer,
    lifecycle: SessionLifecycle,
    show_cursor_icon: bool,
}

impl<S: FrameSource> MeltSession<S> {
    pub fn new(
        settings: &MeltSettings,
        bounds: Bounds,
        source: S,
        icons: IconSet,
        now: Instant,
    ) -> Self {
        let scene = Scene::new(
            bounds,
            SceneConfig::from(settings),
            now,
            rng_from_seed(settings.seed),
        );
        Self {
            scene,
            icons,
            source,
            timer: TickTimer::new(settings.tick_interval(), now),
            lifecycle: SessionLifecycle::Idle,
            show_cursor_icon: settings.show_cursor_icon,
        }
    }

    pub fn scene(&self) -> &Scene<StdRng> {
        &self.scene
    }

    pub fn lifecycle(&self) -> SessionLifecycle {
        self.lifecycle
    }

    fn transition(&mut self, next: SessionLifecycle) -> bool {
        if !can_transition(self.lifecycle, next) {
            tracing::debug!(from = ?self.lifecycle, to = ?next, "ignored session transition");
            return false;
        }
        self.lifecycle = next;
        true
    }

    pub fn start(&mut self) -> bool {
        self.transition(SessionLifecycle::Running)
    }

    /// Runs one tick when the session is running and the timer is due.
    pub fn step(&mut self, now: Instant) -> Option<TickReport> {
        if !self.lifecycle.is_running() || !self.timer.poll(now) {
            return None;
        }
        let report = self.scene.tick(now, &mut self.source, &self.icons);
        if report.entered_bouncing {
            tracing::info!(sprites = self.scene.sprites().len(), "sprites start bouncing");
        }
        Some(report)
    }

    pub fn render_into(&self, frames: &mut RenderFrameBuffer, pointer: Option<(i32, i32)>) -> bool {
        let bounds = self.scene.bounds();
        let size = (bounds.width.max(0) as u32, bounds.height.max(0) as u32);
        let cursor_icon = self.show_cursor_icon.then(|| self.icons.cursor());
        frames.render(size, &self.scene, pointer, cursor_icon)
    }

    pub fn time_until_next_tick(&self, now: Instant) -> Duration {
        self.timer.time_until_due(now)
    }

    /// Drops every image the session holds. Safe before `start` and safe to
    /// repeat.
    pub fn teardown(&mut self) {
        if self.lifecycle == SessionLifecycle::Closed {
            return;
        }
        self.transition(SessionLifecycle::TearingDown);
        self.scene.teardown();
        self.transition(SessionLifecycle::Closed);
        tracing::debug!("melt session torn down");
    }
}

impl<S: FrameSource> Drop for MeltSession<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

pub fn run(settings: &MeltSettings) -> Result<ExitReason> {
    let capture = DesktopCapture::primary().context("select primary display")?;
    let monitor_rect = capture.monitor_rect();
    let icons = IconSet::from_settings(settings);
    tracing::info!(
        x = monitor_rect.x,
        y = monitor_rect.y,
        width = monitor_rect.width,
        height = monitor_rect.height,
        icons = icons.len(),
        "starting desktop melt"
    );

    let mut window =
        OverlayWindow::create_for_monitor(monitor_rect).context("create overlay window")?;
    let mut hook = KeyboardHook::default();
    if let Err(err) = hook.activate() {
        window.shutdown();
        return Err(err.context("install exit keyboard hook"));
    }

    let mut session = MeltSession::new(
        settings,
        Bounds::from(monitor_rect),
        capture,
        icons,
        Instant::now(),
    );
    session.start();
    window.show();

    let mut frames = RenderFrameBuffer::default();
    let reason = loop {
        pump_messages();
        if hook.exit_requested() {
            break ExitReason::UserRequest;
        }

        let now = Instant::now();
        if session.step(now).is_some() {
            let pointer = pointer_on_monitor(monitor_rect, resolve_cursor_position());
            if session.render_into(&mut frames, pointer) {
                frames.present(&mut window);
                window.request_paint();
            }
        }

        let wait = session.time_until_next_tick(Instant::now());
        std::thread::sleep(wait.min(MAX_IDLE_SLEEP));
    };

    session.teardown();
    hook.deactivate();
    window.shutdown();
    tracing::info!(?reason, "desktop melt finished");
    Ok(reason)
}
