use anyhow::{anyhow, Result};
use desktop_melt::melt::composite::{Rgba, RgbaBuffer};
use desktop_melt::melt::icons::IconSet;
use desktop_melt::melt::render::RenderFrameBuffer;
use desktop_melt::melt::sprite::Bounds;
use desktop_melt::melt::state::SessionLifecycle;
use desktop_melt::melt::{FrameSource, MeltSession, MeltSettings};
use std::time::{Duration, Instant};

const WIDTH: i32 = 96;
const HEIGHT: i32 = 64;

struct Flaky {
    fail: bool,
}

impl FrameSource for Flaky {
    fn capture(&mut self) -> Result<RgbaBuffer> {
        if self.fail {
            return Err(anyhow!("display unavailable"));
        }
        Ok(RgbaBuffer::new(WIDTH as u32, HEIGHT as u32, Rgba::rgba(30, 60, 90, 255)))
    }
}

fn session(fail: bool, now: Instant) -> MeltSession<Flaky> {
    let settings = MeltSettings {
        seed: Some(11),
        spawn_probability: 1.0,
        ..MeltSettings::default()
    };
    MeltSession::new(
        &settings,
        Bounds::new(WIDTH, HEIGHT),
        Flaky { fail },
        IconSet::builtin(),
        now,
    )
}

#[test]
fn running_session_renders_background_sprites_and_cursor() {
    let now = Instant::now();
    let mut session = session(false, now);
    assert!(session.start());
    assert_eq!(session.lifecycle(), SessionLifecycle::Running);

    let report = session.step(now + Duration::from_millis(30)).expect("tick");
    assert!(report.captured && report.spawned);

    let mut frames = RenderFrameBuffer::default();
    assert!(session.render_into(&mut frames, Some((48, 32))));
    let frame = frames.frame().expect("frame");
    assert_eq!((frame.width, frame.height), (WIDTH as u32, HEIGHT as u32));
}

#[test]
fn failed_capture_skips_the_frame() {
    let now = Instant::now();
    let mut session = session(true, now);
    session.start();

    let report = session.step(now + Duration::from_millis(30)).expect("tick");
    assert!(!report.captured);

    let mut frames = RenderFrameBuffer::default();
    assert!(!session.render_into(&mut frames, None));
}

#[test]
fn next_tick_wait_never_exceeds_interval() {
    let now = Instant::now();
    let mut session = session(false, now);
    session.start();

    assert_eq!(session.time_until_next_tick(now), Duration::from_millis(30));
    let late = now + Duration::from_millis(500);
    assert!(session.step(late).is_some());
    assert!(session.step(late).is_none());
    assert_eq!(session.time_until_next_tick(late), Duration::from_millis(30));
}

#[test]
fn teardown_releases_everything_and_stops_ticking() {
    let now = Instant::now();
    let mut session = session(false, now);
    session.start();
    for i in 1..=5u64 {
        session.step(now + Duration::from_millis(30 * i));
    }
    assert!(!session.scene().sprites().is_empty());

    session.teardown();
    session.teardown();

    assert_eq!(session.lifecycle(), SessionLifecycle::Closed);
    assert!(session.scene().background().is_none());
    assert!(session.scene().sprites().is_empty());
    assert!(session.step(now + Duration::from_secs(1)).is_none());
}
