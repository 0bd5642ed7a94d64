use crate::melt::composite::RgbaBuffer;
use crate::melt::monitor::MonitorRect;
use anyhow::{anyhow, Context, Result};
use screenshots::Screen;

/// Source of background snapshots. Each call returns a fresh full-screen
/// image; the caller owns it.
pub trait FrameSource {
    fn capture(&mut self) -> Result<RgbaBuffer>;
}

pub fn rgba_buffer_from_image(image: image::RgbaImage) -> Result<RgbaBuffer> {
    let (width, height) = image.dimensions();
    RgbaBuffer::try_from_pixels(width, height, image.into_raw())
        .ok_or_else(|| anyhow!("captured image has inconsistent size {width}x{height}"))
}

/// Captures the primary display. The overlay itself is part of what gets
/// captured, so sprites smear across successive frames.
#[derive(Debug, Clone)]
pub struct DesktopCapture {
    screen: Screen,
}

impl DesktopCapture {
    pub fn primary() -> Result<Self> {
        let screens = Screen::all().context("enumerate displays")?;
        let screen = screens
            .iter()
            .find(|screen| screen.display_info.is_primary)
            .or_else(|| screens.first())
            .cloned()
            .ok_or_else(|| anyhow!("no display available for capture"))?;
        Ok(Self { screen })
    }

    pub fn monitor_rect(&self) -> MonitorRect {
        let info = &self.screen.display_info;
        MonitorRect {
            x: info.x,
            y: info.y,
            width: info.width as i32,
            height: info.height as i32,
        }
    }
}

impl FrameSource for DesktopCapture {
    fn capture(&mut self) -> Result<RgbaBuffer> {
        let image = self.screen.capture().context("capture primary display")?;
        rgba_buffer_from_image(image)
    }
}
