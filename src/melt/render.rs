use crate::melt::composite::{Rgba, RgbaBuffer};
use crate::melt::overlay::OverlayWindow;
use crate::melt::scene::Scene;
use crate::melt::sprite::SPRITE_SIZE;

pub fn convert_rgba_to_dib_bgra(rgba: &[u8], dib_bgra: &mut [u8]) {
    assert_eq!(rgba.len(), dib_bgra.len());
    for (src, dst) in rgba.chunks_exact(4).zip(dib_bgra.chunks_exact_mut(4)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
        dst[3] = src[3];
    }
}

fn background_covers(surface: &RgbaBuffer, background: &RgbaBuffer) -> bool {
    background.width >= surface.width && background.height >= surface.height
}

/// Composites one frame: captured background, then sprites in spawn order,
/// then `cursor_icon` centred on `pointer`. Returns `false` and leaves the
/// surface untouched when no background has been captured.
pub fn render_scene<R>(
    surface: &mut RgbaBuffer,
    scene: &Scene<R>,
    pointer: Option<(i32, i32)>,
    cursor_icon: Option<&RgbaBuffer>,
) -> bool {
    let Some(background) = scene.background() else {
        return false;
    };

    if !background_covers(surface, background) {
        surface.fill(Rgba::BLACK);
    }
    surface.copy_from(background, 0, 0);

    let size = SPRITE_SIZE as u32;
    for sprite in scene.sprites() {
        let Some(image) = sprite.image() else {
            continue;
        };
        let (x, y) = sprite.draw_origin();
        surface.blend_scaled(image, x, y, size, size);
    }

    if let (Some((px, py)), Some(icon)) = (pointer, cursor_icon) {
        let half = SPRITE_SIZE / 2;
        surface.blend_scaled(icon, px - half, py - half, size, size);
    }
    true
}

/// Reusable frame storage so a tick does not allocate a full-screen buffer.
#[derive(Debug, Default)]
pub struct RenderFrameBuffer {
    rgba: Option<RgbaBuffer>,
}

impl RenderFrameBuffer {
    fn ensure_size(&mut self, size: (u32, u32)) -> &mut RgbaBuffer {
        let stale = self
            .rgba
            .as_ref()
            .map_or(true, |frame| (frame.width, frame.height) != size);
        if stale {
            self.rgba = Some(RgbaBuffer::new(size.0, size.1, Rgba::BLACK));
        }
        self.rgba.get_or_insert_with(|| RgbaBuffer::new(size.0, size.1, Rgba::BLACK))
    }

    pub fn render<R>(
        &mut self,
        size: (u32, u32),
        scene: &Scene<R>,
        pointer: Option<(i32, i32)>,
        cursor_icon: Option<&RgbaBuffer>,
    ) -> bool {
        let frame = self.ensure_size(size);
        render_scene(frame, scene, pointer, cursor_icon)
    }

    pub fn frame(&self) -> Option<&RgbaBuffer> {
        self.rgba.as_ref()
    }

    /// Copies the last rendered frame into the overlay's DIB section.
    pub fn present(&self, window: &mut OverlayWindow) {
        let Some(frame) = self.rgba.as_ref() else {
            return;
        };
        window.with_bitmap_mut(|pixels, width, height| {
            if (width, height) != (frame.width, frame.height) || pixels.len() != frame.pixels.len()
            {
                tracing::warn!(
                    width,
                    height,
                    frame_width = frame.width,
                    frame_height = frame.height,
                    "overlay bitmap size does not match rendered frame"
                );
                return;
            }
            convert_rgba_to_dib_bgra(&frame.pixels, pixels);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::melt::capture::FrameSource;
    use crate::melt::icons::IconSet;
    use crate::melt::scene::SceneConfig;
    use crate::melt::sprite::{Bounds, Sprite};
    use anyhow::Result;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Instant;

    const GREY: Rgba = Rgba::rgba(90, 90, 90, 255);
    const RED: Rgba = Rgba::rgba(255, 0, 0, 255);
    const BLUE: Rgba = Rgba::rgba(0, 0, 255, 255);

    struct Solid(RgbaBuffer);

    impl FrameSource for Solid {
        fn capture(&mut self) -> Result<RgbaBuffer> {
            Ok(self.0.clone())
        }
    }

    fn quiet_scene(width: i32, height: i32) -> Scene<StdRng> {
        Scene::new(
            Bounds::new(width, height),
            SceneConfig {
                spawn_probability: 0.0,
                ..SceneConfig::default()
            },
            Instant::now(),
            StdRng::seed_from_u64(9),
        )
    }

    fn place(scene: &mut Scene<StdRng>, image: RgbaBuffer, x: f32, y: f32) {
        let mut rng = StdRng::seed_from_u64(0);
        let mut sprite = Sprite::spawn(image, 0, 0, &mut rng);
        sprite.x = x;
        sprite.y = y;
        scene.push_sprite(sprite);
    }

    #[test]
    fn nothing_is_drawn_without_a_background() {
        let scene = quiet_scene(64, 64);
        let mut surface = RgbaBuffer::new(64, 64, BLUE);
        let before = surface.clone();

        assert!(!render_scene(&mut surface, &scene, Some((10, 10)), None));
        assert_eq!(surface, before);
    }

    #[test]
    fn later_sprites_draw_over_earlier_ones() {
        let mut scene = quiet_scene(64, 64);
        let icons = IconSet::builtin();
        scene.tick(
            Instant::now(),
            &mut Solid(RgbaBuffer::new(64, 64, GREY)),
            &icons,
        );
        place(&mut scene, RgbaBuffer::new(4, 4, RED), 0.0, 0.0);
        place(&mut scene, RgbaBuffer::new(4, 4, BLUE), 16.0, 16.0);

        let mut surface = RgbaBuffer::new(64, 64, Rgba::BLACK);
        assert!(render_scene(&mut surface, &scene, None, None));

        assert_eq!(surface.pixel(5, 5), RED);
        assert_eq!(surface.pixel(20, 20), BLUE);
        assert_eq!(surface.pixel(40, 40), BLUE);
        assert_eq!(surface.pixel(50, 50), GREY);
        assert_eq!(surface.pixel(63, 0), GREY);
    }

    #[test]
    fn disposed_sprites_are_skipped() {
        let mut scene = quiet_scene(64, 64);
        scene.tick(
            Instant::now(),
            &mut Solid(RgbaBuffer::new(64, 64, GREY)),
            &IconSet::builtin(),
        );
        place(&mut scene, RgbaBuffer::new(4, 4, RED), 0.0, 0.0);
        scene.sprites_mut()[0].dispose();

        let mut surface = RgbaBuffer::new(64, 64, Rgba::BLACK);
        render_scene(&mut surface, &scene, None, None);

        assert_eq!(surface.pixel(5, 5), GREY);
    }

    #[test]
    fn cursor_icon_is_centred_on_pointer() {
        let mut scene = quiet_scene(100, 100);
        scene.tick(
            Instant::now(),
            &mut Solid(RgbaBuffer::new(100, 100, GREY)),
            &IconSet::builtin(),
        );
        let icon = RgbaBuffer::new(2, 2, RED);

        let mut surface = RgbaBuffer::new(100, 100, Rgba::BLACK);
        render_scene(&mut surface, &scene, Some((50, 50)), Some(&icon));

        assert_eq!(surface.pixel(34, 34), RED);
        assert_eq!(surface.pixel(65, 65), RED);
        assert_eq!(surface.pixel(33, 33), GREY);
        assert_eq!(surface.pixel(66, 66), GREY);
    }

    #[test]
    fn small_background_is_padded_with_black() {
        let mut scene = quiet_scene(8, 8);
        scene.tick(
            Instant::now(),
            &mut Solid(RgbaBuffer::new(4, 4, GREY)),
            &IconSet::builtin(),
        );

        let mut frames = RenderFrameBuffer::default();
        assert!(frames.render((8, 8), &scene, None, None));
        let frame = frames.frame().expect("frame");

        assert_eq!(frame.pixel(3, 3), GREY);
        assert_eq!(frame.pixel(4, 4), Rgba::BLACK);
    }

    #[test]
    fn dib_conversion_swaps_red_and_blue() {
        let rgba = [10, 20, 30, 255];
        let mut bgra = [0u8; 4];
        convert_rgba_to_dib_bgra(&rgba, &mut bgra);
        assert_eq!(bgra, [30, 20, 10, 255]);
    }
}
