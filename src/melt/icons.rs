use crate::melt::composite::{Rgba, RgbaBuffer};
use crate::melt::settings::MeltSettings;
use crate::melt::sprite::SPRITE_SIZE;
use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use rand::Rng;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Error,
    Warning,
    Information,
    Question,
}

impl StatusIcon {
    pub const ALL: [StatusIcon; 4] = [
        StatusIcon::Error,
        StatusIcon::Warning,
        StatusIcon::Information,
        StatusIcon::Question,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BadgeShape {
    Circle,
    Triangle,
}

fn badge_shape(icon: StatusIcon) -> BadgeShape {
    match icon {
        StatusIcon::Warning => BadgeShape::Triangle,
        _ => BadgeShape::Circle,
    }
}

fn badge_color(icon: StatusIcon) -> Rgba {
    match icon {
        StatusIcon::Error => Rgba::rgba(212, 40, 40, 255),
        StatusIcon::Warning => Rgba::rgba(250, 200, 30, 255),
        StatusIcon::Information | StatusIcon::Question => Rgba::rgba(30, 100, 210, 255),
    }
}

fn glyph_color(icon: StatusIcon) -> Rgba {
    match icon {
        StatusIcon::Warning => Rgba::BLACK,
        _ => Rgba::rgba(255, 255, 255, 255),
    }
}

pub fn glyph_bitmap(icon: StatusIcon) -> &'static [&'static str] {
    match icon {
        StatusIcon::Error => &[
            "10001", "10001", "01010", "00100", "01010", "10001", "10001",
        ],
        StatusIcon::Warning => &[
            "00100", "00100", "00100", "00100", "00100", "00000", "00100",
        ],
        StatusIcon::Information => &[
            "00100", "00000", "01100", "00100", "00100", "00100", "01110",
        ],
        StatusIcon::Question => &[
            "01110", "10001", "00001", "00010", "00100", "00000", "00100",
        ],
    }
}

fn darken(color: Rgba) -> Rgba {
    Rgba::rgba(color.r / 2, color.g / 2, color.b / 2, color.a)
}

fn paint_badge(buffer: &mut RgbaBuffer, shape: BadgeShape, color: Rgba) {
    let size = buffer.width as f32;
    let outline = darken(color);
    match shape {
        BadgeShape::Circle => {
            let c = size / 2.0;
            let r = c - 1.0;
            for y in 0..buffer.height {
                for x in 0..buffer.width {
                    let dx = x as f32 + 0.5 - c;
                    let dy = y as f32 + 0.5 - c;
                    let d = (dx * dx + dy * dy).sqrt();
                    if d <= r {
                        let fill = if d > r - 1.5 { outline } else { color };
                        buffer.set_pixel(x as i32, y as i32, fill);
                    }
                }
            }
        }
        BadgeShape::Triangle => {
            let top = 1.0;
            let bottom = size - 2.0;
            let half_base = size / 2.0 - 1.0;
            let cx = size / 2.0;
            for y in 0..buffer.height {
                let py = y as f32 + 0.5;
                if py < top || py > bottom {
                    continue;
                }
                let half = (py - top) / (bottom - top) * half_base;
                for x in 0..buffer.width {
                    let dx = (x as f32 + 0.5 - cx).abs();
                    if dx <= half {
                        let edge = dx > half - 1.5 || py > bottom - 1.5;
                        buffer.set_pixel(x as i32, y as i32, if edge { outline } else { color });
                    }
                }
            }
        }
    }
}

fn paint_glyph(buffer: &mut RgbaBuffer, rows: &[&str], color: Rgba, y_shift: i32) {
    let glyph_w = rows.first().map_or(0, |row| row.len()) as i32;
    let glyph_h = rows.len() as i32;
    let scale = (buffer.width as i32 / 12).max(1);
    let ox = (buffer.width as i32 - glyph_w * scale) / 2;
    let oy = (buffer.height as i32 - glyph_h * scale) / 2 + y_shift;

    for (gy, row) in rows.iter().enumerate() {
        for (gx, bit) in row.bytes().enumerate() {
            if bit != b'1' {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    buffer.set_pixel(
                        ox + gx as i32 * scale + sx,
                        oy + gy as i32 * scale + sy,
                        color,
                    );
                }
            }
        }
    }
}

pub fn render_status_icon(icon: StatusIcon, size: u32) -> RgbaBuffer {
    let mut buffer = RgbaBuffer::new(size, size, Rgba::TRANSPARENT);
    let shape = badge_shape(icon);
    paint_badge(&mut buffer, shape, badge_color(icon));
    let y_shift = match shape {
        BadgeShape::Triangle => size as i32 / 10,
        BadgeShape::Circle => 0,
    };
    paint_glyph(&mut buffer, glyph_bitmap(icon), glyph_color(icon), y_shift);
    buffer
}

pub fn load_icon_file(path: &Path, size: u32) -> Result<RgbaBuffer> {
    let decoded = image::open(path)
        .with_context(|| format!("decode icon image {}", path.display()))?
        .to_rgba8();
    let resized = image::imageops::resize(&decoded, size, size, FilterType::Triangle);
    let (width, height) = resized.dimensions();
    RgbaBuffer::try_from_pixels(width, height, resized.into_raw()).ok_or_else(|| {
        anyhow!(
            "resized icon {} has inconsistent size {width}x{height}",
            path.display()
        )
    })
}

/// The images sprites are drawn from, plus the decorative pointer icon.
#[derive(Debug, Clone)]
pub struct IconSet {
    sprites: Vec<RgbaBuffer>,
    cursor: RgbaBuffer,
}

impl IconSet {
    pub fn builtin() -> Self {
        let size = SPRITE_SIZE as u32;
        Self {
            sprites: StatusIcon::ALL
                .iter()
                .map(|icon| render_status_icon(*icon, size))
                .collect(),
            cursor: render_status_icon(StatusIcon::Error, size),
        }
    }

    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let size = SPRITE_SIZE as u32;
        let sprites = paths
            .iter()
            .map(|path| load_icon_file(path.as_ref(), size))
            .collect::<Result<Vec<_>>>()?;
        let Some(cursor) = sprites.first().cloned() else {
            return Ok(Self::builtin());
        };
        Ok(Self { sprites, cursor })
    }

    pub fn from_settings(settings: &MeltSettings) -> Self {
        if settings.icon_paths.is_empty() {
            return Self::builtin();
        }
        match Self::from_files(&settings.icon_paths) {
            Ok(icons) => {
                tracing::info!(count = icons.len(), "loaded custom sprite icons");
                icons
            }
            Err(err) => {
                tracing::warn!(?err, "failed to load custom icons; using built-in set");
                Self::builtin()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RgbaBuffer> {
        self.sprites.get(index)
    }

    /// Uniformly chosen copy; every sprite owns its own image.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> RgbaBuffer {
        self.sprites[rng.gen_range(0..self.sprites.len())].clone()
    }

    pub fn cursor(&self) -> &RgbaBuffer {
        &self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn builtin_set_has_four_distinct_sprite_sized_icons() {
        let icons = IconSet::builtin();
        assert_eq!(icons.len(), 4);
        for i in 0..4 {
            let icon = icons.get(i).expect("icon");
            assert_eq!((icon.width, icon.height), (32, 32));
            for j in (i + 1)..4 {
                assert_ne!(icon, icons.get(j).expect("icon"));
            }
        }
    }

    #[test]
    fn circle_badge_is_opaque_inside_and_clear_in_corners() {
        let icon = render_status_icon(StatusIcon::Information, 32);
        assert_eq!(icon.pixel(0, 0).a, 0);
        assert_eq!(icon.pixel(31, 31).a, 0);
        assert_eq!(icon.pixel(4, 16).a, 255);
        assert_eq!(icon.pixel(4, 16), badge_color(StatusIcon::Information));
    }

    #[test]
    fn glyph_is_painted_over_the_badge() {
        let icon = render_status_icon(StatusIcon::Error, 32);
        // centre cell of the X glyph
        assert_eq!(icon.pixel(16, 16), Rgba::rgba(255, 255, 255, 255));
    }

    #[test]
    fn warning_triangle_is_transparent_at_top_corners() {
        let icon = render_status_icon(StatusIcon::Warning, 32);
        assert_eq!(icon.pixel(0, 2).a, 0);
        assert_eq!(icon.pixel(31, 2).a, 0);
        assert_eq!(icon.pixel(16, 26).a, 255);
    }

    #[test]
    fn pick_covers_every_icon() {
        let icons = IconSet::builtin();
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let picked = icons.pick(&mut rng);
            let idx = (0..4)
                .find(|i| icons.get(*i) == Some(&picked))
                .expect("picked icon belongs to set");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn png_override_is_resized_to_sprite_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("skull.png");
        image::RgbaImage::from_pixel(64, 48, image::Rgba([10, 200, 30, 255]))
            .save(&path)
            .expect("write png");

        let icons = IconSet::from_files(&[&path]).expect("load icon");

        assert_eq!(icons.len(), 1);
        let icon = icons.get(0).expect("icon");
        assert_eq!((icon.width, icon.height), (32, 32));
        let centre = icon.pixel(16, 16);
        assert_eq!(centre.a, 255);
        assert!(centre.g > 190 && centre.r < 20 && centre.b < 40);
        assert_eq!(icons.cursor(), icon);
    }

    #[test]
    fn missing_icon_file_reports_path() {
        let err = IconSet::from_files(&["does/not/exist.png"]).expect_err("missing file");
        assert!(format!("{err:#}").contains("does/not/exist.png"));
    }
}
