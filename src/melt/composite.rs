#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Tightly packed RGBA8 image. Used for the captured desktop, every sprite
/// image and the frame handed to the overlay window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

fn byte_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4)
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        let mut pixels = vec![0u8; byte_len(width, height)];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[fill.r, fill.g, fill.b, fill.a]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn try_from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == byte_len(width, height)).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 4;
        Rgba {
            r: self.pixels[idx],
            g: self.pixels[idx + 1],
            b: self.pixels[idx + 2],
            a: self.pixels[idx + 3],
        }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    pub fn fill(&mut self, color: Rgba) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Opaque copy of `src` with its top-left corner at `(x, y)`, clipped to
    /// this buffer.
    pub fn copy_from(&mut self, src: &RgbaBuffer, x: i32, y: i32) {
        let dst_w = self.width as i32;
        let dst_h = self.height as i32;
        let x0 = x.max(0);
        let x1 = (x + src.width as i32).min(dst_w);
        if x1 <= x0 {
            return;
        }
        let row_bytes = ((x1 - x0) as usize) * 4;

        for dst_y in y.max(0)..(y + src.height as i32).min(dst_h) {
            let src_y = (dst_y - y) as usize;
            let src_x = (x0 - x) as usize;
            let src_idx = (src_y * src.width as usize + src_x) * 4;
            let dst_idx = (dst_y as usize * self.width as usize + x0 as usize) * 4;
            self.pixels[dst_idx..dst_idx + row_bytes]
                .copy_from_slice(&src.pixels[src_idx..src_idx + row_bytes]);
        }
    }

    /// Nearest-neighbour scale of `src` into the `width` x `height` box at
    /// `(x, y)`, alpha blended over the current contents and clipped.
    pub fn blend_scaled(&mut self, src: &RgbaBuffer, x: i32, y: i32, width: u32, height: u32) {
        if src.is_empty() || width == 0 || height == 0 {
            return;
        }

        for dy in 0..height {
            let ty = y + dy as i32;
            if ty < 0 || ty >= self.height as i32 {
                continue;
            }
            let sy = (dy as u64 * src.height as u64 / height as u64) as u32;
            for dx in 0..width {
                let tx = x + dx as i32;
                if tx < 0 || tx >= self.width as i32 {
                    continue;
                }
                let sx = (dx as u64 * src.width as u64 / width as u64) as u32;
                let top = src.pixel(sx, sy);
                if top.a == 0 {
                    continue;
                }
                let bottom = self.pixel(tx as u32, ty as u32);
                self.set_pixel(tx, ty, blend_pixel(bottom, top));
            }
        }
    }
}

pub fn blend_pixel(bottom: Rgba, top: Rgba) -> Rgba {
    if top.a == 255 {
        return top;
    }

    let sa = top.a as f32 / 255.0;
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Rgba::TRANSPARENT;
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Rgba {
        r: blend(top.r, bottom.r),
        g: blend(top.g, bottom.g),
        b: blend(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}
