//! Affine blit with resampling and source-over compositing.

use kurbo::{Affine, Point, Vec2};

use crate::{buffer::PixelBuffer, foundation::color::Rgba8};

/// Resampling kernel used when a blit samples between source pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Antialias {
    /// Single nearest source pixel.
    Nearest,
    /// 2x2 linear interpolation.
    #[default]
    Bilinear,
    /// 4x4 Catmull-Rom interpolation.
    Bicubic,
}

/// Placement of a blit source onto the destination buffer.
///
/// The transform applies scale, then flips, then rotation about the scaled
/// image center, then translation. Negative scale factors fold into the
/// flip flags; a zero scale factor makes the blit a no-op.
#[derive(Clone, Copy, Debug)]
pub struct BlitOptions {
    /// Destination translation, x.
    pub offset_x: f32,
    /// Destination translation, y.
    pub offset_y: f32,
    /// Horizontal scale factor.
    pub scale_x: f32,
    /// Vertical scale factor.
    pub scale_y: f32,
    /// Rotation in degrees about the scaled source center.
    pub rotate_deg: f32,
    /// Resampling kernel.
    pub antialias: Antialias,
    /// Mirror the source horizontally.
    pub flip_x: bool,
    /// Mirror the source vertically.
    pub flip_y: bool,
}

impl Default for BlitOptions {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotate_deg: 0.0,
            antialias: Antialias::default(),
            flip_x: false,
            flip_y: false,
        }
    }
}

impl PixelBuffer {
    /// Composite transformed raw RGBA8 source bytes onto the buffer.
    ///
    /// Each destination pixel is inverse-mapped into source space, resampled
    /// per [`BlitOptions::antialias`], and source-over blended; destination
    /// pixels whose mapped source sample is transparent (or outside the
    /// source) are untouched. A source length that does not match its
    /// dimensions is a silent no-op.
    pub fn blit_from_raw(&mut self, src: &[u8], src_width: u32, src_height: u32, opts: &BlitOptions) {
        if (src_width as usize) * (src_height as usize) * 4 != src.len() {
            return;
        }
        if src_width == 0 || src_height == 0 {
            return;
        }
        if opts.scale_x == 0.0 || opts.scale_y == 0.0 {
            // Non-invertible transform.
            return;
        }

        let Some(inverse) = inverse_transform(src_width, src_height, opts) else {
            return;
        };

        let src_w = src_width as i32;
        let src_h = src_height as i32;
        let dst_w = self.width() as i32;
        let dst_h = self.height() as i32;

        for ty in 0..dst_h {
            for tx in 0..dst_w {
                let mapped = inverse * Point::new(f64::from(tx), f64::from(ty));
                let (sx, sy) = (mapped.x, mapped.y);
                if !sx.is_finite() || !sy.is_finite() {
                    continue;
                }
                if sx < 0.0 || sy < 0.0 || sx >= f64::from(src_w) || sy >= f64::from(src_h) {
                    continue;
                }

                let sample = match opts.antialias {
                    Antialias::Nearest => sample_nearest(src, src_w, src_h, sx, sy),
                    Antialias::Bilinear => sample_bilinear(src, src_w, src_h, sx, sy),
                    Antialias::Bicubic => sample_bicubic(src, src_w, src_h, sx, sy),
                };

                if sample[3] < 1.0 {
                    continue;
                }

                let idx = (ty as usize * dst_w as usize + tx as usize) * 4;
                let dst = self.bytes_mut();
                let blended = over_straight(
                    [
                        f32::from(dst[idx]),
                        f32::from(dst[idx + 1]),
                        f32::from(dst[idx + 2]),
                        f32::from(dst[idx + 3]),
                    ],
                    sample,
                );
                dst[idx..idx + 4].copy_from_slice(&blended);
            }
        }
    }

    /// [`blit_from_raw`](Self::blit_from_raw) with another buffer as source.
    pub fn blit_from_buffer(&mut self, src: &PixelBuffer, opts: &BlitOptions) {
        let (w, h) = (src.width(), src.height());
        self.blit_from_raw(src.as_bytes(), w, h, opts);
    }
}

/// Build the destination-to-source mapping for a blit.
///
/// Forward order is flip (in source space), scale, rotate about the scaled
/// image center, translate; negative scales fold into the flips first.
/// Source pixels sample at integer coordinates, so a mirror runs about
/// `(len - 1) / 2`.
fn inverse_transform(src_width: u32, src_height: u32, opts: &BlitOptions) -> Option<Affine> {
    let flip_x = opts.flip_x ^ (opts.scale_x < 0.0);
    let flip_y = opts.flip_y ^ (opts.scale_y < 0.0);
    let scale_x = f64::from(opts.scale_x.abs());
    let scale_y = f64::from(opts.scale_y.abs());

    let mut flip = Affine::IDENTITY;
    if flip_x {
        flip = Affine::new([-1.0, 0.0, 0.0, 1.0, f64::from(src_width - 1), 0.0]) * flip;
    }
    if flip_y {
        flip = Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, f64::from(src_height - 1)]) * flip;
    }

    let center = Vec2::new(
        f64::from(src_width) * scale_x / 2.0,
        f64::from(src_height) * scale_y / 2.0,
    );

    let forward = Affine::translate(Vec2::new(
        f64::from(opts.offset_x),
        f64::from(opts.offset_y),
    )) * Affine::translate(center)
        * Affine::rotate(f64::from(opts.rotate_deg).to_radians())
        * Affine::translate(-center)
        * Affine::scale_non_uniform(scale_x, scale_y)
        * flip;

    let det = forward.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    Some(forward.inverse())
}

fn source_pixel(src: &[u8], src_w: i32, src_h: i32, x: i32, y: i32) -> [f32; 4] {
    if x < 0 || y < 0 || x >= src_w || y >= src_h {
        return [0.0; 4];
    }
    let idx = (y as usize * src_w as usize + x as usize) * 4;
    [
        f32::from(src[idx]),
        f32::from(src[idx + 1]),
        f32::from(src[idx + 2]),
        f32::from(src[idx + 3]),
    ]
}

fn sample_nearest(src: &[u8], src_w: i32, src_h: i32, sx: f64, sy: f64) -> [f32; 4] {
    source_pixel(src, src_w, src_h, sx.floor() as i32, sy.floor() as i32)
}

fn sample_bilinear(src: &[u8], src_w: i32, src_h: i32, sx: f64, sy: f64) -> [f32; 4] {
    let x0 = sx.floor() as i32;
    let y0 = sy.floor() as i32;
    let x1 = (x0 + 1).min(src_w - 1);
    let y1 = (y0 + 1).min(src_h - 1);
    let fx = (sx - f64::from(x0)) as f32;
    let fy = (sy - f64::from(y0)) as f32;

    let p00 = source_pixel(src, src_w, src_h, x0, y0);
    let p10 = source_pixel(src, src_w, src_h, x1, y0);
    let p01 = source_pixel(src, src_w, src_h, x0, y1);
    let p11 = source_pixel(src, src_w, src_h, x1, y1);

    let mut out = [0f32; 4];
    for c in 0..4 {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
        out[c] = top * (1.0 - fy) + bottom * fy;
    }
    out
}

/// Catmull-Rom weight for tap offset `t` in [-2, 2].
fn catmull_rom(t: f32) -> f32 {
    let t = t.abs();
    if t < 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t < 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

fn sample_bicubic(src: &[u8], src_w: i32, src_h: i32, sx: f64, sy: f64) -> [f32; 4] {
    let x0 = sx.floor() as i32;
    let y0 = sy.floor() as i32;
    let fx = (sx - f64::from(x0)) as f32;
    let fy = (sy - f64::from(y0)) as f32;

    let mut out = [0f32; 4];
    for j in -1..=2i32 {
        let wy = catmull_rom(j as f32 - fy);
        if wy == 0.0 {
            continue;
        }
        for i in -1..=2i32 {
            let wx = catmull_rom(i as f32 - fx);
            if wx == 0.0 {
                continue;
            }
            let p = source_pixel(src, src_w, src_h, x0 + i, y0 + j);
            for c in 0..4 {
                out[c] += p[c] * wx * wy;
            }
        }
    }
    for c in &mut out {
        *c = c.clamp(0.0, 255.0);
    }
    out
}

/// Straight-alpha source-over blend, rounded and clamped per channel.
fn over_straight(dst: [f32; 4], src: [f32; 4]) -> Rgba8 {
    let sa = src[3] / 255.0;
    let da = dst[3] / 255.0;

    let mut out = [0u8; 4];
    for c in 0..3 {
        out[c] = (src[c] * sa + dst[c] * (1.0 - sa)).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = ((sa + da * (1.0 - sa)) * 255.0).round().clamp(0.0, 255.0) as u8;
    out
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/blit.rs"]
mod tests;
