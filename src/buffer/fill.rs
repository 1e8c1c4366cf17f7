//! Scanline flood fill and mask-area fill.

use smallvec::SmallVec;

use crate::{
    buffer::PixelBuffer,
    foundation::color::{Rgba8, within_threshold},
};

/// How a selection mask constrains a masked flood fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskMode {
    /// Non-zero mask bytes are eligible.
    Inside,
    /// Zero mask bytes are eligible.
    Outside,
}

impl PixelBuffer {
    /// Scanline 4-connected flood fill seeded at `(start_x, start_y)`.
    ///
    /// A pixel joins the fill when every channel is within `threshold` of
    /// the seed color. Returns whether any pixel changed; an out-of-bounds
    /// seed, or a seed already within `threshold` of `color`, is a silent
    /// no-op.
    pub fn flood_fill(&mut self, start_x: i32, start_y: i32, color: Rgba8, threshold: u8) -> bool {
        let (w, h) = (self.width(), self.height());
        scanline_fill(
            self.bytes_mut(),
            w,
            h,
            start_x,
            start_y,
            color,
            threshold,
            |_, _| true,
        )
    }

    /// [`flood_fill`](Self::flood_fill) constrained by a selection mask.
    ///
    /// `mask` holds one byte per buffer pixel; `mode` decides whether
    /// non-zero bytes are eligible (`Inside`) or excluded (`Outside`). The
    /// seed itself must be eligible. A mask shorter than the buffer is a
    /// silent no-op.
    pub fn flood_fill_with_mask(
        &mut self,
        start_x: i32,
        start_y: i32,
        color: Rgba8,
        threshold: u8,
        mask: &[u8],
        mode: MaskMode,
    ) -> bool {
        let (w, h) = (self.width(), self.height());
        if (w as usize) * (h as usize) > mask.len() {
            return false;
        }
        scanline_fill(
            self.bytes_mut(),
            w,
            h,
            start_x,
            start_y,
            color,
            threshold,
            |x, y| {
                let covered = mask[y as usize * w as usize + x as usize] != 0;
                match mode {
                    MaskMode::Inside => covered,
                    MaskMode::Outside => !covered,
                }
            },
        )
    }

    /// Write `color` wherever the mask byte is non-zero.
    ///
    /// `mask` holds one byte per buffer pixel; a shorter mask is a silent
    /// no-op. Returns whether any pixel changed.
    pub fn fill_mask_area(&mut self, mask: &[u8], color: Rgba8) -> bool {
        let pixels = (self.width() as usize) * (self.height() as usize);
        if mask.len() < pixels {
            return false;
        }

        let mut changed = false;
        for (mi, px) in self.bytes_mut().chunks_exact_mut(4).enumerate() {
            if mask[mi] == 0 {
                continue;
            }
            changed |= px != color;
            px.copy_from_slice(&color);
        }
        changed
    }
}

fn pixel_at(data: &[u8], width: u32, x: i32, y: i32) -> Rgba8 {
    let idx = (y as usize * width as usize + x as usize) * 4;
    let mut px = [0u8; 4];
    px.copy_from_slice(&data[idx..idx + 4]);
    px
}

/// Span-based fill over horizontal scan segments.
///
/// A LIFO of candidate seeds is expanded left/right along its row; filled
/// pixels take the fill color, which the seed precondition keeps outside the
/// match tolerance, so written spans double as the visited set.
#[allow(clippy::too_many_arguments)]
fn scanline_fill(
    data: &mut [u8],
    width: u32,
    height: u32,
    start_x: i32,
    start_y: i32,
    color: Rgba8,
    threshold: u8,
    eligible: impl Fn(i32, i32) -> bool,
) -> bool {
    let w = width as i32;
    let h = height as i32;
    if start_x < 0 || start_y < 0 || start_x >= w || start_y >= h {
        return false;
    }
    if !eligible(start_x, start_y) {
        return false;
    }

    let seed = pixel_at(data, width, start_x, start_y);
    if within_threshold(seed, color, threshold) {
        // Filling would be invisible and the written color could not serve
        // as the visited mark.
        return false;
    }

    let matches = |data: &[u8], x: i32, y: i32| {
        eligible(x, y) && within_threshold(pixel_at(data, width, x, y), seed, threshold)
    };

    let mut stack: SmallVec<[(i32, i32); 64]> = SmallVec::new();
    stack.push((start_x, start_y));
    let mut changed = false;

    while let Some((x, y)) = stack.pop() {
        if !matches(data, x, y) {
            continue;
        }

        let mut x1 = x;
        while x1 > 0 && matches(data, x1 - 1, y) {
            x1 -= 1;
        }
        let mut x2 = x;
        while x2 + 1 < w && matches(data, x2 + 1, y) {
            x2 += 1;
        }

        for xi in x1..=x2 {
            let idx = (y as usize * width as usize + xi as usize) * 4;
            data[idx..idx + 4].copy_from_slice(&color);
        }
        changed = true;

        for ny in [y - 1, y + 1] {
            if ny < 0 || ny >= h {
                continue;
            }
            // One candidate seed per contiguous run bounded by the span.
            let mut xi = x1;
            while xi <= x2 {
                if matches(data, xi, ny) {
                    stack.push((xi, ny));
                    while xi <= x2 && matches(data, xi, ny) {
                        xi += 1;
                    }
                } else {
                    xi += 1;
                }
            }
        }
    }

    changed
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/fill.rs"]
mod tests;
