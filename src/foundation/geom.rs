//! Axis-aligned rectangles and clipping.

/// Axis-aligned rectangle with a signed origin and unsigned size.
///
/// Boxes may extend outside (or lie entirely outside) a pixel grid;
/// geometric operations clip and treat a fully-outside box as a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoundBox {
    /// Left edge in pixels (may be negative).
    pub x: i32,
    /// Top edge in pixels (may be negative).
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundBox {
    /// Box from origin and size.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered.
    pub fn area(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// RGBA byte length of a buffer spanning this box.
    pub fn byte_len(self) -> usize {
        self.area() * 4
    }

    /// True when the box covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect with a `width` x `height` grid anchored at the origin.
    ///
    /// Returns `None` when nothing overlaps.
    pub fn clipped_to(self, width: u32, height: u32) -> Option<BoundBox> {
        let x0 = i64::from(self.x.max(0));
        let y0 = i64::from(self.y.max(0));
        let x1 = (i64::from(self.x) + i64::from(self.width)).min(i64::from(width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).min(i64::from(height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(BoundBox {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}
