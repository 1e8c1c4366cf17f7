//! RGBA8 color helpers and the packed-u32 transport form.

/// Straight (non-premultiplied) RGBA8 pixel in R,G,B,A channel order.
pub type Rgba8 = [u8; 4];

/// Transparent black, the engine's background value.
pub const TRANSPARENT: Rgba8 = [0, 0, 0, 0];

/// Pack a color into the `(A<<24)|(R<<16)|(G<<8)|B` transport layout.
pub fn rgba_to_packed_u32(color: Rgba8) -> u32 {
    let [r, g, b, a] = color;
    (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Exact inverse of [`rgba_to_packed_u32`].
pub fn packed_u32_to_rgba(packed: u32) -> Rgba8 {
    [
        (packed >> 16) as u8,
        (packed >> 8) as u8,
        packed as u8,
        (packed >> 24) as u8,
    ]
}

/// RGBA byte length of a `width` x `height` pixel grid.
pub(crate) fn pixel_byte_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4)
}

/// True when every channel of `a` is within `threshold` of `b`.
pub(crate) fn within_threshold(a: Rgba8, b: Rgba8, threshold: u8) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(&x, &y)| x.abs_diff(y) <= threshold)
}
