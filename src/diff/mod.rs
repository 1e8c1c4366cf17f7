//! Pre-image diff accumulation and the packed patch transport.

mod controller;
mod patch;

pub use controller::DiffController;
pub use patch::{
    PackedDiffs, PackedPartialPatch, PackedPixelPatch, PackedWholePatch, PartialPatch, PixelPatch,
    WholePatch,
};
