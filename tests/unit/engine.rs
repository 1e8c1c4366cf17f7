use super::*;

use crate::buffer::Antialias;
use crate::diff::{PackedPixelPatch, WholePatch};
use crate::foundation::color::TRANSPARENT;

const RED: Rgba8 = [255, 0, 0, 255];
const GREEN: Rgba8 = [0, 255, 0, 255];

#[test]
fn constructor_rejects_zero_tile_size() {
    let err = Anvil::new(64, 64, 0).unwrap_err();
    assert!(matches!(err, AnvilError::Validation(_)));
}

#[test]
fn strict_pixel_access_errors_out_of_bounds() {
    let mut anvil = Anvil::new(4, 4, 2).unwrap();
    assert!(matches!(
        anvil.get_pixel(4, 0),
        Err(AnvilError::OutOfBounds { x: 4, y: 0, .. })
    ));
    assert!(matches!(
        anvil.set_pixel(-1, 2, RED),
        Err(AnvilError::OutOfBounds { x: -1, y: 2, .. })
    ));
    // the permissive buffer path stays silent
    assert_eq!(anvil.buffer().get(-1, 2), TRANSPARENT);
}

#[test]
fn set_pixel_updates_all_three_owners() {
    let mut anvil = Anvil::new(64, 64, 32).unwrap();
    assert!(anvil.set_pixel(33, 5, RED).unwrap());

    assert_eq!(anvil.get_pixel(33, 5).unwrap(), RED);
    assert_eq!(anvil.dirty_tiles(), vec![TileIndex::new(0, 1)]);

    let patch = anvil.preview_patch().unwrap();
    assert_eq!(patch.pixels.len(), 1);
    assert_eq!((patch.pixels[0].x, patch.pixels[0].y), (33, 5));
    assert_eq!(patch.pixels[0].color, rgba_to_packed_u32(TRANSPARENT));
}

#[test]
fn set_pixel_reports_change_detection() {
    let mut anvil = Anvil::new(4, 4, 2).unwrap();
    assert!(anvil.set_pixel(1, 1, RED).unwrap());
    assert!(!anvil.set_pixel(1, 1, RED).unwrap());
    // the pre-image entry is recorded either way
    assert_eq!(anvil.preview_patch().unwrap().pixels.len(), 2);
}

#[test]
fn scattered_writes_dirty_exactly_their_tiles() {
    let mut anvil = Anvil::new(128, 96, 32).unwrap();
    anvil.set_pixel(10, 10, RED).unwrap();
    anvil.set_pixel(50, 50, RED).unwrap();
    anvil.set_pixel(100, 80, RED).unwrap();

    assert_eq!(
        anvil.dirty_tiles(),
        vec![
            TileIndex::new(0, 0),
            TileIndex::new(1, 1),
            TileIndex::new(2, 3),
        ]
    );
}

#[test]
fn fill_rect_records_per_pixel_diffs_and_dirties_tiles() {
    let mut anvil = Anvil::new(8, 8, 4).unwrap();
    assert!(anvil.fill_rect(1, 1, 2, 2, RED));

    let patch = anvil.preview_patch().unwrap();
    assert_eq!(patch.pixels.len(), 4);
    assert_eq!(anvil.dirty_tiles(), vec![TileIndex::new(0, 0)]);

    // refilling the same color changes nothing but still records entries
    assert!(!anvil.fill_rect(1, 1, 2, 2, RED));
    assert_eq!(anvil.preview_patch().unwrap().pixels.len(), 8);
}

#[test]
fn fill_rect_clips_to_the_buffer() {
    let mut anvil = Anvil::new(4, 4, 2).unwrap();
    assert!(anvil.fill_rect(-1, -1, 2, 2, RED));
    assert_eq!(anvil.get_pixel(0, 0).unwrap(), RED);
    assert_eq!(anvil.preview_patch().unwrap().pixels.len(), 1);

    assert!(!anvil.fill_rect(10, 10, 2, 2, RED));
}

#[test]
fn fill_all_records_a_whole_pre_image() {
    let mut anvil = Anvil::new(4, 4, 2).unwrap();
    anvil.set_pixel(0, 0, GREEN).unwrap();
    anvil.fill_all(RED).unwrap();

    let patch = anvil.preview_patch().unwrap();
    assert!(patch.whole.is_some());
    assert!(patch.pixels.is_empty());
    assert_eq!(anvil.dirty_tiles().len(), 4);
    assert_eq!(anvil.get_pixel(3, 3).unwrap(), RED);
}

#[test]
fn write_rect_rejects_mismatched_source() {
    let mut anvil = Anvil::new(4, 4, 2).unwrap();
    assert!(anvil.write_rect(0, 0, 2, 2, &[0u8; 10]).is_err());
    assert!(!anvil.has_pending_changes());
}

#[test]
fn write_rect_records_diffs_for_the_clipped_region() {
    let mut anvil = Anvil::new(4, 4, 2).unwrap();
    let src = vec![7u8; 16];
    anvil.write_rect(3, 3, 2, 2, &src).unwrap();

    // only (3, 3) is inside the buffer
    assert_eq!(anvil.preview_patch().unwrap().pixels.len(), 1);
    assert_eq!(anvil.get_pixel(3, 3).unwrap(), [7, 7, 7, 7]);
    assert_eq!(anvil.dirty_tiles(), vec![TileIndex::new(1, 1)]);
}

#[test]
fn write_pixels_records_diffs_for_in_bounds_pairs() {
    let mut anvil = Anvil::new(4, 4, 2).unwrap();
    let coords = [0u32, 0, 9, 9, 2, 3];
    let colors = [
        1, 1, 1, 255, //
        2, 2, 2, 255, //
        3, 3, 3, 255,
    ];
    anvil.write_pixels(&coords, &colors).unwrap();

    let patch = anvil.preview_patch().unwrap();
    assert_eq!(patch.pixels.len(), 2);
    assert_eq!(anvil.get_pixel(2, 3).unwrap(), [3, 3, 3, 255]);
}

#[test]
fn resize_discards_pending_diffs() {
    let mut anvil = Anvil::new(4, 3, 2).unwrap();
    anvil.set_pixel(0, 0, RED).unwrap();
    anvil.resize_with_offset(6, 4, (0.0, 0.0), (1.0, 1.0));

    assert!(!anvil.has_pending_changes());
    assert_eq!((anvil.width(), anvil.height()), (6, 4));
    assert_eq!(anvil.get_pixel(1, 1).unwrap(), RED);
    assert_eq!(anvil.get_pixel(0, 0).unwrap(), TRANSPARENT);
}

#[test]
fn import_raw_replaces_diffs_with_a_whole_snapshot() {
    let mut anvil = Anvil::new(2, 2, 2).unwrap();
    anvil.set_pixel(0, 0, GREEN).unwrap();

    assert!(anvil.import_raw(&[5u8; 4], 1, 1));
    assert_eq!((anvil.width(), anvil.height()), (1, 1));
    assert_eq!(anvil.get_pixel(0, 0).unwrap(), [5, 5, 5, 5]);

    let patch = anvil.preview_patch().unwrap();
    assert!(patch.pixels.is_empty());
    let whole = patch.whole.unwrap();
    // the snapshot carries the pre-import dimensions
    assert_eq!((whole.width, whole.height), (2, 2));
    assert_eq!(anvil.dirty_tiles().len(), 1);
}

#[test]
fn import_raw_rejects_wrong_length() {
    let mut anvil = Anvil::new(2, 2, 2).unwrap();
    assert!(!anvil.import_raw(&[5u8; 3], 1, 1));
    assert_eq!((anvil.width(), anvil.height()), (2, 2));
}

#[test]
fn failed_webp_import_changes_nothing() {
    let mut anvil = Anvil::new(2, 2, 2).unwrap();
    anvil.set_pixel(0, 0, RED).unwrap();

    assert!(!anvil.import_webp(b"garbage", 2, 2));
    assert_eq!(anvil.get_pixel(0, 0).unwrap(), RED);
    // the pending pixel diff survives a failed import
    assert_eq!(anvil.preview_patch().unwrap().pixels.len(), 1);
}

#[test]
fn webp_export_import_roundtrip() {
    let mut anvil = Anvil::new(3, 3, 2).unwrap();
    anvil.fill_rect(0, 0, 2, 2, RED);
    let webp = anvil.export_webp().unwrap();

    let mut other = Anvil::new(1, 1, 2).unwrap();
    assert!(other.import_webp(&webp, 3, 3));
    assert_eq!(other.buffer().as_bytes(), anvil.buffer().as_bytes());
}

#[test]
fn flood_fill_marks_all_tiles_and_records_nothing() {
    let mut anvil = Anvil::new(8, 8, 4).unwrap();
    assert!(anvil.flood_fill(0, 0, RED, 0));
    assert_eq!(anvil.dirty_tiles().len(), 4);
    assert!(!anvil.has_pending_changes());

    assert!(!anvil.flood_fill(0, 0, RED, 0));
}

#[test]
fn transfer_from_raw_composites_and_dirties() {
    let mut anvil = Anvil::new(4, 4, 2).unwrap();
    let src = RED.repeat(4);
    anvil.transfer_from_raw(
        &src,
        2,
        2,
        &BlitOptions {
            offset_x: 1.0,
            offset_y: 1.0,
            antialias: Antialias::Nearest,
            ..BlitOptions::default()
        },
    );
    assert_eq!(anvil.get_pixel(1, 1).unwrap(), RED);
    assert_eq!(anvil.get_pixel(0, 0).unwrap(), TRANSPARENT);
    assert_eq!(anvil.dirty_tiles().len(), 4);
}

#[test]
fn add_partial_diff_optionally_marks_tiles() {
    let mut anvil = Anvil::new(8, 8, 4).unwrap();
    anvil
        .add_partial_diff(BoundBox::new(0, 0, 2, 2), vec![1u8; 16], false)
        .unwrap();
    assert!(anvil.dirty_tiles().is_empty());
    assert!(anvil.preview_patch().unwrap().partial.is_some());

    anvil
        .add_partial_diff(BoundBox::new(5, 5, 2, 2), vec![2u8; 16], true)
        .unwrap();
    // the second partial is ignored for recording but still marks tiles
    assert_eq!(anvil.dirty_tiles(), vec![TileIndex::new(1, 1)]);
}

#[test]
fn tile_info_reports_geometry_and_state() {
    let mut anvil = Anvil::new(130, 50, 32).unwrap();
    anvil.set_pixel(129, 40, RED).unwrap();

    let info = anvil.tile_info(TileIndex::new(1, 4)).unwrap();
    assert_eq!(info.bounds, BoundBox::new(128, 32, 2, 18));
    assert!(info.dirty);

    let info = anvil.tile_info(TileIndex::new(0, 0)).unwrap();
    assert!(!info.dirty);

    assert!(anvil.tile_info(TileIndex::new(9, 9)).is_none());
}

#[test]
fn clear_and_set_all_dirty_roundtrip() {
    let mut anvil = Anvil::new(64, 64, 32).unwrap();
    anvil.set_all_dirty();
    assert_eq!(anvil.dirty_tiles().len(), 4);
    anvil.clear_dirty_tiles();
    assert!(anvil.dirty_tiles().is_empty());
}

#[test]
fn effects_mark_every_tile_dirty() {
    let mut anvil = Anvil::new(8, 8, 4).unwrap();
    anvil.invert();
    assert_eq!(anvil.dirty_tiles().len(), 4);

    anvil.clear_dirty_tiles();
    anvil.gaussian_blur(1, 0.8).unwrap();
    assert_eq!(anvil.dirty_tiles().len(), 4);
    assert!(!anvil.has_pending_changes());
}

#[test]
fn apply_patch_swaps_a_pixel_entry_in_place() {
    let mut anvil = Anvil::new(4, 4, 2).unwrap();
    anvil.set_pixel(1, 1, GREEN).unwrap();
    anvil.discard_diffs();
    anvil.clear_dirty_tiles();

    let mut patch = PackedDiffs {
        pixels: vec![PackedPixelPatch {
            x: 1,
            y: 1,
            color: rgba_to_packed_u32(RED),
        }],
        ..PackedDiffs::default()
    };

    anvil.apply_patch(&mut patch, PatchMode::Redo).unwrap();
    assert_eq!(anvil.get_pixel(1, 1).unwrap(), RED);
    assert_eq!(patch.pixels[0].color, rgba_to_packed_u32(GREEN));
    assert_eq!(anvil.dirty_tiles(), vec![TileIndex::new(0, 0)]);
}

#[test]
fn apply_patch_runs_whole_before_pixels() {
    let mut anvil = Anvil::new(2, 2, 2).unwrap();
    anvil.fill_rect(0, 0, 2, 2, GREEN);
    anvil.discard_diffs();

    let codec = ImageRsCodec;
    let whole = WholePatch {
        width: 2,
        height: 2,
        swap_buffer: [9u8, 9, 9, 255].repeat(4),
    }
    .pack(&codec)
    .unwrap();

    let mut patch = PackedDiffs {
        pixels: vec![PackedPixelPatch {
            x: 0,
            y: 0,
            color: rgba_to_packed_u32(RED),
        }],
        partial: None,
        whole: Some(whole),
    };

    anvil.apply_patch(&mut patch, PatchMode::Undo).unwrap();

    // the pixel overwrote the whole-swap result at (0, 0)
    assert_eq!(anvil.get_pixel(0, 0).unwrap(), RED);
    assert_eq!(anvil.get_pixel(1, 1).unwrap(), [9, 9, 9, 255]);
    // the pixel entry saw the post-whole value, not the green original
    assert_eq!(patch.pixels[0].color, rgba_to_packed_u32([9, 9, 9, 255]));

    let restored = patch.whole.unwrap().unpack(&codec).unwrap();
    assert_eq!(restored.swap_buffer, GREEN.repeat(4));
}

#[test]
fn apply_patch_with_dimension_change_resizes_the_grid() {
    let mut anvil = Anvil::new(4, 4, 2).unwrap();
    let codec = ImageRsCodec;
    let whole = WholePatch {
        width: 2,
        height: 2,
        swap_buffer: [1u8, 2, 3, 255].repeat(4),
    }
    .pack(&codec)
    .unwrap();

    let mut patch = PackedDiffs {
        whole: Some(whole),
        ..PackedDiffs::default()
    };
    anvil.apply_patch(&mut patch, PatchMode::Undo).unwrap();

    assert_eq!((anvil.width(), anvil.height()), (2, 2));
    assert_eq!(anvil.dirty_tiles(), vec![TileIndex::new(0, 0)]);
    // the rewritten patch carries the old 4x4 image
    assert_eq!(patch.whole.as_ref().unwrap().width, 4);
}
