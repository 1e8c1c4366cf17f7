use super::*;

#[test]
fn grid_dimensions_round_up() {
    let grid = TileGrid::new(128, 96, 32);
    assert_eq!((grid.rows(), grid.cols()), (3, 4));

    let grid = TileGrid::new(130, 50, 32);
    assert_eq!((grid.rows(), grid.cols()), (2, 5));

    let grid = TileGrid::new(0, 0, 32);
    assert_eq!((grid.rows(), grid.cols()), (0, 0));
}

#[test]
fn pixel_to_tile_floors() {
    let grid = TileGrid::new(128, 96, 32);
    assert_eq!(grid.pixel_to_tile(0, 0), TileIndex::new(0, 0));
    assert_eq!(grid.pixel_to_tile(31, 31), TileIndex::new(0, 0));
    assert_eq!(grid.pixel_to_tile(32, 31), TileIndex::new(0, 1));
    assert_eq!(grid.pixel_to_tile(100, 80), TileIndex::new(2, 3));
}

#[test]
fn tile_bounds_clamps_edge_tiles() {
    let grid = TileGrid::new(130, 50, 32);
    assert_eq!(
        grid.tile_bounds(TileIndex::new(0, 0)),
        Some(BoundBox::new(0, 0, 32, 32))
    );
    assert_eq!(
        grid.tile_bounds(TileIndex::new(1, 4)),
        Some(BoundBox::new(128, 32, 2, 18))
    );
    assert_eq!(grid.tile_bounds(TileIndex::new(2, 0)), None);
    assert_eq!(grid.tile_bounds(TileIndex::new(0, 5)), None);
}

#[test]
fn dirty_flags_roundtrip_and_out_of_range_is_silent() {
    let mut grid = TileGrid::new(64, 64, 32);
    let idx = TileIndex::new(1, 1);
    assert!(!grid.is_dirty(idx));

    grid.set_dirty(idx, true);
    assert!(grid.is_dirty(idx));
    grid.set_dirty(idx, false);
    assert!(!grid.is_dirty(idx));

    // out of range: reads clean, writes vanish
    let outside = TileIndex::new(9, 9);
    grid.set_dirty(outside, true);
    assert!(!grid.is_dirty(outside));
    assert_eq!(grid.dirty_count(), 0);
}

#[test]
fn mark_dirty_by_pixel_ignores_outside_pixels() {
    let mut grid = TileGrid::new(64, 64, 32);
    grid.mark_dirty_by_pixel(-1, 0);
    grid.mark_dirty_by_pixel(0, -1);
    grid.mark_dirty_by_pixel(64, 0);
    grid.mark_dirty_by_pixel(0, 64);
    assert_eq!(grid.dirty_count(), 0);

    grid.mark_dirty_by_pixel(33, 10);
    assert!(grid.is_dirty(TileIndex::new(0, 1)));
    assert_eq!(grid.dirty_count(), 1);
}

#[test]
fn mark_rect_dirty_covers_intersecting_tiles() {
    let mut grid = TileGrid::new(128, 96, 32);
    grid.mark_rect_dirty(BoundBox::new(30, 30, 10, 10));
    let dirty = grid.dirty_tile_indices();
    assert_eq!(
        dirty,
        vec![
            TileIndex::new(0, 0),
            TileIndex::new(0, 1),
            TileIndex::new(1, 0),
            TileIndex::new(1, 1),
        ]
    );
}

#[test]
fn mark_rect_dirty_clips_to_the_buffer() {
    let mut grid = TileGrid::new(64, 64, 32);
    grid.mark_rect_dirty(BoundBox::new(-100, -100, 120, 120));
    assert_eq!(grid.dirty_count(), 1);
    assert!(grid.is_dirty(TileIndex::new(0, 0)));

    grid.mark_rect_dirty(BoundBox::new(500, 500, 10, 10));
    assert_eq!(grid.dirty_count(), 1);
}

#[test]
fn set_all_keeps_trailing_word_bits_zero() {
    // 5 tiles fit in one u32 word with 27 unused high bits.
    let mut grid = TileGrid::new(160, 32, 32);
    assert_eq!((grid.rows(), grid.cols()), (1, 5));

    grid.set_all_dirty();
    assert_eq!(grid.dirty_count(), 5);
    assert_eq!(grid.dirty_words(), &[0b11111]);

    grid.clear_all_dirty();
    assert_eq!(grid.dirty_words(), &[0]);
}

#[test]
fn dirty_tile_indices_are_row_major() {
    let mut grid = TileGrid::new(96, 96, 32);
    grid.set_dirty(TileIndex::new(2, 0), true);
    grid.set_dirty(TileIndex::new(0, 1), true);
    grid.set_dirty(TileIndex::new(1, 2), true);
    assert_eq!(
        grid.dirty_tile_indices(),
        vec![
            TileIndex::new(0, 1),
            TileIndex::new(1, 2),
            TileIndex::new(2, 0),
        ]
    );
}

#[test]
fn resize_preserves_the_overlapping_region() {
    let mut grid = TileGrid::new(128, 96, 32);
    grid.set_dirty(TileIndex::new(0, 0), true);
    grid.set_dirty(TileIndex::new(2, 3), true);

    grid.resize(64, 64);
    assert_eq!((grid.rows(), grid.cols()), (2, 2));
    assert!(grid.is_dirty(TileIndex::new(0, 0)));
    assert_eq!(grid.dirty_count(), 1);
}

#[test]
fn resize_growing_keeps_old_flags_and_adds_clean_tiles() {
    let mut grid = TileGrid::new(64, 64, 32);
    grid.set_dirty(TileIndex::new(1, 1), true);

    grid.resize(128, 128);
    assert_eq!((grid.rows(), grid.cols()), (4, 4));
    assert!(grid.is_dirty(TileIndex::new(1, 1)));
    assert_eq!(grid.dirty_count(), 1);
}
