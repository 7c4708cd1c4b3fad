//! Resume, idempotence and cancellation tests.
//!
//! Tests verify:
//! - A second run over a complete output writes nothing and changes nothing
//! - Two runs into fresh directories produce identical bytes
//! - Existing tiles and level rasters are honoured or overwritten per config
//! - Cancellation stops the run early and reports it

use std::fs;

use raster_tiler::{CancelToken, Tiler, TilingConfig};

use super::test_utils::{snapshot, write_gradient, InstrumentedBackend};

fn config() -> TilingConfig {
    TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 3)
        .threads(4)
        .build()
        .unwrap()
}

#[test]
fn test_second_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 256, 192);
    let out = dir.path().join("tiles");

    let first = Tiler::new(config()).process(&source, &out).unwrap();
    let before = snapshot(&out);

    let second = Tiler::new(config()).process(&source, &out).unwrap();
    let after = snapshot(&out);

    assert!(first.tiles_written > 0);
    assert_eq!(second.tiles_written, 0);
    assert_eq!(second.tiles_skipped, first.tiles_written);
    assert_eq!(before, after);
}

#[test]
fn test_output_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 300, 170);

    let out_a = dir.path().join("a");
    let out_b = dir.path().join("b");
    Tiler::new(config()).process(&source, &out_a).unwrap();
    Tiler::new(config()).process(&source, &out_b).unwrap();

    let a = snapshot(&out_a);
    let b = snapshot(&out_b);
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn test_overwrite_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 200, 120);
    let out = dir.path().join("tiles");

    let config = || {
        TilingConfig::builder()
            .tile_size(64)
            .zoom_range(0, 3)
            .zoom_normalize(2)
            .overwrite_base_image(true)
            .overwrite_tile_image(true)
            .build()
            .unwrap()
    };

    let first = Tiler::new(config()).process(&source, &out).unwrap();
    let before = snapshot(&out);
    let second = Tiler::new(config()).process(&source, &out).unwrap();

    assert_eq!(second.tiles_written, first.tiles_written);
    assert_eq!(second.tiles_skipped, 0);
    assert_eq!(before, snapshot(&out));
}

#[test]
fn test_existing_tile_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);
    let out = dir.path().join("tiles");

    let tile = out.join("1/0/0.png");
    fs::create_dir_all(tile.parent().unwrap()).unwrap();
    fs::write(&tile, b"user data").unwrap();

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 1)
        .build()
        .unwrap();
    let report = Tiler::new(config).process(&source, &out).unwrap();

    assert_eq!(report.tiles_skipped, 1);
    assert_eq!(report.tiles_written, 4);
    assert_eq!(fs::read(&tile).unwrap(), b"user data");
}

#[test]
fn test_overwrite_tile_image_replaces_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);
    let out = dir.path().join("tiles");

    let tile = out.join("1/0/0.png");
    fs::create_dir_all(tile.parent().unwrap()).unwrap();
    fs::write(&tile, b"user data").unwrap();

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 1)
        .overwrite_tile_image(true)
        .build()
        .unwrap();
    let report = Tiler::new(config).process(&source, &out).unwrap();

    assert_eq!(report.tiles_written, 5);
    assert!(image::open(&tile).is_ok());
}

#[test]
fn test_existing_base_image_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);
    let out = dir.path().join("tiles");
    fs::create_dir_all(&out).unwrap();

    // a pre-existing level raster of a different color wins over the source
    let marker = image::Rgba([1, 2, 3, 255]);
    image::RgbaImage::from_pixel(64, 64, marker)
        .save(out.join("0.png"))
        .unwrap();

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 1)
        .clean_up_base_images(false)
        .build()
        .unwrap();
    let report = Tiler::new(config).process(&source, &out).unwrap();

    assert_eq!(report.levels_built, 1);
    assert_eq!(report.levels_skipped, 1);
    let tile = image::open(out.join("0/0/0.png")).unwrap().to_rgba8();
    assert_eq!(*tile.get_pixel(5, 5), marker);
}

#[test]
fn test_inline_mode_skips_complete_levels() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);
    let out = dir.path().join("tiles");

    let config = || {
        TilingConfig::builder()
            .tile_size(64)
            .zoom_range(0, 1)
            .persist_base_images(false)
            .build()
            .unwrap()
    };

    let first = Tiler::new(config()).process(&source, &out).unwrap();
    assert_eq!(first.levels_built, 2);

    fs::remove_file(out.join("1/1/1.png")).unwrap();
    let second = Tiler::new(config()).process(&source, &out).unwrap();

    // zoom 0 is complete and skipped; zoom 1 is rebuilt for its missing tile
    assert_eq!(second.levels_skipped, 1);
    assert_eq!(second.levels_built, 1);
    assert_eq!(second.tiles_written, 1);
    assert_eq!(second.tiles_skipped, 3);
    assert!(out.join("1/1/1.png").is_file());
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancel_before_start() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);
    let out = dir.path().join("tiles");

    let cancel = CancelToken::new();
    cancel.cancel();

    let report = Tiler::new(config())
        .with_cancel_token(cancel)
        .process(&source, &out)
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.levels_built, 0);
    assert_eq!(report.tiles_written, 0);
}

#[test]
fn test_cancel_during_tiling() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 256, 256);
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 2)
        .threads(1)
        .build()
        .unwrap();

    // 3 level rasters, then cancel while writing the second tile
    let cancel = CancelToken::new();
    let backend = InstrumentedBackend::new().cancelling_after(5, cancel.clone());
    let tiler = Tiler::with_backend(config, backend).with_cancel_token(cancel);
    let report = tiler.process(&source, &out).unwrap();

    assert!(report.cancelled);
    assert_eq!(report.levels_built, 3);
    assert_eq!(report.tiles_written, 2);
    assert_eq!(report.base_images_removed, 0);

    // level rasters stay for a later resume
    assert!(out.join("0.png").is_file());
    assert!(out.join("2.png").is_file());
}

#[test]
fn test_cancel_token_is_shared() {
    let config = TilingConfig::builder().build().unwrap();
    let tiler = Tiler::new(config);

    let token = tiler.cancel_token();
    token.cancel();
    assert!(tiler.cancel_token().is_cancelled());
}
