//! End-to-end pipeline tests.
//!
//! Tests verify:
//! - Every tile of every level is written with the configured size
//! - Level rasters are removed after tiling unless kept
//! - Inline mode never writes level rasters
//! - JPEG output and the optimizer hook

use std::sync::Arc;

use image::GenericImageView;

use raster_tiler::pyramid::LevelPlan;
use raster_tiler::{Tiler, TilingConfig};

use super::test_utils::{open_tile, snapshot, write_gradient, FailingOptimizer, RecordingOptimizer};

// =============================================================================
// Geometry
// =============================================================================

#[test]
fn test_reference_plan_4096x2048() {
    let config = TilingConfig::builder()
        .tile_size(256)
        .zoom_range(0, 4)
        .build()
        .unwrap();
    let plan = LevelPlan::new(&config, 4096, 2048);

    let grids: Vec<_> = plan
        .levels
        .iter()
        .map(|l| (l.zoom, l.width, l.height, l.columns, l.rows))
        .collect();
    assert_eq!(
        grids,
        vec![
            (0, 256, 128, 1, 1),
            (1, 512, 256, 2, 1),
            (2, 1024, 512, 4, 2),
            (3, 2048, 1024, 8, 4),
            (4, 4096, 2048, 16, 8),
        ]
    );
    assert_eq!(plan.total_tiles(), 171);
}

#[test]
fn test_full_pyramid_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 512, 256);
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 4)
        .threads(2)
        .build()
        .unwrap();
    let report = Tiler::new(config).process(&source, &out).unwrap();

    assert!(!report.cancelled);
    assert_eq!((report.source_width, report.source_height), (512, 256));
    assert_eq!(report.levels_built, 5);
    assert_eq!(report.tiles_written, 32 + 8 + 2 + 1 + 1);
    assert_eq!(report.tiles_skipped, 0);

    // grid completeness
    for (zoom, columns, rows) in [(0, 1, 1), (1, 1, 1), (2, 2, 1), (3, 4, 2), (4, 8, 4)] {
        for x in 0..columns {
            for y in 0..rows {
                let tile = open_tile(&out, zoom, x, y, "png");
                assert_eq!(tile.dimensions(), (64, 64), "tile {zoom}/{x}/{y}");
            }
        }
        assert!(!out.join(format!("{zoom}/{columns}/0.png")).exists());
    }

    // zoom 0 is 32x16, padded with the default black fill
    let top = open_tile(&out, 0, 0, 0, "png").to_rgba8();
    assert_eq!(top.get_pixel(40, 0), &image::Rgba([0, 0, 0, 255]));
    assert_eq!(top.get_pixel(0, 20), &image::Rgba([0, 0, 0, 255]));
    assert_eq!(top.get_pixel(0, 0)[3], 255);

    // level rasters are cleaned up
    assert_eq!(report.base_images_removed, 5);
    for zoom in 0..=4 {
        assert!(!out.join(format!("{zoom}.png")).exists());
    }

    let files = snapshot(&out);
    assert_eq!(files.len(), 44);
}

#[test]
fn test_single_tile_level_is_padded_to_full_tile() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 256, 128);
    let out = dir.path().join("tiles");

    // zoom 0 of the 4096x2048 reference pyramid at tile 256
    let config = TilingConfig::builder()
        .tile_size(256)
        .zoom_range(0, 0)
        .build()
        .unwrap();
    let report = Tiler::new(config).process(&source, &out).unwrap();
    assert_eq!(report.tiles_written, 1);

    let original = image::open(&source).unwrap().to_rgba8();
    let tile = open_tile(&out, 0, 0, 0, "png").to_rgba8();
    assert_eq!(tile.dimensions(), (256, 256));
    for (x, y) in [(0, 0), (255, 0), (100, 64), (255, 127)] {
        assert_eq!(tile.get_pixel(x, y), original.get_pixel(x, y), "content at {x},{y}");
    }
    for (x, y) in [(0, 128), (128, 200), (255, 255)] {
        assert_eq!(tile.get_pixel(x, y), &image::Rgba([0, 0, 0, 255]), "padding at {x},{y}");
    }
}

#[test]
fn test_keep_base_images() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 64);
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 2)
        .clean_up_base_images(false)
        .build()
        .unwrap();
    let report = Tiler::new(config).process(&source, &out).unwrap();

    assert_eq!(report.base_images_removed, 0);
    assert_eq!(image::open(out.join("2.png")).unwrap().dimensions(), (128, 64));
    assert_eq!(image::open(out.join("1.png")).unwrap().dimensions(), (64, 32));
    assert_eq!(image::open(out.join("0.png")).unwrap().dimensions(), (32, 16));
}

#[test]
fn test_inline_mode_writes_no_level_rasters() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 256, 128);
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 2)
        .persist_base_images(false)
        .build()
        .unwrap();
    let report = Tiler::new(config).process(&source, &out).unwrap();

    assert_eq!(report.levels_built, 3);
    assert_eq!(report.levels_tiled, 3);
    assert_eq!(report.tiles_written, 8 + 2 + 1);
    assert_eq!(report.base_images_removed, 0);

    for zoom in 0..=2 {
        assert!(!out.join(format!("{zoom}.png")).exists());
    }
    assert_eq!(open_tile(&out, 2, 3, 1, "png").dimensions(), (64, 64));
}

#[test]
fn test_upscaled_levels_above_normalize() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 100, 50);
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 3)
        .zoom_normalize(1)
        .clean_up_base_images(false)
        .build()
        .unwrap();
    Tiler::new(config).process(&source, &out).unwrap();

    // 100x50 at zoom 1; 2x per level above, half per level below
    assert_eq!(image::open(out.join("3.png")).unwrap().dimensions(), (400, 200));
    assert_eq!(image::open(out.join("2.png")).unwrap().dimensions(), (200, 100));
    assert_eq!(image::open(out.join("1.png")).unwrap().dimensions(), (100, 50));
    assert_eq!(image::open(out.join("0.png")).unwrap().dimensions(), (50, 25));

    // 400 / 64 -> 7 columns, 200 / 64 -> 4 rows
    assert!(out.join("3/6/3.png").is_file());
    assert!(!out.join("3/7/0.png").exists());
}

#[test]
fn test_jpeg_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 1)
        .tile_format("jpg")
        .jpeg_quality(60)
        .build()
        .unwrap();
    let report = Tiler::new(config).process(&source, &out).unwrap();

    assert_eq!(report.tiles_written, 5);
    let tile = open_tile(&out, 1, 1, 1, "jpg");
    assert_eq!(tile.dimensions(), (64, 64));
    assert!(!out.join("1/1/1.png").exists());
}

#[test]
fn test_custom_template_and_extension() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 64);
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(1, 1)
        .store_path_template("level-{z}/{y}_{x}")
        .tile_extension("tile")
        .build()
        .unwrap();
    Tiler::new(config).process(&source, &out).unwrap();

    assert!(out.join("level-1/0_0.tile").is_file());
    assert!(out.join("level-1/0_1.tile").is_file());
    assert!(!out.join("1.tile").exists());
}

// =============================================================================
// Optimizer
// =============================================================================

#[test]
fn test_optimizer_runs_on_fresh_tiles_only() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 64);
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 1)
        .optimize_output(true)
        .build()
        .unwrap();

    let optimizer = Arc::new(RecordingOptimizer::new());
    let tiler = Tiler::new(config).with_optimizer(optimizer.clone());
    tiler.process(&source, &out).unwrap();

    // each tile is optimized while still staged in its own directory
    let calls = optimizer.calls();
    let dirs: Vec<_> = calls
        .iter()
        .map(|(p, _)| p.parent().unwrap().to_path_buf())
        .collect();
    assert_eq!(dirs, vec![out.join("0/0"), out.join("1/0"), out.join("1/1")]);
    for (staged, format) in &calls {
        assert_eq!(staged.extension().unwrap(), "png");
        assert_eq!(*format, raster_tiler::TileFormat::Png);
        assert!(!staged.exists());
    }

    // a second run skips every tile, so nothing is optimized again
    tiler.process(&source, &out).unwrap();
    assert_eq!(optimizer.calls().len(), 3);
}

#[test]
fn test_optimizer_disabled_is_not_called() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 64, 64);
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 0)
        .build()
        .unwrap();

    let optimizer = Arc::new(RecordingOptimizer::new());
    Tiler::new(config)
        .with_optimizer(optimizer.clone())
        .process(&source, &out)
        .unwrap();

    assert!(optimizer.calls().is_empty());
    assert!(out.join("0/0/0.png").is_file());
}

#[test]
fn test_optimizer_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 1)
        .optimize_output(true)
        .build()
        .unwrap();
    let report = Tiler::new(config)
        .with_optimizer(Arc::new(FailingOptimizer))
        .process(&source, &out)
        .unwrap();

    assert_eq!(report.tiles_written, 5);
    assert_eq!(open_tile(&out, 1, 0, 1, "png").dimensions(), (64, 64));
}
