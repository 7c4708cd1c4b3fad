//! Error handling integration tests.
//!
//! Tests verify:
//! - Invalid sources and output directories fail during validation
//! - Write failures abort the run with the phase they occurred in
//! - Corrupt level rasters are reported as consistency errors
//! - Small sources keep every level; empty levels are rejected up front

use std::fs;

use raster_tiler::error::{Phase, TilerError};
use raster_tiler::{Tiler, TilingConfig};

use super::test_utils::{write_gradient, InstrumentedBackend};

fn config() -> TilingConfig {
    TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 1)
        .build()
        .unwrap()
}

#[test]
fn test_source_is_not_an_image() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("notes.png");
    fs::write(&source, b"this is not a png").unwrap();

    let err = Tiler::new(config())
        .process(&source, &dir.path().join("tiles"))
        .unwrap_err();

    assert!(matches!(err, TilerError::Input { .. }));
    assert_eq!(err.phase(), Phase::Validating);
    assert!(!dir.path().join("tiles/0").exists());
}

#[test]
fn test_source_is_a_directory() {
    let dir = tempfile::tempdir().unwrap();

    let err = Tiler::new(config())
        .process(dir.path(), &dir.path().join("tiles"))
        .unwrap_err();
    assert!(matches!(err, TilerError::Input { .. }));
}

#[test]
fn test_write_failure_while_building_levels() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);

    let backend = InstrumentedBackend::new().failing_after(0);
    let err = Tiler::with_backend(config(), backend)
        .process(&source, &dir.path().join("tiles"))
        .unwrap_err();

    match err {
        TilerError::BackendWrite { phase, zoom, .. } => {
            assert_eq!(phase, Phase::BuildingLevels);
            assert_eq!(zoom, 1);
        }
        other => panic!("expected BackendWrite, got {other:?}"),
    }
}

#[test]
fn test_write_failure_while_tiling_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);
    let out = dir.path().join("tiles");

    // both level rasters succeed, the first tile fails
    let backend = InstrumentedBackend::new().failing_after(2);
    let err = Tiler::with_backend(config(), backend)
        .process(&source, &out)
        .unwrap_err();

    match err {
        TilerError::BackendWrite { phase, zoom, ref path, .. } => {
            assert_eq!(phase, Phase::Tiling);
            assert_eq!(zoom, 0);
            assert_eq!(path, &out.join("0/0/0.png"));
        }
        ref other => panic!("expected BackendWrite, got {other:?}"),
    }

    // no partial tile and no cleanup after an abort
    assert!(!out.join("0/0/0.png").exists());
    assert!(out.join("0.png").is_file());
    assert!(out.join("1.png").is_file());
}

#[test]
fn test_write_failure_inline_mode() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 1)
        .persist_base_images(false)
        .build()
        .unwrap();
    let backend = InstrumentedBackend::new().failing_after(1);
    let err = Tiler::with_backend(config, backend)
        .process(&source, &dir.path().join("tiles"))
        .unwrap_err();

    assert!(matches!(
        err,
        TilerError::BackendWrite {
            phase: Phase::Tiling,
            zoom: 1,
            ..
        }
    ));
}

#[test]
fn test_corrupt_level_raster_is_consistency_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 128, 128);
    let out = dir.path().join("tiles");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("0.png"), b"truncated").unwrap();

    let err = Tiler::new(config()).process(&source, &out).unwrap_err();

    match err {
        TilerError::Consistency { zoom, path } => {
            assert_eq!(zoom, 0);
            assert_eq!(path, out.join("0.png"));
        }
        other => panic!("expected Consistency, got {other:?}"),
    }
}

#[test]
fn test_small_source_with_default_zooms_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 200, 100);
    let out = dir.path().join("tiles");

    // zoom 0 rounds to 1x0 and is kept at one pixel
    let config = TilingConfig::builder().build().unwrap();
    let report = Tiler::new(config).process(&source, &out).unwrap();

    assert_eq!(report.levels_built, 9);
    assert_eq!(report.tiles_written, 9);
    assert_eq!(report.base_images_removed, 9);
    for zoom in 0..=8 {
        assert!(!out.join(format!("{zoom}.png")).exists());
        assert!(out.join(format!("{zoom}/0/0.png")).is_file());
    }
}

#[test]
fn test_empty_level_is_rejected_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gradient(dir.path(), 16, 16);
    let out = dir.path().join("tiles");

    let backend = InstrumentedBackend::new().reporting_dimensions(0, 16);
    let tiler = Tiler::with_backend(config(), backend);
    let err = tiler.process(&source, &out).unwrap_err();

    assert!(matches!(err, TilerError::EmptyLevel { zoom: 0, .. }));
    assert_eq!(err.phase(), Phase::Validating);
    assert!(!out.exists());
}

#[test]
fn test_translucent_fill_with_jpeg_is_rejected() {
    let err = TilingConfig::builder()
        .tile_format("jpeg")
        .fill_color("#00000080")
        .build()
        .unwrap_err();

    assert!(matches!(
        err,
        raster_tiler::ConfigError::TranslucentFill { .. }
    ));
}
