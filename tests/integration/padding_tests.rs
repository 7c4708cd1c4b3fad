//! Edge tile padding tests.
//!
//! Tests verify:
//! - Content placement for top-left (XYZ) and bottom-left (TMS) rows
//! - Fill color on the overhanging part of edge tiles
//! - Transparent fill for PNG output

use image::{GenericImageView, Rgba};

use raster_tiler::{TileScheme, Tiler, TilingConfig};

use super::test_utils::{open_tile, write_solid};

const GREEN: Rgba<u8> = Rgba([0, 200, 0, 255]);
const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);

fn run(scheme: TileScheme, fill: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    // 100x60 at tile size 64: 2 columns, 1 row, overhang right and vertically
    let source = write_solid(dir.path(), 100, 60, GREEN);

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 0)
        .tile_scheme(scheme)
        .fill_color(fill)
        .build()
        .unwrap();
    Tiler::new(config)
        .process(&source, &dir.path().join("tiles"))
        .unwrap();
    dir
}

#[test]
fn test_top_left_padding_below_content() {
    let dir = run(TileScheme::TopLeft, "#ff00ff");
    let out = dir.path().join("tiles");

    let tile = open_tile(&out, 0, 0, 0, "png");
    assert_eq!(tile.dimensions(), (64, 64));
    assert_eq!(tile.get_pixel(0, 0), GREEN);
    assert_eq!(tile.get_pixel(63, 59), GREEN);
    assert_eq!(tile.get_pixel(0, 60), MAGENTA);
    assert_eq!(tile.get_pixel(63, 63), MAGENTA);

    // right column: 36 pixels of content, fill beyond
    let tile = open_tile(&out, 0, 1, 0, "png");
    assert_eq!(tile.dimensions(), (64, 64));
    assert_eq!(tile.get_pixel(35, 0), GREEN);
    assert_eq!(tile.get_pixel(36, 0), MAGENTA);
    assert_eq!(tile.get_pixel(35, 60), MAGENTA);
}

#[test]
fn test_bottom_left_padding_above_content() {
    let dir = run(TileScheme::BottomLeft, "#ff00ff");
    let out = dir.path().join("tiles");

    let tile = open_tile(&out, 0, 0, 0, "png");
    assert_eq!(tile.dimensions(), (64, 64));
    assert_eq!(tile.get_pixel(0, 0), MAGENTA);
    assert_eq!(tile.get_pixel(0, 3), MAGENTA);
    assert_eq!(tile.get_pixel(0, 4), GREEN);
    assert_eq!(tile.get_pixel(63, 63), GREEN);

    let tile = open_tile(&out, 0, 1, 0, "png");
    assert_eq!(tile.get_pixel(35, 63), GREEN);
    assert_eq!(tile.get_pixel(36, 63), MAGENTA);
    assert_eq!(tile.get_pixel(0, 0), MAGENTA);
}

#[test]
fn test_transparent_fill() {
    let dir = run(TileScheme::TopLeft, "transparent");
    let out = dir.path().join("tiles");

    let tile = open_tile(&out, 0, 1, 0, "png");
    assert_eq!(tile.get_pixel(0, 0), GREEN);
    assert_eq!(tile.get_pixel(63, 63)[3], 0);
}

#[test]
fn test_bottom_left_rows_count_from_bottom() {
    let dir = tempfile::tempdir().unwrap();
    // 64x128: one column, two rows; top half green, bottom half magenta
    let path = dir.path().join("halves.png");
    image::RgbaImage::from_fn(64, 128, |_, y| if y < 64 { GREEN } else { MAGENTA })
        .save(&path)
        .unwrap();
    let out = dir.path().join("tiles");

    let config = TilingConfig::builder()
        .tile_size(64)
        .zoom_range(0, 0)
        .tile_scheme(TileScheme::BottomLeft)
        .build()
        .unwrap();
    Tiler::new(config).process(&path, &out).unwrap();

    // row 0 is the bottom of the image
    assert_eq!(open_tile(&out, 0, 0, 0, "png").get_pixel(10, 10), MAGENTA);
    assert_eq!(open_tile(&out, 0, 0, 1, "png").get_pixel(10, 10), GREEN);
}
