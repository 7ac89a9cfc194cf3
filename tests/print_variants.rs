//! End-to-end print rendering: a generated-size source in, the full stock
//! variant set out, every canvas exactly its configured dimensions.

use image::{DynamicImage, Rgb, RgbImage};
use posterflow::imaging::{Quality, default_targets, generate_variants};
use std::io::Cursor;

fn png_source(width: u32, height: u32) -> Vec<u8> {
    // Gradient rather than a solid so resampling has real content to chew on
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn square_generation_renders_the_full_stock_set() {
    let source = png_source(1024, 1024);
    let set = generate_variants(&source, &default_targets(), Quality::default()).unwrap();

    assert_eq!(set.names(), vec!["Large", "Medium", "Small"]);
    let expected = [
        ("Large", 3508, 4961),
        ("Medium", 2480, 3508),
        ("Small", 1748, 2480),
    ];
    for (name, width, height) in expected {
        let variant = set.get(name).unwrap();
        assert_eq!((variant.width, variant.height), (width, height), "{name}");

        // Every output must decode back to exactly the canvas size
        let decoded = image::load_from_memory(&variant.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (width, height), "{name}");
    }
}

#[test]
fn square_source_on_portrait_canvas_gets_white_bands_top_and_bottom() {
    let source = png_source(1024, 1024);
    let set = generate_variants(&source, &default_targets(), Quality::default()).unwrap();

    let medium = set.get("Medium").unwrap();
    let decoded = image::load_from_memory(&medium.bytes).unwrap().to_rgb8();

    // 1024x1024 fits 2480x3508 as 2480x2480, centered at y = 514
    let near_white = |p: &Rgb<u8>| p.0.iter().all(|&c| c > 250);
    assert!(near_white(decoded.get_pixel(0, 0)));
    assert!(near_white(decoded.get_pixel(2479, 3507)));
    assert!(near_white(decoded.get_pixel(1240, 500)));
    // Canvas center is source content, far from white
    let center = decoded.get_pixel(1240, 1754);
    assert!(center.0[2] > 100 && center.0[2] < 160, "{center:?}");
}

#[test]
fn extreme_aspect_ratio_still_fills_the_exact_canvas() {
    let source = png_source(100, 4000);
    let set = generate_variants(&source, &default_targets(), Quality::default()).unwrap();

    for variant in set.iter() {
        let decoded = image::load_from_memory(&variant.bytes).unwrap();
        assert_eq!(
            (decoded.width(), decoded.height()),
            (variant.width, variant.height),
            "{}",
            variant.name
        );
    }
}

#[test]
fn rendering_is_idempotent_for_identical_input() {
    let source = png_source(256, 256);
    let targets = default_targets();
    let first = generate_variants(&source, &targets, Quality::default()).unwrap();
    let second = generate_variants(&source, &targets, Quality::default()).unwrap();

    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.bytes, b.bytes, "{}", a.name);
    }
}
