//! High-level print-layout operations.
//!
//! These functions combine the pure geometry in
//! [`calculations`](super::calculations) with actual pixel work: decoding,
//! Lanczos3 resampling, white-canvas composition, and JPEG encoding.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use std::io::Cursor;

use super::ImagingError;
use super::calculations::{calculate_center_offsets, calculate_fit_dimensions};
use super::targets::{PrintTarget, Quality};

/// One encoded print layout.
#[derive(Debug, Clone)]
pub struct PrintVariant {
    /// The [`PrintTarget`] name this variant was rendered for.
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// JPEG-encoded canvas, exactly `width × height`.
    pub bytes: Vec<u8>,
}

/// The per-export collection of encoded layouts, one per configured target.
///
/// Ordering follows the target configuration, not insertion into any map —
/// callers that need deterministic output iterate this directly.
#[derive(Debug, Clone, Default)]
pub struct VariantSet {
    variants: Vec<PrintVariant>,
}

impl VariantSet {
    /// Look up a variant by target name.
    pub fn get(&self, name: &str) -> Option<&PrintVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Target names in configuration order.
    pub fn names(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrintVariant> {
        self.variants.iter()
    }
}

impl IntoIterator for VariantSet {
    type Item = PrintVariant;
    type IntoIter = std::vec::IntoIter<PrintVariant>;

    fn into_iter(self) -> Self::IntoIter {
        self.variants.into_iter()
    }
}

/// Fit a decoded raster onto a white canvas of exactly `width × height`.
///
/// The source is scaled uniformly (width-first, height on overflow — see
/// [`calculate_fit_dimensions`]) with Lanczos3 resampling and composed
/// centered onto an opaque white background. Output is RGB: exactly the
/// requested dimensions, no transparency, aspect ratio preserved.
///
/// Fails with [`ImagingError::InvalidDimension`] if either dimension is zero.
pub fn fit_and_pad(
    source: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<RgbImage, ImagingError> {
    if width == 0 || height == 0 {
        return Err(ImagingError::InvalidDimension { width, height });
    }

    let (fit_w, fit_h) =
        calculate_fit_dimensions((source.width(), source.height()), (width, height));
    // Often a large upscale (1024px generations → 3508px print width), so a
    // high-quality filter is mandatory; nearest/triangle shows blockiness in print.
    let scaled = source.resize_exact(fit_w, fit_h, FilterType::Lanczos3).to_rgb8();

    let (x, y) = calculate_center_offsets((width, height), (fit_w, fit_h));
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    image::imageops::overlay(&mut canvas, &scaled, i64::from(x), i64::from(y));
    Ok(canvas)
}

/// Encode a composed canvas as a print-quality JPEG.
///
/// The `image` crate's JPEG encoder writes 4:4:4 (no chroma subsampling),
/// which keeps typography edges sharp at print resolution.
pub fn encode_print_jpeg(canvas: &RgbImage, quality: Quality) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality.value());
    encoder
        .encode_image(canvas)
        .map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Decode source bytes once and render one JPEG per configured target.
///
/// Fail-fast: an error on any target aborts the whole call, so callers
/// never observe a partial [`VariantSet`]. Returns exactly one entry per
/// target, in target order.
pub fn generate_variants(
    source_bytes: &[u8],
    targets: &[PrintTarget],
    quality: Quality,
) -> Result<VariantSet, ImagingError> {
    let source =
        image::load_from_memory(source_bytes).map_err(|e| ImagingError::Decode(e.to_string()))?;
    log::debug!(
        "decoded {}x{} source for {} print target(s)",
        source.width(),
        source.height(),
        targets.len()
    );

    let mut variants = Vec::with_capacity(targets.len());
    for target in targets {
        let canvas = fit_and_pad(&source, target.width, target.height)?;
        let bytes = encode_print_jpeg(&canvas, quality)?;
        variants.push(PrintVariant {
            name: target.name.clone(),
            width: target.width,
            height: target.height,
            bytes,
        });
    }
    Ok(VariantSet { variants })
}
