//! Print-layout imaging — pure Rust, no system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (PNG, JPEG, WebP) | `image::load_from_memory` |
//! | **Fit + letterbox** | pure math in [`calculations`] + `resize_exact` (Lanczos3) |
//! | **Compose** | white `RgbImage` canvas + `imageops::overlay` |
//! | **Encode** | `image` JPEG encoder, quality 95, 4:4:4 |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for fit/centering math (unit testable)
//! - **Targets**: [`PrintTarget`] canvas definitions and the [`Quality`] newtype
//! - **Operations**: [`fit_and_pad`] and [`generate_variants`]

pub mod calculations;
pub mod operations;
pub mod targets;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("failed to decode source image: {0}")]
    Decode(String),
    #[error("invalid print dimensions {width}x{height}: both sides must be positive")]
    InvalidDimension { width: u32, height: u32 },
    #[error("JPEG encode failed: {0}")]
    Encode(String),
}

pub use calculations::{calculate_center_offsets, calculate_fit_dimensions};
pub use operations::{PrintVariant, VariantSet, fit_and_pad, generate_variants};
pub use targets::{PrintTarget, Quality, default_targets};
