//! Print target definitions.
//!
//! A [`PrintTarget`] names a fixed output canvas — a paper size rendered at
//! 300 DPI in portrait orientation. The set is defined at configuration time
//! and immutable for the process lifetime; variant generation walks it in
//! order, so output ordering is a property of configuration, not of any map.

use serde::{Deserialize, Serialize};

/// A named fixed-size print canvas, in pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintTarget {
    /// Identifier used in output filenames and variant lookup (e.g. "Large").
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl PrintTarget {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
        }
    }
}

/// The stock target set: A3/A4/A5 portrait at 300 DPI.
///
/// | Name   | Paper | Pixels      |
/// |--------|-------|-------------|
/// | Large  | A3    | 3508 × 4961 |
/// | Medium | A4    | 2480 × 3508 |
/// | Small  | A5    | 1748 × 2480 |
pub fn default_targets() -> Vec<PrintTarget> {
    vec![
        PrintTarget::new("Large", 3508, 4961),
        PrintTarget::new("Medium", 2480, 3508),
        PrintTarget::new("Small", 1748, 2480),
    ]
}

/// Quality setting for lossy print encoding (1-100).
///
/// Defaults to 95 — print output tolerates very little compression loss,
/// especially around typography edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_are_ordered_large_to_small() {
        let targets = default_targets();
        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Large", "Medium", "Small"]);
    }

    #[test]
    fn default_targets_match_300dpi_a_series() {
        let targets = default_targets();
        assert_eq!((targets[0].width, targets[0].height), (3508, 4961));
        assert_eq!((targets[1].width, targets[1].height), (2480, 3508));
        assert_eq!((targets[2].width, targets[2].height), (1748, 2480));
    }

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(101).value(), 100);
    }

    #[test]
    fn quality_default_is_95() {
        assert_eq!(Quality::default().value(), 95);
    }
}
