//! Shared test utilities for the reef-heat-stress workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Approximate-equality macros for scalars and whole rasters
//! - Deterministic raster and series generators
//! - Common grid and date fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro comparing two rasters cell by cell.
///
/// Both rasters must agree on which cells are valid, and valid cells must
/// match within `epsilon`. Panics naming the first offending cell.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_raster_approx_eq;
///
/// assert_raster_approx_eq!(naive_dhw, sliding_dhw, 1e-3);
/// ```
#[macro_export]
macro_rules! assert_raster_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = &$left;
        let right = &$right;
        assert_eq!(
            left.len(),
            right.len(),
            "rasters differ in cell count: {} vs {}",
            left.len(),
            right.len()
        );
        for idx in 0..left.len() {
            match (left.get(idx), right.get(idx)) {
                (None, None) => {}
                (Some(l), Some(r)) => {
                    let diff = (l as f64 - r as f64).abs();
                    if diff > $epsilon as f64 {
                        panic!(
                            "rasters differ at cell {}: left `{:?}`, right `{:?}`, diff `{:?}`",
                            idx, l, r, diff
                        );
                    }
                }
                (l, r) => panic!(
                    "validity differs at cell {}: left `{:?}`, right `{:?}`",
                    idx, l, r
                ),
            }
        }
    }};
}
