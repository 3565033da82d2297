//! Trend-corrected climatology baselines for coral heat-stress analysis.
//!
//! The climatology answers one question per cell: what would a typical SST
//! look like here, on this day of year, absent the long-term warming trend?
//! It is built in three steps:
//!
//! 1. For each calendar month, regress per-cell yearly means against the
//!    year and evaluate the fit at a fixed reference year. This removes the
//!    warming trend a plain multi-year average would bake in and re-centers
//!    the climatology on the reference epoch (Skirving methodology). The
//!    result is the Monthly Mean (MM), 12 rasters.
//! 2. Take the per-cell maximum of the 12 MM rasters: the Maximum Monthly
//!    Mean (MMM), the bleaching-relevant threshold.
//! 3. Interpolate the 12 monthly anchors into a daily baseline (DC) for
//!    every day of year 1-366, wrapping across the December-January
//!    boundary.
//!
//! [`ClimatologyBaseline`] bundles all three as an immutable value object,
//! computed once per (grid, baseline window) and shared by every downstream
//! analysis stage.

pub mod baseline;
pub mod config;
pub mod daily;
pub mod monthly;

pub use baseline::ClimatologyBaseline;
pub use config::ClimatologyConfig;
pub use daily::{DailyClimatology, ANCHOR_DAYS};
pub use monthly::{monthly_mean, MonthlyClimatology, MonthlyRegression, MIN_BASELINE_YEARS};
