//! Integration test: estimate a trend-corrected climatology from a
//! multi-year synthetic SST series and expand it into the daily baseline.
//!
//! The series is built so every stage has a closed-form answer: daily SST
//! is constant within a calendar month at
//! `base(cell) + seasonal(month) + trend * (year - reference)`, so each
//! month's yearly means lie exactly on a line and the regression evaluated
//! at the reference year must recover `base + seasonal` with the warming
//! trend removed.

use chrono::Datelike;

use climatology::{
    monthly_mean, ClimatologyBaseline, ClimatologyConfig, MonthlyClimatology, MonthlyRegression,
    ANCHOR_DAYS,
};
use reef_common::{DateRange, Grid, GridSeries};
use test_utils::{assert_approx_eq, assert_raster_approx_eq, date, series_from_fn, small_grid};

/// January-peaked seasonal cycle, southern-hemisphere style.
const SEASONAL: [f32; 12] = [
    1.5, 1.2, 0.6, 0.0, -0.8, -1.5, -1.8, -1.4, -0.6, 0.2, 0.9, 1.4,
];

fn test_config() -> ClimatologyConfig {
    ClimatologyConfig {
        baseline_start: 1985,
        baseline_end: 1989,
        reference_year: 1987.0,
    }
}

fn cell_base(idx: usize) -> f32 {
    20.0 + 0.5 * idx as f32
}

/// Five years of daily SST: a fixed per-cell base, the seasonal cycle, and
/// a linear warming trend centered on the reference year.
fn trending_series(grid: Grid, config: &ClimatologyConfig, trend_per_year: f32) -> GridSeries {
    let range = DateRange::new(
        date(config.baseline_start, 1, 1),
        date(config.baseline_end, 12, 31),
    )
    .expect("baseline range");
    let reference = config.reference_year as f32;

    series_from_fn("sst", grid, range, move |day, idx| {
        let years_out = day.year() as f32 - reference;
        Some(cell_base(idx) + SEASONAL[day.month0() as usize] + trend_per_year * years_out)
    })
}

#[test]
fn test_regression_recovers_monthly_means_at_reference_year() {
    let grid = small_grid();
    let config = test_config();
    let series = trending_series(grid, &config, 0.08);

    let monthly = MonthlyClimatology::estimate(&series, &config).expect("estimate");

    for month in 1..=12_u32 {
        let raster = monthly.month(month);
        for idx in 0..grid.len() {
            let expected = cell_base(idx) + SEASONAL[month as usize - 1];
            assert_approx_eq!(raster.get(idx).expect("valid cell"), expected, 1e-3);
        }
    }

    println!(
        "Trend correction verified for {} cells x 12 months",
        grid.len()
    );
}

#[test]
fn test_monthly_means_do_not_depend_on_the_warming_trend() {
    let grid = small_grid();
    let config = test_config();

    let flat =
        MonthlyClimatology::estimate(&trending_series(grid, &config, 0.0), &config).expect("flat");
    let warming = MonthlyClimatology::estimate(&trending_series(grid, &config, 0.12), &config)
        .expect("warming");

    for month in 1..=12_u32 {
        assert_raster_approx_eq!(flat.month(month), warming.month(month), 1e-3);
    }
}

#[test]
fn test_streaming_regression_matches_one_shot_estimate() {
    // The service feeds the regression one (year, month) mean at a time to
    // keep memory bounded; the answer must match the one-shot driver.
    let grid = small_grid();
    let config = test_config();
    let series = trending_series(grid, &config, 0.08);

    let one_shot = MonthlyClimatology::estimate(&series, &config).expect("estimate");

    for month in 1..=12_u32 {
        let mut regression = MonthlyRegression::new(grid);
        for year in config.years() {
            let yearly = monthly_mean(&series, year, month).expect("yearly mean");
            regression.add_year(year, &yearly).expect("add year");
        }
        let streamed = regression.evaluate(config.reference_year).expect("evaluate");

        assert_raster_approx_eq!(streamed, one_shot.month(month), 1e-6);
    }
}

#[test]
fn test_baseline_bundle_carries_anchors_and_maximum() {
    let grid = small_grid();
    let config = test_config();
    let series = trending_series(grid, &config, 0.05);

    let baseline = ClimatologyBaseline::compute(&series, &config).expect("baseline");

    // The daily curve reproduces each monthly mean at its anchor day.
    for (month0, anchor) in ANCHOR_DAYS.iter().enumerate() {
        assert_raster_approx_eq!(
            baseline.daily().for_day(*anchor),
            baseline.monthly().months()[month0],
            1e-6
        );
    }

    // January carries the seasonal peak, so the MMM is the January mean.
    assert_raster_approx_eq!(baseline.max_monthly_mean(), baseline.monthly().month(1), 1e-6);

    // Day 366 and day 1 sit on the same December-January segment.
    assert_raster_approx_eq!(baseline.daily().for_day(366), baseline.daily().for_day(1), 1e-6);
}

#[test]
fn test_observation_gaps_stay_cell_local() {
    let grid = small_grid();
    let config = test_config();
    let range = DateRange::new(
        date(config.baseline_start, 1, 1),
        date(config.baseline_end, 12, 31),
    )
    .expect("baseline range");

    // Cell 0 never reports in March; everything else is complete.
    let series = series_from_fn("sst", grid, range, |day, idx| {
        if idx == 0 && day.month() == 3 {
            return None;
        }
        Some(cell_base(idx) + SEASONAL[day.month0() as usize])
    });

    let baseline = ClimatologyBaseline::compute(&series, &config).expect("baseline");

    // March is no-data at the gap cell only.
    assert_eq!(baseline.monthly().month(3).get(0), None);
    assert!(baseline.monthly().month(3).get(1).is_some());

    // Days interpolating from March inherit the gap at that cell.
    assert_eq!(baseline.daily().for_day(74).get(0), None);
    assert_eq!(baseline.daily().for_day(60).get(0), None);
    assert!(baseline.daily().for_day(135).get(0).is_some());

    // The maximum still exists there, taken over the eleven valid months.
    assert_approx_eq!(
        baseline.max_monthly_mean().get(0).expect("mmm"),
        cell_base(0) + SEASONAL[0],
        1e-3
    );
}
