//! Integration test: the sliding DHW accumulator against a naive
//! per-window recompute over a season of HotSpot data with coverage gaps,
//! plus the full SST -> products -> DHW -> alert chain.

use chrono::{Datelike, NaiveDate};

use climatology::{ClimatologyBaseline, MonthlyClimatology};
use heat_stress::alerts::{alert_counts, exceedance_mask};
use heat_stress::{
    accumulate_series, AlertLevel, DailyProducts, DhwAccumulator, DhwConfig, RegionSummary,
    WARNING_DHW,
};
use reef_common::{DateRange, Grid, GridSeries, Raster};
use test_utils::{assert_approx_eq, assert_raster_approx_eq, constant_series, date, small_grid};

/// The window re-summed from scratch, the reference semantics the sliding
/// accumulator must reproduce: threshold per day per cell, any gap in the
/// window makes the cell no-data.
fn naive_dhw(hotspots: &GridSeries, config: &DhwConfig, day: NaiveDate) -> Raster {
    let grid = *hotspots.grid();
    let window = DateRange::single(day).with_lookback(config.window_days as u32 - 1);

    let mut out = Raster::nodata(grid);
    for idx in 0..grid.len() {
        let mut sum = 0.0_f64;
        let mut complete = true;
        for d in window.iter() {
            match hotspots.get(d).and_then(|r| r.get(idx)) {
                Some(v) if v >= config.hotspot_threshold => sum += v as f64,
                Some(_) => {}
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            out.set(idx, (sum / 7.0) as f32);
        }
    }
    out
}

/// A sinusoidal stress pulse that crosses the accumulation threshold in
/// late summer, cooler row by row so cells disagree.
fn pulse(day: NaiveDate, idx: usize) -> f32 {
    let doy = day.ordinal() as f32;
    let seasonal = 1.9 * (std::f32::consts::PI * doy / 180.0).sin();
    (seasonal - 0.15 * (idx / 4) as f32).max(0.0)
}

/// Half a year of HotSpots with both kinds of gap: one date entirely
/// absent from the series and one cloud hole at a single cell.
fn gappy_season(grid: Grid) -> GridSeries {
    let span = DateRange::new(date(1998, 1, 1), date(1998, 7, 31)).expect("season span");
    let mut series = GridSeries::new("hotspot", grid);

    for day in span.iter() {
        if day == date(1998, 2, 1) {
            continue;
        }
        let mut raster = Raster::nodata(grid);
        for idx in 0..grid.len() {
            if idx == 0 && day == date(1998, 4, 20) {
                continue;
            }
            raster.set(idx, pulse(day, idx));
        }
        series.insert(day, raster).expect("distinct days");
    }
    series
}

#[test]
fn test_sliding_window_matches_naive_recompute() {
    let grid = small_grid();
    let config = DhwConfig::default();
    let hotspots = gappy_season(grid);

    // The first output day's window reaches back to the start of the feed.
    let output = DateRange::new(date(1998, 3, 25), date(1998, 7, 31)).expect("output range");
    let dhw = accumulate_series(&hotspots, &config, output).expect("accumulate");

    assert_eq!(dhw.len() as i64, output.num_days());
    for day in output.iter() {
        let expected = naive_dhw(&hotspots, &config, day);
        let got = dhw.get(day).expect("a raster for every output day");
        assert_raster_approx_eq!(got, expected, 1e-4);
    }

    // The Feb 1 outage silences every cell while it sits in the window.
    assert_eq!(dhw.get(date(1998, 4, 25)).expect("raster").valid_count(), 0);

    // One day later it has slid out; only the Apr 20 hole still silences
    // cell 0.
    let after = dhw.get(date(1998, 4, 26)).expect("raster");
    assert_eq!(after.get(0), None);
    assert_eq!(after.valid_count(), grid.len() - 1);

    // By mid-July both gaps are out of every window.
    assert_eq!(
        dhw.get(date(1998, 7, 13)).expect("raster").valid_count(),
        grid.len()
    );
}

#[test]
fn test_sustained_stress_hits_the_textbook_value() {
    // Twelve weeks of 1.4 degree HotSpots accumulate to 16.8 degree-weeks.
    let grid = small_grid();
    let config = DhwConfig::default();
    let span = DateRange::new(date(1998, 1, 1), date(1998, 4, 30)).expect("span");
    let hotspots = constant_series("hotspot", grid, span, 1.4);

    let output = DateRange::new(date(1998, 3, 25), date(1998, 4, 30)).expect("output range");
    let dhw = accumulate_series(&hotspots, &config, output).expect("accumulate");

    for entry in dhw.iter() {
        assert_raster_approx_eq!(entry.raster, Raster::filled(grid, 16.8), 1e-4);
    }

    // 16.8 degree-weeks is deep into alert territory.
    let counts = alert_counts(dhw.get(date(1998, 4, 30)).expect("last day"));
    assert_eq!(counts.alert, grid.len());
    assert_eq!(counts.warning + counts.no_stress + counts.no_data, 0);
}

#[test]
fn test_full_chain_from_sst_to_alert_levels() {
    let grid = small_grid();

    // Flat 28 degree baseline: every monthly mean, the MMM and the whole
    // daily curve sit at 28.
    let months: Vec<Raster> = (1..=12).map(|_| Raster::filled(grid, 28.0)).collect();
    let monthly = MonthlyClimatology::new(months).expect("12 months");
    let baseline = ClimatologyBaseline::from_monthly(monthly).expect("baseline");

    let span = DateRange::new(date(1998, 1, 1), date(1998, 3, 31)).expect("span");
    let mut accumulator = DhwAccumulator::new(grid, DhwConfig::default());

    let mut last = None;
    for day in span.iter() {
        let sst = Raster::filled(grid, 29.5);
        let products = DailyProducts::derive(day, sst, &baseline).expect("derive");

        assert_approx_eq!(products.anomaly.get(0).expect("anomaly"), 1.5, 1e-5);
        assert_approx_eq!(products.hotspot.get(0).expect("hotspot"), 1.5, 1e-5);

        if let Some(dhw) = accumulator.advance(&products.hotspot).expect("advance") {
            last = Some(dhw);
        }
    }

    // 84 days of 1.5 degree HotSpots: DHW = 84 * 1.5 / 7 = 18.
    let dhw = last.expect("window filled after 90 days");
    assert_raster_approx_eq!(dhw, Raster::filled(grid, 18.0), 1e-4);
    assert_eq!(AlertLevel::from_dhw(dhw.get(0).expect("cell")), AlertLevel::Alert);

    // Every cell exceeds the warning threshold.
    let mask = exceedance_mask(&dhw, WARNING_DHW);
    assert_approx_eq!(mask.get(0).expect("mask"), 1.0, 1e-9);
    assert_eq!(mask.valid_count(), grid.len());

    // The published regional summary reduces to the same number.
    let summary = RegionSummary::of(&dhw).expect("valid cells");
    assert_approx_eq!(summary.mean, 18.0, 1e-3);
    assert_eq!(summary.count, grid.len() as u32);
    assert_approx_eq!(summary.std_dev, 0.0, 1e-6);
}
