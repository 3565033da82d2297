//! Per-day anomaly and HotSpot derivation.

use chrono::NaiveDate;

use climatology::ClimatologyBaseline;
use reef_common::{Raster, ReefResult};

/// SST anomaly: the day's SST minus the interpolated daily climatology for
/// that day-of-year.
///
/// A cell that is no-data in either the SST raster or the climatology is
/// no-data in the anomaly.
pub fn anomaly(sst: &Raster, baseline: &ClimatologyBaseline, date: NaiveDate) -> ReefResult<Raster> {
    let daily = baseline.daily().for_date(date);
    sst.zip_map(daily, |s, c| s - c)
}

/// Coral bleaching HotSpot: positive departure of SST from the Maximum
/// Monthly Mean, clamped to zero below the MMM.
pub fn hotspot(sst: &Raster, baseline: &ClimatologyBaseline) -> ReefResult<Raster> {
    sst.zip_map(baseline.max_monthly_mean(), |s, m| (s - m).max(0.0))
}

/// The instantaneous products for one day, bundled for export.
///
/// DHW is not part of the bundle: it needs the trailing HotSpot window and
/// is produced by [`crate::dhw::DhwAccumulator`].
#[derive(Debug, Clone)]
pub struct DailyProducts {
    pub date: NaiveDate,
    pub sst: Raster,
    pub anomaly: Raster,
    pub hotspot: Raster,
}

impl DailyProducts {
    /// Derive anomaly and HotSpot for one day of SST.
    pub fn derive(
        date: NaiveDate,
        sst: Raster,
        baseline: &ClimatologyBaseline,
    ) -> ReefResult<Self> {
        let anomaly = anomaly(&sst, baseline, date)?;
        let hotspot = hotspot(&sst, baseline)?;
        Ok(Self {
            date,
            sst,
            anomaly,
            hotspot,
        })
    }
}

#[cfg(test)]
mod tests {
    use climatology::MonthlyClimatology;
    use test_utils::{assert_approx_eq, date, small_grid};

    use reef_common::ReefError;

    use super::*;

    /// Baseline with every Monthly Mean at `value`, so the daily curve and
    /// the MMM are both flat at `value`.
    fn flat_baseline(value: f32) -> ClimatologyBaseline {
        let months = (1..=12)
            .map(|_| Raster::filled(small_grid(), value))
            .collect();
        let monthly = MonthlyClimatology::new(months).unwrap();
        ClimatologyBaseline::from_monthly(monthly).unwrap()
    }

    #[test]
    fn test_anomaly_is_departure_from_daily_climatology() {
        let baseline = flat_baseline(27.0);
        let sst = Raster::filled(small_grid(), 28.5);

        let anom = anomaly(&sst, &baseline, date(2024, 2, 10)).unwrap();
        assert_approx_eq!(anom.get(0).unwrap(), 1.5, 1e-5);
    }

    #[test]
    fn test_anomaly_can_be_negative() {
        let baseline = flat_baseline(27.0);
        let sst = Raster::filled(small_grid(), 25.0);

        let anom = anomaly(&sst, &baseline, date(2024, 7, 1)).unwrap();
        assert_approx_eq!(anom.get(0).unwrap(), -2.0, 1e-5);
    }

    #[test]
    fn test_hotspot_clamps_below_mmm_to_zero() {
        let baseline = flat_baseline(28.0);

        let cool = hotspot(&Raster::filled(small_grid(), 26.0), &baseline).unwrap();
        assert_approx_eq!(cool.get(0).unwrap(), 0.0, 1e-6);

        let warm = hotspot(&Raster::filled(small_grid(), 29.3), &baseline).unwrap();
        assert_approx_eq!(warm.get(0).unwrap(), 1.3, 1e-5);
    }

    #[test]
    fn test_nodata_sst_propagates() {
        let baseline = flat_baseline(27.0);
        let mut sst = Raster::filled(small_grid(), 28.0);
        sst.clear(4);

        let products = DailyProducts::derive(date(2024, 1, 20), sst, &baseline).unwrap();
        assert_eq!(products.anomaly.get(4), None);
        assert_eq!(products.hotspot.get(4), None);
        assert!(products.anomaly.get(0).is_some());
    }

    #[test]
    fn test_foreign_grid_rejected() {
        let baseline = flat_baseline(27.0);
        let foreign = Raster::filled(test_utils::single_cell_grid(), 28.0);

        let result = anomaly(&foreign, &baseline, date(2024, 1, 1));
        assert!(matches!(result, Err(ReefError::GridMismatch { .. })));
    }
}
