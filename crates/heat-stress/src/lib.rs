//! Daily heat-stress products derived from SST and the climatology baseline.
//!
//! Three products are computed for every day with satellite coverage:
//!
//! * **SST anomaly**: departure of the day's SST from the interpolated
//!   daily climatology.
//! * **Coral bleaching HotSpot**: positive departure from the Maximum
//!   Monthly Mean, the thermal ceiling above which corals accumulate
//!   stress. Negative departures clamp to zero.
//! * **Degree Heating Weeks**: HotSpots at or above the accumulation
//!   threshold, summed over a sliding 84-day window and scaled to
//!   degree-weeks.
//!
//! DHW is the operational bleaching predictor: four degree-weeks marks
//! the level where significant bleaching becomes likely, eight the level
//! where widespread bleaching and mortality are expected. The
//! [`alerts`] module maps DHW onto those levels and [`summary`] reduces
//! product rasters to regional statistics.

pub mod alerts;
pub mod config;
pub mod dhw;
pub mod products;
pub mod summary;

pub use alerts::{AlertLevel, ALERT_DHW, WARNING_DHW};
pub use config::DhwConfig;
pub use dhw::{accumulate_series, DhwAccumulator};
pub use products::{anomaly, hotspot, DailyProducts};
pub use summary::{DailySummary, RegionSummary};
