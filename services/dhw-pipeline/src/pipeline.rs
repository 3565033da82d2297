//! Pipeline orchestration over the configured source and sink.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use climatology::{
    monthly_mean, ClimatologyBaseline, MonthlyClimatology, MonthlyRegression,
};
use heat_stress::alerts::alert_counts;
use heat_stress::{DailyProducts, DailySummary, DhwAccumulator};
use reef_common::{DateRange, GridSeries, Raster};
use reef_export::{BaselineStore, ExportSink, ZarrExportSink};
use sst_source::{SstSource, SyntheticSource, ZarrSstSource};

use crate::config::{PipelineConfig, SourceConfig};

/// Days the upstream archive is allowed to lag before a run gives up.
const MAX_ARCHIVE_LAG_DAYS: u32 = 2;

/// The heat-stress pipeline: climatology precompute, daily product runs,
/// backfill and annual composites, all against one source and one sink.
pub struct DhwPipeline {
    config: PipelineConfig,
    source: Arc<dyn SstSource>,
    sink: Arc<dyn ExportSink>,
    baseline_store: BaselineStore,
}

impl DhwPipeline {
    /// Wire the pipeline from configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let source: Arc<dyn SstSource> = match &config.source {
            SourceConfig::Synthetic => {
                info!("using synthetic SST source");
                Arc::new(SyntheticSource::new("sst", config.region.grid()))
            }
            SourceConfig::Zarr { root, path } => {
                info!(root = %root.display(), path = %path, "using zarr SST archive");
                Arc::new(ZarrSstSource::open_filesystem(root, path)?)
            }
        };

        let sink = Arc::new(ZarrExportSink::filesystem(
            &config.output.store_root,
            config.export.clone(),
        )?);

        Ok(Self::new(config.clone(), source, sink))
    }

    /// Wire the pipeline from explicit collaborators.
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn SstSource>,
        sink: Arc<dyn ExportSink>,
    ) -> Self {
        let baseline_store = BaselineStore::new(sink.clone());
        Self {
            config,
            source,
            sink,
            baseline_store,
        }
    }

    /// Estimate the climatology baseline and persist it through the sink.
    ///
    /// Source data is fetched one calendar month of one year at a time, so
    /// a full 28-year precompute never holds more than a month of rasters
    /// alongside the regression accumulators. Re-running overwrites any
    /// baseline already stored.
    #[instrument(skip(self))]
    pub async fn precompute(&self) -> Result<()> {
        let window = self.config.climatology.clone();
        let bbox = self.config.region.bounding_box();

        if self.baseline_store.exists().await? {
            info!("baseline already present, recomputing");
        }

        info!(
            start = window.baseline_start,
            end = window.baseline_end,
            reference = window.reference_year,
            "estimating climatology baseline"
        );

        // An empty fetch still reports the cell-aligned grid the source
        // serves for this region.
        let first_day = DateRange::year(window.baseline_start)?.start;
        let probe = self
            .source
            .fetch(&bbox, DateRange::single(first_day))
            .await?;
        let grid = *probe.grid();

        let mut months = Vec::with_capacity(12);
        for month in 1..=12 {
            let mut regression = MonthlyRegression::new(grid);
            for year in window.years() {
                let range = DateRange::month(year, month)?;
                let series = self.source.fetch(&bbox, range).await?;
                if series.is_empty() {
                    debug!(year, month, "no source days in month");
                    continue;
                }
                let yearly = monthly_mean(&series, year, month)?;
                regression.add_year(year, &yearly)?;
            }
            months.push(regression.evaluate(window.reference_year)?);
            debug!(month, "monthly mean fitted");
        }

        let monthly = MonthlyClimatology::new(months)?;
        let baseline = ClimatologyBaseline::from_monthly(monthly)?;
        self.baseline_store.save(&baseline, &window).await?;

        info!(grid = %grid.describe(), "climatology baseline persisted");
        Ok(())
    }

    /// Produce one day of products, defaulting to today and falling back
    /// across the archive's publication lag.
    #[instrument(skip(self))]
    pub async fn run(&self, date: Option<NaiveDate>) -> Result<()> {
        let baseline = self.load_baseline().await?;
        let requested = date.unwrap_or_else(|| Utc::now().date_naive());
        let target = self.resolve_available_date(requested).await?;
        self.process_range(&baseline, DateRange::single(target))
            .await
    }

    /// Produce products for every day of an inclusive range, skipping days
    /// already in the store.
    #[instrument(skip(self, range), fields(start = %range.start, end = %range.end))]
    pub async fn backfill(&self, range: DateRange) -> Result<()> {
        let baseline = self.load_baseline().await?;
        info!(days = range.num_days(), "backfilling products");
        self.process_range(&baseline, range).await
    }

    /// Composite the annual maximum DHW from the stored daily rasters.
    ///
    /// The composite is persisted under `dhw_annual_max`, dated 31 December
    /// of the year.
    #[instrument(skip(self))]
    pub async fn annual_max(&self, year: i32) -> Result<()> {
        let range = DateRange::year(year)?;
        let mut series: Option<GridSeries> = None;
        let mut days = 0_usize;

        for date in range.iter() {
            if let Some(raster) = self.sink.load_raster("dhw", date).await? {
                let entry =
                    series.get_or_insert_with(|| GridSeries::new("dhw", *raster.grid()));
                entry.insert(date, raster)?;
                days += 1;
            }
        }

        let composite = series
            .map(|s| s.max_composite())
            .transpose()?
            .flatten()
            .with_context(|| format!("no dhw rasters stored for {year}, run backfill first"))?;

        let label = range.end;
        self.sink
            .persist_raster("dhw_annual_max", label, &composite)
            .await?;
        info!(year, days, date = %label, "annual maximum DHW composite persisted");
        Ok(())
    }

    async fn load_baseline(&self) -> Result<ClimatologyBaseline> {
        if let Some(stored) = self.baseline_store.stored_window().await? {
            let configured = &self.config.climatology;
            if stored.baseline_start != configured.baseline_start
                || stored.baseline_end != configured.baseline_end
            {
                warn!(
                    stored_start = stored.baseline_start,
                    stored_end = stored.baseline_end,
                    configured_start = configured.baseline_start,
                    configured_end = configured.baseline_end,
                    "stored baseline window differs from configuration"
                );
            }
        }

        self.baseline_store
            .load()
            .await
            .context("loading climatology baseline, run the precompute command first")
    }

    /// The most recent day at or before `requested` the source covers.
    async fn resolve_available_date(&self, requested: NaiveDate) -> Result<NaiveDate> {
        let mut candidate = requested;
        for _ in 0..=MAX_ARCHIVE_LAG_DAYS {
            if self.source.has_data(candidate).await? {
                if candidate != requested {
                    info!(
                        requested = %requested,
                        using = %candidate,
                        "source lags, using latest available day"
                    );
                }
                return Ok(candidate);
            }
            debug!(date = %candidate, "source has no data yet");
            candidate = candidate
                .pred_opt()
                .ok_or_else(|| anyhow::anyhow!("date underflow before {requested}"))?;
        }
        bail!("no source data for {requested} or the {MAX_ARCHIVE_LAG_DAYS} days before it")
    }

    /// Derive and export products for every day of `output`.
    ///
    /// The source window starts `window_days - 1` days earlier so the first
    /// output day already has a full accumulation window behind it. Days
    /// whose DHW is already stored are skipped, which makes long backfills
    /// resumable.
    async fn process_range(
        &self,
        baseline: &ClimatologyBaseline,
        output: DateRange,
    ) -> Result<()> {
        let dhw_config = self.config.dhw.clone();
        let lookback = dhw_config.window_days.saturating_sub(1) as u32;
        let fetch_range = output.with_lookback(lookback);

        let sst = self
            .source
            .fetch(&self.config.region.bounding_box(), fetch_range)
            .await?;
        debug!(
            days = sst.len(),
            start = %fetch_range.start,
            end = %fetch_range.end,
            "fetched source window"
        );

        let mut accumulator = DhwAccumulator::new(*sst.grid(), dhw_config);
        let mut exported = 0_usize;
        let mut skipped = 0_usize;
        let mut missing = 0_usize;

        for date in fetch_range.iter() {
            let raster = match sst.get(date) {
                Some(raster) => raster,
                None => {
                    accumulator.advance_missing();
                    if output.contains(date) {
                        warn!(%date, "no source coverage, day not exported");
                        missing += 1;
                    }
                    continue;
                }
            };

            let products = DailyProducts::derive(date, raster.clone(), baseline)?;
            let dhw = accumulator.advance(&products.hotspot)?;

            if !output.contains(date) {
                continue;
            }

            if self.sink.exists("dhw", date).await? {
                debug!(%date, "products already exported, skipping");
                skipped += 1;
                continue;
            }

            self.export_day(&products, dhw.as_ref()).await?;
            exported += 1;
        }

        info!(exported, skipped, missing, "export range complete");
        Ok(())
    }

    async fn export_day(&self, products: &DailyProducts, dhw: Option<&Raster>) -> Result<()> {
        let date = products.date;
        self.sink.persist_raster("sst", date, &products.sst).await?;
        self.sink
            .persist_raster("anomaly", date, &products.anomaly)
            .await?;
        self.sink
            .persist_raster("hotspot", date, &products.hotspot)
            .await?;

        let mut row = DailySummary::new(date)
            .with_sst(&products.sst)
            .with_anomaly(&products.anomaly);

        match dhw {
            Some(dhw) => {
                self.sink.persist_raster("dhw", date, dhw).await?;
                row = row.with_dhw(dhw);

                let counts = alert_counts(dhw);
                if counts.alert > 0 {
                    warn!(%date, cells = counts.alert, "DHW at alert level, widespread bleaching likely");
                } else if counts.warning > 0 {
                    info!(%date, cells = counts.warning, "DHW at warning level, bleaching possible");
                }
            }
            None => {
                debug!(%date, "accumulation window still warming up, no dhw for day");
            }
        }

        self.append_summary(&row).await
    }

    /// Append one summary row to the JSONL journal.
    async fn append_summary(&self, row: &DailySummary) -> Result<()> {
        let path = &self.config.output.summary_file;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(row)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("opening summary file {}", path.display()))?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}
