use crate::adapters::cso::CsoClient;
use crate::core::report::{build_report, correlations_json, render_markdown, table_to_delimited};
use crate::core::series::extract_series;
use crate::core::{ConfigProvider, Pipeline, Storage, TransformResult};
use crate::domain::model::{CsoSource, MergedTable, SeriesSpec, YearSeries};
use crate::utils::error::{EtlError, Result};
use chrono::{SecondsFormat, Utc};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const REPORT_ARCHIVE: &str = "spurious_report.zip";

pub struct SpuriousPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) client: CsoClient,
}

impl<S: Storage, C: ConfigProvider> SpuriousPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = CsoClient::new(config.api_base(), config.timeout_seconds())?;
        Ok(Self {
            storage,
            config,
            client,
        })
    }

    async fn fetch_series(&self, name: &str, source: &CsoSource) -> Result<YearSeries> {
        let dataset = self.client.fetch_dataset(&source.table, &source.request).await?;
        let records = dataset.to_records(source.naming)?;
        extract_series(name, &records, source)
    }

    /// Live data first, bundled sample second; `None` when neither works.
    async fn resolve_series(&self, spec: &SeriesSpec) -> Option<YearSeries> {
        if let (false, Some(source)) = (self.config.offline(), &spec.cso) {
            match self.fetch_series(&spec.name, source).await {
                Ok(series) if !series.is_empty() => {
                    tracing::info!(
                        "✅ '{}' loaded from table {} ({} years)",
                        spec.name,
                        source.table,
                        series.points.len()
                    );
                    return Some(series);
                }
                Ok(_) => tracing::warn!(
                    "Table {} has no usable points for '{}'",
                    source.table,
                    spec.name
                ),
                Err(e) => tracing::warn!(
                    "⚠️ Fetching '{}' from table {} failed: {} (💡 {})",
                    spec.name,
                    source.table,
                    e,
                    e.recovery_suggestion()
                ),
            }
        }

        // 沒有 API 數據時改用內建樣本
        spec.sample.as_ref().map(|sample| {
            tracing::info!("Using bundled sample data for '{}'", spec.name);
            sample.to_series(&spec.name)
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SpuriousPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<YearSeries>> {
        let mut collected = Vec::new();

        for spec in self.config.series() {
            match self.resolve_series(spec).await {
                Some(series) => collected.push(series),
                None => tracing::warn!(
                    "Series '{}' unavailable; comparisons using it will be skipped",
                    spec.name
                ),
            }
        }

        if collected.is_empty() {
            return Err(EtlError::ProcessingError {
                message: "no configured series could be loaded".to_string(),
            });
        }

        Ok(collected)
    }

    async fn transform(&self, data: Vec<YearSeries>) -> Result<TransformResult> {
        let merged = MergedTable::outer_join(&data);
        let range = self.config.year_range();
        let selected = self.config.selected_comparisons();

        let reports: Vec<_> = self
            .config
            .comparisons()
            .iter()
            .filter(|c| selected.is_empty() || selected.contains(&c.key))
            .map(|c| build_report(c, self.config.series(), &merged, range))
            .collect();

        for report in &reports {
            match report.range_r {
                Some(r) => tracing::info!("📈 {}: r = {}", report.key, r),
                None => tracing::info!("📈 {}: r unavailable", report.key),
            }
        }

        let table = match range {
            Some(range) => merged.filter_years(range),
            None => merged,
        };
        let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        Ok(TransformResult {
            csv_output: table_to_delimited(&table, b',')?,
            tsv_output: table_to_delimited(&table, b'\t')?,
            markdown_output: render_markdown(&reports, &generated_at),
            merged: table,
            reports,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = format!("{}/{}", self.config.output_path(), REPORT_ARCHIVE);

        tracing::debug!(
            "Creating ZIP file with {} files",
            4 + result.reports.len()
        );

        // 創建ZIP文件
        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("merged.csv", FileOptions::default())?;
            zip.write_all(result.csv_output.as_bytes())?;

            zip.start_file::<_, ()>("merged.tsv", FileOptions::default())?;
            zip.write_all(result.tsv_output.as_bytes())?;

            zip.start_file::<_, ()>("correlations.json", FileOptions::default())?;
            let correlations = serde_json::to_string_pretty(&correlations_json(&result.reports))?;
            zip.write_all(correlations.as_bytes())?;

            zip.start_file::<_, ()>("report.md", FileOptions::default())?;
            zip.write_all(result.markdown_output.as_bytes())?;

            for report in &result.reports {
                zip.start_file::<_, ()>(
                    format!("{}.figure.json", report.key),
                    FileOptions::default(),
                )?;
                let figure = serde_json::to_string_pretty(&report.figure)?;
                zip.write_all(figure.as_bytes())?;
            }

            // 完成並取回底層 Vec<u8>
            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(REPORT_ARCHIVE, &zip_data).await?;

        Ok(output_path)
    }
}
