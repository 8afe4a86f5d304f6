pub mod cli;
pub mod toml_config;

use crate::core::catalog;
use crate::core::ConfigProvider;
use crate::domain::model::{ComparisonSpec, SampleData, SeriesSpec, YearRange};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "spurious-ireland"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Correlate unrelated Irish statistics, because numbers moving together proves nothing")
)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    #[cfg_attr(feature = "cli", arg(long, default_value = catalog::CSO_API_BASE))]
    pub api_base: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = "./output"))]
    pub output_path: String,

    #[cfg_attr(feature = "cli", arg(long, help = "First year of the comparison window"))]
    pub from_year: Option<i32>,

    #[cfg_attr(feature = "cli", arg(long, help = "Last year of the comparison window"))]
    pub to_year: Option<i32>,

    #[cfg_attr(
        feature = "cli",
        arg(long = "comparison", value_delimiter = ',', help = "Comparison keys to render (default: all)")
    )]
    pub comparisons_selected: Vec<String>,

    #[cfg_attr(feature = "cli", arg(long, help = "Skip the CSO API and use bundled sample data"))]
    pub offline: bool,

    #[cfg_attr(feature = "cli", arg(long, default_value = "30"))]
    pub timeout_seconds: u64,

    #[cfg_attr(feature = "cli", arg(long, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Emit logs as JSON"))]
    pub json_logs: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Log process CPU and memory per phase"))]
    pub monitor: bool,

    #[cfg_attr(feature = "cli", arg(skip = catalog::default_series()))]
    #[serde(default = "catalog::default_series")]
    pub series: Vec<SeriesSpec>,

    #[cfg_attr(feature = "cli", arg(skip = catalog::default_comparisons()))]
    #[serde(default = "catalog::default_comparisons")]
    pub comparisons: Vec<ComparisonSpec>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_base: catalog::CSO_API_BASE.to_string(),
            output_path: "./output".to_string(),
            from_year: None,
            to_year: None,
            comparisons_selected: Vec::new(),
            offline: false,
            timeout_seconds: 30,
            verbose: false,
            json_logs: false,
            monitor: false,
            series: catalog::default_series(),
            comparisons: catalog::default_comparisons(),
        }
    }
}

/// Both ends open means the whole table; one end open is filled from the data.
pub(crate) fn year_range_from(from: Option<i32>, to: Option<i32>) -> Option<YearRange> {
    match (from, to) {
        (None, None) => None,
        (from, to) => Some(YearRange {
            from: from.unwrap_or(i32::MIN),
            to: to.unwrap_or(i32::MAX),
        }),
    }
}

/// Selected keys must name a configured comparison, whose series must exist.
pub(crate) fn validate_catalog(
    series: &[SeriesSpec],
    comparisons: &[ComparisonSpec],
    selected: &[String],
) -> Result<()> {
    validation::validate_unique_names("series", series.iter().map(|s| s.name.as_str()))?;
    validation::validate_unique_names("comparisons", comparisons.iter().map(|c| c.key.as_str()))?;

    for spec in series {
        validation::validate_non_empty_string("series.name", &spec.name)?;
        if spec.cso.is_none() && spec.sample.is_none() {
            return Err(EtlError::ConfigValidationError {
                field: format!("series.{}", spec.name),
                message: "series needs a cso source, sample data, or both".to_string(),
            });
        }
        if let Some(sample) = &spec.sample {
            validate_sample(&spec.name, sample)?;
        }
    }

    for comparison in comparisons {
        for side in [&comparison.left, &comparison.right] {
            if !series.iter().any(|s| &s.name == side) {
                return Err(EtlError::InvalidConfigValueError {
                    field: format!("comparisons.{}", comparison.key),
                    value: side.clone(),
                    reason: "Unknown series".to_string(),
                });
            }
        }
    }

    for key in selected {
        if !comparisons.iter().any(|c| &c.key == key) {
            let known: Vec<&str> = comparisons.iter().map(|c| c.key.as_str()).collect();
            return Err(EtlError::InvalidConfigValueError {
                field: "comparison".to_string(),
                value: key.clone(),
                reason: format!("Unknown comparison. Known comparisons: {}", known.join(", ")),
            });
        }
    }

    Ok(())
}

/// 樣本的每一年都必須落在允許的年份範圍內，數值必須是有限數
fn validate_sample(series_name: &str, sample: &SampleData) -> Result<()> {
    let field = format!("series.{}.sample", series_name);
    validation::validate_range(
        &format!("{}.start_year", field),
        sample.start_year,
        validation::MIN_YEAR,
        validation::MAX_YEAR,
    )?;

    let span = i64::try_from(sample.values.len().saturating_sub(1)).unwrap_or(i64::MAX);
    let last_year = i64::from(sample.start_year).saturating_add(span);
    validation::validate_range(
        &format!("{}.last_year", field),
        last_year,
        i64::from(validation::MIN_YEAR),
        i64::from(validation::MAX_YEAR),
    )?;

    if let Some(value) = sample.values.iter().find(|v| !v.is_finite()) {
        return Err(EtlError::InvalidConfigValueError {
            field: format!("{}.values", field),
            value: value.to_string(),
            reason: "Sample values must be finite numbers".to_string(),
        });
    }

    Ok(())
}

impl ConfigProvider for CliConfig {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn series(&self) -> &[SeriesSpec] {
        &self.series
    }

    fn comparisons(&self) -> &[ComparisonSpec] {
        &self.comparisons
    }

    fn selected_comparisons(&self) -> &[String] {
        &self.comparisons_selected
    }

    fn year_range(&self) -> Option<YearRange> {
        year_range_from(self.from_year, self.to_year)
    }

    fn offline(&self) -> bool {
        self.offline
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if !self.offline {
            validation::validate_url("api_base", &self.api_base)?;
        }
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validation::validate_year_range("from_year/to_year", self.from_year, self.to_year)?;
        validate_catalog(&self.series, &self.comparisons, &self.comparisons_selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CliConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.year_range(), None);
        assert_eq!(config.series().len(), 4);
    }

    #[test]
    fn test_unknown_comparison_is_rejected() {
        let config = CliConfig {
            comparisons_selected: vec!["potato_gdp".to_string()],
            ..CliConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_half_open_year_range() {
        let config = CliConfig {
            from_year: Some(2015),
            ..CliConfig::default()
        };
        let range = config.year_range().unwrap();
        assert!(range.contains(2023));
        assert!(!range.contains(2014));
    }

    #[test]
    fn test_inverted_year_range_is_rejected() {
        let config = CliConfig {
            from_year: Some(2020),
            to_year: Some(2012),
            ..CliConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_parse_cli_flags() {
        let config = CliConfig::parse_from([
            "spurious-ireland",
            "--offline",
            "--from-year",
            "2012",
            "--comparison",
            "marriages_gdp,potato_migration",
        ]);
        assert!(config.offline);
        assert_eq!(config.from_year, Some(2012));
        assert_eq!(config.comparisons_selected, vec!["marriages_gdp", "potato_migration"]);
        assert_eq!(config.api_base, catalog::CSO_API_BASE);
        assert_eq!(config.comparisons.len(), 2);
    }
}
