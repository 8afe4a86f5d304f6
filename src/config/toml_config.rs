use crate::core::catalog;
use crate::core::ConfigProvider;
use crate::domain::model::{ComparisonSpec, SeriesSpec, YearRange};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub monitoring: Option<MonitoringConfig>,
    /// Falls back to the built-in series when omitted.
    #[serde(default = "catalog::default_series")]
    pub series: Vec<SeriesSpec>,
    #[serde(default = "catalog::default_comparisons")]
    pub comparisons: Vec<ComparisonSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
    /// Comparison keys to render; empty renders all.
    #[serde(default)]
    pub comparisons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub offline: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_seconds: default_timeout_seconds(),
            offline: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn default_api_base() -> String {
    catalog::CSO_API_BASE.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_output_path() -> String {
    "./output".to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CSO_API_BASE})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static env var pattern")
        });

        re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn api_base(&self) -> &str {
        &self.source.api_base
    }

    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn series(&self) -> &[SeriesSpec] {
        &self.series
    }

    fn comparisons(&self) -> &[ComparisonSpec] {
        &self.comparisons
    }

    fn selected_comparisons(&self) -> &[String] {
        &self.report.comparisons
    }

    fn year_range(&self) -> Option<YearRange> {
        super::year_range_from(self.report.from_year, self.report.to_year)
    }

    fn offline(&self) -> bool {
        self.source.offline
    }

    fn timeout_seconds(&self) -> u64 {
        self.source.timeout_seconds
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("report.name", &self.report.name)?;
        if !self.source.offline {
            validation::validate_url("source.api_base", &self.source.api_base)?;
        }
        validation::validate_positive_number("source.timeout_seconds", self.source.timeout_seconds, 1)?;
        validation::validate_path("output.output_path", &self.output.output_path)?;
        validation::validate_year_range("report.from_year/to_year", self.report.from_year, self.report.to_year)?;
        super::validate_catalog(&self.series, &self.comparisons, &self.report.comparisons)
    }
}
