use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// 統計立方體的一個維度：名稱與有序的類別標籤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub categories: Vec<String>,
}

impl Dimension {
    pub fn new<N, I, S>(name: N, categories: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// 依 row-major 順序排列的維度，加上攤平的儲存格數值
///
/// `None` 代表缺值 (JSON `null`)，仍佔一個儲存格
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    pub dimensions: Vec<Dimension>,
    pub values: Vec<Option<f64>>,
}

impl Cube {
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(Dimension::len).collect()
    }
}

/// 攤平後的單一儲存格
///
/// 標籤保持維度順序，序列化為
/// `{"<dimension>": "<label>", ..., "value": <number|null>}`
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub labels: Vec<(String, String)>,
    pub value: Option<f64>,
}

impl Record {
    pub fn label(&self, dimension: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|(_, label)| label.as_str())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.labels.len() + 1))?;
        for (name, label) in &self.labels {
            map.serialize_entry(name, label)?;
        }
        map.serialize_entry("value", &self.value)?;
        map.end()
    }
}

/// 具名的年度序列，例如每年結婚數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSeries {
    pub name: String,
    pub points: BTreeMap<i32, f64>,
}

impl YearSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: BTreeMap::new(),
        }
    }

    pub fn from_points<I>(name: impl Into<String>, points: I) -> Self
    where
        I: IntoIterator<Item = (i32, f64)>,
    {
        Self {
            name: name.into(),
            points: points.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// 年份區間 (含頭尾)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub from: i32,
    pub to: i32,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        year >= self.from && year <= self.to
    }
}

/// 多個序列依年份做 outer join 的結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedTable {
    pub years: Vec<i32>,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStyle {
    Line,
    Bar,
}

/// 兩個序列之間的一份比較報表
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub key: String,
    pub title: String,
    pub left_label: String,
    pub right_label: String,
    pub years: Option<YearRange>,
    pub rows: Vec<(i32, Option<f64>, Option<f64>)>,
    /// 兩序列共有年份的相關係數 (已四捨五入)
    pub overall_r: Option<f64>,
    /// 選定年份區間內的相關係數 (已四捨五入)
    pub range_r: Option<f64>,
    pub headline: String,
    pub paragraphs: Vec<String>,
    pub caveat: String,
    pub figure: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub merged: MergedTable,
    pub reports: Vec<ComparisonReport>,
    pub csv_output: String,
    pub tsv_output: String,
    pub markdown_output: String,
}

/// 序列的資料來源設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub cso: Option<CsoSource>,
    /// 離線或 API 失敗時使用的內建數值
    #[serde(default)]
    pub sample: Option<SampleData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsoSource {
    pub table: String,
    #[serde(default = "default_year_dimension")]
    pub year_dimension: String,
    /// 維度名稱 -> 儲存格必須符合的類別標籤
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    /// 以 `query` 參數送出的伺服器端篩選
    #[serde(default)]
    pub request: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub aggregate: Aggregate,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub naming: DimensionNaming,
}

fn default_year_dimension() -> String {
    "Year".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleData {
    pub start_year: i32,
    pub values: Vec<f64>,
}

impl SampleData {
    /// 年份超出 i32 範圍的數值會被略過
    pub fn to_series(&self, name: &str) -> YearSeries {
        YearSeries::from_points(
            name,
            self.values.iter().enumerate().filter_map(|(offset, value)| {
                let year = i32::try_from(offset)
                    .ok()
                    .and_then(|offset| self.start_year.checked_add(offset))?;
                Some((year, *value))
            }),
        )
    }
}

/// 同一年有多個儲存格時的彙總方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    #[default]
    Single,
    Sum,
    Mean,
    Last,
}

/// 記錄欄位使用維度標籤 ("Year") 或維度代碼 ("TLIST(A1)")
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionNaming {
    #[default]
    Label,
    Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSpec {
    pub key: String,
    pub title: String,
    pub left: String,
    pub right: String,
    #[serde(default = "default_left_style")]
    pub left_style: TraceStyle,
    #[serde(default = "default_right_style")]
    pub right_style: TraceStyle,
    #[serde(default = "default_left_color")]
    pub left_color: String,
    #[serde(default = "default_right_color")]
    pub right_color: String,
    /// `{r}` 會被替換成四捨五入後的相關係數
    pub headline: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub caveat: String,
}

fn default_left_style() -> TraceStyle {
    TraceStyle::Line
}

fn default_right_style() -> TraceStyle {
    TraceStyle::Line
}

fn default_left_color() -> String {
    "#8B4513".to_string()
}

fn default_right_color() -> String {
    "#2E8B57".to_string()
}
