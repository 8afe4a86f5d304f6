use crate::domain::model::{ComparisonSpec, SeriesSpec, TransformResult, YearRange, YearSeries};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base(&self) -> &str;
    fn output_path(&self) -> &str;
    fn series(&self) -> &[SeriesSpec];
    fn comparisons(&self) -> &[ComparisonSpec];
    /// Comparison keys to render; empty renders all of them.
    fn selected_comparisons(&self) -> &[String];
    fn year_range(&self) -> Option<YearRange>;
    fn offline(&self) -> bool;
    fn timeout_seconds(&self) -> u64;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<YearSeries>>;
    async fn transform(&self, data: Vec<YearSeries>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
