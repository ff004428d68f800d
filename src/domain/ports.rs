use crate::domain::model::{DashboardOptions, DashboardReport, RawData};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn noaa_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    /// `None` means the synthetic study dataset.
    fn study_file(&self) -> Option<&str>;
    fn request_timeout_secs(&self) -> u64;
    /// Seed for the fallback climate series; `None` draws from entropy.
    fn seed(&self) -> Option<u64>;
    fn font_path(&self) -> &str;
    fn bundle(&self) -> bool;
    fn options(&self) -> DashboardOptions;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RawData>;
    async fn transform(&self, data: RawData) -> Result<DashboardReport>;
    async fn load(&self, report: DashboardReport) -> Result<String>;
}
