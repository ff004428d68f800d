use crate::analysis::build_report;
use crate::core::{ConfigProvider, DashboardReport, Pipeline, RawData, Storage};
use crate::render::export::{climate_csv, study_csv, CLIMATE_CSV, STUDY_CSV};
use crate::render::{render_dashboard, PageMode, RenderContext, FONT_ASSET};
use crate::sources::{load_climate_series, study};
use crate::utils::error::Result;
use chrono::{Local, NaiveDate, Utc};
use reqwest::Client;
use std::io::Write;
use std::time::Duration;
use zip::write::{FileOptions, ZipWriter};

pub const DASHBOARD_HTML: &str = "dashboard.html";
pub const BUNDLE_ZIP: &str = "dashboard_bundle.zip";

pub struct DashboardPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
    today: Option<NaiveDate>,
}

impl<S: Storage, C: ConfigProvider> DashboardPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs()))
            .build()?;
        Ok(Self {
            storage,
            config,
            client,
            today: None,
        })
    }

    /// Pin "today" for the future-date cut.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    async fn load_study(&self) -> Result<crate::core::StudyDataset> {
        match self.config.study_file() {
            Some(path) => {
                tracing::debug!("Reading study file: {}", path);
                let body = tokio::fs::read(path).await?;
                study::user_dataset(path, &body)
            }
            None => study::synthetic_dataset(),
        }
    }

    fn bundle(&self, html: &str, climate: &str, study: &str) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>(DASHBOARD_HTML, FileOptions::default())?;
        zip.write_all(html.as_bytes())?;

        zip.start_file::<_, ()>(CLIMATE_CSV, FileOptions::default())?;
        zip.write_all(climate.as_bytes())?;

        zip.start_file::<_, ()>(STUDY_CSV, FileOptions::default())?;
        zip.write_all(study.as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DashboardPipeline<S, C> {
    async fn extract(&self) -> Result<RawData> {
        let climate = load_climate_series(
            &self.client,
            self.config.noaa_endpoint(),
            self.today(),
            self.config.seed(),
        )
        .await;
        let study = self.load_study().await?;
        Ok(RawData { climate, study })
    }

    async fn transform(&self, data: RawData) -> Result<DashboardReport> {
        build_report(&data, &self.config.options(), Utc::now())
    }

    async fn load(&self, report: DashboardReport) -> Result<String> {
        let ctx = RenderContext::detect(PageMode::Static, self.config.font_path());
        let html = render_dashboard(&report, &ctx);
        let climate = climate_csv(&report.climate)?;
        let study = study_csv(&report.study)?;

        tracing::debug!("Writing {} ({} bytes)", DASHBOARD_HTML, html.len());
        self.storage.write_file(DASHBOARD_HTML, html.as_bytes()).await?;
        self.storage.write_file(CLIMATE_CSV, climate.as_bytes()).await?;
        self.storage.write_file(STUDY_CSV, study.as_bytes()).await?;

        if ctx.font.is_some() {
            let font = tokio::fs::read(self.config.font_path()).await?;
            self.storage.write_file(FONT_ASSET, &font).await?;
        }

        if self.config.bundle() {
            let zip_data = self.bundle(&html, &climate, &study)?;
            tracing::debug!("Writing {} ({} bytes)", BUNDLE_ZIP, zip_data.len());
            self.storage.write_file(BUNDLE_ZIP, &zip_data).await?;
        }

        Ok(format!("{}/{}", self.config.output_path(), DASHBOARD_HTML))
    }
}
