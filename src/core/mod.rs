pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{
    ClimateSeries, DashboardOptions, DashboardReport, DataOrigin, RawData, StudyDataset,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
