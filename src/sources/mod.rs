pub mod noaa;
pub mod study;

pub use noaa::{load_climate_series, DEFAULT_NOAA_ENDPOINT};
