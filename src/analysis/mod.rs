pub mod regression;
pub mod stats;
pub mod view;

pub use view::build_report;
