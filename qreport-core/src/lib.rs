//! qreport core library: server fetchers, chart rendering and HTML report.
//!
//! The main entry point is [`pipeline::ReportPipeline`], which runs
//! Fetch → Charts → HTML over any [`fetch::SonarApi`].

pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod types;
