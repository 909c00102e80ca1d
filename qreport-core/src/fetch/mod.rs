pub mod client;
pub mod issues;
pub mod summary;
pub mod traits;

pub use client::HttpSonarClient;
pub use issues::{IssueFetchOptions, fetch_issues, page_count};
pub use summary::{fetch_metrics, fetch_project, fetch_quality_gate};
pub use traits::SonarApi;

use tracing::{info, instrument};

use crate::config::ReportConfig;
use crate::progress::ProgressReporter;
use crate::types::ReportData;

/// Fetch metrics, project, quality gate and issues concurrently.
///
/// The first failure aborts the whole fetch.
#[instrument(skip_all, name = "fetch_all", fields(project = %project_key))]
pub async fn fetch_all(
    api: &dyn SonarApi,
    project_key: &str,
    config: &ReportConfig,
    progress: &dyn ProgressReporter,
) -> crate::error::Result<ReportData> {
    let options = IssueFetchOptions {
        page_size: config.server.page_size,
        concurrency: config.concurrency(),
    };

    let (metrics, project, gate, issues) = tokio::try_join!(
        fetch_metrics(api, project_key, &config.server.metric_keys),
        fetch_project(api, project_key),
        fetch_quality_gate(api, project_key),
        fetch_issues(api, project_key, options, progress),
    )?;

    info!(
        metrics = metrics.len(),
        issues = issues.len(),
        gate = gate.status.label(),
        "Server data fetched"
    );

    Ok(ReportData {
        metrics,
        project,
        gate,
        issues,
    })
}
