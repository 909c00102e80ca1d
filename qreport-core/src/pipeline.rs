// Report pipeline: concurrent fetch, then charts, then HTML.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{info, instrument};

use crate::config::ReportConfig;
use crate::fetch::{self, SonarApi};
use crate::progress::ProgressReporter;
use crate::render::{ChartPaths, ReportDocument, render_charts, write_report};
use crate::types::ReportData;

/// What to report on and where to put the artifacts.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub project_key: String,
    pub charts_dir: PathBuf,
    pub output: PathBuf,
}

/// Summary of one report run.
#[derive(Debug, Clone)]
pub struct ReportStats {
    pub metric_count: usize,
    pub issue_count: usize,
    pub gate_status: String,
    pub charts: ChartPaths,
    pub output: PathBuf,
    pub duration: Duration,
}

/// Orchestrates one report run over a [`SonarApi`].
#[derive(Debug)]
pub struct ReportPipeline {
    config: ReportConfig,
}

impl ReportPipeline {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Fetch metrics, project, gate and issues concurrently.
    pub async fn fetch(
        &self,
        api: &dyn SonarApi,
        request: &ReportRequest,
        progress: &dyn ProgressReporter,
    ) -> crate::error::Result<ReportData> {
        fetch::fetch_all(api, &request.project_key, &self.config, progress).await
    }

    /// Write both charts, then the HTML page. Returns the chart paths.
    #[instrument(skip_all, name = "render_report", fields(output = %request.output.display()))]
    pub fn render(
        &self,
        data: &ReportData,
        request: &ReportRequest,
    ) -> crate::error::Result<ChartPaths> {
        let charts_cfg = &self.config.charts;
        let charts = render_charts(&data.metrics, &data.issues, &request.charts_dir, charts_cfg)?;

        let html = ReportDocument::new(
            data,
            &request.project_key,
            &request.charts_dir,
            &charts_cfg.bar_file,
            &charts_cfg.pie_file,
        )
        .with_escape_all_fields(self.config.html.escape_all_fields)
        .render(Local::now());

        write_report(&request.output, &html)?;
        info!(bytes = html.len(), "Report written");
        Ok(charts)
    }

    /// Fetch and render in one go.
    pub async fn run(
        &self,
        api: &dyn SonarApi,
        request: &ReportRequest,
        progress: &dyn ProgressReporter,
    ) -> crate::error::Result<ReportStats> {
        let start = Instant::now();
        let data = self.fetch(api, request, progress).await?;
        let charts = self.render(&data, request)?;

        let stats = ReportStats {
            metric_count: data.metrics.len(),
            issue_count: data.issues.len(),
            gate_status: data.gate.status.label().to_string(),
            charts,
            output: request.output.clone(),
            duration: start.elapsed(),
        };
        info!(
            metrics = stats.metric_count,
            issues = stats.issue_count,
            gate = %stats.gate_status,
            duration = ?stats.duration,
            "Report pipeline complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::traits::Query;
    use crate::progress::NoopReporter;
    use crate::types::{Metric, Project, QualityGate};
    use serde_json::json;

    struct Routes;

    #[async_trait::async_trait]
    impl SonarApi for Routes {
        async fn get_json(
            &self,
            path: &str,
            _query: &Query<'_>,
        ) -> crate::error::Result<serde_json::Value> {
            Ok(match path {
                "/api/measures/component" => json!({"component": {"measures": [
                    {"metric": "bugs", "value": "2"}
                ]}}),
                "/api/projects/search" => json!({"components": [{"key": "demo", "name": "Demo"}]}),
                "/api/qualitygates/project_status" => json!({"projectStatus": {"status": "OK"}}),
                _ => json!({"total": 1, "issues": [{"key": "I1", "type": "BUG", "message": "m"}]}),
            })
        }
    }

    fn request(dir: &std::path::Path) -> ReportRequest {
        ReportRequest {
            project_key: "demo".to_string(),
            charts_dir: dir.join("charts"),
            output: dir.join("report.html"),
        }
    }

    #[tokio::test]
    async fn run_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        let pipeline = ReportPipeline::new(ReportConfig::default());

        let stats = pipeline.run(&Routes, &req, &NoopReporter).await.unwrap();
        assert_eq!(stats.metric_count, 1);
        assert_eq!(stats.issue_count, 1);
        assert_eq!(stats.gate_status, "OK");
        assert!(stats.charts.bar.exists());
        assert!(stats.charts.pie.exists());

        let html = std::fs::read_to_string(&req.output).unwrap();
        assert!(html.contains("color: green"));
        assert!(html.contains("<td>I1</td>"));
    }

    #[test]
    fn render_honours_escape_config() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        let mut config = ReportConfig::default();
        config.html.escape_all_fields = true;
        config.charts.bar_file = "bars.svg".to_string();

        let data = ReportData {
            metrics: vec![Metric::new("bugs", "1")].into_iter().collect(),
            project: Project::default(),
            gate: QualityGate::default(),
            issues: vec![crate::types::Issue {
                key: "<k>".into(),
                severity: String::new(),
                issue_type: "BUG".into(),
                message: String::new(),
                component: String::new(),
                line: None,
                status: String::new(),
            }],
        };

        let charts = ReportPipeline::new(config).render(&data, &req).unwrap();
        assert!(charts.bar.ends_with("bars.svg"));

        let html = std::fs::read_to_string(&req.output).unwrap();
        assert!(html.contains("<td>&lt;k&gt;</td>"));
        assert!(html.contains("bars.svg"));
    }
}
