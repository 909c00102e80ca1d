// Integration test utilities: an in-memory code-quality server and report helpers.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{Value, json};

use qreport_core::config::ReportConfig;
use qreport_core::error::FetchError;
use qreport_core::fetch::SonarApi;
use qreport_core::fetch::traits::Query;
use qreport_core::pipeline::{ReportPipeline, ReportRequest, ReportStats};
use qreport_core::progress::NoopReporter;

/// One request seen by [`MockSonar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory stand-in for the server's REST API.
///
/// Issue search honours `ps`/`p` paging over the configured issue list.
#[derive(Debug, Default)]
pub struct MockSonar {
    measures: Vec<Value>,
    project: Option<Value>,
    gate: Option<Value>,
    issues: Vec<Value>,
    failing: Option<(String, u16)>,
    reverse_page_latency: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockSonar {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_metric(mut self, name: &str, value: &str) -> Self {
        self.measures.push(json!({"metric": name, "value": value}));
        self
    }

    #[must_use]
    pub fn with_project(mut self, key: &str, name: &str) -> Self {
        self.project = Some(json!({"key": key, "name": name, "qualifier": "TRK"}));
        self
    }

    #[must_use]
    pub fn with_gate(mut self, status: &str) -> Self {
        self.gate = Some(json!({"status": status, "conditions": []}));
        self
    }

    #[must_use]
    pub fn with_gate_body(mut self, body: Value) -> Self {
        self.gate = Some(body);
        self
    }

    #[must_use]
    pub fn with_issue(mut self, issue: Value) -> Self {
        self.issues.push(issue);
        self
    }

    /// Add `count` issues keyed `ISSUE-0..`, cycling through `types`.
    #[must_use]
    pub fn with_generated_issues(mut self, count: usize, types: &[&str]) -> Self {
        let base = self.issues.len();
        for i in 0..count {
            let n = base + i;
            self.issues.push(issue_json(
                &format!("ISSUE-{n}"),
                types[n % types.len()],
                &format!("Issue number {n}"),
            ));
        }
        self
    }

    /// Answer `path` with the given HTTP status instead of data.
    #[must_use]
    pub fn failing(mut self, path: &str, status: u16) -> Self {
        self.failing = Some((path.to_string(), status));
        self
    }

    /// Make lower page numbers answer later than higher ones.
    #[must_use]
    pub fn with_reverse_page_latency(mut self) -> Self {
        self.reverse_page_latency = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Issue-search calls other than the `ps=1` count query.
    pub fn page_requests(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == "/api/issues/search" && c.param("ps") != Some("1"))
            .collect()
    }

    fn issue_page(&self, ps: usize, p: usize) -> Value {
        let start = p.saturating_sub(1).saturating_mul(ps).min(self.issues.len());
        let end = start.saturating_add(ps).min(self.issues.len());
        json!({
            "total": self.issues.len(),
            "p": p,
            "ps": ps,
            "issues": &self.issues[start..end],
        })
    }
}

#[async_trait::async_trait]
impl SonarApi for MockSonar {
    async fn get_json(&self, path: &str, query: &Query<'_>) -> qreport_core::error::Result<Value> {
        let call = RecordedCall {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        };
        let ps: usize = call.param("ps").and_then(|v| v.parse().ok()).unwrap_or(100);
        let p: usize = call.param("p").and_then(|v| v.parse().ok()).unwrap_or(1);
        self.calls.lock().expect("calls lock").push(call);

        if let Some((failing_path, status)) = &self.failing {
            if failing_path == path {
                return Err(FetchError::Status {
                    url: format!("mock://{path}"),
                    status: *status,
                    body: "mock failure".to_string(),
                }
                .into());
            }
        }

        match path {
            "/api/measures/component" => Ok(json!({
                "component": {"key": "mock", "measures": self.measures}
            })),
            "/api/projects/search" => Ok(json!({
                "components": self.project.iter().collect::<Vec<_>>()
            })),
            "/api/qualitygates/project_status" => Ok(match &self.gate {
                Some(gate) => json!({"projectStatus": gate}),
                None => json!({}),
            }),
            "/api/issues/search" => {
                if self.reverse_page_latency && ps > 1 {
                    let delay = 40u64.saturating_sub(p as u64 * 10);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Ok(self.issue_page(ps, p))
            }
            other => Err(FetchError::Status {
                url: format!("mock://{other}"),
                status: 404,
                body: "unknown endpoint".to_string(),
            }
            .into()),
        }
    }
}

/// JSON for one issue as returned by issue search.
pub fn issue_json(key: &str, kind: &str, message: &str) -> Value {
    json!({
        "key": key,
        "severity": "MAJOR",
        "type": kind,
        "message": message,
        "component": "demo:src/lib.rs",
        "line": 7,
        "status": "OPEN",
    })
}

/// Temporary output layout for one report run.
#[derive(Debug)]
pub struct ReportDir {
    pub dir: tempfile::TempDir,
}

impl ReportDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.path().join("charts")
    }

    pub fn output(&self) -> PathBuf {
        self.path().join("report.html")
    }

    pub fn request(&self, project_key: &str) -> ReportRequest {
        ReportRequest {
            project_key: project_key.to_string(),
            charts_dir: self.charts_dir(),
            output: self.output(),
        }
    }

    pub fn read_report(&self) -> String {
        std::fs::read_to_string(self.output()).expect("read report")
    }
}

impl Default for ReportDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the full pipeline against `api` with `config`, writing into `out`.
pub async fn run_report(
    api: &dyn SonarApi,
    out: &ReportDir,
    project_key: &str,
    config: ReportConfig,
) -> anyhow::Result<ReportStats> {
    let pipeline = ReportPipeline::new(config);
    let stats = pipeline
        .run(api, &out.request(project_key), &NoopReporter)
        .await?;
    Ok(stats)
}

/// Number of `<tr>` elements inside the issue table body.
pub fn issue_row_count(html: &str) -> usize {
    match (html.find("<tbody>"), html.find("</tbody>")) {
        (Some(start), Some(end)) if start < end => html[start..end].matches("<tr>").count(),
        _ => 0,
    }
}

/// Issue keys in table order (first cell of each body row).
pub fn issue_row_keys(html: &str) -> Vec<String> {
    let Some(start) = html.find("<tbody>") else {
        return Vec::new();
    };
    html[start..]
        .split("<tr><td>")
        .skip(1)
        .filter_map(|row| row.split_once("</td>").map(|(key, _)| key.to_string()))
        .collect()
}
