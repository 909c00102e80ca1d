// Single-request fetchers: component measures, project info, quality gate.

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::types::{Metrics, Project, QualityGate};

use super::traits::{SonarApi, decode};

const MEASURES_PATH: &str = "/api/measures/component";
const PROJECTS_PATH: &str = "/api/projects/search";
const GATE_PATH: &str = "/api/qualitygates/project_status";

/// Fetch the requested measures for `project_key`, in server order.
#[instrument(skip_all, name = "fetch_metrics", fields(project = %project_key))]
pub async fn fetch_metrics(
    api: &dyn SonarApi,
    project_key: &str,
    metric_keys: &[String],
) -> crate::error::Result<Metrics> {
    let body = api
        .get_json(
            MEASURES_PATH,
            &[
                ("component", project_key.to_string()),
                ("metricKeys", metric_keys.join(",")),
            ],
        )
        .await?;
    let envelope: MeasuresResponse = decode(MEASURES_PATH, body)?;
    let metrics = envelope.component.measures;
    debug!(count = metrics.len(), "Metrics fetched");
    Ok(metrics)
}

/// Fetch project info. Unknown projects yield an empty [`Project`].
#[instrument(skip_all, name = "fetch_project", fields(project = %project_key))]
pub async fn fetch_project(
    api: &dyn SonarApi,
    project_key: &str,
) -> crate::error::Result<Project> {
    let body = api
        .get_json(PROJECTS_PATH, &[("projects", project_key.to_string())])
        .await?;
    let envelope: ProjectsResponse = decode(PROJECTS_PATH, body)?;
    Ok(envelope.components.into_iter().next().unwrap_or_default())
}

/// Fetch the quality gate verdict. A missing verdict decodes as `Unknown`.
#[instrument(skip_all, name = "fetch_quality_gate", fields(project = %project_key))]
pub async fn fetch_quality_gate(
    api: &dyn SonarApi,
    project_key: &str,
) -> crate::error::Result<QualityGate> {
    let body = api
        .get_json(GATE_PATH, &[("projectKey", project_key.to_string())])
        .await?;
    let envelope: GateResponse = decode(GATE_PATH, body)?;
    debug!(status = envelope.project_status.status.label(), "Quality gate fetched");
    Ok(envelope.project_status)
}

// ── API envelopes ───────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct MeasuresResponse {
    #[serde(default)]
    component: MeasuresComponent,
}

#[derive(Debug, Default, Deserialize)]
struct MeasuresComponent {
    #[serde(default)]
    measures: Metrics,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectsResponse {
    #[serde(default)]
    components: Vec<Project>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GateResponse {
    #[serde(default)]
    project_status: QualityGate,
}
