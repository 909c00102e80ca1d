use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// ── Metrics ───────────────────────────────────────────────────────

/// A single measure reported by the server, e.g. `bugs = "5"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(rename = "metric")]
    pub name: String,
    /// Raw server value. Numbers are stringified on decode.
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Numeric view of the value, see [`parse_numeric`].
    pub fn numeric(&self) -> Option<f64> {
        parse_numeric(&self.value)
    }
}

/// Metrics in server order, looked up by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(pub Vec<Metric>);

impl Metrics {
    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.0.iter().find(|m| m.name == name)
    }

    /// Numeric value of `name`, `None` if missing or not numeric.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Metric::numeric)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Metric> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Metric> for Metrics {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parse a metric value that is plain digits with at most one decimal point.
///
/// Signs, exponents, empty strings and values too large for `f64` are not
/// numeric.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let stripped = raw.replacen('.', "", 1);
    if stripped.is_empty() || !stripped.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number metric value, got {other}"
        ))),
    }
}

// ── Project ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub key: String,
    pub name: String,
    pub qualifier: Option<String>,
    pub visibility: Option<String>,
    pub last_analysis_date: Option<String>,
}

// ── Quality gate ──────────────────────────────────────────────────

/// Quality gate verdict. Absent status decodes as [`GateStatus::Unknown`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum GateStatus {
    Ok,
    Error,
    /// Any other server verdict, e.g. `WARN` or `NONE`.
    Other(String),
    #[default]
    Unknown,
}

impl GateStatus {
    pub fn is_passing(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Other(s) => s,
            Self::Unknown => "Unknown",
        }
    }
}

impl From<Option<String>> for GateStatus {
    fn from(raw: Option<String>) -> Self {
        match raw {
            None => Self::Unknown,
            Some(s) if s == "OK" => Self::Ok,
            Some(s) if s == "ERROR" => Self::Error,
            Some(s) => Self::Other(s),
        }
    }
}

impl From<GateStatus> for Option<String> {
    fn from(status: GateStatus) -> Self {
        match status {
            GateStatus::Unknown => None,
            other => Some(other.label().to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GateCondition {
    pub status: String,
    pub metric_key: String,
    pub comparator: String,
    pub error_threshold: Option<String>,
    pub actual_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGate {
    pub status: GateStatus,
    pub conditions: Vec<GateCondition>,
}

// ── Issues ────────────────────────────────────────────────────────

/// One reported defect or rule violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub severity: String,
    #[serde(rename = "type")]
    pub issue_type: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub status: String,
}

/// Everything fetched for one report run.
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    pub metrics: Metrics,
    pub project: Project,
    pub gate: QualityGate,
    pub issues: Vec<Issue>,
}
