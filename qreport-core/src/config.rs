use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest page size the issue search endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Top-level qreport configuration, matching the optional `--config` TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub charts: ChartsSection,
    #[serde(default)]
    pub html: HtmlSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Issues per page for the paginated collector.
    pub page_size: u32,
    /// Upper bound on in-flight requests. 0 means host available parallelism.
    pub max_concurrency: usize,
    /// Measures requested from the component measures endpoint.
    pub metric_keys: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            page_size: 300,
            max_concurrency: 0,
            metric_keys: vec![
                "bugs".into(),
                "vulnerabilities".into(),
                "code_smells".into(),
                "coverage".into(),
                "duplicated_lines_density".into(),
                "ncloc".into(),
                "complexity".into(),
                "reliability_rating".into(),
                "security_rating".into(),
                "sqale_rating".into(),
                "lines".into(),
                "functions".into(),
                "classes".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsSection {
    pub bar_file: String,
    pub pie_file: String,
    pub bar_color: String,
    pub pie_colors: Vec<String>,
}

impl Default for ChartsSection {
    fn default() -> Self {
        Self {
            bar_file: "code_quality_issues.svg".into(),
            pie_file: "issue_types.svg".into(),
            bar_color: "#87ceeb".into(),
            pie_colors: vec![
                "#ff9999".into(),
                "#66b3ff".into(),
                "#99ff99".into(),
                "#ffcc99".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlSection {
    /// HTML-escape every issue cell instead of only the message.
    pub escape_all_fields: bool,
}

impl ReportConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml(&raw)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let page_size = self.server.page_size;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "server.page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        if self.server.metric_keys.is_empty() {
            return Err(ConfigError::Invalid(
                "server.metric_keys must not be empty".into(),
            ));
        }
        if self.charts.pie_colors.is_empty() {
            return Err(ConfigError::Invalid(
                "charts.pie_colors must not be empty".into(),
            ));
        }
        if self.charts.bar_file.trim().is_empty() || self.charts.pie_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "chart file names must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Effective request concurrency, resolving 0 to the host parallelism.
    pub fn concurrency(&self) -> usize {
        match self.server.max_concurrency {
            0 => std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get),
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_server_limits() {
        let config = ReportConfig::default();
        assert_eq!(config.server.page_size, 300);
        assert_eq!(config.server.metric_keys.len(), 13);
        assert_eq!(config.charts.bar_file, "code_quality_issues.svg");
        assert_eq!(config.charts.pie_file, "issue_types.svg");
        assert!(!config.html.escape_all_fields);
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = ReportConfig::from_toml("[server]\npage_size = 100\n").unwrap();
        assert_eq!(config.server.page_size, 100);
        assert_eq!(config.server.metric_keys.len(), 13);
        assert_eq!(config.charts.pie_colors.len(), 4);
    }

    #[test]
    fn html_section_parses() {
        let config = ReportConfig::from_toml("[html]\nescape_all_fields = true\n").unwrap();
        assert!(config.html.escape_all_fields);
    }

    #[test]
    fn rejects_zero_page_size() {
        let err = ReportConfig::from_toml("[server]\npage_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_oversized_page() {
        let err = ReportConfig::from_toml("[server]\npage_size = 501\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_palette() {
        let err = ReportConfig::from_toml("[charts]\npie_colors = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_syntax_is_parse_error() {
        let err = ReportConfig::from_toml("[server\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReportConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qreport.toml");
        std::fs::write(&path, "[server]\nmax_concurrency = 3\n").unwrap();
        let config = ReportConfig::load(&path).unwrap();
        assert_eq!(config.concurrency(), 3);
    }

    #[test]
    fn zero_concurrency_resolves_to_host() {
        let config = ReportConfig::default();
        assert!(config.concurrency() >= 1);
    }
}
