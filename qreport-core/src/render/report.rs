// Report composer: a single self-contained HTML page with metrics, gate
// verdict, chart images and the full issue table.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Local};
use tracing::{info, instrument};

use crate::error::RenderError;
use crate::types::{GateCondition, Issue, ReportData};

use super::escape_html;

/// Everything the HTML page needs besides the generation time.
#[derive(Debug)]
pub struct ReportDocument<'a> {
    pub data: &'a ReportData,
    /// Project key used when the server returned no project.
    pub project_key: &'a str,
    /// `src` of the bar chart image.
    pub bar_chart_src: String,
    /// `src` of the pie chart image.
    pub pie_chart_src: String,
    /// Escape every issue cell, not only the message.
    pub escape_all_fields: bool,
}

impl<'a> ReportDocument<'a> {
    /// Build a document whose chart links are `{charts_dir}/{file}`.
    pub fn new(
        data: &'a ReportData,
        project_key: &'a str,
        charts_dir: &Path,
        bar_file: &str,
        pie_file: &str,
    ) -> Self {
        Self {
            data,
            project_key,
            bar_chart_src: chart_src(charts_dir, bar_file),
            pie_chart_src: chart_src(charts_dir, pie_file),
            escape_all_fields: false,
        }
    }

    #[must_use]
    pub fn with_escape_all_fields(mut self, escape_all: bool) -> Self {
        self.escape_all_fields = escape_all;
        self
    }

    fn title_key(&self) -> &str {
        if self.data.project.key.is_empty() {
            self.project_key
        } else {
            &self.data.project.key
        }
    }

    /// Server-supplied text, escaped only when `escape_all_fields` is set.
    fn server_text(&self, raw: &str) -> String {
        if self.escape_all_fields {
            escape_html(raw)
        } else {
            raw.to_string()
        }
    }

    /// Render the full HTML page.
    #[instrument(skip_all, name = "report_render")]
    pub fn render(&self, generated_at: DateTime<Local>) -> String {
        let mut h = String::with_capacity(8192 + self.data.issues.len() * 256);
        let key = self.title_key();

        let _ = writeln!(h, "<!DOCTYPE html>");
        let _ = writeln!(h, "<html lang=\"en\">");
        let _ = writeln!(h, "<head>");
        let _ = writeln!(h, "<meta charset=\"UTF-8\" />");
        let _ = writeln!(
            h,
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />"
        );
        let _ = writeln!(h, "<title>SonarQube Report - {key}</title>");
        let _ = writeln!(h, "<style>{REPORT_CSS}</style>");
        let _ = writeln!(h, "</head>");
        let _ = writeln!(h, "<body>");
        let _ = writeln!(h, "<h1>SonarQube Report - {key}</h1>");
        let _ = writeln!(
            h,
            "<p><b>Generated:</b> {}</p>",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        );

        self.render_metrics(&mut h);
        self.render_gate(&mut h);
        self.render_charts(&mut h);
        self.render_issues(&mut h);

        let _ = writeln!(h, "</body>");
        let _ = writeln!(h, "</html>");

        info!(bytes = h.len(), issues = self.data.issues.len(), "Report rendered");
        h
    }

    fn render_metrics(&self, h: &mut String) {
        let _ = writeln!(h, "<h2>Metrics</h2>");
        let _ = writeln!(h, "<ul>");
        for m in self.data.metrics.iter() {
            let _ = writeln!(
                h,
                "<li>{}: {}</li>",
                humanize_metric_name(&m.name),
                m.value
            );
        }
        let _ = writeln!(h, "</ul>");
    }

    fn render_gate(&self, h: &mut String) {
        let status = &self.data.gate.status;
        let color = if status.is_passing() { "green" } else { "red" };
        let _ = writeln!(
            h,
            "<h2>Quality Gate: <span style=\"color: {color}; font-weight: 700;\">{}</span></h2>",
            self.server_text(status.label())
        );

        if self.data.gate.conditions.is_empty() {
            return;
        }
        let _ = writeln!(h, "<ul class=\"conditions\">");
        for cond in &self.data.gate.conditions {
            let _ = writeln!(h, "<li>{}</li>", self.server_text(&describe_condition(cond)));
        }
        let _ = writeln!(h, "</ul>");
    }

    fn render_charts(&self, h: &mut String) {
        let _ = writeln!(h, "<div class=\"charts-container\">");
        let _ = writeln!(
            h,
            "<img src=\"{}\" alt=\"Code Quality Issues Chart\" />",
            self.bar_chart_src
        );
        let _ = writeln!(
            h,
            "<img src=\"{}\" alt=\"Issue Types Distribution Chart\" />",
            self.pie_chart_src
        );
        let _ = writeln!(h, "</div>");
    }

    fn render_issues(&self, h: &mut String) {
        let _ = writeln!(h, "<h2>Issues ({})</h2>", self.data.issues.len());
        let _ = writeln!(h, "<table>");
        let _ = writeln!(
            h,
            "<colgroup><col /><col /><col /><col /><col /><col /><col /></colgroup>"
        );
        let _ = writeln!(
            h,
            "<thead><tr><th>Key</th><th>Severity</th><th>Type</th><th>Message</th>\
             <th>Component</th><th>Line</th><th>Status</th></tr></thead>"
        );
        let _ = writeln!(h, "<tbody>");
        for issue in &self.data.issues {
            self.render_issue_row(h, issue);
        }
        let _ = writeln!(h, "</tbody>");
        let _ = writeln!(h, "</table>");
    }

    fn render_issue_row(&self, h: &mut String, issue: &Issue) {
        let line = match issue.line {
            Some(n) if n != 0 => n.to_string(),
            _ => "-".to_string(),
        };

        // Only the message is escaped unless escape_all_fields is set.
        let cell = |raw: &str| self.server_text(raw);
        let message = if self.escape_all_fields {
            escape_html(&issue.message)
        } else {
            escape_angle_brackets(&issue.message)
        };

        let _ = writeln!(
            h,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{message}</td><td>{}</td>\
             <td>{line}</td><td>{}</td></tr>",
            cell(&issue.key),
            cell(&issue.severity),
            cell(&issue.issue_type),
            cell(&issue.component),
            cell(&issue.status),
        );
    }
}

/// Write the rendered page as UTF-8, replacing any existing file.
pub fn write_report(path: &Path, html: &str) -> Result<(), RenderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| RenderError::io(parent, e))?;
    }
    std::fs::write(path, html).map_err(|e| RenderError::io(path, e))
}

/// `duplicated_lines_density` → `Duplicated Lines Density`.
///
/// A word starts after any non-letter, so `a1b` becomes `A1B`.
pub fn humanize_metric_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for c in name.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn escape_angle_brackets(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

fn describe_condition(cond: &GateCondition) -> String {
    let mut text = format!("{} {}", humanize_metric_name(&cond.metric_key), cond.comparator);
    if let Some(threshold) = &cond.error_threshold {
        let _ = write!(text, " {threshold}");
    }
    if let Some(actual) = &cond.actual_value {
        let _ = write!(text, " (actual {actual})");
    }
    let _ = write!(text, ": {}", cond.status);
    text
}

fn chart_src(charts_dir: &Path, file: &str) -> String {
    let dir = charts_dir.to_string_lossy();
    let dir = dir.trim_end_matches(['/', '\\']);
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

const REPORT_CSS: &str = "\
body{font-family:'Segoe UI',Tahoma,Geneva,Verdana,sans-serif;\
background-color:#f9f9f9;color:#333;margin:20px;line-height:1.6}\
h1{color:#2c3e50;border-bottom:2px solid #2980b9;padding-bottom:10px}\
h2{color:#34495e;margin-top:40px;border-bottom:1px solid #bdc3c7;padding-bottom:5px}\
ul{list-style-type:none;padding-left:0}\
ul li{padding:4px 0;font-size:1.1em}\
ul.conditions li{font-size:.95em;color:#555}\
.charts-container{display:flex;flex-direction:row;gap:40px;margin-top:20px;\
justify-content:space-between;flex-wrap:wrap}\
.charts-container img{flex:1;max-width:48%;height:auto;border:1px solid #ddd;\
border-radius:5px;box-shadow:0 2px 6px rgba(0,0,0,.1)}\
table{border-collapse:separate;border-spacing:0 8px;width:100%;margin-top:30px;\
background-color:#fff;table-layout:fixed}\
colgroup col:nth-child(1){width:12%}\
colgroup col:nth-child(2){width:10%}\
colgroup col:nth-child(3){width:10%}\
colgroup col:nth-child(4){width:30%}\
colgroup col:nth-child(5){width:20%}\
colgroup col:nth-child(6){width:8%}\
colgroup col:nth-child(7){width:10%}\
th,td{text-align:left;padding:16px 20px;border:1px solid #ccc;font-size:1em;\
vertical-align:top;word-wrap:break-word;white-space:normal}\
th{background-color:#2980b9;color:white;letter-spacing:.03em;\
text-transform:uppercase;font-weight:600}\
tr:hover{background-color:#f1f8ff}\
@media (max-width:768px){.charts-container{flex-direction:column}\
.charts-container img{max-width:100%}\
th,td{padding:12px 14px;font-size:.95em}}";
