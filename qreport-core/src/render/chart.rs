// Chart renderer: bar chart of defect counters and pie chart of issue types, as SVG.

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::config::ChartsSection;
use crate::error::RenderError;
use crate::types::{Issue, Metrics};

use super::escape_html;

/// Metrics plotted by the bar chart, in plot order.
pub const BAR_METRICS: [&str; 3] = ["bugs", "vulnerabilities", "code_smells"];

const BAR_W: f64 = 640.0;
const BAR_H: f64 = 420.0;
const PIE_SIZE: f64 = 480.0;
const MAX_TICKS: f64 = 10.0;

/// Where [`render_charts`] wrote its two files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPaths {
    pub bar: PathBuf,
    pub pie: PathBuf,
}

/// One pie wedge: an issue type and its share of all issues.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// Bar heights for [`BAR_METRICS`]. Missing or non-numeric metrics plot as 0.
pub fn bar_values(metrics: &Metrics) -> [(&'static str, f64); 3] {
    BAR_METRICS.map(|name| {
        let value = match metrics.get(name) {
            None => 0.0,
            Some(m) => m.numeric().unwrap_or_else(|| {
                warn!(metric = name, value = %m.value, "Non-numeric counter plotted as 0");
                0.0
            }),
        };
        (name, value)
    })
}

/// Group issues by type, largest group first (ties keep first-seen order).
pub fn pie_slices(issues: &[Issue]) -> Vec<PieSlice> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for issue in issues {
        match counts.iter().position(|(t, _)| *t == issue.issue_type) {
            Some(idx) => counts[idx].1 += 1,
            None => counts.push((issue.issue_type.as_str(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = issues.len() as f64;
    counts
        .into_iter()
        .map(|(label, count)| PieSlice {
            label: label.to_string(),
            count,
            percent: count as f64 / total * 100.0,
        })
        .collect()
}

/// Write both charts into `charts_dir`, creating it if needed.
///
/// Existing files with the same names are overwritten.
#[instrument(skip_all, name = "render_charts", fields(dir = %charts_dir.display()))]
pub fn render_charts(
    metrics: &Metrics,
    issues: &[Issue],
    charts_dir: &Path,
    charts: &ChartsSection,
) -> Result<ChartPaths, RenderError> {
    std::fs::create_dir_all(charts_dir).map_err(|e| RenderError::io(charts_dir, e))?;

    let bar = charts_dir.join(&charts.bar_file);
    let bar_svg = bar_chart_svg(&bar_values(metrics), &charts.bar_color)?;
    std::fs::write(&bar, bar_svg).map_err(|e| RenderError::io(&bar, e))?;

    let pie = charts_dir.join(&charts.pie_file);
    let slices = pie_slices(issues);
    let pie_svg = pie_chart_svg(&slices, &charts.pie_colors)?;
    std::fs::write(&pie, pie_svg).map_err(|e| RenderError::io(&pie, e))?;

    info!(slices = slices.len(), "Charts written");
    Ok(ChartPaths { bar, pie })
}

// ── Bar chart ────────────────────────────────────────────────────────

pub fn bar_chart_svg(values: &[(&str, f64)], color: &str) -> Result<String, RenderError> {
    let mut out = String::with_capacity(2048);
    let left = 70.0;
    let right = 20.0;
    let top = 50.0;
    let bottom = 50.0;
    let plot_w = BAR_W - left - right;
    let plot_h = BAR_H - top - bottom;

    // Non-finite bars plot as 0
    let values: Vec<(&str, f64)> = values
        .iter()
        .map(|(label, v)| (*label, if v.is_finite() { v.max(0.0) } else { 0.0 }))
        .collect();
    let max = values.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let step = nice_step(max / 5.0);
    let y_max = (max / step).ceil().max(1.0) * step;
    let y_max = if y_max.is_finite() { y_max } else { max };
    let y_scale = plot_h / y_max;
    let ticks = ((y_max / step) + 1e-9).floor().clamp(1.0, MAX_TICKS) as usize;

    svg_open(&mut out, BAR_W, BAR_H)?;
    writeln!(
        out,
        "<text x=\"{:.1}\" y=\"30\" text-anchor=\"middle\" font-size=\"18\">Code Quality Issues</text>",
        BAR_W / 2.0
    )?;

    // Y grid and ticks
    for i in 0..=ticks {
        let tick = i as f64 * step;
        let y = top + plot_h - tick * y_scale;
        writeln!(
            out,
            "<line x1=\"{left:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#e5e5e5\"/>",
            left + plot_w
        )?;
        writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"12\">{}</text>",
            left - 6.0,
            y + 4.0,
            format_tick(tick)
        )?;
    }
    writeln!(
        out,
        "<text transform=\"translate(20 {:.1}) rotate(-90)\" text-anchor=\"middle\" font-size=\"13\">Count</text>",
        top + plot_h / 2.0
    )?;

    let slot = plot_w / values.len().max(1) as f64;
    let bar_w = slot * 0.6;
    for (i, (label, value)) in values.iter().enumerate() {
        let x = left + i as f64 * slot + (slot - bar_w) / 2.0;
        let h = value * y_scale;
        let y = top + plot_h - h;
        writeln!(
            out,
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bar_w:.1}\" height=\"{h:.1}\" fill=\"{color}\"/>"
        )?;
        writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\">{}</text>",
            x + bar_w / 2.0,
            y - 6.0,
            format_tick(*value)
        )?;
        writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"13\">{}</text>",
            x + bar_w / 2.0,
            top + plot_h + 20.0,
            escape_html(label)
        )?;
    }

    writeln!(
        out,
        "<line x1=\"{left:.1}\" y1=\"{top:.1}\" x2=\"{left:.1}\" y2=\"{:.1}\" stroke=\"#333\"/>",
        top + plot_h
    )?;
    writeln!(
        out,
        "<line x1=\"{left:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#333\"/>",
        top + plot_h,
        left + plot_w,
        top + plot_h
    )?;
    writeln!(out, "</svg>")?;
    Ok(out)
}

/// Round a raw tick interval up to 1, 2 or 5 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_tick(v: f64) -> String {
    if v.fract().abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

// ── Pie chart ────────────────────────────────────────────────────────

pub fn pie_chart_svg(slices: &[PieSlice], colors: &[String]) -> Result<String, RenderError> {
    let mut out = String::with_capacity(2048);
    let cx = PIE_SIZE / 2.0;
    let cy = PIE_SIZE / 2.0 + 20.0;
    let r = 170.0;

    svg_open(&mut out, PIE_SIZE, PIE_SIZE + 20.0)?;
    writeln!(
        out,
        "<text x=\"{cx:.1}\" y=\"30\" text-anchor=\"middle\" font-size=\"18\">Issue Types Distribution</text>"
    )?;

    let fallback = ["#cccccc".to_string()];
    let palette = if colors.is_empty() { &fallback[..] } else { colors };

    // Angles start at 12 o'clock and run clockwise.
    let mut angle = -FRAC_PI_2;
    for (i, slice) in slices.iter().enumerate() {
        let color = &palette[i % palette.len()];
        let sweep = slice.percent / 100.0 * TAU;

        if slices.len() == 1 {
            writeln!(
                out,
                "<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"{r:.1}\" fill=\"{color}\" stroke=\"#fff\"/>"
            )?;
        } else {
            let (x0, y0) = polar(cx, cy, r, angle);
            let (x1, y1) = polar(cx, cy, r, angle + sweep);
            let large = u8::from(sweep > std::f64::consts::PI);
            writeln!(
                out,
                "<path d=\"M {cx:.2} {cy:.2} L {x0:.2} {y0:.2} A {r:.2} {r:.2} 0 {large} 1 {x1:.2} {y1:.2} Z\" \
                 fill=\"{color}\" stroke=\"#fff\"/>"
            )?;
        }

        let mid = angle + sweep / 2.0;
        let (px, py) = polar(cx, cy, r * 0.6, mid);
        writeln!(
            out,
            "<text x=\"{px:.1}\" y=\"{py:.1}\" text-anchor=\"middle\" font-size=\"13\">{:.1}%</text>",
            slice.percent
        )?;
        let (lx, ly) = polar(cx, cy, r * 1.12, mid);
        let anchor = if lx < cx { "end" } else { "start" };
        writeln!(
            out,
            "<text x=\"{lx:.1}\" y=\"{ly:.1}\" text-anchor=\"{anchor}\" font-size=\"13\">{}</text>",
            escape_html(&slice.label)
        )?;

        angle += sweep;
    }

    writeln!(out, "</svg>")?;
    Ok(out)
}

fn polar(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    (cx + r * angle.cos(), cy + r * angle.sin())
}

fn svg_open(out: &mut String, w: f64, h: f64) -> std::fmt::Result {
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" \
         font-family=\"Segoe UI, Tahoma, Geneva, Verdana, sans-serif\">"
    )?;
    writeln!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" fill=\"#fff\"/>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metric;

    fn issue(kind: &str) -> Issue {
        Issue {
            key: String::new(),
            severity: String::new(),
            issue_type: kind.to_string(),
            message: String::new(),
            component: String::new(),
            line: None,
            status: String::new(),
        }
    }

    #[test]
    fn bar_values_default_missing_to_zero() {
        let metrics: Metrics = vec![Metric::new("bugs", "5")].into_iter().collect();
        assert_eq!(
            bar_values(&metrics),
            [("bugs", 5.0), ("vulnerabilities", 0.0), ("code_smells", 0.0)]
        );
    }

    #[test]
    fn bar_values_ignore_unrelated_and_non_numeric() {
        let metrics: Metrics = vec![
            Metric::new("sqale_rating", "A"),
            Metric::new("code_smells", "12"),
            Metric::new("vulnerabilities", "n/a"),
        ]
        .into_iter()
        .collect();
        let values = bar_values(&metrics);
        assert_eq!(values.len(), 3);
        assert_eq!(values[1], ("vulnerabilities", 0.0));
        assert_eq!(values[2], ("code_smells", 12.0));
    }

    #[test]
    fn pie_slices_seventy_thirty() {
        let mut issues: Vec<Issue> = (0..7).map(|_| issue("BUG")).collect();
        issues.extend((0..3).map(|_| issue("CODE_SMELL")));

        let slices = pie_slices(&issues);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].label, "BUG");
        assert_eq!(slices[0].count, 7);
        assert!((slices[0].percent - 70.0).abs() < 1e-9);
        assert_eq!(slices[1].label, "CODE_SMELL");
        assert!((slices[1].percent - 30.0).abs() < 1e-9);
    }

    #[test]
    fn pie_slices_sum_to_hundred_and_sort_desc() {
        let issues: Vec<Issue> = ["VULNERABILITY", "BUG", "CODE_SMELL", "CODE_SMELL", "BUG", "CODE_SMELL"]
            .iter()
            .map(|k| issue(k))
            .collect();
        let slices = pie_slices(&issues);
        let labels: Vec<&str> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["CODE_SMELL", "BUG", "VULNERABILITY"]);
        let sum: f64 = slices.iter().map(|s| s.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn pie_slices_empty_for_no_issues() {
        assert!(pie_slices(&[]).is_empty());
    }

    #[test]
    fn bar_svg_has_three_bars() {
        let svg = bar_chart_svg(
            &[("bugs", 5.0), ("vulnerabilities", 0.0), ("code_smells", 12.0)],
            "#87ceeb",
        )
        .unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("fill=\"#87ceeb\"").count(), 3);
        assert!(svg.contains("Code Quality Issues"));
        assert!(svg.contains(">code_smells</text>"));
        assert!(svg.contains(">Count</text>"));
    }

    #[test]
    fn bar_svg_all_zero_is_still_drawable() {
        let svg = bar_chart_svg(&[("bugs", 0.0), ("vulnerabilities", 0.0), ("code_smells", 0.0)], "#87ceeb")
            .unwrap();
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }

    #[test]
    fn huge_counter_plots_as_zero() {
        let metrics: Metrics = vec![
            Metric::new("bugs", "9".repeat(400)),
            Metric::new("code_smells", "4"),
        ]
        .into_iter()
        .collect();
        let values = bar_values(&metrics);
        assert_eq!(values[0], ("bugs", 0.0));

        let svg = bar_chart_svg(&values, "#87ceeb").unwrap();
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn bar_svg_tick_count_is_bounded() {
        for extreme in [f64::INFINITY, f64::NAN, f64::MAX, 1e300] {
            let svg = bar_chart_svg(&[("bugs", extreme), ("vulnerabilities", 1.0), ("code_smells", 0.0)], "#87ceeb")
                .unwrap();
            assert!(svg.matches("stroke=\"#e5e5e5\"").count() <= MAX_TICKS as usize + 1);
            assert!(!svg.contains("NaN"), "{extreme}");
            assert!(!svg.contains("inf"), "{extreme}");
        }
    }

    #[test]
    fn pie_svg_single_category_is_full_circle() {
        let slices = pie_slices(&[issue("BUG"), issue("BUG")]);
        let colors = ChartsSection::default().pie_colors;
        let svg = pie_chart_svg(&slices, &colors).unwrap();
        assert!(svg.contains("<circle"));
        assert!(svg.contains("100.0%"));
    }

    #[test]
    fn pie_svg_empty_has_only_title() {
        let svg = pie_chart_svg(&[], &ChartsSection::default().pie_colors).unwrap();
        assert!(svg.contains("Issue Types Distribution"));
        assert!(!svg.contains("<path"));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn pie_svg_cycles_palette() {
        let kinds = ["A", "B", "C", "D", "E"];
        let issues: Vec<Issue> = kinds.iter().map(|k| issue(k)).collect();
        let colors = ChartsSection::default().pie_colors;
        let svg = pie_chart_svg(&pie_slices(&issues), &colors).unwrap();
        assert_eq!(svg.matches("<path").count(), 5);
        assert_eq!(svg.matches("fill=\"#ff9999\"").count(), 2);
    }

    #[test]
    fn nice_steps() {
        assert!((nice_step(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((nice_step(0.8) - 1.0).abs() < 1e-9);
        assert!((nice_step(2.4) - 5.0).abs() < 1e-9);
        assert!((nice_step(13.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn render_charts_creates_dir_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let charts_dir = dir.path().join("nested/charts");
        let config = ChartsSection::default();

        let paths = render_charts(&Metrics::default(), &[], &charts_dir, &config).unwrap();
        assert!(paths.bar.ends_with("code_quality_issues.svg"));
        assert!(paths.pie.exists());

        std::fs::write(&paths.pie, "stale").unwrap();
        render_charts(&Metrics::default(), &[issue("BUG")], &charts_dir, &config).unwrap();
        let pie = std::fs::read_to_string(&paths.pie).unwrap();
        assert!(pie.contains("BUG"));
    }
}
