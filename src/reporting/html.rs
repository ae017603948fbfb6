//! # HTML Reporting Module / HTML 报告模块
//!
//! Renders all case reports into a standalone HTML page.
//!
//! 将所有用例报告渲染为一个独立的 HTML 页面。

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::harness::models::{CaseReport, RunOutcome, ValidationOutcome};
use crate::infra::t;
use crate::reporting::console::{reason_label, run_label};

const HTML_STYLE: &str = r#"
body { font-family: sans-serif; margin: 2em; color: #222; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ccc; padding: 0.4em 0.6em; text-align: left; vertical-align: top; }
th { background: #f0f0f0; }
.status-Passed { color: #1a7f37; font-weight: bold; }
.status-Failed { color: #cf222e; font-weight: bold; }
.summary span { margin-right: 1.5em; }
pre { max-height: 24em; overflow: auto; background: #f6f8fa; padding: 0.5em; }
"#;

/// Writes the HTML report for `reports` to `output_path`.
///
/// # Arguments / 参数
/// * `reports` - Every case of the invocation / 本次调用的所有用例
/// * `output_path` - Destination file / 目标文件
/// * `locale` - Language of the labels / 标签语言
pub fn generate_html_report(reports: &[CaseReport], output_path: &Path, locale: &str) -> Result<()> {
    let page = render_report(reports, locale, &chrono::Local::now().to_rfc3339());
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(output_path, page.into_string())
        .with_context(|| format!("Failed to write HTML report: {}", output_path.display()))
}

/// Builds the report markup. `generated_at` is printed verbatim.
pub fn render_report(reports: &[CaseReport], locale: &str, generated_at: &str) -> Markup {
    let failed = reports.iter().filter(|r| r.is_failure()).count();
    let passed = reports.len() - failed;

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale).to_string()) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.title", locale = locale).to_string()) }
                p { (t!("html_report.generated_at", locale = locale, time = generated_at).to_string()) }
                div class="summary" {
                    span { (t!("html_report.total", locale = locale).to_string()) ": " (reports.len().to_string()) }
                    span class="status-Passed" { (t!("report.status_passed", locale = locale).to_string()) ": " (passed.to_string()) }
                    span class="status-Failed" { (t!("report.status_failed", locale = locale).to_string()) ": " (failed.to_string()) }
                }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.suite", locale = locale).to_string()) }
                            th { (t!("html_report.subject", locale = locale).to_string()) }
                            th { (t!("html_report.option", locale = locale).to_string()) }
                            th { (t!("html_report.run", locale = locale).to_string()) }
                            th { (t!("report.status", locale = locale).to_string()) }
                            th { (t!("report.measure", locale = locale).to_string()) }
                            th { (t!("html_report.metric", locale = locale).to_string()) }
                        }
                    }
                    tbody {
                        @for report in reports {
                            (render_row(report, locale))
                        }
                    }
                }
            }
        }
    }
}

fn render_row(report: &CaseReport, locale: &str) -> Markup {
    let combination = &report.combination;
    html! {
        tr {
            td { (combination.suite) }
            td { (combination.subject) }
            td { (combination.option) }
            td { (run_label(report.run.as_ref(), locale)) }
            @match &report.validation {
                ValidationOutcome::Passed { status, measure_result, metric } => {
                    td class="status-Passed" { (status) }
                    td { (measure_result.as_deref().unwrap_or("-")) }
                    td { (metric.to_string()) }
                }
                ValidationOutcome::Failed { reason, detail } => {
                    td class="status-Failed" { (reason_label(*reason, locale)) }
                    td colspan="2" {
                        (detail)
                        @if let Some(output) = report.run.as_ref().and_then(RunOutcome::output) {
                            @if !output.trim().is_empty() {
                                details {
                                    summary { (t!("report.process_log", locale = locale).to_string()) }
                                    pre { (output) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
