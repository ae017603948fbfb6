//! # Console Reporting Module / 控制台报告模块
//!
//! Colored per-combination summaries and failure details.
//!
//! 彩色的逐组合摘要和失败详情。

use colored::*;

use crate::harness::models::{CaseReport, FailureReason, RunOutcome, ValidationOutcome};
use crate::infra::t;

/// Localized label of a failure reason.
pub fn reason_label(reason: FailureReason, locale: &str) -> String {
    match reason {
        FailureReason::MissingOutput => t!("reason.missing_output", locale = locale),
        FailureReason::ParseError => t!("reason.parse_error", locale = locale),
        FailureReason::StatusMismatch => t!("reason.status_mismatch", locale = locale),
        FailureReason::MissingStep => t!("reason.missing_step", locale = locale),
        FailureReason::MissingMetric => t!("reason.missing_metric", locale = locale),
    }
    .to_string()
}

/// How the run phase treated a case, for display.
pub fn run_label(run: Option<&RunOutcome>, locale: &str) -> String {
    match run {
        None => "-".to_string(),
        Some(RunOutcome::Cached) => t!("report.run_cached", locale = locale).to_string(),
        Some(RunOutcome::Executed { success: true, duration, .. }) => {
            format!("{:.2?}", duration)
        }
        Some(RunOutcome::Executed { exit_code, .. }) => t!(
            "report.run_exit_code",
            locale = locale,
            code = exit_code.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string())
        )
        .to_string(),
        Some(RunOutcome::Failed { .. }) => t!("report.run_not_started", locale = locale).to_string(),
    }
}

/// Prints the result lines of one case: status, measure result and the metric.
///
/// ```text
/// [model] seb.osm x code (Quebec)
///     status: Success | measure: Success | total_site_energy: 123.4
/// ```
pub fn print_case(report: &CaseReport, metric: &str, locale: &str) {
    println!("{}", report.combination.to_string().bold());
    match &report.validation {
        ValidationOutcome::Passed {
            status,
            measure_result,
            metric: value,
        } => {
            println!(
                "    {}: {} | {}: {} | {}: {}",
                t!("report.status", locale = locale),
                status.green(),
                t!("report.measure", locale = locale),
                measure_result.as_deref().unwrap_or("-"),
                metric,
                value
            );
        }
        ValidationOutcome::Failed { reason, detail } => {
            println!(
                "    {} ({}): {}",
                t!("report.status_failed", locale = locale).red(),
                reason_label(*reason, locale),
                detail
            );
        }
    }
}

/// Prints the closing table of every case.
///
/// ```text
/// --- Run Summary ---
///   - Passed   | [model] seb.osm x skip                        |     cached | 123.4
///   - Failed   | [model] seb.osm x code (Quebec)               |     exit 1 | Status mismatch
/// ```
pub fn print_summary(reports: &[CaseReport], locale: &str) {
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());

    for report in reports {
        let (status, tail) = match &report.validation {
            ValidationOutcome::Passed { metric, .. } => (
                t!("report.status_passed", locale = locale).green(),
                metric.to_string(),
            ),
            ValidationOutcome::Failed { reason, .. } => (
                t!("report.status_failed", locale = locale).red(),
                reason_label(*reason, locale),
            ),
        };
        println!(
            "  - {:<10} | {:<48} | {:>12} | {}",
            status,
            report.combination.to_string(),
            run_label(report.run.as_ref(), locale),
            tail
        );
    }

    let failed = reports.iter().filter(|r| r.is_failure()).count();
    println!(
        "\n{}",
        t!(
            "report.totals",
            locale = locale,
            total = reports.len(),
            passed = reports.len() - failed,
            failed = failed
        )
    );
}

/// Prints, for each failed case, its run directory, the failure detail and
/// any process output captured during this invocation.
pub fn print_failure_details(failures: &[&CaseReport], locale: &str) {
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("report.failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, report) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} {}",
            i + 1,
            failures.len(),
            t!("report.failure_header", locale = locale).red(),
            report.combination.to_string().cyan()
        );
        println!(
            "{}",
            t!("report.run_dir", locale = locale, path = report.run_dir.display())
        );
        if let ValidationOutcome::Failed { reason, detail } = &report.validation {
            println!("{}: {}", reason_label(*reason, locale).yellow(), detail);
        }
        match report.run.as_ref().and_then(RunOutcome::output) {
            Some(output) if !output.trim().is_empty() => {
                println!("\n--- {} ---\n", t!("report.process_log", locale = locale).yellow());
                println!("{}", output.trim_end());
            }
            _ => {}
        }
        println!("\n{}", "-".repeat(80));
    }
}
