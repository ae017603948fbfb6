//! # Result Validation Module / 结果验证模块
//!
//! Parses `out.osw` result documents and judges each combination: completion
//! status, measure-step result and the reported metric.
//!
//! 解析 `out.osw` 结果文档并判定每个组合：完成状态、度量步骤结果以及报告的指标。

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::harness::{
    config::ValidationSettings,
    execution::OUTPUT_FILE,
    models::{CaseReport, Combination, FailureReason, ValidationOutcome},
    planner::enumerate_combinations,
};

/// Result document written by the simulation CLI.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunResult {
    pub completed_status: String,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

/// One step of a result document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StepRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_dir_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StepResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_name: Option<String>,
    #[serde(default)]
    pub step_values: Vec<StepValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StepValue {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl StepRecord {
    /// Matches `selector` against the step name, its measure directory, or
    /// the measure name recorded in its result.
    pub fn matches(&self, selector: &str) -> bool {
        self.name.as_deref() == Some(selector)
            || self.measure_dir_name.as_deref() == Some(selector)
            || self
                .result
                .as_ref()
                .and_then(|r| r.measure_name.as_deref())
                == Some(selector)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.result
            .as_ref()?
            .step_values
            .iter()
            .find(|v| v.name == name)
            .map(|v| &v.value)
    }
}

impl RunResult {
    /// The step matching `selector`, else the step at `fallback_index`.
    pub fn find_step(&self, selector: &str, fallback_index: Option<usize>) -> Option<&StepRecord> {
        self.steps
            .iter()
            .find(|s| s.matches(selector))
            .or_else(|| fallback_index.and_then(|i| self.steps.get(i)))
    }

    /// Looks `metric` up in the `results_step`, or in the first step carrying
    /// it when no step matches `results_step`.
    pub fn find_metric(&self, results_step: &str, metric: &str) -> Option<&Value> {
        match self.steps.iter().find(|s| s.matches(results_step)) {
            Some(step) => step.value(metric),
            None => self.steps.iter().find_map(|s| s.value(metric)),
        }
    }
}

/// Where the measure under test sits in result documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureLocator {
    /// Step name or measure directory of the measure.
    pub selector: String,
    /// Index of the measure step in the template, used when result steps
    /// carry no names.
    pub fallback_index: Option<usize>,
}

/// Reads and parses a result document. Missing files and shape mismatches
/// are errors.
pub fn load_run_result(path: &Path) -> Result<RunResult> {
    crate::infra::fs::read_json(path)
}

/// Judges the run stored in `run_dir`.
/// 判定存储在 `run_dir` 中的运行。
pub fn validate_run_dir(
    run_dir: &Path,
    locator: &MeasureLocator,
    settings: &ValidationSettings,
) -> ValidationOutcome {
    let output_path = run_dir.join(OUTPUT_FILE);
    if !output_path.is_file() {
        return ValidationOutcome::Failed {
            reason: FailureReason::MissingOutput,
            detail: format!("{} does not exist", output_path.display()),
        };
    }

    match load_run_result(&output_path) {
        Ok(result) => validate_run_result(&result, locator, settings),
        Err(e) => ValidationOutcome::Failed {
            reason: FailureReason::ParseError,
            detail: format!("{e:#}"),
        },
    }
}

/// Judges an already parsed result document.
pub fn validate_run_result(
    result: &RunResult,
    locator: &MeasureLocator,
    settings: &ValidationSettings,
) -> ValidationOutcome {
    if result.completed_status != settings.success_status {
        return ValidationOutcome::Failed {
            reason: FailureReason::StatusMismatch,
            detail: format!(
                "completed_status is '{}', expected '{}'",
                result.completed_status, settings.success_status
            ),
        };
    }

    let Some(measure_step) = result.find_step(&locator.selector, locator.fallback_index) else {
        return ValidationOutcome::Failed {
            reason: FailureReason::MissingStep,
            detail: format!("no result for measure step '{}'", locator.selector),
        };
    };

    let Some(metric) = result.find_metric(&settings.results_step, &settings.metric) else {
        return ValidationOutcome::Failed {
            reason: FailureReason::MissingMetric,
            detail: format!(
                "'{}' not found in the values of step '{}'",
                settings.metric, settings.results_step
            ),
        };
    };

    ValidationOutcome::Passed {
        status: result.completed_status.clone(),
        measure_result: measure_step.result.as_ref().and_then(|r| r.step_result.clone()),
        metric: metric.clone(),
    }
}

/// Judges every `subject x option` combination of a suite. Each combination
/// is checked on its own; a failure never hides the others.
///
/// 判定套件中的每个 `主体 x 选项` 组合。每个组合独立检查；一个失败不会掩盖其他组合。
pub fn validate_results<S, O>(
    suite: &str,
    run_root: &Path,
    subjects: &[S],
    options: &[O],
    locator: &MeasureLocator,
    settings: &ValidationSettings,
) -> Vec<CaseReport>
where
    S: AsRef<str>,
    O: AsRef<str>,
{
    enumerate_combinations(subjects, options)
        .into_iter()
        .map(|(subject, option)| {
            let combination = Combination::new(suite, subject, option);
            let run_dir = run_root.join(combination.run_id());
            let validation = validate_run_dir(&run_dir, locator, settings);
            CaseReport {
                combination,
                run_dir,
                run: None,
                validation,
            }
        })
        .collect()
}
