//! # Data Models Module / 数据模型模块
//!
//! Core records shared by the planner, the executor, the validator and the
//! reporters: combinations, run outcomes and per-combination reports.
//!
//! 规划器、执行器、验证器和报告器共享的核心记录：组合、运行结果和每个组合的报告。

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::harness::planner::build_run_id;

/// One `(subject, option)` pair of a suite.
/// 套件中的一个 `(主体, 选项)` 对。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Combination {
    pub suite: String,
    /// A model file name or a building-type label.
    pub subject: String,
    /// A thermal-bridging option label, possibly the `skip` sentinel.
    pub option: String,
}

impl Combination {
    pub fn new(suite: impl Into<String>, subject: impl Into<String>, option: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            subject: subject.into(),
            option: option.into(),
        }
    }

    /// The run-directory name of this combination.
    pub fn run_id(&self) -> String {
        build_run_id(&self.subject, &self.option)
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} x {}", self.suite, self.subject, self.option)
    }
}

/// What happened when a combination went through the run phase.
/// 组合经过运行阶段时发生的情况。
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// `out.osw` already existed; no process was spawned.
    /// `out.osw` 已存在；未启动任何进程。
    Cached,
    /// The simulation CLI ran to completion.
    /// 模拟 CLI 运行完成。
    Executed {
        success: bool,
        exit_code: Option<i32>,
        /// Interleaved stdout and stderr.
        output: String,
        duration: Duration,
    },
    /// The run directory could not be prepared or the process could not be spawned.
    /// 无法准备运行目录或无法启动进程。
    Failed { error: String },
}

impl RunOutcome {
    pub fn is_cached(&self) -> bool {
        matches!(self, RunOutcome::Cached)
    }

    /// Captured process output or error text, if there is any.
    pub fn output(&self) -> Option<&str> {
        match self {
            RunOutcome::Cached => None,
            RunOutcome::Executed { output, .. } => Some(output),
            RunOutcome::Failed { error } => Some(error),
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            RunOutcome::Executed { duration, .. } => Some(*duration),
            _ => None,
        }
    }
}

/// Categorizes why a combination failed validation.
/// 对组合验证失败的原因进行分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// `out.osw` does not exist.
    MissingOutput,
    /// `out.osw` could not be read or parsed.
    ParseError,
    /// `completed_status` differs from the success marker.
    StatusMismatch,
    /// The measure step is absent from the result.
    MissingStep,
    /// The metric is absent from the results step values.
    MissingMetric,
}

/// The verdict for one combination.
/// 单个组合的判定结果。
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Passed {
        status: String,
        /// `step_result` of the measure under test (e.g. "Success", "Skip").
        measure_result: Option<String>,
        /// Raw metric value as written by the simulation.
        metric: Value,
    },
    Failed {
        reason: FailureReason,
        detail: String,
    },
}

impl ValidationOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, ValidationOutcome::Passed { .. })
    }

    pub fn metric_value(&self) -> Option<f64> {
        match self {
            ValidationOutcome::Passed { metric, .. } => metric.as_f64(),
            ValidationOutcome::Failed { .. } => None,
        }
    }
}

/// Everything known about one combination once both phases are over.
/// 两个阶段都结束后关于一个组合的全部信息。
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub combination: Combination,
    pub run_dir: PathBuf,
    /// `None` when the run phase did not consider this combination.
    pub run: Option<RunOutcome>,
    pub validation: ValidationOutcome,
}

impl CaseReport {
    pub fn is_failure(&self) -> bool {
        !self.validation.is_passed()
    }
}
