//! # Run Planner Module / 运行计划模块
//!
//! Expands suites into combinations, derives run-directory names, sizes the
//! worker pool and rejects plans whose run directories would collide.
//!
//! 将套件展开为组合，推导运行目录名称，确定工作池大小，并拒绝运行目录会冲突的计划。

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::harness::config::{OswMatrix, Suite};
use crate::harness::models::Combination;

/// Characters replaced by `_` when turning a combination into a directory name.
const PATH_UNSAFE: &[char] = &['.', '/', '\\'];

/// Cartesian product of subjects and options, subjects in the outer loop.
/// 主体与选项的笛卡尔积，主体在外层循环。
pub fn enumerate_combinations<S, O>(subjects: &[S], options: &[O]) -> Vec<(String, String)>
where
    S: AsRef<str>,
    O: AsRef<str>,
{
    subjects
        .iter()
        .flat_map(|subject| {
            options
                .iter()
                .map(move |option| (subject.as_ref().to_string(), option.as_ref().to_string()))
        })
        .collect()
}

/// Stable directory name for a combination, e.g. `seb.osm` x `skip` -> `seb_osm_skip`.
/// 组合的稳定目录名称。
pub fn build_run_id(subject: &str, option: &str) -> String {
    format!("{subject}_{option}").replace(PATH_UNSAFE, "_")
}

/// Worker pool size leaving two processors to the host.
pub fn default_jobs() -> usize {
    num_cpus::get().saturating_sub(2).max(1)
}

/// The planned work of one suite.
#[derive(Debug, Clone)]
pub struct SuitePlan {
    pub suite: Suite,
    pub run_root: PathBuf,
    pub combinations: Vec<Combination>,
}

impl SuitePlan {
    pub fn run_dir(&self, combination: &Combination) -> PathBuf {
        self.run_root.join(combination.run_id())
    }
}

/// Represents the complete plan for one invocation.
/// 表示一次调用的完整执行计划。
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub suites: Vec<SuitePlan>,
    pub jobs: usize,
}

impl ExecutionPlan {
    pub fn total_combinations(&self) -> usize {
        self.suites.iter().map(|s| s.combinations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_combinations() == 0
    }
}

/// Creates an execution plan for the selected suites of `matrix`.
///
/// # Arguments
/// * `matrix` - The loaded configuration
/// * `selected` - Suite names to keep; empty keeps all
/// * `jobs` - Explicit pool size, overriding the configuration
///
/// Fails when a selected suite is unknown, when `jobs` is zero, or when two
/// distinct combinations map to the same run directory.
pub fn plan_execution(matrix: &OswMatrix, selected: &[String], jobs: Option<usize>) -> Result<ExecutionPlan> {
    let jobs = jobs.or(matrix.jobs).unwrap_or_else(default_jobs);
    if jobs == 0 {
        bail!("The worker pool needs at least one job.");
    }

    let suites: Vec<SuitePlan> = matrix
        .select_suites(selected)?
        .into_iter()
        .map(|suite| plan_suite(suite, &matrix.run_root))
        .collect();

    check_run_dirs_are_unique(&suites)?;

    Ok(ExecutionPlan { suites, jobs })
}

fn plan_suite(suite: Suite, matrix_run_root: &Path) -> SuitePlan {
    let run_root = suite.resolved_run_root(matrix_run_root);
    let combinations = enumerate_combinations(&suite.subjects, &suite.options)
        .into_iter()
        .map(|(subject, option)| Combination::new(&suite.name, subject, option))
        .collect();
    SuitePlan {
        suite,
        run_root,
        combinations,
    }
}

fn check_run_dirs_are_unique(suites: &[SuitePlan]) -> Result<()> {
    let mut seen: HashMap<PathBuf, &Combination> = HashMap::new();
    for plan in suites {
        for combination in &plan.combinations {
            let run_dir = plan.run_dir(combination);
            if let Some(previous) = seen.insert(run_dir.clone(), combination) {
                if previous == combination {
                    bail!("Combination {} is listed more than once.", combination);
                }
                bail!(
                    "Combinations {} and {} share the run directory {}.",
                    previous,
                    combination,
                    run_dir.display()
                );
            }
        }
    }
    Ok(())
}
