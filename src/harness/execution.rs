//! # Run Execution Module / 运行执行模块
//!
//! Turns prepared workflows into simulation runs: one run directory per
//! combination, one child process per combination that has not already
//! produced an `out.osw`, a bounded pool of concurrent runs.
//!
//! 将准备好的工作流转化为模拟运行：每个组合一个运行目录，
//! 每个尚未产出 `out.osw` 的组合启动一个子进程，并发运行数量受限。

use anyhow::{anyhow, Context, Result};
use colored::*;
use futures::{stream, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;

use crate::{
    harness::{
        config::OswMatrix,
        models::{Combination, RunOutcome},
        workflow::Workflow,
    },
    infra::{
        command::{spawn_and_capture, ChildEnv},
        fs::{ensure_run_dir, write_json_pretty},
        t,
    },
};

/// Workflow document written for the simulation CLI.
pub const INPUT_FILE: &str = "in.osw";
/// Result document written by the simulation CLI.
pub const OUTPUT_FILE: &str = "out.osw";

/// How to invoke the simulation CLI.
/// 如何调用模拟 CLI。
#[derive(Debug, Clone)]
pub struct SimulationCli {
    pub program: String,
    /// Arguments placed before `run -w <in.osw>`.
    pub leading_args: Vec<String>,
    pub env: ChildEnv,
}

impl SimulationCli {
    /// Parses a command string such as `~/openstudio/bin/openstudio --verbose`.
    pub fn parse(command: &str, env: ChildEnv) -> Result<Self> {
        let expanded = shellexpand::full(command)
            .with_context(|| format!("Failed to expand simulation CLI: {command}"))?
            .to_string();
        let mut parts = shlex::split(&expanded)
            .ok_or_else(|| anyhow!("Failed to parse simulation CLI: {}", expanded))?
            .into_iter();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("The simulation CLI command is empty."))?;
        Ok(Self {
            program,
            leading_args: parts.collect(),
            env,
        })
    }

    pub fn from_config(matrix: &OswMatrix) -> Result<Self> {
        Self::parse(&matrix.cli, ChildEnv::from_policy(&matrix.env))
    }

    /// `<program> <leading args> run -w <workflow>` with the scrubbed environment.
    pub fn command(&self, workflow_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg("run")
            .arg("-w")
            .arg(workflow_path)
            .kill_on_drop(true);
        self.env.apply(&mut cmd);
        cmd
    }
}

/// A run is complete iff its directory and its `out.osw` both exist.
pub fn is_complete(run_dir: &Path) -> bool {
    run_dir.is_dir() && run_dir.join(OUTPUT_FILE).is_file()
}

/// Runs a single combination unless it already has an `out.osw`.
///
/// A non-zero exit is recorded, not raised: the verdict belongs to the
/// validation phase. Only failures to prepare the run directory or to spawn
/// the process come back as `Err`.
///
/// # Arguments
/// * `run_root` - Directory holding the suite's run directories
/// * `combination` - The combination to run
/// * `workflow` - The workflow prepared for `combination`
/// * `cli` - The simulation CLI
pub async fn run_combination(
    run_root: &Path,
    combination: &Combination,
    workflow: &Workflow,
    cli: &SimulationCli,
) -> Result<RunOutcome> {
    let run_dir = run_root.join(combination.run_id());
    if is_complete(&run_dir) {
        println!("{}", t!("run.cached", name = combination).dimmed());
        return Ok(RunOutcome::Cached);
    }

    ensure_run_dir(&run_dir)?;
    let input_path = run_dir.join(INPUT_FILE);
    write_json_pretty(&input_path, workflow)?;

    println!("{}", t!("run.starting", name = combination).blue());
    let mut cmd = cli.command(&input_path);
    cmd.current_dir(&run_dir);

    let start_time = Instant::now();
    let captured = spawn_and_capture(cmd)
        .await
        .with_context(|| format!("Failed to spawn '{}' for {}", cli.program, combination))?;
    let duration = start_time.elapsed();

    let success = captured.status.success();
    let duration_str = format!("{:.2}", duration.as_secs_f64());
    if success {
        println!(
            "{}",
            t!("run.finished", name = combination, duration = duration_str).green()
        );
    } else {
        println!(
            "{}",
            t!(
                "run.exited_nonzero",
                name = combination,
                code = captured
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                duration = duration_str
            )
            .yellow()
        );
    }

    Ok(RunOutcome::Executed {
        success,
        exit_code: captured.status.code(),
        output: captured.output,
        duration,
    })
}

/// One unit of work for [`run_all`].
#[derive(Debug, Clone)]
pub struct RunJob {
    pub run_root: PathBuf,
    pub combination: Combination,
    pub workflow: Workflow,
}

/// Runs every job with at most `jobs` simulations in flight and returns once
/// all of them are done. Errors are folded into [`RunOutcome::Failed`] so one
/// broken combination never stops its siblings.
///
/// 以最多 `jobs` 个并发模拟运行所有任务，全部完成后才返回。
pub async fn run_all(run_jobs: Vec<RunJob>, cli: &SimulationCli, jobs: usize) -> Vec<(Combination, RunOutcome)> {
    stream::iter(run_jobs.into_iter().map(|job| async move {
        let outcome = match run_combination(&job.run_root, &job.combination, &job.workflow, cli).await {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("{}", t!("run.failed_to_start", name = job.combination, error = format!("{e:#}")).red());
                RunOutcome::Failed {
                    error: format!("{e:#}"),
                }
            }
        };
        (job.combination, outcome)
    }))
    .buffer_unordered(jobs.max(1))
    .collect()
    .await
}
