//! # Run Command Module / 运行命令模块
//!
//! Implements `run`: load the configuration, check fixtures, prepare one
//! workflow per combination, run the simulations through the worker pool,
//! then validate every combination and report.
//!
//! 实现 `run` 命令：加载配置、检查夹具、为每个组合准备工作流、
//! 通过工作池运行模拟，然后验证每个组合并生成报告。

use anyhow::{bail, Context, Result};
use colored::*;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{
    harness::{
        config::{OswMatrix, SubjectKind, Suite},
        execution::{run_all, RunJob, SimulationCli},
        models::{CaseReport, Combination, RunOutcome},
        planner::{self, SuitePlan},
        validation::{validate_results, MeasureLocator},
        workflow::{prepare_workflow, Workflow},
    },
    infra::{
        fs::{ensure_fixture_dir, ensure_fixture_file},
        t,
    },
    reporting::{generate_html_report, print_failure_details, print_summary},
};

/// Arguments of the `run` command.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: PathBuf,
    pub jobs: Option<usize>,
    /// Suites to run; empty runs all of them.
    pub suites: Vec<String>,
    pub html: Option<PathBuf>,
    /// Language given on the command line, which wins over the configuration.
    pub language: Option<String>,
}

/// A suite whose template is loaded and whose fixtures are checked.
struct PreparedSuite {
    plan: SuitePlan,
    locator: MeasureLocator,
    jobs: Vec<RunJob>,
}

/// Executes the run command and returns the per-combination reports.
/// Fails if a precondition is not met or if any combination failed.
pub async fn execute(options: RunOptions) -> Result<Vec<CaseReport>> {
    let matrix = OswMatrix::load(&options.config)
        .with_context(|| t!("config.load_failed", path = options.config.display()).to_string())?;

    let locale = crate::resolve_locale(options.language.as_deref().or(matrix.language.as_deref()));
    rust_i18n::set_locale(&locale);
    let locale = locale.as_str();

    println!(
        "{}",
        t!("config.loaded", locale = locale, path = options.config.display())
    );

    let plan = planner::plan_execution(&matrix, &options.suites, options.jobs)?;
    let prepared = plan
        .suites
        .into_iter()
        .map(prepare_suite)
        .collect::<Result<Vec<_>>>()?;

    if prepared.iter().all(|s| s.plan.combinations.is_empty()) {
        println!("{}", t!("run.no_combinations", locale = locale).yellow());
        return Ok(Vec::new());
    }

    for suite in &prepared {
        println!(
            "{}",
            t!(
                "run.suite_planned",
                locale = locale,
                name = suite.plan.suite.name,
                count = suite.plan.combinations.len(),
                path = suite.plan.run_root.display()
            )
            .cyan()
        );
    }
    println!(
        "{}",
        t!("run.pool_size", locale = locale, jobs = plan.jobs).bold()
    );

    let cli = SimulationCli::from_config(&matrix)?;
    let run_jobs: Vec<RunJob> = prepared.iter().flat_map(|s| s.jobs.iter().cloned()).collect();
    let mut outcomes: HashMap<Combination, RunOutcome> =
        run_all(run_jobs, &cli, plan.jobs).await.into_iter().collect();

    println!("\n{}", t!("validate.banner", locale = locale).bold());
    let mut reports = Vec::new();
    for suite in &prepared {
        let settings = &suite.plan.suite.validation;
        let mut suite_reports = validate_results(
            &suite.plan.suite.name,
            &suite.plan.run_root,
            &suite.plan.suite.subjects,
            &suite.plan.suite.options,
            &suite.locator,
            settings,
        );
        for report in &mut suite_reports {
            report.run = outcomes.remove(&report.combination);
            crate::reporting::console::print_case(report, &settings.metric, locale);
        }
        reports.extend(suite_reports);
    }

    print_summary(&reports, locale);

    if let Some(report_path) = &options.html {
        println!("\n{}", t!("report.html_writing", locale = locale, path = report_path.display()));
        if let Err(e) = generate_html_report(&reports, report_path, locale) {
            eprintln!("{} {:#}", t!("report.html_failed", locale = locale).red(), e);
        }
    }

    let failures: Vec<&CaseReport> = reports.iter().filter(|r| r.is_failure()).collect();
    if !failures.is_empty() {
        print_failure_details(&failures, locale);
        bail!(t!("run.failed", locale = locale, count = failures.len()).to_string());
    }

    println!("\n{}", t!("run.all_passed", locale = locale).green().bold());
    Ok(reports)
}

/// Checks the suite's fixtures, loads its template and prepares the
/// workflow of every combination.
fn prepare_suite(plan: SuitePlan) -> Result<PreparedSuite> {
    check_fixtures(&plan.suite)?;

    let template = Workflow::load(&plan.suite.template)?;
    let locator = MeasureLocator {
        selector: plan.suite.measure_step.clone(),
        fallback_index: template.step_index(&plan.suite.measure_step),
    };

    let jobs = plan
        .combinations
        .iter()
        .map(|combination| {
            let workflow = prepare_workflow(&template, combination, &plan.suite)
                .with_context(|| format!("Failed to prepare the workflow of {combination}"))?;
            Ok::<_, anyhow::Error>(RunJob {
                run_root: plan.run_root.clone(),
                combination: combination.clone(),
                workflow,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PreparedSuite { plan, locator, jobs })
}

/// Fails before any run if the template, the fixture directory, or a seed
/// model or weather file it references is missing.
fn check_fixtures(suite: &Suite) -> Result<()> {
    ensure_fixture_file(&suite.template)?;

    let Some(fixtures) = &suite.fixtures else {
        return Ok(());
    };
    ensure_fixture_dir(fixtures)?;

    if suite.kind == SubjectKind::Model {
        for subject in &suite.subjects {
            ensure_fixture_file(&fixtures.join(subject))?;
        }
    }
    for weather in suite.weather.values().chain(suite.weather_file.iter()) {
        ensure_fixture_file(&fixtures.join(weather))?;
    }
    Ok(())
}
