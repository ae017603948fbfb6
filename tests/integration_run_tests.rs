//! # Run Phase Integration Tests / 运行阶段集成测试
//!
//! Drives the run and validation phases against a shell script standing in
//! for the simulation CLI.
//!
//! 使用代替模拟 CLI 的 shell 脚本驱动运行阶段和验证阶段。

#![cfg(unix)]

mod common;

use osw_matrix_runner::config::ValidationSettings;
use osw_matrix_runner::execution::{is_complete, run_all, run_combination, RunJob, SimulationCli};
use osw_matrix_runner::infra::command::ChildEnv;
use osw_matrix_runner::models::{Combination, FailureReason, RunOutcome, ValidationOutcome};
use osw_matrix_runner::validation::{validate_results, MeasureLocator};
use osw_matrix_runner::workflow::{prepare_workflow, Workflow};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use crate::common::{invocation_count, model_suite, template, write_fake_cli};

fn fake_cli(dir: &Path, status: &str) -> SimulationCli {
    let script = write_fake_cli(dir, status);
    SimulationCli {
        program: script.to_string_lossy().into_owned(),
        leading_args: Vec::new(),
        env: ChildEnv::default(),
    }
}

fn locator() -> MeasureLocator {
    MeasureLocator {
        selector: "tbd_measure".to_string(),
        fallback_index: Some(0),
    }
}

fn jobs_for(run_root: &Path, subjects: &[&str], options: &[&str]) -> Vec<RunJob> {
    let template = template();
    let suite = model_suite("model", "template.osw".into(), subjects, options);
    subjects
        .iter()
        .flat_map(|subject| options.iter().map(move |option| (*subject, *option)))
        .map(|(subject, option)| {
            let combination = Combination::new("model", subject, option);
            RunJob {
                run_root: run_root.to_path_buf(),
                workflow: prepare_workflow(&template, &combination, &suite).unwrap(),
                combination,
            }
        })
        .collect()
}

fn read_in_osw(run_dir: &Path) -> Workflow {
    serde_json::from_str(&fs::read_to_string(run_dir.join("in.osw")).unwrap()).unwrap()
}

#[cfg(test)]
mod single_run_tests {
    use super::*;

    #[tokio::test]
    async fn test_runs_write_workflows_into_named_directories() {
        let tools = tempdir().unwrap();
        let runs = tempdir().unwrap();
        let cli = fake_cli(tools.path(), "Success");

        for job in jobs_for(runs.path(), &["seb.osm"], &["skip", "code (Quebec)"]) {
            let outcome = run_combination(&job.run_root, &job.combination, &job.workflow, &cli)
                .await
                .unwrap();
            assert!(matches!(outcome, RunOutcome::Executed { success: true, .. }));
        }

        let skip_dir = runs.path().join("seb_osm_skip");
        let code_dir = runs.path().join("seb_osm_code (Quebec)");
        assert!(is_complete(&skip_dir));
        assert!(is_complete(&code_dir));

        let skip = read_in_osw(&skip_dir);
        let step = skip.step("tbd_measure").unwrap();
        assert_eq!(step.arguments.get("__SKIP__"), Some(&Value::Bool(true)));
        assert!(step.arguments.get("option").is_none());
        assert_eq!(skip.seed_file.as_deref(), Some("seb.osm"));

        let code = read_in_osw(&code_dir);
        let step = code.step("tbd_measure").unwrap();
        assert_eq!(
            step.arguments.get("option"),
            Some(&Value::String("code (Quebec)".to_string()))
        );
        assert!(step.arguments.get("__SKIP__").is_none());

        assert_eq!(invocation_count(tools.path()), 2);
    }

    #[tokio::test]
    async fn test_second_invocation_reuses_existing_output() {
        let tools = tempdir().unwrap();
        let runs = tempdir().unwrap();
        let cli = fake_cli(tools.path(), "Success");
        let job = jobs_for(runs.path(), &["seb.osm"], &["skip"]).remove(0);

        run_combination(&job.run_root, &job.combination, &job.workflow, &cli)
            .await
            .unwrap();
        let out_path = runs.path().join("seb_osm_skip").join("out.osw");
        let first = fs::read_to_string(&out_path).unwrap();

        let again = run_combination(&job.run_root, &job.combination, &job.workflow, &cli)
            .await
            .unwrap();

        assert!(again.is_cached());
        assert_eq!(invocation_count(tools.path()), 1);
        assert_eq!(fs::read_to_string(&out_path).unwrap(), first);
    }

    #[tokio::test]
    async fn test_input_without_output_is_rerun() {
        let tools = tempdir().unwrap();
        let runs = tempdir().unwrap();
        let cli = fake_cli(tools.path(), "Success");
        let job = jobs_for(runs.path(), &["seb.osm"], &["skip"]).remove(0);

        let run_dir = runs.path().join("seb_osm_skip");
        fs::create_dir_all(&run_dir).unwrap();
        fs::write(run_dir.join("in.osw"), "{}").unwrap();

        let outcome = run_combination(&job.run_root, &job.combination, &job.workflow, &cli)
            .await
            .unwrap();

        assert!(!outcome.is_cached());
        assert_eq!(invocation_count(tools.path()), 1);
        assert!(read_in_osw(&run_dir).step("tbd_measure").is_some());
    }

    #[tokio::test]
    async fn test_latin1_log_lines_do_not_break_the_run() {
        use std::os::unix::fs::PermissionsExt;

        let tools = tempdir().unwrap();
        let runs = tempdir().unwrap();
        let script = tools.path().join("latin1_openstudio.sh");
        fs::write(
            &script,
            r#"#!/bin/sh
rundir=$(dirname "$3")
printf 'Weather: Montr\351al-Trudeau\n'
sleep 0.3
echo 'still simulating'
cat > "$rundir/out.osw" <<EOT
{"completed_status":"Success","steps":[{"measure_dir_name":"tbd_measure","result":{"step_result":"Success"}},{"measure_dir_name":"openstudio_results","result":{"step_values":[{"name":"total_site_energy","value":42.0}]}}]}
EOT
"#,
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let cli = SimulationCli {
            program: script.to_string_lossy().into_owned(),
            leading_args: Vec::new(),
            env: ChildEnv::default(),
        };
        let job = jobs_for(runs.path(), &["seb.osm"], &["code (Quebec)"]).remove(0);

        let outcome = run_combination(&job.run_root, &job.combination, &job.workflow, &cli)
            .await
            .unwrap();

        match &outcome {
            RunOutcome::Executed {
                success,
                exit_code,
                output,
                ..
            } => {
                assert!(*success);
                assert_eq!(*exit_code, Some(0));
                assert!(output.contains("Montr\u{FFFD}al-Trudeau"));
                assert!(output.contains("still simulating"));
            }
            other => panic!("expected an executed run, got {other:?}"),
        }

        let reports = validate_results(
            "model",
            runs.path(),
            &["seb.osm"],
            &["code (Quebec)"],
            &locator(),
            &ValidationSettings::default(),
        );
        assert_eq!(reports[0].validation.metric_value(), Some(42.0));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_recorded_with_its_output() {
        let tools = tempdir().unwrap();
        let runs = tempdir().unwrap();
        let cli = fake_cli(tools.path(), "");
        let job = jobs_for(runs.path(), &["seb.osm"], &["skip"]).remove(0);

        let outcome = run_combination(&job.run_root, &job.combination, &job.workflow, &cli)
            .await
            .unwrap();

        match outcome {
            RunOutcome::Executed {
                success,
                exit_code,
                output,
                ..
            } => {
                assert!(!success);
                assert_eq!(exit_code, Some(1));
                assert!(output.contains("simulating"));
                assert!(output.contains("warning: fake engine"));
            }
            other => panic!("expected an executed run, got {other:?}"),
        }
        assert!(!is_complete(&runs.path().join("seb_osm_skip")));
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_runs_every_combination_then_validation_passes() {
        let tools = tempdir().unwrap();
        let runs = tempdir().unwrap();
        let cli = fake_cli(tools.path(), "Success");
        let subjects = ["seb.osm", "warehouse.osm"];
        let options = ["skip", "poor (BETBG)", "code (Quebec)"];

        let outcomes = run_all(jobs_for(runs.path(), &subjects, &options), &cli, 2).await;

        assert_eq!(outcomes.len(), 6);
        assert!(outcomes
            .iter()
            .all(|(_, o)| matches!(o, RunOutcome::Executed { success: true, .. })));
        assert_eq!(invocation_count(tools.path()), 6);

        let reports = validate_results(
            "model",
            runs.path(),
            &subjects,
            &options,
            &locator(),
            &ValidationSettings::default(),
        );
        assert_eq!(reports.len(), 6);
        for report in &reports {
            assert!(!report.is_failure(), "{} failed", report.combination);
            assert_eq!(report.validation.metric_value(), Some(123.4));
            let expected = if report.combination.option == "skip" {
                "Skip"
            } else {
                "Success"
            };
            assert!(matches!(
                &report.validation,
                ValidationOutcome::Passed { measure_result: Some(r), .. } if r == expected
            ));
        }

        let cached = run_all(jobs_for(runs.path(), &subjects, &options), &cli, 2).await;
        assert!(cached.iter().all(|(_, o)| o.is_cached()));
        assert_eq!(invocation_count(tools.path()), 6);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_siblings() {
        let tools = tempdir().unwrap();
        let runs = tempdir().unwrap();
        let cli = fake_cli(tools.path(), "Fail");

        let outcomes = run_all(jobs_for(runs.path(), &["seb.osm"], &["skip", "poor"]), &cli, 1).await;
        assert_eq!(outcomes.len(), 2);

        let reports = validate_results(
            "model",
            runs.path(),
            &["seb.osm"],
            &["skip", "poor"],
            &locator(),
            &ValidationSettings::default(),
        );
        assert!(reports.iter().all(|r| matches!(
            r.validation,
            ValidationOutcome::Failed { reason: FailureReason::StatusMismatch, .. }
        )));
    }

    #[tokio::test]
    async fn test_missing_program_becomes_a_failed_outcome() {
        let runs = tempdir().unwrap();
        let cli = SimulationCli {
            program: "/nonexistent/bin/openstudio".to_string(),
            leading_args: Vec::new(),
            env: ChildEnv::default(),
        };

        let outcomes = run_all(jobs_for(runs.path(), &["seb.osm"], &["skip"]), &cli, 4).await;

        assert_eq!(outcomes.len(), 1);
        match &outcomes[0].1 {
            RunOutcome::Failed { error } => assert!(error.contains("/nonexistent/bin/openstudio")),
            other => panic!("expected a failed outcome, got {other:?}"),
        }

        let reports = validate_results(
            "model",
            runs.path(),
            &["seb.osm"],
            &["skip"],
            &locator(),
            &ValidationSettings::default(),
        );
        assert!(matches!(
            reports[0].validation,
            ValidationOutcome::Failed { reason: FailureReason::MissingOutput, .. }
        ));
    }
}
