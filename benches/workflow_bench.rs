use criterion::{criterion_group, criterion_main, Criterion};
use osw_matrix_runner::config::{SubjectKind, Suite, ValidationSettings};
use osw_matrix_runner::execution::{run_combination, SimulationCli};
use osw_matrix_runner::infra::command::ChildEnv;
use osw_matrix_runner::models::Combination;
use osw_matrix_runner::workflow::{prepare_workflow, Workflow};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tokio::runtime::Runtime;

fn template() -> Workflow {
    serde_json::from_value(json!({
        "weather_file": "CAN_QC_Quebec.epw",
        "steps": [
            { "measure_dir_name": "tbd_measure", "arguments": { "option": "poor (BETBG)" } },
            { "measure_dir_name": "openstudio_results", "arguments": {} }
        ]
    }))
    .unwrap()
}

fn suite() -> Suite {
    Suite {
        name: "model".to_string(),
        kind: SubjectKind::Model,
        template: PathBuf::from("model.osw"),
        fixtures: Some(PathBuf::from("/fixtures/files")),
        run_root: None,
        measure_step: "tbd_measure".to_string(),
        option_argument: "option".to_string(),
        prototype_step: "create_DOE_prototype_building".to_string(),
        weather_file: None,
        weather: BTreeMap::new(),
        subjects: vec!["seb.osm".to_string()],
        options: vec!["skip".to_string(), "code (Quebec)".to_string()],
        validation: ValidationSettings::default(),
    }
}

fn bench_prepare_workflow(c: &mut Criterion) {
    let template = template();
    let suite = suite();
    let combination = Combination::new("model", "seb.osm", "code (Quebec)");

    c.bench_function("prepare_workflow", |b| {
        b.iter(|| prepare_workflow(&template, &combination, &suite).unwrap());
    });
}

fn bench_cached_run(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let runs = tempfile::tempdir().unwrap();
    let combination = Combination::new("model", "seb.osm", "skip");
    let run_dir = runs.path().join(combination.run_id());
    fs::create_dir_all(&run_dir).unwrap();
    fs::write(run_dir.join("out.osw"), r#"{"completed_status":"Success"}"#).unwrap();

    let workflow = template();
    let cli = SimulationCli {
        program: "openstudio".to_string(),
        leading_args: Vec::new(),
        env: ChildEnv::default(),
    };

    c.bench_function("run_combination_cached", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = run_combination(runs.path(), &combination, &workflow, &cli).await;
        });
    });
}

criterion_group!(benches, bench_prepare_workflow, bench_cached_run);
criterion_main!(benches);
