// Shared fixtures for the integration tests
#![allow(dead_code)]

use osw_matrix_runner::config::{Suite, SubjectKind, ValidationSettings};
use osw_matrix_runner::workflow::Workflow;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A model-suite template: the measure under test followed by the results report.
pub fn template_json() -> Value {
    json!({
        "seed_file": "placeholder.osm",
        "weather_file": "CAN_QC_Quebec.epw",
        "file_paths": ["../files"],
        "steps": [
            {
                "measure_dir_name": "tbd_measure",
                "name": "tbd_measure",
                "arguments": {
                    "option": "poor (BETBG)",
                    "alter_model": true
                }
            },
            {
                "measure_dir_name": "openstudio_results",
                "arguments": {}
            }
        ]
    })
}

/// A prototype-suite template: prototype generation, the measure, the report.
pub fn prototype_template_json() -> Value {
    json!({
        "weather_file": "CAN_QC_Quebec.epw",
        "steps": [
            {
                "measure_dir_name": "create_DOE_prototype_building",
                "arguments": {
                    "building_type": "SmallOffice",
                    "template": "90.1-2013"
                }
            },
            {
                "measure_dir_name": "tbd_measure",
                "arguments": {}
            },
            {
                "measure_dir_name": "openstudio_results",
                "arguments": {}
            }
        ]
    })
}

pub fn template() -> Workflow {
    serde_json::from_value(template_json()).expect("template should deserialize")
}

pub fn write_template(dir: &Path) -> PathBuf {
    let path = dir.join("template.osw");
    fs::write(&path, serde_json::to_string_pretty(&template_json()).unwrap()).unwrap();
    path
}

pub fn model_suite(name: &str, template: PathBuf, subjects: &[&str], options: &[&str]) -> Suite {
    Suite {
        name: name.to_string(),
        kind: SubjectKind::Model,
        template,
        fixtures: None,
        run_root: None,
        measure_step: "tbd_measure".to_string(),
        option_argument: "option".to_string(),
        prototype_step: "create_DOE_prototype_building".to_string(),
        weather_file: None,
        weather: BTreeMap::new(),
        subjects: subjects.iter().map(|s| s.to_string()).collect(),
        options: options.iter().map(|o| o.to_string()).collect(),
        validation: ValidationSettings::default(),
    }
}

/// A result document as written by the simulation CLI.
pub fn out_osw(status: &str, measure_result: &str, metric: Option<Value>) -> Value {
    let mut values = vec![json!({ "name": "net_site_energy", "value": 99.0 })];
    if let Some(metric) = metric {
        values.push(json!({ "name": "total_site_energy", "value": metric }));
    }
    json!({
        "completed_status": status,
        "steps": [
            {
                "measure_dir_name": "tbd_measure",
                "result": { "step_result": measure_result, "step_values": [] }
            },
            {
                "measure_dir_name": "openstudio_results",
                "result": { "step_result": "Success", "step_values": values }
            }
        ]
    })
}

pub fn write_out_osw(run_dir: &Path, document: &Value) {
    fs::create_dir_all(run_dir).unwrap();
    fs::write(run_dir.join("out.osw"), serde_json::to_string_pretty(document).unwrap()).unwrap();
}

/// Writes an executable shell script standing in for the simulation CLI.
///
/// It expects `run -w <in.osw>`, appends one line per invocation to
/// `invocations.log` next to itself, records `GEM_HOME` as seen by the child,
/// and writes an `out.osw` reporting `status` next to the workflow. When
/// `status` is empty it writes nothing and exits 1.
#[cfg(unix)]
pub fn write_fake_cli(dir: &Path, status: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
[ "$1" = "run" ] && [ "$2" = "-w" ] || exit 64
wf="$3"
rundir=$(dirname "$wf")
echo "$wf" >> "$(dirname "$0")/invocations.log"
echo "${{GEM_HOME:-unset}}" > "$rundir/gem_home.txt"
echo "simulating $wf"
echo "warning: fake engine" 1>&2
status="{status}"
[ -n "$status" ] || exit 1
if grep -q '"__SKIP__": true' "$wf"; then measure=Skip; else measure=Success; fi
cat > "$rundir/out.osw" <<EOT
{{"completed_status":"$status","steps":[{{"measure_dir_name":"tbd_measure","result":{{"step_result":"$measure"}}}},{{"measure_dir_name":"openstudio_results","result":{{"step_result":"Success","step_values":[{{"name":"total_site_energy","value":123.4}}]}}}}]}}
EOT
"#
    );
    let path = dir.join("fake_openstudio.sh");
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Number of times the fake CLI in `dir` has been invoked.
pub fn invocation_count(dir: &Path) -> usize {
    fs::read_to_string(dir.join("invocations.log"))
        .map(|log| log.lines().count())
        .unwrap_or(0)
}
