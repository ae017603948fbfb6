//! # Workflow Document Module / 工作流文档模块
//!
//! Typed view of an OpenStudio workflow (`.osw`) and the per-combination
//! preparation of a template into a runnable document.
//!
//! OpenStudio 工作流（`.osw`）的类型化视图，以及将模板为每个组合准备为可运行文档的逻辑。

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

use crate::harness::config::{Suite, SubjectKind};
use crate::harness::models::Combination;

/// Option label that bypasses the measure step instead of configuring it.
pub const SKIP_OPTION: &str = "skip";
/// Step argument read by the workflow runner to bypass a step.
pub const SKIP_ARGUMENT: &str = "__SKIP__";
/// Argument of the prototype step that selects the building type.
pub const BUILDING_TYPE_ARGUMENT: &str = "building_type";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("workflow template has no step named '{0}'")]
    StepNotFound(String),
}

/// A workflow document. Keys the harness does not touch are kept verbatim.
/// 工作流文档。运行器不涉及的键会被原样保留。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_file: Option<String>,
    pub steps: Vec<WorkflowStep>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One measure step of a workflow.
/// 工作流中的一个度量步骤。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorkflowStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_dir_name: Option<String>,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowStep {
    /// True when `selector` equals the step's `name` or `measure_dir_name`.
    pub fn matches(&self, selector: &str) -> bool {
        self.name.as_deref() == Some(selector) || self.measure_dir_name.as_deref() == Some(selector)
    }

    pub fn is_skipped(&self) -> bool {
        self.arguments.get(SKIP_ARGUMENT) == Some(&Value::Bool(true))
    }
}

impl Workflow {
    /// Loads a template, failing on any shape mismatch.
    pub fn load(path: &Path) -> Result<Self> {
        crate::infra::fs::read_json(path)
    }

    pub fn step_index(&self, selector: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.matches(selector))
    }

    pub fn step(&self, selector: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.matches(selector))
    }

    fn step_mut(&mut self, selector: &str) -> Result<&mut WorkflowStep, WorkflowError> {
        self.steps
            .iter_mut()
            .find(|s| s.matches(selector))
            .ok_or_else(|| WorkflowError::StepNotFound(selector.to_string()))
    }
}

/// Builds the workflow document for one combination.
///
/// The template is cloned, never mutated. Model subjects become the seed
/// file, prototype subjects become the `building_type` argument of the
/// suite's prototype step. The option then lands on the measure step: the
/// `skip` sentinel sets `__SKIP__` and drops the option argument, any other
/// label sets the option argument and drops `__SKIP__`.
///
/// 为单个组合构建工作流文档。模板只会被克隆，绝不会被修改。
pub fn prepare_workflow(
    template: &Workflow,
    combination: &Combination,
    suite: &Suite,
) -> Result<Workflow, WorkflowError> {
    let mut workflow = template.clone();
    let subject = combination.subject.as_str();

    match suite.kind {
        SubjectKind::Model => {
            workflow.seed_file = Some(fixture_reference(suite, subject));
        }
        SubjectKind::Prototype => {
            workflow
                .step_mut(&suite.prototype_step)?
                .arguments
                .insert(BUILDING_TYPE_ARGUMENT.to_string(), Value::String(subject.to_string()));
        }
    }

    if let Some(weather) = suite.weather_for(subject) {
        workflow.weather_file = Some(fixture_reference(suite, weather));
    }

    let step = workflow.step_mut(&suite.measure_step)?;
    if combination.option == SKIP_OPTION {
        step.arguments.remove(&suite.option_argument);
        step.arguments.insert(SKIP_ARGUMENT.to_string(), Value::Bool(true));
    } else {
        step.arguments.remove(SKIP_ARGUMENT);
        step.arguments.insert(
            suite.option_argument.clone(),
            Value::String(combination.option.clone()),
        );
    }

    Ok(workflow)
}

/// A file name as the workflow should reference it: inside the suite's
/// fixture directory when one is configured, verbatim otherwise.
fn fixture_reference(suite: &Suite, file: &str) -> String {
    match &suite.fixtures {
        Some(dir) => dir.join(file).display().to_string(),
        None => file.to_string(),
    }
}
