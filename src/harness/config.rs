//! # Configuration Module / 配置模块
//!
//! Defines the harness configuration loaded from `OswMatrix.toml`: the path to
//! the simulation CLI, the child-process environment policy, and the suites
//! whose subjects and options span the run matrix.
//!
//! 定义从 `OswMatrix.toml` 加载的运行配置：模拟 CLI 的路径、子进程环境策略，
//! 以及由主体和选项组成运行矩阵的测试套件。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name looked up by `run` and written by `init`.
pub const DEFAULT_CONFIG_FILE: &str = "OswMatrix.toml";

/// Errors raised while loading or checking a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("suite name '{0}' is declared more than once")]
    DuplicateSuite(String),
    #[error("no suite named '{0}' in the configuration")]
    UnknownSuite(String),
}

/// How a suite's subjects are injected into the workflow document.
/// 套件的主体如何注入工作流文档。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    /// Subjects are model files; each one becomes the workflow's `seed_file`.
    /// 主体是模型文件；每个都成为工作流的 `seed_file`。
    #[default]
    Model,
    /// Subjects are building-type labels passed to a prototype-generation step.
    /// 主体是建筑类型标签，传递给原型生成步骤。
    Prototype,
}

/// Whether the child environment is scrubbed by removing named variables or
/// rebuilt from scratch with only the named variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvMode {
    #[default]
    Denylist,
    Allowlist,
}

/// Child-process environment policy.
/// 子进程环境策略。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnvPolicy {
    #[serde(default)]
    pub mode: EnvMode,
    /// In `denylist` mode these are removed on top of the built-in list.
    /// In `allowlist` mode these are the only variables passed through.
    #[serde(default)]
    pub vars: Vec<String>,
}

/// Settings used to judge a finished run.
/// 用于判断已完成运行的设置。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidationSettings {
    /// The literal `completed_status` of a successful run.
    #[serde(default = "default_success_status")]
    pub success_status: String,
    /// The step whose `step_values` carry the reported metric.
    #[serde(default = "default_results_step")]
    pub results_step: String,
    /// Name of the metric extracted from the results step.
    #[serde(default = "default_metric")]
    pub metric: String,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            success_status: default_success_status(),
            results_step: default_results_step(),
            metric: default_metric(),
        }
    }
}

/// One named block of the matrix: a template crossed with subjects and options.
/// 矩阵中的一个命名块：模板与主体和选项的交叉组合。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Suite {
    /// Unique suite name, used in logs and as the default run sub-directory.
    /// 唯一的套件名称，用于日志并作为默认的运行子目录。
    pub name: String,
    #[serde(default)]
    pub kind: SubjectKind,
    /// Template workflow file (`.osw`).
    pub template: PathBuf,
    /// Directory holding seed models and weather files. When set, seed and
    /// weather references are written as paths inside it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<PathBuf>,
    /// Overrides `<run_root>/<name>` as the directory holding this suite's runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_root: Option<PathBuf>,
    /// Step (by `name` or `measure_dir_name`) that receives the option.
    #[serde(default = "default_measure_step")]
    pub measure_step: String,
    /// Argument of the measure step that carries the option label.
    #[serde(default = "default_option_argument")]
    pub option_argument: String,
    /// Step that receives `building_type` in prototype suites.
    #[serde(default = "default_prototype_step")]
    pub prototype_step: String,
    /// Weather file applied to every subject lacking an entry in `weather`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_file: Option<String>,
    /// Per-subject weather files.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub weather: BTreeMap<String, String>,
    pub subjects: Vec<String>,
    pub options: Vec<String>,
    #[serde(default)]
    pub validation: ValidationSettings,
}

impl Suite {
    /// Directory that holds this suite's run directories.
    pub fn resolved_run_root(&self, matrix_run_root: &Path) -> PathBuf {
        self.run_root
            .clone()
            .unwrap_or_else(|| matrix_run_root.join(&self.name))
    }

    /// The weather file that applies to `subject`, if any.
    pub fn weather_for(&self, subject: &str) -> Option<&str> {
        self.weather
            .get(subject)
            .or(self.weather_file.as_ref())
            .map(String::as_str)
    }
}

/// The whole configuration file.
/// 整个配置文件。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OswMatrix {
    /// Language for console output (e.g. "en", "zh-CN"). Falls back to the
    /// system locale when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Simulation CLI, optionally followed by leading arguments.
    #[serde(default = "default_cli")]
    pub cli: String,
    /// Root directory of all run directories.
    #[serde(default = "default_run_root")]
    pub run_root: PathBuf,
    /// Worker pool size. Defaults to `max(1, cpus - 2)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    #[serde(default)]
    pub env: EnvPolicy,
    #[serde(default)]
    pub suites: Vec<Suite>,
}

impl OswMatrix {
    /// Reads and parses a configuration file, then resolves every relative
    /// path against the directory containing it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut matrix: OswMatrix = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        matrix.resolve_paths(base);
        matrix.check_suite_names()?;
        Ok(matrix)
    }

    /// Makes relative paths absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        self.run_root = crate::infra::fs::resolve_against(base, &self.run_root);
        for suite in &mut self.suites {
            suite.template = crate::infra::fs::resolve_against(base, &suite.template);
            suite.fixtures = suite
                .fixtures
                .as_ref()
                .map(|p| crate::infra::fs::resolve_against(base, p));
            suite.run_root = suite
                .run_root
                .as_ref()
                .map(|p| crate::infra::fs::resolve_against(base, p));
        }
    }

    /// Rejects configurations declaring two suites with the same name.
    pub fn check_suite_names(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for suite in &self.suites {
            if !seen.insert(suite.name.as_str()) {
                return Err(ConfigError::DuplicateSuite(suite.name.clone()));
            }
        }
        Ok(())
    }

    /// Returns the suites named in `selected`, or all suites when it is empty.
    pub fn select_suites(&self, selected: &[String]) -> Result<Vec<Suite>, ConfigError> {
        if selected.is_empty() {
            return Ok(self.suites.clone());
        }
        selected
            .iter()
            .map(|name| {
                self.suites
                    .iter()
                    .find(|s| &s.name == name)
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownSuite(name.clone()))
            })
            .collect()
    }
}

fn default_cli() -> String {
    "openstudio".to_string()
}

fn default_run_root() -> PathBuf {
    PathBuf::from("runs")
}

fn default_measure_step() -> String {
    "tbd_measure".to_string()
}

fn default_option_argument() -> String {
    "option".to_string()
}

fn default_prototype_step() -> String {
    "create_DOE_prototype_building".to_string()
}

fn default_success_status() -> String {
    "Success".to_string()
}

fn default_results_step() -> String {
    "openstudio_results".to_string()
}

fn default_metric() -> String {
    "total_site_energy".to_string()
}
