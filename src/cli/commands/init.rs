//! # Configuration Initialization Module / 配置初始化模块
//!
//! Writes a starter `OswMatrix.toml`, either directly or through an
//! interactive wizard that picks the suites and the simulation CLI.
//!
//! 直接或通过交互式向导（选择套件和模拟 CLI）生成初始的 `OswMatrix.toml`。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::harness::config::{EnvPolicy, OswMatrix, SubjectKind, Suite, ValidationSettings};
use crate::harness::workflow::SKIP_OPTION;
use crate::infra::t;

/// Thermal-bridging options exercised by the default suites.
pub const DEFAULT_OPTIONS: &[&str] = &[
    SKIP_OPTION,
    "poor (BETBG)",
    "regular (BETBG)",
    "efficient (BETBG)",
    "spandrel (BETBG)",
    "spandrel HP (BETBG)",
    "code (Quebec)",
    "uncompliant (Quebec)",
    "(non thermal bridging)",
];

/// Seed models of the default model suite.
pub const DEFAULT_MODELS: &[&str] = &["seb.osm", "warehouse.osm", "smalloffice.osm"];

/// Building types of the default prototype suite.
pub const DEFAULT_PROTOTYPES: &[&str] = &[
    "SmallOffice",
    "MediumOffice",
    "PrimarySchool",
    "QuickServiceRestaurant",
    "Warehouse",
];

/// Runs the wizard (or its non-interactive shortcut) writing to `config_path`.
///
/// 运行向导（或其非交互式快捷方式），写入 `config_path`。
pub fn run_init_wizard(config_path: &Path, language: &str, non_interactive: bool) -> Result<()> {
    let theme = ColorfulTheme::default();

    if non_interactive {
        return write_config(config_path, &default_matrix(), language);
    }

    println!("\n{}", t!("init.welcome", locale = language).cyan().bold());
    println!("{}", t!("init.description", locale = language));

    if config_path.exists() {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", locale = language, path = config_path.display()))
            .default(false)
            .interact()
            .context(t!("init.confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let cli: String = Input::with_theme(&theme)
        .with_prompt(t!("init.cli_prompt", locale = language))
        .default(default_matrix().cli)
        .interact_text()
        .context(t!("init.confirmation_failed", locale = language).to_string())?;

    let defaults = default_suites();
    let labels: Vec<String> = defaults
        .iter()
        .map(|s| format!("{} ({})", s.name, s.subjects.join(", ")))
        .collect();
    let selections = MultiSelect::with_theme(&theme)
        .with_prompt(t!("init.suite_prompt", locale = language))
        .items(&labels)
        .defaults(&vec![true; labels.len()])
        .interact()
        .context(t!("init.confirmation_failed", locale = language).to_string())?;

    if selections.is_empty() {
        println!("{}", t!("init.no_suites_selected", locale = language).yellow());
    }

    let matrix = OswMatrix {
        language: Some(language.to_string()),
        cli,
        suites: selections.into_iter().map(|i| defaults[i].clone()).collect(),
        ..default_matrix()
    };

    write_config(config_path, &matrix, language)
}

/// The configuration written by `init --non-interactive`.
pub fn default_matrix() -> OswMatrix {
    OswMatrix {
        language: None,
        cli: "openstudio".to_string(),
        run_root: PathBuf::from("runs"),
        jobs: None,
        env: EnvPolicy::default(),
        suites: default_suites(),
    }
}

/// The measure smoke suite, the model-file suite and the prototype suite.
pub fn default_suites() -> Vec<Suite> {
    let options: Vec<String> = DEFAULT_OPTIONS.iter().map(|o| o.to_string()).collect();
    let base = Suite {
        name: String::new(),
        kind: SubjectKind::Model,
        template: PathBuf::new(),
        fixtures: Some(PathBuf::from("fixtures/files")),
        run_root: None,
        measure_step: "tbd_measure".to_string(),
        option_argument: "option".to_string(),
        prototype_step: "create_DOE_prototype_building".to_string(),
        weather_file: None,
        weather: BTreeMap::new(),
        subjects: Vec::new(),
        options: Vec::new(),
        validation: ValidationSettings::default(),
    };

    vec![
        Suite {
            name: "measure".to_string(),
            template: PathBuf::from("fixtures/osw/measure.osw"),
            subjects: vec!["seb.osm".to_string()],
            options: vec![SKIP_OPTION.to_string(), "code (Quebec)".to_string()],
            ..base.clone()
        },
        Suite {
            name: "model".to_string(),
            template: PathBuf::from("fixtures/osw/model.osw"),
            subjects: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            options: options.clone(),
            ..base.clone()
        },
        Suite {
            name: "prototype".to_string(),
            kind: SubjectKind::Prototype,
            template: PathBuf::from("fixtures/osw/prototype.osw"),
            fixtures: None,
            subjects: DEFAULT_PROTOTYPES.iter().map(|p| p.to_string()).collect(),
            options,
            ..base
        },
    ]
}

fn write_config(path: &Path, matrix: &OswMatrix, language: &str) -> Result<()> {
    let toml_string = toml::to_string_pretty(matrix)
        .context(t!("init.serialize_failed", locale = language).to_string())?;

    fs::write(path, toml_string)
        .with_context(|| t!("init.write_failed", locale = language, path = path.display()).to_string())?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.created", locale = language, path = path.display()).bold()
    );
    println!("{}", t!("init.usage_hint", locale = language));

    Ok(())
}
