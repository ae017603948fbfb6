//! # Command Line Interface / 命令行接口
//!
//! Builds the clap command tree and dispatches to the `run` and `init`
//! commands.
//!
//! 构建 clap 命令树并分派到 `run` 和 `init` 命令。

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::{env, path::PathBuf};

use crate::harness::config::DEFAULT_CONFIG_FILE;
use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
fn pre_parse_language() -> Option<String> {
    find_language_arg(env::args())
}

/// Finds the value of `--lang`, given either as `--lang xx` or `--lang=xx`.
pub fn find_language_arg<I>(args: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--lang" {
            return args.next();
        }
        if let Some(value) = arg.strip_prefix("--lang=") {
            return Some(value.to_string());
        }
    }
    None
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("osw-matrix-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cli.run_about", locale = locale).to_string())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("cli.config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .default_value(DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help(t!("cli.jobs", locale = locale).to_string())
                        .value_name("JOBS")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("suite")
                        .short('s')
                        .long("suite")
                        .help(t!("cli.suite", locale = locale).to_string())
                        .value_name("SUITE")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("cli.html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.init_about", locale = locale).to_string())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("cli.init_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .default_value(DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("cli.non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

pub async fn run() -> Result<()> {
    let requested = pre_parse_language();
    let language = crate::resolve_locale(requested.as_deref());
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let options = commands::run::RunOptions {
                config: run_matches
                    .get_one::<PathBuf>("config")
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
                jobs: run_matches.get_one::<usize>("jobs").copied(),
                suites: run_matches
                    .get_many::<String>("suite")
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default(),
                html: run_matches.get_one::<PathBuf>("html").cloned(),
                language: requested,
            };
            commands::run::execute(options).await?;
        }
        Some(("init", init_matches)) => {
            let config = init_matches
                .get_one::<PathBuf>("config")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            let non_interactive = init_matches.get_flag("non-interactive");
            commands::init::run_init_wizard(&config, &language, non_interactive)?;
        }
        _ => {
            // Clap has already printed help.
        }
    }
    Ok(())
}
