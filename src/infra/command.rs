//! # Command Execution Module / 命令执行模块
//!
//! Builds the environment of the simulation child process and spawns it with
//! its output captured.
//!
//! 构建模拟子进程的环境，并在捕获其输出的情况下启动它。

use std::collections::BTreeSet;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::harness::config::{EnvMode, EnvPolicy};

/// Variables that leak the harness's package-manager and interpreter context
/// into the simulation CLI, which resolves its own embedded Ruby and gems.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "BUNDLE_BIN_PATH",
    "BUNDLE_GEMFILE",
    "BUNDLE_PATH",
    "BUNDLE_WITHOUT",
    "BUNDLER_ORIG_BUNDLE_BIN_PATH",
    "BUNDLER_ORIG_BUNDLE_GEMFILE",
    "BUNDLER_ORIG_GEM_HOME",
    "BUNDLER_ORIG_GEM_PATH",
    "BUNDLER_ORIG_MANPATH",
    "BUNDLER_ORIG_PATH",
    "BUNDLER_ORIG_RB_USER_INSTALL",
    "BUNDLER_ORIG_RUBYLIB",
    "BUNDLER_ORIG_RUBYOPT",
    "BUNDLER_SETUP",
    "BUNDLER_VERSION",
    "GEM_HOME",
    "GEM_PATH",
    "RUBYLIB",
    "RUBYOPT",
];

/// The environment handed to a child process.
/// 传递给子进程的环境。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildEnv {
    /// Inherit the harness environment minus these variables.
    Denylist(BTreeSet<String>),
    /// Start empty and copy only these variables from the harness environment.
    Allowlist(BTreeSet<String>),
}

impl Default for ChildEnv {
    fn default() -> Self {
        ChildEnv::Denylist(DEFAULT_DENYLIST.iter().map(|v| v.to_string()).collect())
    }
}

impl ChildEnv {
    pub fn from_policy(policy: &EnvPolicy) -> Self {
        match policy.mode {
            EnvMode::Denylist => {
                let mut vars: BTreeSet<String> =
                    DEFAULT_DENYLIST.iter().map(|v| v.to_string()).collect();
                vars.extend(policy.vars.iter().cloned());
                ChildEnv::Denylist(vars)
            }
            EnvMode::Allowlist => ChildEnv::Allowlist(policy.vars.iter().cloned().collect()),
        }
    }

    /// Applies this environment to `cmd`, reading allowlisted values from the
    /// current process.
    pub fn apply(&self, cmd: &mut Command) {
        self.apply_with(cmd, |name| std::env::var_os(name))
    }

    /// Like [`ChildEnv::apply`] with an explicit lookup for allowlisted values.
    pub fn apply_with<F>(&self, cmd: &mut Command, lookup: F)
    where
        F: Fn(&str) -> Option<std::ffi::OsString>,
    {
        match self {
            ChildEnv::Denylist(vars) => {
                for var in vars {
                    cmd.env_remove(var);
                }
            }
            ChildEnv::Allowlist(vars) => {
                cmd.env_clear();
                for var in vars {
                    if let Some(value) = lookup(var) {
                        cmd.env(var, value);
                    }
                }
            }
        }
    }
}

/// Exit status and combined output of a finished child.
#[derive(Debug, Clone)]
pub struct CapturedRun {
    pub status: ExitStatus,
    /// Stdout and stderr lines in arrival order.
    pub output: String,
}

/// Spawns `cmd` and waits for it, collecting stdout and stderr line by line
/// into one buffer.
///
/// 启动 `cmd` 并等待其结束，将 stdout 和 stderr 逐行收集到一个缓冲区中。
pub async fn spawn_and_capture(mut cmd: Command) -> std::io::Result<CapturedRun> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("child stderr was not captured"))?;

    let buffer = Arc::new(Mutex::new(String::new()));
    let stdout_task = tokio::spawn(drain_lines(stdout, Arc::clone(&buffer)));
    let stderr_task = tokio::spawn(drain_lines(stderr, Arc::clone(&buffer)));

    let status = child.wait().await?;

    // Both readers hit EOF once the child is gone.
    if let Err(e) = stdout_task.await {
        eprintln!("Failed to join stdout task: {}", e);
    }
    if let Err(e) = stderr_task.await {
        eprintln!("Failed to join stderr task: {}", e);
    }

    let output = buffer.lock().await.clone();
    Ok(CapturedRun { status, output })
}

/// Reads `stream` to EOF, appending each line to `buffer`. Lines that are not
/// valid UTF-8 are decoded lossily; only an I/O error ends the loop early.
async fn drain_lines<R>(stream: R, buffer: Arc<Mutex<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                let mut buffer = buffer.lock().await;
                buffer.push_str(text.trim_end_matches(['\r', '\n']));
                buffer.push('\n');
            }
        }
    }
}
