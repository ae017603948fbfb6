//! # File System Operations Module / 文件系统操作模块
//!
//! Fixture precondition checks, run-directory creation and JSON document I/O.
//!
//! 夹具前置条件检查、运行目录创建以及 JSON 文档读写。

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::infra::t;

/// Returns `path` unchanged if absolute, otherwise `base.join(path)`.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Fails with a message naming `path` unless it is an existing directory.
pub fn ensure_fixture_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        bail!(t!("fixture.missing_dir", path = path.display()).to_string());
    }
    Ok(())
}

/// Fails with a message naming `path` unless it is an existing file.
pub fn ensure_fixture_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!(t!("fixture.missing_file", path = path.display()).to_string());
    }
    Ok(())
}

/// Creates a run directory and its parents. Safe to call concurrently.
pub fn ensure_run_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create run directory: {}", path.display()))
}

/// Reads and deserializes a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Serializes `value` as pretty-printed JSON into `path`.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
