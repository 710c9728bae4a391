use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home))
}

pub fn relay_home() -> Result<PathBuf> {
    Ok(home_dir()?.join(".relay"))
}

pub fn ensure_relay_home() -> Result<PathBuf> {
    let dir = relay_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Where the mail layer drops attachments unless configured otherwise.
pub fn default_export_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join("Downloads"))
}
