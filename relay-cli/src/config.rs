use anyhow::{Context, Result};
use relay_core::{CurrencyTable, MemoStyle, NormalizerConfig, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{default_export_dir, ensure_relay_home, relay_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceSection,
    pub normalizer: NormalizerConfig,
    /// Currency code → minor-unit decimal places, merged over the built-in table
    pub currencies: BTreeMap<String, u32>,
    pub transactions: TransactionsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// Directory the mail layer saves attachments into (default: ~/Downloads)
    pub dir: Option<PathBuf>,
    pub extensions: Vec<String>,
    /// Files whose name contains this are treated as exports without sniffing
    pub name_marker: String,
    /// Ignore files older than this many days
    pub max_age_days: Option<u64>,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            dir: None,
            extensions: vec!["csv".to_string()],
            name_marker: "Expensify".to_string(),
            max_age_days: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionsSection {
    pub memo_style: MemoStyle,
}

impl Config {
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            normalizer: self.normalizer.clone(),
            currencies: CurrencyTable::default().with_overrides(&self.currencies),
            memo_style: self.transactions.memo_style,
        }
    }

    pub fn export_dir(&self) -> Result<PathBuf> {
        match &self.source.dir {
            Some(dir) => Ok(dir.clone()),
            None => default_export_dir(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(relay_home()?.join("config.toml"))
}

/// Load `path` (or ~/.relay/config.toml). A missing default file means defaults;
/// a missing explicit file is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = config_path()?;
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the default config unless one already exists. Returns the path.
pub fn init_config() -> Result<PathBuf> {
    let p = ensure_relay_home()?.join("config.toml");
    if p.exists() {
        eprintln!("Config already exists: {}", p.display());
        return Ok(p);
    }
    save_config(&Config::default(), &p)?;
    eprintln!("Wrote {}", p.display());
    Ok(p)
}
