use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use matshell_contracts::{DEFAULT_REGISTRY_CAPACITY, MATSHELL_CONFIG_SCHEMA_VERSION};
use serde::Deserialize;

/// On-disk config document. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    schema_version: Option<String>,
    capacity: Option<usize>,
    data_dir: Option<PathBuf>,
    seed: Option<u64>,
    startup_matrix: Option<bool>,
    prompt: Option<String>,
}

/// Flags given on the command line; they win over the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub capacity: Option<usize>,
    pub data_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub no_startup_matrix: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub capacity: usize,
    pub data_dir: PathBuf,
    pub seed: Option<u64>,
    pub startup_matrix: bool,
    pub prompt: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_REGISTRY_CAPACITY,
            data_dir: PathBuf::from("."),
            seed: None,
            startup_matrix: true,
            prompt: "> ".to_string(),
        }
    }
}

impl ShellConfig {
    /// Defaults, then the config file at `path` if any, then `cli`.
    pub fn resolve(path: Option<&Path>, cli: &CliOverrides) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(path) = path {
            cfg.merge_file(load_file(path)?);
        }
        cfg.merge_cli(cli);
        if cfg.capacity == 0 {
            anyhow::bail!("registry capacity must be at least 1");
        }
        Ok(cfg)
    }

    fn merge_file(&mut self, file: ConfigFile) {
        if let Some(capacity) = file.capacity {
            self.capacity = capacity;
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if file.seed.is_some() {
            self.seed = file.seed;
        }
        if let Some(on) = file.startup_matrix {
            self.startup_matrix = on;
        }
        if let Some(prompt) = file.prompt {
            self.prompt = prompt;
        }
    }

    fn merge_cli(&mut self, cli: &CliOverrides) {
        if let Some(capacity) = cli.capacity {
            self.capacity = capacity;
        }
        if let Some(dir) = &cli.data_dir {
            self.data_dir = dir.clone();
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
        if cli.no_startup_matrix {
            self.startup_matrix = false;
        }
    }
}

fn load_file(path: &Path) -> Result<ConfigFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read config: {}", path.display()))?;
    let file: ConfigFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON: {}", path.display()))?;
    if let Some(v) = &file.schema_version {
        if v.trim() != MATSHELL_CONFIG_SCHEMA_VERSION {
            anyhow::bail!(
                "config schema_version mismatch: expected {MATSHELL_CONFIG_SCHEMA_VERSION} got {v:?}"
            );
        }
    }
    Ok(file)
}
