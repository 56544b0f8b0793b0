use crate::data::{SortDirection, SortField};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[beads] dir`.
pub const BEADS_DIR_ENV: &str = "BEADS_DIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub beads: BeadsConfig,
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeadsConfig {
    #[serde(default = "default_beads_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_issues_file")]
    pub issues_file: String,
}

fn default_beads_dir() -> PathBuf {
    PathBuf::from(".beads")
}

fn default_issues_file() -> String {
    "issues.jsonl".to_string()
}

impl Default for BeadsConfig {
    fn default() -> Self {
        Self {
            dir: default_beads_dir(),
            issues_file: default_issues_file(),
        }
    }
}

impl BeadsConfig {
    pub fn issues_path(&self) -> PathBuf {
        self.dir.join(&self.issues_file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_sort_field")]
    pub sort_field: String,
    #[serde(default = "default_sort_direction")]
    pub sort_direction: String,
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_sort_field() -> String {
    "created".to_string()
}

fn default_sort_direction() -> String {
    "desc".to_string()
}

fn default_filter() -> String {
    "all".to_string()
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            sort_field: default_sort_field(),
            sort_direction: default_sort_direction(),
            filter: default_filter(),
        }
    }
}

impl TreeConfig {
    /// Parsed sort settings. Unknown names fall back to the defaults.
    pub fn sort(&self) -> (SortField, SortDirection) {
        let field = self.sort_field.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown sort field {:?}, using created", self.sort_field);
            SortField::default()
        });
        let direction = self.sort_direction.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown sort direction {:?}", self.sort_direction);
            field.default_direction()
        });
        (field, direction)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Rows used by `--print`.
    #[serde(default = "default_height")]
    pub height: i32,
    /// Columns used by `--print`.
    #[serde(default = "default_width")]
    pub width: i32,
}

fn default_height() -> i32 {
    30
}

fn default_width() -> i32 {
    100
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            height: default_height(),
            width: default_width(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let dir = directories::ProjectDirs::from("", "", "canopy")
        .context("Could not determine config directory")?
        .config_dir()
        .to_path_buf();
    Ok(dir)
}

pub fn data_dir() -> Result<PathBuf> {
    let dir = directories::ProjectDirs::from("", "", "canopy")
        .context("Could not determine data directory")?
        .data_dir()
        .to_path_buf();
    Ok(dir)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load the config at `path` (or the default location). A missing file
/// yields the defaults.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    Ok(config)
}

/// Resolve the beads directory: CLI flag, then `BEADS_DIR`, then config.
pub fn resolve_beads_dir(cli: Option<&Path>, env: Option<&str>, config: &Config) -> PathBuf {
    if let Some(dir) = cli {
        return dir.to_path_buf();
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => config.beads.dir.clone(),
    }
}

/// Write the default config to `path`, refusing to overwrite an existing file.
pub fn init(path: Option<&Path>) -> Result<PathBuf> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if config_path.exists() {
        anyhow::bail!("Config already exists at {}", config_path.display());
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(config_path)
}
