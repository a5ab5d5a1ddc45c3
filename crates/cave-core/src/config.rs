use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let dirs =
            ProjectDirs::from("dev", "cave", "cave").context("cannot locate config directory")?;
        Ok(dirs.config_dir().join("graph.toml"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(PathBuf::from).unwrap_or_else(|| {
            Config::default_path().unwrap_or_else(|_| PathBuf::from("./graph.toml"))
        });
        let mut cfg = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading config at {:?}", path))?;
            toml::from_str(&content).context("parsing config")?
        } else {
            Config::default()
        };
        cfg.expand_paths();
        Ok(cfg)
    }

    pub fn expand_paths(&mut self) {
        self.store.path = expand_tilde(&self.store.path);
        if let Some(file) = &self.logging.file {
            self.logging.file = Some(expand_tilde(file));
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ApiConfig::default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout: Self::default_timeout(),
        }
    }
}

impl ApiConfig {
    fn default_base_url() -> String {
        "http://localhost:8080".into()
    }

    fn default_timeout() -> Duration {
        Duration::from_secs(30)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "StoreConfig::default_path")]
    pub path: PathBuf,
    #[serde(default = "StoreConfig::default_max_suggestions")]
    pub max_suggestions_per_field: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            max_suggestions_per_field: Self::default_max_suggestions(),
        }
    }
}

impl StoreConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("~/.local/share/cave/graph-state.db")
    }

    fn default_max_suggestions() -> Option<usize> {
        Some(200)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            file: Some(PathBuf::from("~/.local/state/cave/graph.log")),
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".into()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "GraphConfig::default_range", with = "humantime_serde")]
    pub default_range: Duration,
    #[serde(default = "GraphConfig::default_interval")]
    pub default_interval: String,
    #[serde(default = "GraphConfig::default_aggregator")]
    pub default_aggregator: String,
    #[serde(default = "GraphConfig::default_interval")]
    pub default_interval_for_test: String,
    /// Origin and path of the graph page, used for shareable links.
    #[serde(default = "GraphConfig::default_page_url")]
    pub page_url: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_range: Self::default_range(),
            default_interval: Self::default_interval(),
            default_aggregator: Self::default_aggregator(),
            default_interval_for_test: Self::default_interval(),
            page_url: Self::default_page_url(),
        }
    }
}

impl GraphConfig {
    fn default_range() -> Duration {
        Duration::from_secs(3600)
    }

    fn default_interval() -> String {
        "minute".into()
    }

    fn default_aggregator() -> String {
        "mean".into()
    }

    fn default_page_url() -> String {
        "http://localhost:8080/graph".into()
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if !path_str.starts_with('~') {
        return path.to_path_buf();
    }

    let home = BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    if path_str == "~" {
        home
    } else {
        let mut expanded = home;
        expanded.push(path_str.trim_start_matches("~/"));
        expanded
    }
}
