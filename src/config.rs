use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

const MIN_REQUEST_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Deserialize, Default)]
struct FileConfig {
    bind_addr: Option<String>,
    summarizer_url: Option<String>,
    request_timeout_seconds: Option<u64>,
    frontend_dist: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RootConfig {
    #[serde(default, flatten)]
    top: FileConfig,
    reko_web: Option<FileConfig>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub summarizer_url: String,
    pub request_timeout_seconds: u64,
    pub frontend_dist: String,
    pub config_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            summarizer_url: "http://127.0.0.1:8001/api/summarize".to_string(),
            request_timeout_seconds: 900,
            frontend_dist: "frontend/dist".to_string(),
            config_path: PathBuf::from("config.toml"),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        let mut cfg = Self::default();

        let config_path = find_config_file().unwrap_or_else(|| config_search_paths()[0].clone());
        cfg.config_path = config_path.clone();

        let root = match load_root_config(&config_path) {
            Ok(root) => root,
            Err(err) => {
                warn!("ignoring config file {}: {err:#}", config_path.display());
                RootConfig::default()
            }
        };
        cfg.apply_root(root);
        cfg.apply_env(|key| env::var(key).ok());

        cfg
    }

    fn apply_root(&mut self, root: RootConfig) {
        let RootConfig { top, reko_web } = root;
        self.apply_file(top);
        if let Some(section) = reko_web {
            self.apply_file(section);
        }
    }

    fn apply_file(&mut self, file_cfg: FileConfig) {
        set_opt(&mut self.bind_addr, file_cfg.bind_addr);
        set_opt(&mut self.summarizer_url, file_cfg.summarizer_url);
        set_opt_u64_min(
            &mut self.request_timeout_seconds,
            file_cfg.request_timeout_seconds,
            MIN_REQUEST_TIMEOUT_SECONDS,
        );
        set_opt(&mut self.frontend_dist, file_cfg.frontend_dist);
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let env_parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let env_cfg = FileConfig {
            bind_addr: lookup("REKO_WEB_BIND_ADDR"),
            summarizer_url: lookup("REKO_WEB_SUMMARIZER_URL"),
            request_timeout_seconds: env_parse("REKO_WEB_REQUEST_TIMEOUT_SECONDS"),
            frontend_dist: lookup("REKO_WEB_FRONTEND_DIST"),
        };
        self.apply_file(env_cfg);
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn frontend_dist(&self) -> PathBuf {
        PathBuf::from(&self.frontend_dist)
    }
}

pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("config.toml"), PathBuf::from("reko.toml")];
    if let Some(home) = dirs_home() {
        paths.push(home.join(".config").join("reko").join("config.toml"));
    }
    paths
}

pub fn find_config_file() -> Option<PathBuf> {
    config_search_paths().into_iter().find(|path| path.exists())
}

fn dirs_home() -> Option<PathBuf> {
    env::var("HOME").ok().map(PathBuf::from)
}

fn load_root_config(path: &Path) -> Result<RootConfig> {
    if !path.exists() {
        return Ok(RootConfig::default());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("failed reading {path:?}"))?;
    parse_root_config(&raw)
}

fn parse_root_config(raw: &str) -> Result<RootConfig> {
    toml::from_str::<RootConfig>(raw).context("failed parsing config as root structure")
}

fn set_opt<T>(dst: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *dst = v;
    }
}

fn set_opt_u64_min(dst: &mut u64, value: Option<u64>, min: u64) {
    if let Some(v) = value {
        *dst = v.max(min);
    }
}
