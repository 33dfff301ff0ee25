use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::Ko2PathwayError;

pub const DEFAULT_CONFIG_FILE: &str = "ko2pathway.json";
pub const DEFAULT_CACHE_FILE: &str = "kegg_ko_pathway_map.json";
pub const DEFAULT_OUTPUT_FILE: &str = "kegg_pathway_summary.tsv";
pub const DEFAULT_PLOT_FILE: &str = "top20_pathways_circular_barplot.svg";
pub const DEFAULT_KEGG_BASE_URL: &str = "https://rest.kegg.jp";
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub cache: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub plotfile: Option<String>,
    #[serde(default)]
    pub kegg_base_url: Option<String>,
    #[serde(default)]
    pub request_delay_ms: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub cache: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub plotfile: Utf8PathBuf,
    pub kegg: KeggSettings,
}

#[derive(Debug, Clone)]
pub struct KeggSettings {
    pub base_url: String,
    pub request_delay: Duration,
    pub timeout: Duration,
}

impl Default for KeggSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_KEGG_BASE_URL.to_string(),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; the implicit `ko2pathway.json` is optional.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, Ko2PathwayError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| Ko2PathwayError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| Ko2PathwayError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, Ko2PathwayError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let cache = match config.cache {
            Some(path) => Utf8PathBuf::from(path),
            None => default_cache_path()?,
        };
        let base_url = config
            .kegg_base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_KEGG_BASE_URL.to_string());

        Ok(ResolvedConfig {
            schema_version,
            cache,
            output: Utf8PathBuf::from(config.output.unwrap_or_else(|| DEFAULT_OUTPUT_FILE.into())),
            plotfile: Utf8PathBuf::from(
                config
                    .plotfile
                    .unwrap_or_else(|| DEFAULT_PLOT_FILE.into()),
            ),
            kegg: KeggSettings {
                base_url,
                request_delay: Duration::from_millis(
                    config.request_delay_ms.unwrap_or(DEFAULT_REQUEST_DELAY_MS),
                ),
                timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            },
        })
    }
}

/// `~/.cache/ko2pathway/kegg_ko_pathway_map.json`, shared across projects.
pub fn default_cache_path() -> Result<Utf8PathBuf, Ko2PathwayError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("ko2pathway")).ok()
        })
        .map(|dir| dir.join(DEFAULT_CACHE_FILE))
        .ok_or_else(|| Ko2PathwayError::Filesystem("unable to resolve cache directory".to_string()))
}
