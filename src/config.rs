//! Bridge configuration model, defaults, and loading.

use std::path::{Path, PathBuf};

use log::info;

const CONFIG_FILE_NAME: &str = "nowplaying-bridge.toml";
const MIN_INTERVAL_MS: u64 = 100;

/// Root configuration persisted to `nowplaying-bridge.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Webhook sink endpoints.
    pub sink: SinkConfig,
    #[serde(default)]
    /// Dispatch cadence and HTTP timeouts.
    pub dispatch: DispatchConfig,
    #[serde(default)]
    /// Cover-art rewriting.
    pub artwork: ArtworkConfig,
    #[serde(default)]
    /// Page capture input.
    pub page: PageConfig,
}

/// Where snapshots are delivered and where the local sink listens.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct SinkConfig {
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

/// Tick schedule and transport timeouts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct DispatchConfig {
    /// Delay before the first tick.
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
    /// Fixed period between ticks.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// CDN size rewriting for cover art.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ArtworkConfig {
    /// Hosts containing this marker get their `w<N>-h<N>` token rewritten.
    #[serde(default = "default_cdn_host_marker")]
    pub cdn_host_marker: String,
    #[serde(default = "default_upgrade_edge_px")]
    pub upgrade_edge_px: u32,
    /// Final edge length requested from the CDN.
    #[serde(default = "default_cap_edge_px")]
    pub cap_edge_px: u32,
}

/// Page capture input used by the `run` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct PageConfig {
    #[serde(default)]
    pub capture_path: String,
}

/// Failure to read or create the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no config directory available on this platform")]
    NoConfigDir,
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize default config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn default_webhook_url() -> String {
    "http://localhost:8080/webhook".to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_warmup_ms() -> u64 {
    1_500
}

fn default_interval_ms() -> u64 {
    1_000
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_cdn_host_marker() -> String {
    "googleusercontent.com".to_string()
}

fn default_upgrade_edge_px() -> u32 {
    1_600
}

fn default_cap_edge_px() -> u32 {
    800
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            webhook_url: default_webhook_url(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            warmup_ms: default_warmup_ms(),
            interval_ms: default_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            cdn_host_marker: default_cdn_host_marker(),
            upgrade_edge_px: default_upgrade_edge_px(),
            cap_edge_px: default_cap_edge_px(),
        }
    }
}

/// Clamps values that would stall the loop or produce nonsense art sizes.
pub fn sanitize_config(config: Config) -> Config {
    let mut sanitized = config;
    sanitized.dispatch.interval_ms = sanitized.dispatch.interval_ms.max(MIN_INTERVAL_MS);
    sanitized.dispatch.connect_timeout_ms = sanitized.dispatch.connect_timeout_ms.max(1);
    sanitized.dispatch.request_timeout_ms = sanitized.dispatch.request_timeout_ms.max(1);
    sanitized.artwork.upgrade_edge_px = sanitized.artwork.upgrade_edge_px.max(1);
    sanitized.artwork.cap_edge_px = sanitized
        .artwork
        .cap_edge_px
        .clamp(1, sanitized.artwork.upgrade_edge_px);
    if sanitized.artwork.cdn_host_marker.trim().is_empty() {
        sanitized.artwork.cdn_host_marker = default_cdn_host_marker();
    }
    sanitized
}

/// Default location of the config file.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

/// Parses config text, filling every missing field with its default.
pub fn parse_config(content: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str::<Config>(content)
        .map(sanitize_config)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Loads the config at `path`, writing a default file first if none exists.
pub fn load_or_create(path: &Path) -> Result<Config, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if !path.exists() {
        info!(
            "Config file not found. Creating default config. path={}",
            path.display()
        );
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(path, toml::to_string(&Config::default())?).map_err(io_error)?;
    }
    let content = std::fs::read_to_string(path).map_err(io_error)?;
    parse_config(&content, path)
}
