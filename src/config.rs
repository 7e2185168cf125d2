use reqwest::Url;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Default backend host used when `FIISPLORER_BACKEND_URL` is unset.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
/// Default bound applied to a single search request.
pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 8_000;
/// Default admission size ceiling (10 MiB).
pub const DEFAULT_UPLOAD_MAX_BYTES: u64 = 10 * 1024 * 1024;
/// Default delay between simulated progress steps.
pub const DEFAULT_UPLOAD_STEP_DELAY_MS: u64 = 100;
/// Default time processed uploads stay visible before leaving the queue.
pub const DEFAULT_UPLOAD_HOLD_MS: u64 = 2_000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the search client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the search backend; also hosts the `/documents/` path.
    pub backend_url: Url,
    /// Upper bound for a single search call, in milliseconds.
    pub search_timeout_ms: u64,
    /// Largest file size accepted by the upload admission rules.
    pub upload_max_bytes: u64,
    /// Delay between progress steps of the simulated transport.
    pub upload_step_delay_ms: u64,
    /// Display-hold before processed uploads are cleared from the queue.
    pub upload_hold_ms: u64,
}

/// Settings consumed by [`crate::search::SearchOrchestrator`].
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Backend host serving `/search` and `/documents/`.
    pub backend_url: Url,
    /// Timeout bound for one search invocation.
    pub timeout: Duration,
}

/// Settings consumed by [`crate::upload::UploadPipeline`].
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Inclusive size ceiling for admitted files.
    pub max_file_bytes: u64,
    /// Delay between simulated progress steps.
    pub step_delay: Duration,
    /// How long processed items remain visible after a batch completes.
    pub display_hold: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            search_timeout_ms: DEFAULT_SEARCH_TIMEOUT_MS,
            upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            upload_step_delay_ms: DEFAULT_UPLOAD_STEP_DELAY_MS,
            upload_hold_ms: DEFAULT_UPLOAD_HOLD_MS,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Config::default().search_settings()
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Config::default().upload_settings()
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_url = match load_env_optional("FIISPLORER_BACKEND_URL") {
            Some(value) => parse_backend_url(&value)
                .ok_or_else(|| ConfigError::InvalidValue("FIISPLORER_BACKEND_URL".into()))?,
            None => default_backend_url(),
        };

        Ok(Self {
            backend_url,
            search_timeout_ms: load_positive(
                "FIISPLORER_SEARCH_TIMEOUT_MS",
                DEFAULT_SEARCH_TIMEOUT_MS,
            )?,
            upload_max_bytes: load_positive("FIISPLORER_UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES)?,
            upload_step_delay_ms: load_u64(
                "FIISPLORER_UPLOAD_STEP_DELAY_MS",
                DEFAULT_UPLOAD_STEP_DELAY_MS,
            )?,
            upload_hold_ms: load_u64("FIISPLORER_UPLOAD_HOLD_MS", DEFAULT_UPLOAD_HOLD_MS)?,
        })
    }

    /// Derive the search orchestrator settings.
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            backend_url: self.backend_url.clone(),
            timeout: Duration::from_millis(self.search_timeout_ms),
        }
    }

    /// Derive the upload pipeline settings.
    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            max_file_bytes: self.upload_max_bytes,
            step_delay: Duration::from_millis(self.upload_step_delay_ms),
            display_hold: Duration::from_millis(self.upload_hold_ms),
        }
    }
}

fn default_backend_url() -> Url {
    Url::parse(DEFAULT_BACKEND_URL).expect("default backend URL is valid")
}

fn parse_backend_url(value: &str) -> Option<Url> {
    let parsed = Url::parse(value.trim()).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed),
        _ => None,
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
        .map(|value| value.unwrap_or(default))
}

fn load_positive(key: &str, default: u64) -> Result<u64, ConfigError> {
    match load_u64(key, default)? {
        0 => Err(ConfigError::InvalidValue(key.to_string())),
        value => Ok(value),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
///
/// Repeated calls keep the first configuration that was installed.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        backend_url = %config.backend_url,
        search_timeout_ms = config.search_timeout_ms,
        upload_max_bytes = config.upload_max_bytes,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_behavior() {
        let config = Config::default();
        assert_eq!(config.backend_url.as_str(), "http://127.0.0.1:8000/");
        let search = config.search_settings();
        assert_eq!(search.timeout, Duration::from_secs(8));
        let upload = config.upload_settings();
        assert_eq!(upload.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(upload.step_delay, Duration::from_millis(100));
        assert_eq!(upload.display_hold, Duration::from_secs(2));
    }

    #[test]
    fn backend_url_requires_http_scheme() {
        assert!(parse_backend_url("https://search.example.edu").is_some());
        assert!(parse_backend_url("  http://10.0.0.5:8000/api  ").is_some());
        assert!(parse_backend_url("ftp://example.edu").is_none());
        assert!(parse_backend_url("not a url").is_none());
    }
}
