use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const API_URL_ENV: &str = "MOVIEFLIX_API_URL";
pub const SESSION_PATH_ENV: &str = "MOVIEFLIX_SESSION_PATH";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Where the movie API lives and how long a single call may take.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { session_path: default_session_path() }
    }
}

fn default_base_url() -> String { "http://127.0.0.1:8080".to_string() }
fn default_connect_timeout() -> u64 { 5 }
fn default_request_timeout() -> u64 { 30 }
fn default_session_path() -> PathBuf { PathBuf::from("data/session.json") }

pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string())
}

/// Read and parse a config file; `None` when the file does not exist.
pub fn load_from_file(path: &str) -> Result<Option<AppConfig>> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(&content).map(Some).map_err(|e| anyhow!("{path}: {e}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow!("cannot read {path}: {e}")),
    }
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load from `CONFIG_PATH` (default `config.toml`), falling back to
    /// defaults when the file is missing, then apply env overrides.
    pub fn load_or_default() -> Result<Self> {
        let mut cfg = load_from_file(&config_path())?.unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.backend.normalize_from_env();
        self.backend.validate()?;
        self.storage.normalize_from_env();
        self.storage.validate()?;
        Ok(())
    }
}

impl BackendConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if self.base_url.trim().is_empty() {
            self.base_url = default_base_url();
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("backend.base_url must start with http:// or https://"));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(anyhow!("backend timeouts must be positive seconds"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(path) = std::env::var(SESSION_PATH_ENV) {
            if !path.trim().is_empty() {
                self.session_path = PathBuf::from(path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_path.as_os_str().is_empty() {
            return Err(anyhow!("storage.session_path is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() -> Result<()> {
        let cfg = parse("")?;
        assert_eq!(cfg.backend.base_url, "http://127.0.0.1:8080");
        assert_eq!(cfg.backend.request_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.backend.connect_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.storage.session_path, PathBuf::from("data/session.json"));
        Ok(())
    }

    #[test]
    fn partial_sections_keep_field_defaults() -> Result<()> {
        let cfg = parse(
            r#"
            [backend]
            base_url = "https://movies.example.com/api/"
            request_timeout_secs = 10
            "#,
        )?;
        assert_eq!(cfg.backend.request_timeout_secs, 10);
        assert_eq!(cfg.backend.connect_timeout_secs, 5);
        Ok(())
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        if std::env::var(API_URL_ENV).is_ok() { return; }
        let mut backend = BackendConfig {
            base_url: " https://movies.example.com/api/ ".into(),
            ..BackendConfig::default()
        };
        backend.normalize_from_env();
        assert!(backend.validate().is_ok());
        assert_eq!(backend.base_url, "https://movies.example.com/api");
    }

    #[test]
    fn rejects_non_http_url() {
        let backend = BackendConfig { base_url: "ftp://movies".into(), ..BackendConfig::default() };
        assert!(backend.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeouts() {
        let backend = BackendConfig { request_timeout_secs: 0, ..BackendConfig::default() };
        assert!(backend.validate().is_err());
    }

    #[test]
    fn load_from_file_reads_toml() -> Result<()> {
        let path = std::env::temp_dir().join(format!("movieflix_cfg_{}.toml", uuid::Uuid::new_v4()));
        let path_str = path.to_str().ok_or_else(|| anyhow!("utf8 path"))?.to_string();
        assert!(load_from_file(&path_str)?.is_none());

        std::fs::write(&path, "[storage]\nsession_path = \"state/me.json\"\n")?;
        let cfg = load_from_file(&path_str)?.ok_or_else(|| anyhow!("config missing"))?;
        assert_eq!(cfg.storage.session_path, PathBuf::from("state/me.json"));

        std::fs::write(&path, "[backend\n")?;
        assert!(load_from_file(&path_str).is_err());
        let _ = std::fs::remove_file(&path);
        Ok(())
    }
}
