//! Configuration loading and validation.
//!
//! Sources are layered, later ones winning:
//! 1. built-in defaults,
//! 2. `config.toml` in the platform config directory, if present,
//! 3. an explicitly given file (TOML, YAML or JSON by extension),
//! 4. `CLIPFLOW_*` environment variables, with `__` separating nested keys
//!    (`CLIPFLOW_API__BASE_URL`, `CLIPFLOW_BROWSER__PER_PAGE`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the REST API, e.g. `https://app.example.com/api`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub per_page: u32,
    /// Files transferred at the same time.
    pub upload_concurrency: usize,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            per_page: 15,
            upload_concurrency: 3,
        }
    }
}

impl Config {
    /// Load, merge and validate every source. `explicit` must exist if given.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(explicit)?)
    }

    /// Every source, merged but not yet extracted.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        Ok(with_env(layered(default_path().as_deref(), explicit)?))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|err| exn::Exn::from(ErrorKind::Extract(err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            exn::bail!(invalid("api.base_url", "must not be empty"));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            exn::bail!(invalid("api.base_url", "must start with http:// or https://"));
        }
        if self.api.timeout_secs == 0 {
            exn::bail!(invalid("api.timeout_secs", "must be greater than zero"));
        }
        if self.browser.per_page == 0 {
            exn::bail!(invalid("browser.per_page", "must be greater than zero"));
        }
        if self.browser.upload_concurrency == 0 {
            exn::bail!(invalid("browser.upload_concurrency", "must be greater than zero"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

fn invalid(field: &'static str, reason: &str) -> ErrorKind {
    ErrorKind::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// `config.toml` inside the platform's config directory for clipflow.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "clipflow").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn layered(platform: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = platform
        && path.is_file()
    {
        tracing::debug!(path = %path.display(), "Reading platform config");
        figment = merge_file(figment, path)?;
    }
    if let Some(path) = explicit {
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "Reading config file");
        figment = merge_file(figment, path)?;
    }
    Ok(figment)
}

/// `CLIPFLOW_*` variables over everything else; `__` separates nested keys.
fn with_env(figment: Figment) -> Figment {
    figment.merge(Env::prefixed("CLIPFLOW_").split("__"))
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn load(platform: Option<&Path>, explicit: Option<&Path>) -> Result<Config> {
        Config::from_figment(layered(platform, explicit)?)
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = load(None, None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[rstest]
    #[case("config.toml", "[api]\nbase_url = \"https://a.example\"\n\n[browser]\nper_page = 30\n")]
    #[case("config.yaml", "api:\n  base_url: https://a.example\nbrowser:\n  per_page: 30\n")]
    #[case("config.json", r#"{"api": {"base_url": "https://a.example"}, "browser": {"per_page": 30}}"#)]
    fn test_explicit_file_formats(#[case] name: &str, #[case] contents: &str) {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, name, contents);
        let config = load(None, Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "https://a.example");
        assert_eq!(config.browser.per_page, 30);
        assert_eq!(config.browser.upload_concurrency, 3);
    }

    #[test]
    fn test_explicit_overrides_platform() {
        let dir = TempDir::new().unwrap();
        let platform = write(&dir, "platform.toml", "[api]\ntoken = \"abc\"\ntimeout_secs = 5\n");
        let explicit = write(&dir, "explicit.toml", "[api]\ntimeout_secs = 60\n");
        let config = load(Some(&platform), Some(&explicit)).unwrap();
        assert_eq!(config.api.token.as_deref(), Some("abc"));
        assert_eq!(config.api.timeout_secs, 60);
    }

    #[test]
    fn test_missing_platform_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml")), None).is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let err = load(None, Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(path));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.ini", "per_page=3");
        assert!(matches!(*load(None, Some(&path)).unwrap_err(), ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.toml", "[browser]\nper_page = \"many\"\n");
        assert!(matches!(*load(None, Some(&path)).unwrap_err(), ErrorKind::Extract(_)));
    }

    #[test]
    fn test_environment_overrides_files() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[api]\ntoken = \"abc\"\n\n[browser]\nper_page = 30\n")?;
            jail.set_env("CLIPFLOW_BROWSER__PER_PAGE", "50");
            jail.set_env("CLIPFLOW_API__BASE_URL", "https://env.example");
            let explicit = jail.directory().join("config.toml");
            let config = Config::from_figment(with_env(layered(None, Some(&explicit)).unwrap())).unwrap();
            assert_eq!(config.browser.per_page, 50);
            assert_eq!(config.api.base_url, "https://env.example");
            assert_eq!(config.api.token.as_deref(), Some("abc"));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_environment_value_fails_validation() {
        Jail::expect_with(|jail| {
            jail.set_env("CLIPFLOW_BROWSER__UPLOAD_CONCURRENCY", "0");
            let err = Config::from_figment(with_env(layered(None, None).unwrap())).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid { field: "browser.upload_concurrency", .. }));

            jail.set_env("CLIPFLOW_BROWSER__UPLOAD_CONCURRENCY", "lots");
            let err = Config::from_figment(with_env(layered(None, None).unwrap())).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Extract(_)));
            Ok(())
        });
    }

    #[rstest]
    #[case("[api]\nbase_url = \"\"\n", "api.base_url")]
    #[case("[api]\nbase_url = \"ftp://files\"\n", "api.base_url")]
    #[case("[api]\ntimeout_secs = 0\n", "api.timeout_secs")]
    #[case("[browser]\nper_page = 0\n", "browser.per_page")]
    #[case("[browser]\nupload_concurrency = 0\n", "browser.upload_concurrency")]
    fn test_validation(#[case] contents: &str, #[case] expected: &str) {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.toml", contents);
        let err = load(None, Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid { field, .. } if *field == expected));
    }
}
