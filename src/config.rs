use crate::solver::SolverCookie;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const FLARESOLVERR_URL_ENV: &str = "FLARESOLVERR_URL";
pub const FLARESOLVERR_SESSION_ENV: &str = "FLARESOLVERR_SESSION";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub solver: SolverConfig,
    pub cache: CacheConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub url: String,
    pub context: SolverContext,
    /// Passed to FlareSolverr as `maxTimeout`.
    pub max_timeout_ms: u64,
    /// Client-side bound on the whole solver round trip.
    pub request_timeout_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8191".to_string(),
            context: SolverContext::default(),
            max_timeout_ms: 60_000,
            request_timeout_secs: 90,
        }
    }
}

/// Browser state the solver reuses across requests. Fixed for the lifetime
/// of the config; never renegotiated per call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SolverContext {
    Session { session: String },
    Cookies { cookies: Vec<SolverCookie> },
}

impl Default for SolverContext {
    fn default() -> Self {
        SolverContext::Session {
            session: "default_session".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub route_expire_secs: u64,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            route_expire_secs: 300,
            max_capacity: 1024,
        }
    }
}

impl CacheConfig {
    pub fn route_expire(&self) -> Duration {
        Duration::from_secs(self.route_expire_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub permalink_base: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.sotwe.com".to_string(),
            permalink_base: "https://x.com".to_string(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sotwe-feed").join("config.toml"))
    }

    /// Read `path` (defaults apply when it does not exist), then apply
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Defaults plus environment overrides, for when no config file applies.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(FLARESOLVERR_URL_ENV).filter(|v| !v.is_empty()) {
            self.solver.url = url;
        }
        if let Some(session) = lookup(FLARESOLVERR_SESSION_ENV).filter(|v| !v.is_empty()) {
            self.solver.context = SolverContext::Session { session };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.solver.url, "http://127.0.0.1:8191");
        assert_eq!(config.solver.context, SolverContext::default());
        assert_eq!(config.solver.max_timeout_ms, 60_000);
        assert_eq!(config.cache.route_expire(), Duration::from_secs(300));
        assert_eq!(config.site.base_url, "https://www.sotwe.com");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.cache.max_capacity, 1024);
    }

    #[test]
    fn test_load_cookie_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[solver]
url = "http://solver:8191"

[solver.context]
mode = "cookies"
cookies = [{{ name = "cf_clearance", value = "abc", domain = ".sotwe.com" }}]

[cache]
route_expire_secs = 60
"#
        )
        .unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let config: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.solver.url, "http://solver:8191");
        assert_eq!(config.cache.route_expire_secs, 60);
        assert_eq!(config.cache.max_capacity, 1024);
        match config.solver.context {
            SolverContext::Cookies { cookies } => {
                assert_eq!(cookies[0].name, "cf_clearance");
                assert_eq!(cookies[0].domain.as_deref(), Some(".sotwe.com"));
            }
            other => panic!("unexpected context: {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            FLARESOLVERR_URL_ENV => Some("http://10.0.0.2:8191".to_string()),
            FLARESOLVERR_SESSION_ENV => Some("feeds".to_string()),
            _ => None,
        });
        assert_eq!(config.solver.url, "http://10.0.0.2:8191");
        assert_eq!(
            config.solver.context,
            SolverContext::Session {
                session: "feeds".to_string()
            }
        );
    }

    #[test]
    fn test_empty_env_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.solver.url, "http://127.0.0.1:8191");
    }
}
