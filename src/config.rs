use std::{env, fmt, path::PathBuf};

/// Which storage backend answers data-access calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Cloud,
    Memory,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Cloud => "cloud",
            StorageMode::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") || v.eq_ignore_ascii_case("prod") => {
                Environment::Production
            }
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Credentials for the cloud backend. Read once at process start.
#[derive(Clone, Default)]
pub struct StorageConfig {
    pub cloud_url: Option<String>,
    pub anon_key: Option<String>,
    pub service_key: Option<String>,
    pub allow_memory_fallback: bool,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("cloud_url", &self.cloud_url.as_ref().map(|_| "<set>"))
            .field("anon_key", &self.anon_key.as_ref().map(|_| "<redacted>"))
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .field("allow_memory_fallback", &self.allow_memory_fallback)
            .finish()
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let allow_memory_fallback = lookup("STORAGE_ALLOW_FALLBACK")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        Self {
            cloud_url: non_blank("CLOUD_DATABASE_URL"),
            anon_key: non_blank("CLOUD_ANON_KEY"),
            service_key: non_blank("CLOUD_SERVICE_KEY"),
            allow_memory_fallback,
        }
    }

    /// An in-memory config, used by tests and local demos.
    pub fn memory() -> Self {
        Self {
            allow_memory_fallback: true,
            ..Self::default()
        }
    }

    pub fn is_backend_configured(&self) -> bool {
        self.cloud_url.is_some() && self.anon_key.is_some()
    }

    pub fn storage_mode(&self) -> StorageMode {
        if self.is_backend_configured() {
            StorageMode::Cloud
        } else {
            StorageMode::Memory
        }
    }

    /// The credential used to open cloud connections. The service key carries
    /// the privileges admin writes need, so it wins when present.
    pub fn connection_key(&self) -> Option<&str> {
        self.service_key.as_deref().or(self.anon_key.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub site_url: String,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::parse(env::var("APP_ENV").ok());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let site_url =
            env::var("SITE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => anyhow::bail!("JWT_SECRET must be set in production"),
            _ => {
                tracing::warn!("JWT_SECRET not set, using an insecure development secret");
                "dev-secret-change-me".to_string()
            }
        };
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public/uploads"));

        Ok(Self {
            host,
            port,
            environment,
            site_url,
            jwt_secret,
            upload_dir,
            storage: StorageConfig::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn both_values_select_cloud() {
        let config = StorageConfig::from_lookup(lookup(&[
            ("CLOUD_DATABASE_URL", "postgres://db.example.com/shop"),
            ("CLOUD_ANON_KEY", "anon"),
        ]));
        assert!(config.is_backend_configured());
        assert_eq!(config.storage_mode(), StorageMode::Cloud);
    }

    #[test]
    fn missing_or_blank_key_selects_memory() {
        let only_url = StorageConfig::from_lookup(lookup(&[(
            "CLOUD_DATABASE_URL",
            "postgres://db.example.com/shop",
        )]));
        assert_eq!(only_url.storage_mode(), StorageMode::Memory);

        let blank_key = StorageConfig::from_lookup(lookup(&[
            ("CLOUD_DATABASE_URL", "postgres://db.example.com/shop"),
            ("CLOUD_ANON_KEY", "   "),
        ]));
        assert!(!blank_key.is_backend_configured());
        assert_eq!(StorageConfig::memory().storage_mode(), StorageMode::Memory);
    }

    #[test]
    fn service_key_preferred_for_connections() {
        let config = StorageConfig::from_lookup(lookup(&[
            ("CLOUD_ANON_KEY", "anon"),
            ("CLOUD_SERVICE_KEY", "service"),
        ]));
        assert_eq!(config.connection_key(), Some("service"));
        assert!(config.allow_memory_fallback);
    }

    #[test]
    fn fallback_can_be_disabled() {
        let config = StorageConfig::from_lookup(lookup(&[("STORAGE_ALLOW_FALLBACK", "false")]));
        assert!(!config.allow_memory_fallback);
    }

    #[test]
    fn environment_defaults_to_development() {
        assert_eq!(Environment::parse(None), Environment::Development);
        assert_eq!(
            Environment::parse(Some("Production".into())),
            Environment::Production
        );
    }
}
