use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CoreError, Result};

/// Upper bound for `db.max_idle_time` and `db.query_timeout`
pub const MAX_DB_DURATION: Duration = Duration::from_secs(60 * 60);

/// Environment variable overriding `server.port`
pub const ENV_PORT: &str = "BOOKCTL_PORT";
/// Environment variable overriding `server.env`
pub const ENV_ENVIRONMENT: &str = "BOOKCTL_ENV";
/// Environment variable overriding `db.dsn`
pub const ENV_DB_DSN: &str = "BOOK_DB_DSN";

/// Centralized configuration for bookctl
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookctlConfig {
    pub server: ServerConfig,
    pub db: DbConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub env: Environment,
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            env: Environment::Development,
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsn: Option<String>,
    pub max_open_conns: u32,
    #[serde(with = "duration_str")]
    pub max_idle_time: Duration,
    /// Ceiling applied to every repository call
    #[serde(with = "duration_str")]
    pub query_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            max_open_conns: 25,
            max_idle_time: Duration::from_secs(15 * 60),
            query_timeout: Duration::from_secs(3),
        }
    }
}

/// Deployment environment, reported by the healthcheck
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(CoreError::config(format!(
                "unknown environment '{}' (expected development|staging|production)",
                other
            ))),
        }
    }
}

impl BookctlConfig {
    /// Load config from ~/.bookctl/config.toml, then apply environment
    /// overrides.
    ///
    /// A missing file is not an error: defaults are used.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a specific TOML file without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get config directory: ~/.bookctl
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bookctl")
    }

    /// Get config file path: ~/.bookctl/config.toml
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Apply `BOOKCTL_PORT`, `BOOKCTL_ENV` and `BOOK_DB_DSN` from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .parse()
                .map_err(|_| CoreError::config(format!("{} is not a port: '{}'", ENV_PORT, port)))?;
        }
        if let Some(env) = lookup(ENV_ENVIRONMENT) {
            self.server.env = env.parse()?;
        }
        if let Some(dsn) = lookup(ENV_DB_DSN).filter(|d| !d.is_empty()) {
            self.db.dsn = Some(dsn);
        }
        Ok(())
    }

    /// Reject settings the pool cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.db.max_open_conns == 0 {
            return Err(CoreError::config("db.max_open_conns must be at least 1"));
        }
        for (key, value) in [
            ("db.max_idle_time", self.db.max_idle_time),
            ("db.query_timeout", self.db.query_timeout),
        ] {
            if value.is_zero() {
                return Err(CoreError::config(format!("{} must be non-zero", key)));
            }
            if value > MAX_DB_DURATION {
                return Err(CoreError::config(format!(
                    "{} must be at most {}",
                    key,
                    format_duration(MAX_DB_DURATION)
                )));
            }
        }
        Ok(())
    }
}

/// Parse `<int><unit>` where unit is `ms`, `s`, `m` or `h`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let bad = || CoreError::config(format!("invalid duration '{}' (e.g. 500ms, 3s, 15m, 1h)", s));

    let split = s.find(|c: char| !c.is_ascii_digit()).ok_or_else(bad)?;
    let (digits, unit) = s.split_at(split);
    let n: u64 = digits.parse().map_err(|_| bad())?;

    match unit {
        "ms" => Ok(Duration::from_millis(n)),
        "s" => Ok(Duration::from_secs(n)),
        "m" => n.checked_mul(60).map(Duration::from_secs).ok_or_else(bad),
        "h" => n.checked_mul(3600).map(Duration::from_secs).ok_or_else(bad),
        _ => Err(bad()),
    }
}

/// Render a duration in the largest unit that divides it exactly.
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms % 1000 != 0 {
        return format!("{}ms", ms);
    }
    let secs = d.as_secs();
    if secs != 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs != 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

mod duration_str {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_duration(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_values() {
        let c = BookctlConfig::default();
        assert_eq!(c.server.port, 4000);
        assert_eq!(c.server.env, Environment::Development);
        assert_eq!(c.db.max_open_conns, 25);
        assert_eq!(c.db.max_idle_time, Duration::from_secs(900));
        assert_eq!(c.db.query_timeout, Duration::from_secs(3));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080
env = "staging"

[db]
dsn = "postgres://localhost/books"
max_idle_time = "5m"
"#
        )
        .unwrap();

        let c = BookctlConfig::load_from(file.path()).unwrap();
        assert_eq!(c.server.port, 8080);
        assert_eq!(c.server.env, Environment::Staging);
        assert_eq!(c.db.dsn.as_deref(), Some("postgres://localhost/books"));
        assert_eq!(c.db.max_idle_time, Duration::from_secs(300));
        assert_eq!(c.db.max_open_conns, 25);
    }

    #[test]
    fn bad_toml_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[db]\nmax_idle_time = \"forever\"").unwrap();

        let err = BookctlConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse { .. }));
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_PORT, "9000"),
            (ENV_ENVIRONMENT, "production"),
            (ENV_DB_DSN, "postgres://db/books"),
        ]
        .into_iter()
        .collect();

        let mut c = BookctlConfig::default();
        c.apply_env(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(c.server.port, 9000);
        assert_eq!(c.server.env, Environment::Production);
        assert_eq!(c.db.dsn.as_deref(), Some("postgres://db/books"));
    }

    #[test]
    fn env_rejects_unknown_environment() {
        let mut c = BookctlConfig::default();
        let err = c
            .apply_env(|k| (k == ENV_ENVIRONMENT).then(|| "prod".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("unknown environment"));
    }

    #[test]
    fn validate_pool_limits() {
        let mut c = BookctlConfig::default();
        c.db.max_open_conns = 0;
        assert!(c.validate().is_err());

        c.db.max_open_conns = 10;
        c.db.max_idle_time = Duration::ZERO;
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_huge_durations() {
        let c: BookctlConfig =
            toml::from_str("[db]\nquery_timeout = \"18446744073709551615s\"").unwrap();
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("db.query_timeout must be at most 1h"), "{}", err);

        let mut c = BookctlConfig::default();
        c.db.max_idle_time = MAX_DB_DURATION + Duration::from_secs(1);
        assert!(c.validate().is_err());

        c.db.max_idle_time = MAX_DB_DURATION;
        c.db.query_timeout = MAX_DB_DURATION;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn duration_parsing() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));

        for bad in ["", "15", "m", "1.5s", "-1s", "3 s", "3d"] {
            assert!(parse_duration(bad).is_err(), "{:?}", bad);
        }
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(Duration::from_secs(900)), "15m");
        assert_eq!(format_duration(Duration::from_secs(3)), "3s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn round_trips_through_toml() {
        let c = BookctlConfig::default();
        let text = toml::to_string_pretty(&c).unwrap();
        assert!(text.contains("max_idle_time = \"15m\""));
        let back: BookctlConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, c);
    }
}
