//! HTTP server command
//!
//! Resolves configuration (flag > environment > config file > default),
//! opens the pool, optionally bootstraps the schema, then serves until
//! Ctrl+C or SIGTERM.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use bookctl_core::config::{parse_duration, ENV_DB_DSN};
use bookctl_core::{BookctlConfig, CoreError, Environment};
use bookctl_server::db::{create_pool_with_options, schema, Models, PoolOptions};
use bookctl_server::http::{run_server, AppState, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Config file (default: ~/.bookctl/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to bind to
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// API server port [env: BOOKCTL_PORT] [config: server.port, default 4000]
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Environment (development|staging|production) [env: BOOKCTL_ENV]
    #[arg(long, value_parser = parse_environment)]
    pub env: Option<Environment>,

    /// PostgreSQL DSN [env: BOOK_DB_DSN]
    #[arg(long)]
    pub db_dsn: Option<String>,

    /// PostgreSQL max open connections [default: 25]
    #[arg(long)]
    pub db_max_open_conns: Option<u32>,

    /// PostgreSQL max connection idle time, e.g. 15m [default: 15m]
    #[arg(long, value_parser = parse_duration_arg)]
    pub db_max_idle_time: Option<Duration>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Create the books table and indexes if missing before serving
    #[arg(long)]
    pub init_schema: bool,
}

fn parse_environment(s: &str) -> std::result::Result<Environment, CoreError> {
    s.parse()
}

fn parse_duration_arg(s: &str) -> std::result::Result<Duration, CoreError> {
    parse_duration(s)
}

impl ServeArgs {
    /// Overlay explicit flags on an already-resolved config.
    pub fn apply(&self, config: &mut BookctlConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(env) = self.env {
            config.server.env = env;
        }
        if self.cors_permissive {
            config.server.cors_permissive = true;
        }
        if let Some(dsn) = &self.db_dsn {
            config.db.dsn = Some(dsn.clone());
        }
        if let Some(n) = self.db_max_open_conns {
            config.db.max_open_conns = n;
        }
        if let Some(idle) = self.db_max_idle_time {
            config.db.max_idle_time = idle;
        }
    }

    /// File and environment first, then flags on top.
    pub fn resolve(&self) -> Result<BookctlConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = BookctlConfig::load_from(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?;
                config.apply_env(|key| std::env::var(key).ok())?;
                config
            }
            None => BookctlConfig::load().context("Failed to load config")?,
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args.resolve()?;

    let dsn = config.db.dsn.clone().with_context(|| {
        format!(
            "database DSN not set. Set via --db-dsn, {} env, or db.dsn in {}",
            ENV_DB_DSN,
            BookctlConfig::config_path().display()
        )
    })?;

    let pool = create_pool_with_options(
        &dsn,
        PoolOptions {
            max_connections: config.db.max_open_conns,
            max_idle_time: config.db.max_idle_time,
        },
    )
    .await
    .context("Failed to create database pool")?;

    if args.init_schema {
        schema::ensure(&pool)
            .await
            .context("Failed to bootstrap books schema")?;
    }

    let timeout = config.db.query_timeout;
    let state = AppState::new(Models::with_timeout(pool, timeout), config.server.env)
        .with_request_timeout(timeout);

    let server_config = ServerConfig {
        bind_addr: SocketAddr::new(args.host, config.server.port),
        cors_permissive: config.server.cors_permissive,
    };

    tracing::info!(
        addr = %server_config.bind_addr,
        env = %config.server.env,
        "starting bookctl server"
    );

    // Blocks until shutdown
    run_server(state, server_config)
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServeArgs {
        let mut argv = vec!["serve"];
        argv.extend_from_slice(args);
        ServeArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_override_config() {
        let mut config = BookctlConfig::default();
        config.db.dsn = Some("postgres://file/db".into());

        parse(&[
            "--port",
            "8080",
            "--env",
            "production",
            "--db-dsn",
            "postgres://flag/db",
            "--db-max-open-conns",
            "5",
            "--db-max-idle-time",
            "30s",
            "--cors-permissive",
        ])
        .apply(&mut config);

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.env, Environment::Production);
        assert!(config.server.cors_permissive);
        assert_eq!(config.db.dsn.as_deref(), Some("postgres://flag/db"));
        assert_eq!(config.db.max_open_conns, 5);
        assert_eq!(config.db.max_idle_time, Duration::from_secs(30));
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut config = BookctlConfig::default();
        config.server.port = 9000;
        config.db.dsn = Some("postgres://file/db".into());
        let before = config.clone();

        parse(&[]).apply(&mut config);
        assert_eq!(config, before);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ServeArgs::try_parse_from(["serve", "--env", "qa"]).is_err());
        assert!(ServeArgs::try_parse_from(["serve", "--db-max-idle-time", "15 minutes"]).is_err());
        assert!(ServeArgs::try_parse_from(["serve", "--port", "70000"]).is_err());
    }

    #[test]
    fn resolve_reads_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 5050\n\n[db]\ndsn = \"postgres://file/db\"\nmax_open_conns = 7\n",
        )
        .unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "--db-max-open-conns", "3"]);
        let config = args.resolve().unwrap();

        assert_eq!(config.db.max_open_conns, 3);
        assert_eq!(config.db.query_timeout, Duration::from_secs(3));
    }

    #[test]
    fn resolve_rejects_zero_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[db]\ndsn = \"postgres://file/db\"\n").unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "--db-max-open-conns", "0"]);
        let err = args.resolve().unwrap_err();
        assert!(err.to_string().contains("max_open_conns"), "{}", err);
    }

    #[test]
    fn resolve_reports_missing_config_file() {
        let args = parse(&["--config", "/nonexistent/bookctl.toml"]);
        let err = args.resolve().unwrap_err();
        assert!(err.to_string().contains("Failed to load config"), "{}", err);
    }
}
