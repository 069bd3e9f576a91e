use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bookctl_core::BookctlConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file path
    Path,
    /// Print the effective config (file plus environment overrides) as TOML
    Show,
    /// Write a config file with default values
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init(args) => run_init(args),
    }
}

fn run_path() -> Result<()> {
    println!("{}", BookctlConfig::config_path().display());
    Ok(())
}

fn run_show() -> Result<()> {
    let mut config = BookctlConfig::load().context("Failed to load config")?;
    // Never echo credentials.
    if config.db.dsn.is_some() {
        config.db.dsn = Some("<set>".to_string());
    }
    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
    print!("{}", rendered);
    Ok(())
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = BookctlConfig::config_path();

    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {:?}\n\nUse --force to overwrite",
            config_path
        ));
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let rendered = toml::to_string_pretty(&BookctlConfig::default())
        .context("Failed to render default config")?;
    std::fs::write(&config_path, rendered)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Wrote {}", config_path.display());
    Ok(())
}
