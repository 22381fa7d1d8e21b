//! tablerepo CLI - inspect and check the configured logical databases
//!
//! Reads the registry from a YAML file (`--config`) or from `DATABASE_URL*`
//! environment variables, optionally loaded from a `.env` file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use tablerepo::config::mask_url;
use tablerepo::{Database, RegistryConfig, RepositoryError};

#[derive(Parser)]
#[command(name = "tablerepo")]
#[command(version, about = "Inspect and check the logical databases used by table repositories", long_about = None)]
struct Cli {
    /// Registry configuration file; defaults to DATABASE_URL* environment variables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured logical databases
    Databases,

    /// Check connectivity of one or all logical databases
    Ping {
        /// Only check this logical database
        #[arg(short, long)]
        database: Option<String>,
    },
}

fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Databases => {
            for line in describe_databases(&config) {
                println!("{}", line);
            }
            Ok(())
        }
        Commands::Ping { database } => {
            let results = ping_databases(&config, database.as_deref())?;
            for (name, outcome) in &results {
                match outcome {
                    Ok(()) => println!("✅ {}", name),
                    Err(e) => println!("❌ {}: {}", name, e),
                }
            }
            check_pings(&results)
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RegistryConfig, RepositoryError> {
    match path {
        Some(path) => RegistryConfig::from_file(path),
        None => RegistryConfig::from_env(),
    }
}

/// One line per logical database, default marked with `*`, passwords masked
fn describe_databases(config: &RegistryConfig) -> Vec<String> {
    config
        .databases
        .iter()
        .map(|(name, settings)| {
            let marker = if *name == config.default { "*" } else { " " };
            let target = match (&settings.url, &settings.url_env) {
                (Some(url), _) => mask_url(url),
                (None, Some(var)) => format!("${}", var),
                (None, None) => "-".to_string(),
            };
            format!(
                "{} {:<16} {} (max_connections={}{})",
                marker,
                name,
                target,
                settings.pool.max_connections,
                if settings.pool.lazy { ", lazy" } else { "" }
            )
        })
        .collect()
}

type PingResult = (String, Result<(), RepositoryError>);

/// Open and ping each selected database, in configuration order
fn ping_databases(
    config: &RegistryConfig,
    only: Option<&str>,
) -> Result<Vec<PingResult>, RepositoryError> {
    if let Some(name) = only {
        if !config.databases.contains_key(name) {
            return Err(RepositoryError::UnknownDatabase(name.to_string()));
        }
    }

    let results = config
        .databases
        .iter()
        .filter(|(name, _)| only.map_or(true, |wanted| wanted == name.as_str()))
        .map(|(name, settings)| {
            let outcome = settings
                .resolve_url()
                .and_then(|url| Database::new_with_config(name, &url, settings.pool.clone()))
                .and_then(|database| database.ping());
            (name.clone(), outcome)
        })
        .collect();

    Ok(results)
}

fn check_pings(results: &[PingResult]) -> Result<(), RepositoryError> {
    let failures = results.iter().filter(|(_, outcome)| outcome.is_err()).count();
    if failures > 0 {
        return Err(RepositoryError::Config(format!(
            "{} database(s) unreachable",
            failures
        )));
    }
    Ok(())
}
