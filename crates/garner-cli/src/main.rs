//! # garner-cli
//!
//! Command-line front end for the Garner artifact resolver.
//!
//! Handles command parsing, logging setup and repository configuration
//! (from `garner.toml` and/or `--repo` flags), then drives the resolution
//! engine and prints the materialized artifact paths.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;

use garner_cache::ArtifactStore;
use garner_core::types::{Coordinate, Dependency};
use garner_registry::{LayoutKind, Repository, RepositoryRegistry};
use garner_resolver::{Mediation, ResolutionPolicy, Resolver};

/// Client-side build-dependency resolver
#[derive(Parser)]
#[command(name = "garner", version, about = "Resolve and cache build dependencies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve coordinates and materialize their artifacts
    Resolve {
        /// Coordinates to resolve (group:name:version)
        #[arg(required = true)]
        coordinates: Vec<String>,
        /// Extra repository, highest priority first: id=url[#layout]
        #[arg(long = "repo")]
        repositories: Vec<String>,
        /// Configuration file (defaults to ./garner.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Include optional dependencies declared below the roots
        #[arg(long)]
        include_optional: bool,
        /// Mediation rule: nearest (default) or highest
        #[arg(long, default_value = "nearest")]
        mediation: String,
        /// Local artifact store directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Empty the local artifact store
    Clean {
        /// Local artifact store directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

/// `garner.toml` contents
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    cache_dir: Option<PathBuf>,
    #[serde(default, rename = "repository")]
    repositories: Vec<RepositoryConfig>,
}

#[derive(Debug, Deserialize)]
struct RepositoryConfig {
    id: String,
    url: String,
    layout: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    rt.block_on(run(cli.command))
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Resolve {
            coordinates,
            repositories,
            config,
            include_optional,
            mediation,
            cache_dir,
        } => {
            let config = load_config(config)?;
            let registry = build_registry(&repositories, &config)?;
            let store = open_store(cache_dir.or(config.cache_dir))?;

            let policy = ResolutionPolicy {
                include_optional,
                mediation: parse_mediation(&mediation)?,
                ..ResolutionPolicy::default()
            };

            let roots = coordinates
                .iter()
                .map(|raw| Coordinate::from_str(raw).map(Dependency::new))
                .collect::<Result<Vec<_>, _>>()?;

            let resolver = Resolver::new(Arc::new(registry), store).with_policy(policy);
            let resolved = resolver.resolve(roots).await?;
            info!(artifacts = resolved.len(), "resolution complete");

            let paths = resolver.materialize(&resolved).await?;
            for (coordinate, path) in paths {
                println!("{} -> {}", coordinate, path);
            }
            Ok(())
        }
        Commands::Clean { cache_dir } => {
            let store = open_store(cache_dir)?;
            store.clear()?;
            println!("Cleared {}", store.root());
            Ok(())
        }
    }
}

/// Read the configuration file; an explicitly-passed path must exist, the
/// implicit ./garner.toml may be absent
fn load_config(path: Option<PathBuf>) -> anyhow::Result<ConfigFile> {
    let (path, required) = match path {
        Some(path) => (path, true),
        None => (PathBuf::from("garner.toml"), false),
    };
    if !path.exists() {
        if required {
            bail!("configuration file {} not found", path.display());
        }
        return Ok(ConfigFile::default());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Command-line repositories take priority over configured ones
fn build_registry(
    flags: &[String],
    config: &ConfigFile,
) -> anyhow::Result<RepositoryRegistry> {
    let mut registry = RepositoryRegistry::new();
    for flag in flags {
        registry.register(parse_repository_flag(flag)?)?;
    }
    for repository in &config.repositories {
        let layout = match &repository.layout {
            Some(layout) => LayoutKind::from_str(layout)?,
            None => LayoutKind::default(),
        };
        registry.register(
            Repository::builder()
                .id(&repository.id)
                .url(&repository.url)
                .layout(layout)
                .build()?,
        )?;
    }
    if registry.is_empty() {
        bail!("no repositories configured; pass --repo id=url or add [[repository]] to garner.toml");
    }
    Ok(registry)
}

/// Parse an `id=url[#layout]` repository flag
fn parse_repository_flag(flag: &str) -> anyhow::Result<Repository> {
    let (id, rest) = flag
        .split_once('=')
        .ok_or_else(|| anyhow!("--repo expects id=url[#layout], got '{}'", flag))?;
    let (url, layout) = match rest.rsplit_once('#') {
        Some((url, layout)) => (url, LayoutKind::from_str(layout)?),
        None => (rest, LayoutKind::default()),
    };
    Ok(Repository::builder().id(id).url(url).layout(layout).build()?)
}

fn parse_mediation(raw: &str) -> anyhow::Result<Mediation> {
    match raw {
        "nearest" => Ok(Mediation::NearestWins),
        "highest" => Ok(Mediation::HighestVersion),
        other => bail!("unknown mediation rule '{}' (expected nearest or highest)", other),
    }
}

fn open_store(dir: Option<PathBuf>) -> anyhow::Result<ArtifactStore> {
    let dir = match dir {
        Some(dir) => dir,
        None => dirs::home_dir()
            .ok_or_else(|| anyhow!("cannot determine home directory; pass --cache-dir"))?
            .join(".garner")
            .join("store"),
    };
    let dir = Utf8PathBuf::from_path_buf(dir)
        .map_err(|dir| anyhow!("cache directory {} is not valid UTF-8", dir.display()))?;
    Ok(ArtifactStore::new(dir)?)
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "garner={level},garner_core={level},garner_registry={level},garner_resolver={level},garner_cache={level}"
        ))
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repository_flag() {
        let repository = parse_repository_flag("central=https://repo.example.org/releases").unwrap();
        assert_eq!(repository.id(), "central");
        assert_eq!(repository.layout(), LayoutKind::Maven2);

        let flat = parse_repository_flag("drop=file:///tmp/drop#flat").unwrap();
        assert_eq!(flat.layout(), LayoutKind::Flat);

        assert!(parse_repository_flag("missing-separator").is_err());
        assert!(parse_repository_flag("x=https://a.example#p2").is_err());
    }

    #[test]
    fn test_parse_mediation() {
        assert_eq!(parse_mediation("nearest").unwrap(), Mediation::NearestWins);
        assert_eq!(parse_mediation("highest").unwrap(), Mediation::HighestVersion);
        assert!(parse_mediation("coin-flip").is_err());
    }

    #[test]
    fn test_config_file_parsing() {
        let raw = r#"
            cache_dir = "/var/cache/garner"

            [[repository]]
            id = "central"
            url = "https://repo.example.org/releases"

            [[repository]]
            id = "mirror"
            url = "file:///srv/mirror"
            layout = "flat"
        "#;
        let config: ConfigFile = toml::from_str(raw).unwrap();
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/garner")));
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.repositories[1].layout.as_deref(), Some("flat"));
    }

    #[test]
    fn test_registry_requires_a_repository() {
        let err = build_registry(&[], &ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("no repositories configured"));
    }

    #[test]
    fn test_flag_repositories_outrank_configured_ones() {
        let config: ConfigFile = toml::from_str(
            r#"[[repository]]
            id = "configured"
            url = "https://configured.example""#,
        )
        .unwrap();
        let registry = build_registry(
            &["override=https://override.example".to_string()],
            &config,
        )
        .unwrap();
        let ids: Vec<&str> = registry.repositories().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["override", "configured"]);
    }
}
