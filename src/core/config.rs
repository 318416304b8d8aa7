//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → preference files → env vars → CLI flags.
//!
//! Config lives at `<repo root>/.dockhand.toml` and is entirely optional.
//! Resolution runs once at startup; the supervision loop only ever sees the
//! resolved result.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::command::ComposeInvocation;
use crate::command::stack::Stack;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DockhandConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub compose: ComposeConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub setup_script: Option<String>,
    pub default_stack: Option<String>,
    pub logs_service: Option<String>,
    pub logs_tail: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ComposeConfig {
    pub docker_binary: Option<String>,
    pub compose_command: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const CONFIG_FILE_NAME: &str = ".dockhand.toml";
pub const DEFAULT_SETUP_SCRIPT: &str = "script/dev_setup.sh";
pub const DEFAULT_LOGS_SERVICE: &str = "web";
pub const DEFAULT_LOGS_TAIL: u32 = 100;
pub const DEFAULT_DOCKER_BINARY: &str = "docker";

/// Files/directories that mark a repository root during discovery.
const REPO_MARKERS: [&str; 3] = [".git", "docker-compose.yml", CONFIG_FILE_NAME];

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub repo_root: PathBuf,
    /// Setup script path, relative to `repo_root`.
    pub setup_script: String,
    pub stack: Stack,
    pub logs_service: String,
    pub logs_tail: u32,
    pub docker_binary: String,
    pub compose: ComposeInvocation,
}

impl ResolvedConfig {
    pub fn setup_script_path(&self) -> PathBuf {
        self.repo_root.join(&self.setup_script)
    }
}

// ============================================================================
// CLI / Environment Overrides
// ============================================================================

/// Command-line overrides fed into [`resolve`] (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub stack: Option<String>,
    pub setup_script: Option<String>,
}

/// Snapshot of the environment variables the resolver honors.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub stack: Option<String>,
    pub docker: Option<String>,
    pub compose: Option<String>,
}

impl EnvOverrides {
    /// Captures `STACK`, `DOCKER`, and `COMPOSE` from the ambient
    /// environment, treating blank values as unset.
    pub fn capture() -> Self {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        }
        Self {
            stack: var("STACK"),
            docker: var("DOCKER"),
            compose: var("COMPOSE"),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Loading
// ============================================================================

/// Walks up from `start` looking for a repository marker (`.git`,
/// `docker-compose.yml`, or the config file); falls back to `start` itself
/// when nothing matches.
pub fn discover_repo_root(start: &Path) -> PathBuf {
    let mut dir = start;
    loop {
        if REPO_MARKERS.iter().any(|m| dir.join(m).exists()) {
            return dir.to_path_buf();
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return start.to_path_buf(),
        }
    }
}

/// Load config from `<repo_root>/.dockhand.toml`.
///
/// A missing file is not an error — the tool works with defaults and never
/// writes into the repository. A malformed file is `ConfigError::Parse`.
pub fn load_config(repo_root: &Path) -> Result<DockhandConfig, ConfigError> {
    let path = repo_root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return Ok(DockhandConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: DockhandConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing:
/// defaults → config file → preference files → env vars → CLI flags.
pub fn resolve(config: &DockhandConfig, cli: &CliOverrides, repo_root: &Path) -> ResolvedConfig {
    resolve_from_values(config, cli, repo_root, &EnvOverrides::capture())
}

/// Same as [`resolve`], with the environment snapshot supplied explicitly.
pub fn resolve_from_values(
    config: &DockhandConfig,
    cli: &CliOverrides,
    repo_root: &Path,
    env: &EnvOverrides,
) -> ResolvedConfig {
    // Engine binary: env → config → default
    let docker_binary = env
        .docker
        .clone()
        .or_else(|| config.compose.docker_binary.clone())
        .unwrap_or_else(|| DEFAULT_DOCKER_BINARY.to_string());

    // Compose invocation: env → config → `<engine> compose`
    let compose = env
        .compose
        .as_deref()
        .or(config.compose.compose_command.as_deref())
        .map(|raw| ComposeInvocation::from_override(raw, &docker_binary))
        .unwrap_or_else(|| ComposeInvocation::for_engine(&docker_binary));

    // Stack: CLI → env → preference files → config → default
    let stack = cli
        .stack
        .as_deref()
        .map(Stack::normalize)
        .or_else(|| env.stack.as_deref().map(Stack::normalize))
        .or_else(|| Stack::detect(repo_root))
        .or_else(|| config.general.default_stack.as_deref().map(Stack::normalize))
        .unwrap_or_default();

    let setup_script = cli
        .setup_script
        .clone()
        .or_else(|| config.general.setup_script.clone())
        .unwrap_or_else(|| DEFAULT_SETUP_SCRIPT.to_string());

    ResolvedConfig {
        repo_root: repo_root.to_path_buf(),
        setup_script,
        stack,
        logs_service: config
            .general
            .logs_service
            .clone()
            .unwrap_or_else(|| DEFAULT_LOGS_SERVICE.to_string()),
        logs_tail: config.general.logs_tail.unwrap_or(DEFAULT_LOGS_TAIL),
        docker_binary,
        compose,
    }
}
