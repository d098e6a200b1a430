// Configuration loading and parsing (config/courtdraft.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// courtdraft.toml structs
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "courtdraft.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub draft: DraftDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub ws_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub players_csv: String,
    pub seasons_csv: String,
}

/// Engine-wide knobs for drafts. Scoring constants are not configurable.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftDefaults {
    /// Page size auto-pick scans the eligible candidates with.
    pub auto_pick_page_size: usize,
    /// Turn timer for auto-pick drafts whose rules leave it unset.
    #[serde(default)]
    pub default_pick_timer_seconds: Option<u32>,
    /// Pending commands each draft actor will queue.
    pub command_queue_depth: usize,
}

impl Default for DraftDefaults {
    fn default() -> Self {
        DraftDefaults {
            auto_pick_page_size: 50,
            default_pick_timer_seconds: None,
            command_queue_depth: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/courtdraft.toml` relative to `base_dir`.
///
/// This does not auto-copy defaults; prefer `load_config()`.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&text, &path)?;
    validate(&config)?;
    Ok(config)
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Copy every file in `defaults/` that `config/` lacks, never overwriting.
/// `.example` files stay behind. Returns the paths written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if config_dir.exists() {
            return Ok(vec![]);
        }
        return Err(copy_error(format!(
            "no defaults/ or config/ directory under {}",
            base_dir.display()
        )));
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;
    let entries = std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_error(format!("cannot read {}: {e}", defaults_dir.display())))?;

    let mut copied = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| copy_error(format!("cannot read defaults entry: {e}")))?
            .path();
        let Some(name) = path.file_name().filter(|_| path.is_file()) else {
            continue;
        };
        if name.to_string_lossy().ends_with(".example") {
            continue;
        }
        let target = config_dir.join(name);
        if copy_if_missing(&path, &target)? {
            copied.push(target);
        }
    }
    Ok(copied)
}

fn copy_if_missing(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    use std::io::Write;

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error(format!("cannot create {}: {e}", target.display()))),
    };
    let content = std::fs::read(source)
        .map_err(|e| copy_error(format!("cannot read {}: {e}", source.display())))?;
    dest.write_all(&content)
        .map_err(|e| copy_error(format!("cannot write {}: {e}", target.display())))?;
    Ok(true)
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Load config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.ws_port == 0 {
        return Err(ConfigError::ValidationError {
            field: "server.ws_port".into(),
            message: "must be greater than 0".into(),
        });
    }

    let paths: &[(&str, &str)] = &[
        ("database.path", &config.database.path),
        ("catalog.players_csv", &config.catalog.players_csv),
        ("catalog.seasons_csv", &config.catalog.seasons_csv),
    ];
    for (name, val) in paths {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    let draft = &config.draft;
    let sizes: &[(&str, usize)] = &[
        ("draft.auto_pick_page_size", draft.auto_pick_page_size),
        ("draft.command_queue_depth", draft.command_queue_depth),
    ];
    for (name, val) in sizes {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if draft.default_pick_timer_seconds == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "draft.default_pick_timer_seconds".into(),
            message: "must be > 0 when set".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
