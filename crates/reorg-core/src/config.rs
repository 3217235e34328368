//! Configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConfigError;

/// Configuration for walking a tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WalkConfig {
    /// Root path to walk.
    pub root: PathBuf,

    /// Follow symbolic links to directories.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden entries (starting with `.`). When false, hidden
    /// directories are not descended into.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Number of threads for directory reads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_true() -> bool {
    true
}

impl WalkConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl WalkConfig {
    /// Create a new walk config builder.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }

    /// Create a simple config for walking a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            threads: 0,
        }
    }

    /// Set whether hidden entries are walked.
    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }
}

/// Which database holds retention records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// Local SQLite file.
    #[default]
    Sqlite,
    /// Postgres server configured through `DB_*` environment variables.
    Postgres,
}

/// `[normalize]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeSettings {
    /// File extensions renamed without asking (lowercase, with leading dot).
    pub auto_approve_extensions: Vec<String>,
    /// Folder names never renamed; their contents are left alone too.
    pub excluded_folders: Vec<String>,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            auto_approve_extensions: [
                ".jpg", ".jpeg", ".png", ".gif", ".txt", ".md", ".pdf", ".docx", ".xlsx", ".pptx",
                ".mp3", ".mp4", ".avi",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            excluded_folders: vec!["Obsidian Vault".to_string()],
        }
    }
}

/// `[duplicates]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateSettings {
    /// Split name/size groups by content hash before offering deletions.
    pub verify_content: bool,
    /// Ignore files smaller than this many bytes.
    pub min_size: u64,
    /// Skip the empty-directory pass after deletions.
    pub keep_empty_dirs: bool,
}

/// `[retention]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    /// Child names never deleted from a cleaned directory.
    pub preserved_names: Vec<String>,
    /// Record store backend.
    pub backend: StoreBackend,
    /// SQLite database file (defaults to the platform data directory).
    pub sqlite_path: Option<PathBuf>,
    /// Prefix of the auto-commit message; the run timestamp is appended.
    pub commit_prefix: String,
    /// Push after committing.
    pub push: bool,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            preserved_names: vec![".git".to_string(), ".gitignore".to_string()],
            backend: StoreBackend::Sqlite,
            sqlite_path: None,
            commit_prefix: "Auto commit".to_string(),
            push: true,
        }
    }
}

impl RetentionSettings {
    /// Resolved SQLite database location.
    pub fn database_path(&self) -> PathBuf {
        self.sqlite_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("reorg")
                .join("retention.db")
        })
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorgConfig {
    pub normalize: NormalizeSettings,
    pub duplicates: DuplicateSettings,
    pub retention: RetentionSettings,
}

impl ReorgConfig {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("reorg").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_config_builder() {
        let config = WalkConfig::builder()
            .root("/home/user")
            .threads(4usize)
            .include_hidden(false)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.threads, 4);
        assert!(!config.include_hidden);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_walk_config_requires_root() {
        assert!(WalkConfig::builder().build().is_err());
        assert!(WalkConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ReorgConfig::default();
        assert!(config
            .normalize
            .auto_approve_extensions
            .contains(&".pdf".to_string()));
        assert_eq!(config.retention.preserved_names, vec![".git", ".gitignore"]);
        assert_eq!(config.retention.backend, StoreBackend::Sqlite);
        assert!(!config.duplicates.verify_content);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReorgConfig::from_toml_str(
            r#"
            [retention]
            backend = "postgres"
            push = false

            [duplicates]
            verify_content = true
            "#,
        )
        .unwrap();

        assert_eq!(config.retention.backend, StoreBackend::Postgres);
        assert!(!config.retention.push);
        assert_eq!(config.retention.commit_prefix, "Auto commit");
        assert!(config.duplicates.verify_content);
        assert_eq!(config.normalize.excluded_folders, vec!["Obsidian Vault"]);
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = ReorgConfig::load(Some(&temp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[retention]\nbackend = \"mysql\"\n").unwrap();
        let err = ReorgConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(StoreBackend::Sqlite.to_string(), "sqlite");
    }
}
