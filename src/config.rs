//! Runtime configuration resolved from environment variables.
//!
//! Every setting has a default so the binaries start with no environment at
//! all, reading artifacts from `./models`.

use std::path::PathBuf;

pub const ARTIFACT_DIR_ENV: &str = "CARDIOTRIAGE_ARTIFACT_DIR";
pub const MODEL_FILE_ENV: &str = "CARDIOTRIAGE_MODEL_FILE";
pub const SCALER_FILE_ENV: &str = "CARDIOTRIAGE_SCALER_FILE";
pub const REQUIRE_MANIFEST_ENV: &str = "CARDIOTRIAGE_REQUIRE_MANIFEST";
pub const LOG_MODE_ENV: &str = "CARDIOTRIAGE_LOG_MODE";
pub const LOG_FILE_ENV: &str = "CARDIOTRIAGE_LOG_FILE";

const DEFAULT_ARTIFACT_DIR: &str = "models";
const DEFAULT_MODEL_FILE: &str = "model.json";
const DEFAULT_SCALER_FILE: &str = "scaler.json";
const DEFAULT_LOG_FILE: &str = "cardiotriage.log";

/// Where the fitted artifacts live and how strictly they are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSettings {
    pub dir: PathBuf,
    pub model_file: String,
    pub scaler_file: String,
    /// Refuse to load when `manifest.json` is absent.
    pub require_manifest: bool,
}

impl ArtifactSettings {
    /// Settings for a directory using the default file names.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            scaler_file: DEFAULT_SCALER_FILE.to_string(),
            require_manifest: false,
        }
    }

    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    #[must_use]
    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_file)
    }
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self::in_dir(DEFAULT_ARTIFACT_DIR)
    }
}

/// Log sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Whether logs go to a file, given whether stdout is interactive.
    ///
    /// Writing logs to the terminal corrupts the TUI's alternate screen.
    #[must_use]
    pub fn use_file(&self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub mode: LogMode,
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            mode: LogMode::Auto,
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriageConfig {
    pub artifacts: ArtifactSettings,
    pub logging: LogSettings,
}

impl TriageConfig {
    /// Resolve configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = Self::default();
        let artifacts = ArtifactSettings {
            dir: get(ARTIFACT_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.artifacts.dir),
            model_file: get(MODEL_FILE_ENV).unwrap_or(defaults.artifacts.model_file),
            scaler_file: get(SCALER_FILE_ENV).unwrap_or(defaults.artifacts.scaler_file),
            require_manifest: get(REQUIRE_MANIFEST_ENV)
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
        };
        let logging = LogSettings {
            mode: get(LOG_MODE_ENV)
                .map(|v| LogMode::parse(&v))
                .unwrap_or(LogMode::Auto),
            file: get(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.logging.file),
        };

        Self { artifacts, logging }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}
