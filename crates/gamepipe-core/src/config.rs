//! Configuration resolution for GamePipe.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/gamepipe/settings.json)
//! 3. Project config (.gamepipe/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Complete GamePipe configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub log_level: String,
    pub log_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// Per-session tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a command's collection loop waits for the next output
    /// line before considering the response complete (milliseconds).
    /// The clock restarts on every received line.
    pub idle_timeout_ms: u64,
    /// Line terminator appended to commands written to the child.
    pub line_ending: LineEnding,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 1000,
            line_ending: LineEnding::Lf,
        }
    }
}

impl SessionConfig {
    /// Idle timeout as a [`Duration`].
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Line terminator convention for commands sent to the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

impl std::str::FromStr for LineEnding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lf" => Ok(Self::Lf),
            "crlf" => Ok(Self::CrLf),
            other => Err(Error::Config(format!("Unknown line ending: {other}"))),
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    // Load global config
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let global = load_config_file(&global_path)?;
            merge_config(&mut config, global);
        }
    }

    // Load project config
    if let Some(dir) = project_dir {
        let project_path = dir.join(".gamepipe").join("settings.json");
        if project_path.exists() {
            let project = load_config_file(&project_path)?;
            merge_config(&mut config, project);
        }
    }

    // Apply environment overrides
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".gamepipe").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/gamepipe/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("gamepipe").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn merge_config(base: &mut Config, overlay: Config) {
    base.engine = overlay.engine;
    base.session = overlay.session;
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("GAMEPIPE_IDLE_TIMEOUT_MS") {
        if let Ok(ms) = val.parse() {
            config.session.idle_timeout_ms = ms;
        }
    }
    if let Ok(val) = std::env::var("GAMEPIPE_LINE_ENDING") {
        if let Ok(ending) = val.parse() {
            config.session.line_ending = ending;
        }
    }
    if let Ok(val) = std::env::var("GAMEPIPE_LOG_LEVEL") {
        config.engine.log_level = val;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_idle_timeout_is_one_second() {
        let config = Config::default();
        assert_eq!(config.session.idle_timeout_ms, 1000);
        assert_eq!(config.session.idle_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn default_line_ending_is_lf() {
        let config = Config::default();
        assert_eq!(config.session.line_ending, LineEnding::Lf);
        assert_eq!(config.session.line_ending.as_str(), "\n");
    }

    #[test]
    fn line_ending_parses_case_insensitively() {
        assert_eq!("CRLF".parse::<LineEnding>().ok(), Some(LineEnding::CrLf));
        assert_eq!("lf".parse::<LineEnding>().ok(), Some(LineEnding::Lf));
        assert!("cr".parse::<LineEnding>().is_err());
    }

    #[test]
    fn project_config_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_dir = dir.path().join(".gamepipe");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("settings.json"),
            r#"{"session": {"idle_timeout_ms": 250, "line_ending": "crlf"}}"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path())).unwrap();
        assert_eq!(config.session.idle_timeout_ms, 250);
        assert_eq!(config.session.line_ending, LineEnding::CrLf);
    }

    #[test]
    fn malformed_project_config_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_dir = dir.path().join(".gamepipe");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("settings.json"), "not json").unwrap();

        assert!(load_config(Some(dir.path())).is_err());
    }
}
