//! Application settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use rigcat_port::PortConfig;
use rigcat_protocol::PttMethod;
use serde::{Deserialize, Serialize};

/// Settings file contents; command line flags override these
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rig model name
    pub rig: String,
    /// Serial port to open
    pub port: PortConfig,
    /// PTT method applied after the rig is bound
    pub ptt_method: Option<PttMethod>,
    /// CI-V address override
    pub civ_address: Option<u8>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rig: "FT-817".to_string(),
            port: PortConfig::default(),
            ptt_method: None,
            civ_address: None,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for rigcat
    /// Uses $XDG_CONFIG_HOME/rigcat, falls back to ~/.config/rigcat
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("rigcat"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("rigcat"))
    }

    /// Default settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing default file means defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::settings_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.rig, "FT-817");
        assert_eq!(settings.port.baud_rate, 9600);
        assert_eq!(settings.ptt_method, None);
    }

    #[test]
    fn test_partial_json() {
        let settings = Settings::from_json(
            r#"{"rig": "IC-7300", "port": {"port": "/dev/ttyUSB0", "baud_rate": 19200}, "ptt_method": "RTS", "civ_address": 148}"#,
        )
        .unwrap();
        assert_eq!(settings.rig, "IC-7300");
        assert_eq!(settings.port.port, "/dev/ttyUSB0");
        assert_eq!(settings.port.baud_rate, 19200);
        assert_eq!(settings.port.read_timeout_ms, 1100);
        assert_eq!(settings.ptt_method, Some(PttMethod::Rts));
        assert_eq!(settings.civ_address, Some(0x94));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"rig": "FT-991"}}"#).unwrap();
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.rig, "FT-991");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("nope.json"))).is_err());
    }

    #[test]
    fn test_bad_json_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{rig").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }
}
