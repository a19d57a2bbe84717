//! INI configuration behind [`ConfigPort`].
//!
//! Section and key names are case-insensitive. Blank values count as unset,
//! so `count =` falls back to the default like a missing key does.

use crate::domain::error::MarketScoreError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    /// No file given: every lookup returns its default.
    pub fn empty() -> Self {
        Self { ini: Ini::new() }
    }

    pub fn from_file(path: &Path) -> Result<Self, MarketScoreError> {
        let file = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| MarketScoreError::ConfigParse {
            file: file.clone(),
            reason: e.to_string(),
        })?;
        Self::parse(&file, &content)
    }

    pub fn from_string(content: &str) -> Result<Self, MarketScoreError> {
        Self::parse("<inline>", content)
    }

    fn parse(file: &str, content: &str) -> Result<Self, MarketScoreError> {
        let mut ini = Ini::new();
        ini.read(content.trim_start_matches('\u{feff}').to_string())
            .map_err(|reason| MarketScoreError::ConfigParse {
                file: file.to_string(),
                reason,
            })?;
        Ok(Self { ini })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_string(section, key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .and_then(|v| Self::parse_bool(&v))
            .unwrap_or(default)
    }
}
