// CLI settings
// Loaded from --config or ./phaseplan.toml; command-line flags win over both

use anyhow::{Context, Result};
use phaseplan_core::CalendarFormat;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "phaseplan.toml";

/// Settings from `phaseplan.toml`; every key is optional
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Calendar used for project files that do not name one
    pub calendar_format: Option<CalendarFormat>,
    /// Currency symbol for the details report
    pub currency: Option<String>,
    /// Whether `export` writes the companion details file
    pub details: Option<bool>,
}

impl Settings {
    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or("$")
    }

    pub fn details(&self) -> bool {
        self.details.unwrap_or(true)
    }
}

/// Load settings from an explicit path, or from `./phaseplan.toml` when it exists
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(Settings::default());
            }
            default
        }
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let settings = parse_settings(&contents)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    debug!(path = %path.display(), ?settings, "loaded settings");
    Ok(settings)
}

fn parse_settings(contents: &str) -> Result<Settings> {
    Ok(toml::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.currency(), "$");
        assert!(settings.details());
    }

    #[test]
    fn all_keys() {
        let settings = parse_settings(
            r#"
calendar_format = "six_day"
currency = "₦"
details = false
"#,
        )
        .unwrap();
        assert_eq!(settings.calendar_format, Some(CalendarFormat::SixDay));
        assert_eq!(settings.currency(), "₦");
        assert!(!settings.details());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_settings("currancy = \"€\"").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_settings(Some(Path::new("/no/such/phaseplan.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
