//! Typed configuration of the tutor.
//!
//! Every field has a default equal to the behaviour of a run without any configuration, so a
//! missing file section or key simply keeps the default. Unknown keys and values of the
//! wrong type are rejected while the TOML is deserialized:
//!
//! ```toml
//! log_level = "info"        # off | error | warn | info | debug | trace
//! log_file = "tutor.log"    # or `true` for a timestamped file name
//!
//! [plot]
//! enabled = true
//! x_min = -10.0
//! x_max = 10.0
//! samples = 400
//! width = 800
//! height = 600
//! output_dir = "plots"
//! unique_names = false      # append a timestamp to every file name
//! ```
use crate::Utils::logger::{default_log_file_name, parse_level};
use log::{LevelFilter, info};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Sampling domain, image size and file naming of plots.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    /// `false` turns every plot request into a "Plotting error"
    pub enabled: bool,
    pub x_min: f64,
    pub x_max: f64,
    /// number of evenly spaced sample points
    pub samples: usize,
    pub width: u32,
    pub height: u32,
    pub output_dir: PathBuf,
    /// append a timestamp so that equal titles do not overwrite each other
    pub unique_names: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            x_min: -10.0,
            x_max: 10.0,
            samples: 400,
            width: 800,
            height: 600,
            output_dir: PathBuf::from("."),
            unique_names: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TutorConfig {
    pub log_level: String,
    #[serde(deserialize_with = "log_file_setting")]
    pub log_file: Option<String>,
    pub plot: PlotConfig,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_file: None,
            plot: PlotConfig::default(),
        }
    }
}

/// `log_file = true` picks a timestamped name, `false` keeps logging on the terminal only
fn log_file_setting<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LogFile {
        Flag(bool),
        Name(String),
    }
    Ok(match LogFile::deserialize(deserializer)? {
        LogFile::Flag(true) => Some(default_log_file_name()),
        LogFile::Flag(false) => None,
        LogFile::Name(name) => Some(name),
    })
}

impl TutorConfig {
    /// Reads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<TutorConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = TutorConfig::from_toml_str(&text)?;
        info!("configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<TutorConfig, ConfigError> {
        let config: TutorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if parse_level(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }
        self.plot.validate()
    }

    pub fn level_filter(&self) -> LevelFilter {
        parse_level(&self.log_level).unwrap_or(LevelFilter::Warn)
    }
}

impl PlotConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.x_min < self.x_max) {
            return Err(ConfigError::Invalid(format!(
                "plot.x_min ({}) must be less than plot.x_max ({})",
                self.x_min, self.x_max
            )));
        }
        if self.samples < 2 {
            return Err(ConfigError::Invalid("plot.samples must be at least 2".to_string()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid("plot size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_plain_run() {
        let config = TutorConfig::default();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_file, None);
        assert_eq!(config.plot.samples, 400);
        assert_eq!(config.plot.x_min, -10.0);
        assert_eq!(config.plot.x_max, 10.0);
        assert_eq!(config.plot.output_dir, PathBuf::from("."));
        assert!(!config.plot.unique_names);
        assert_eq!(config.level_filter(), LevelFilter::Warn);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = TutorConfig::from_toml_str(
            "log_level = \"debug\"\n[plot]\nx_min = -2\nsamples = 50\nunique_names = true\n",
        )
        .unwrap();
        assert_eq!(config.level_filter(), LevelFilter::Debug);
        assert_eq!(config.plot.x_min, -2.0);
        assert_eq!(config.plot.x_max, 10.0);
        assert_eq!(config.plot.samples, 50);
        assert!(config.plot.unique_names);
        assert_eq!(config.plot.width, 800);
    }

    #[test]
    fn test_log_file_flag() {
        let config = TutorConfig::from_toml_str("log_file = true").unwrap();
        assert!(config.log_file.unwrap().ends_with(".txt"));
        let config = TutorConfig::from_toml_str("log_file = \"tutor.log\"").unwrap();
        assert_eq!(config.log_file.as_deref(), Some("tutor.log"));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            TutorConfig::from_toml_str("[plot]\nx_min = 5\nx_max = 1\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TutorConfig::from_toml_str("[plot]\nsamples = \"many\"\n"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            TutorConfig::from_toml_str("log_level = \"loud\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TutorConfig::from_toml_str("log_level = "),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_out_of_range_and_unknown_keys_are_rejected() {
        for text in [
            "[plot]\nwidth = 5000000000\n",
            "[plot]\nheight = -600\n",
            "[plot]\nsamples = -1\n",
            "[plot]\nxmin = -2\n",
            "log_levle = \"info\"",
            "log_file = 3",
        ] {
            assert!(
                matches!(TutorConfig::from_toml_str(text), Err(ConfigError::Toml(_))),
                "{}",
                text
            );
        }
        let config = TutorConfig::from_toml_str("log_file = false\n[plot]\nwidth = 4000000\n").unwrap();
        assert_eq!(config.log_file, None);
        assert_eq!(config.plot.width, 4_000_000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tutor.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[plot]\noutput_dir = \"figures\"\nwidth = 640").unwrap();
        let config = TutorConfig::load(&path).unwrap();
        assert_eq!(config.plot.output_dir, PathBuf::from("figures"));
        assert_eq!(config.plot.width, 640);
        let missing = TutorConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
