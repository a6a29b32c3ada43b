use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::SetupError;

pub const DEFAULT_CONFIG_FILE: &str = "prism-setup.json";

const DEFAULT_ARCHIVE_FILE: &str = "External.zip";
const DEFAULT_EXTRACT_TO: &str = ".";
const DEFAULT_GENERATOR_SCRIPT: &str = "Scripts/gen_projects.py";
const DEFAULT_EXIT_PAUSE_MS: u64 = 2000;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub bundle_url: Option<String>,
    #[serde(default)]
    pub archive_file: Option<String>,
    #[serde(default)]
    pub extract_to: Option<String>,
    #[serde(default)]
    pub generator_script: Option<String>,
    #[serde(default)]
    pub generator_launcher: Option<String>,
    #[serde(default)]
    pub keep_archive: Option<bool>,
    #[serde(default)]
    pub exit_pause_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub bundle_url: String,
    pub archive_file: Utf8PathBuf,
    pub extract_to: Utf8PathBuf,
    pub generator_script: Utf8PathBuf,
    pub generator_launcher: Option<Utf8PathBuf>,
    pub keep_archive: bool,
    pub exit_pause: Duration,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the config file. An explicitly named file must exist; the
    /// default file in the working directory is optional.
    pub fn load(path: Option<&str>) -> Result<Config, SetupError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| SetupError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| SetupError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, SetupError> {
        let bundle_url = config.bundle_url.ok_or(SetupError::MissingBundleUrl)?;

        Ok(ResolvedConfig {
            bundle_url,
            archive_file: Utf8PathBuf::from(
                config
                    .archive_file
                    .unwrap_or_else(|| DEFAULT_ARCHIVE_FILE.to_string()),
            ),
            extract_to: Utf8PathBuf::from(
                config
                    .extract_to
                    .unwrap_or_else(|| DEFAULT_EXTRACT_TO.to_string()),
            ),
            generator_script: Utf8PathBuf::from(
                config
                    .generator_script
                    .unwrap_or_else(|| DEFAULT_GENERATOR_SCRIPT.to_string()),
            ),
            generator_launcher: config.generator_launcher.map(Utf8PathBuf::from),
            keep_archive: config.keep_archive.unwrap_or(false),
            exit_pause: Duration::from_millis(
                config.exit_pause_ms.unwrap_or(DEFAULT_EXIT_PAUSE_MS),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn resolves_defaults_around_the_url() {
        let config = Config {
            bundle_url: Some("https://host/f/bundle.zip?dl=0".to_string()),
            ..Config::default()
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.archive_file, Utf8PathBuf::from("External.zip"));
        assert_eq!(resolved.extract_to, Utf8PathBuf::from("."));
        assert_eq!(
            resolved.generator_script,
            Utf8PathBuf::from("Scripts/gen_projects.py")
        );
        assert!(resolved.generator_launcher.is_none());
        assert!(!resolved.keep_archive);
        assert_eq!(resolved.exit_pause, Duration::from_millis(2000));
    }

    #[test]
    fn missing_url_is_rejected() {
        let result = ConfigLoader::resolve_config(Config::default());
        assert_matches!(result, Err(SetupError::MissingBundleUrl));
    }

    #[test]
    fn explicit_values_win_over_defaults() {
        let config = Config {
            bundle_url: Some("https://host/f/bundle.zip".to_string()),
            archive_file: Some("deps.zip".to_string()),
            extract_to: Some("vendor".to_string()),
            generator_script: Some("tools/generate".to_string()),
            generator_launcher: Some("python3".to_string()),
            keep_archive: Some(true),
            exit_pause_ms: Some(0),
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.archive_file, Utf8PathBuf::from("deps.zip"));
        assert_eq!(resolved.extract_to, Utf8PathBuf::from("vendor"));
        assert_eq!(
            resolved.generator_launcher,
            Some(Utf8PathBuf::from("python3"))
        );
        assert!(resolved.keep_archive);
        assert!(resolved.exit_pause.is_zero());
    }
}
