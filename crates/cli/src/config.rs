//! Config file resolution: `--config`, then the user config dir, then defaults.

use std::path::{Path, PathBuf};

use modelcheck_validator::ValidatorConfig;

use crate::exit_codes::{EXIT_CONFIG_INVALID, EXIT_IO};
use crate::CliError;

pub const CONFIG_DIR: &str = "modelcheck";
pub const CONFIG_FILE: &str = "config.toml";

/// Where the effective config came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    UserDir(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Explicit(p) | Self::UserDir(p) => p.display().to_string(),
            Self::Defaults => "built-in defaults".to_string(),
        }
    }
}

/// `<config dir>/modelcheck/config.toml`, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
}

fn read_config(path: &Path) -> Result<ValidatorConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_IO,
        message: format!("cannot read config {}: {}", path.display(), e),
        hint: None,
    })?;
    ValidatorConfig::from_toml(&text).map_err(|e| CliError {
        code: EXIT_CONFIG_INVALID,
        message: format!("{}: {}", path.display(), e),
        hint: Some("run `modelcheck config --print-default` for a valid starting point".into()),
    })
}

/// Resolve the effective config. An explicit path must exist; the user
/// config file is optional.
pub fn load(explicit: Option<&Path>) -> Result<(ValidatorConfig, ConfigSource), CliError> {
    if let Some(path) = explicit {
        let config = read_config(path)?;
        return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
    }
    match user_config_path() {
        Some(path) if path.is_file() => {
            let config = read_config(&path)?;
            log::debug!("using config {}", path.display());
            Ok((config, ConfigSource::UserDir(path)))
        }
        _ => Ok((ValidatorConfig::default(), ConfigSource::Defaults)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn explicit_config_is_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, "[tolerance]\nbeneficiary_sum = 2.0\n").unwrap();

        let (config, source) = load(Some(&path)).unwrap();
        assert_eq!(config.tolerance.beneficiary_sum, 2.0);
        assert_eq!(source, ConfigSource::Explicit(path));
    }

    #[test]
    fn invalid_config_maps_to_config_exit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, "[tolerance]\nbudget_ratio_min = 11.0\nbudget_ratio_max = 9.0\n")
            .unwrap();
        assert_eq!(load(Some(&path)).unwrap_err().code, EXIT_CONFIG_INVALID);

        std::fs::write(&path, "tolerance = [").unwrap();
        assert_eq!(load(Some(&path)).unwrap_err().code, EXIT_CONFIG_INVALID);
    }

    #[test]
    fn missing_explicit_config_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert_eq!(err.code, EXIT_IO);
    }
}
