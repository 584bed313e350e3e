//! Configuration file discovery, reading and writing.
//!
//! Files ending in `.json` are parsed as strict JSON; anything else is
//! parsed as JSON5, which allows comments and trailing commas. Files are
//! always written back as pretty-printed JSON.
//!
//! Discovery order:
//!
//! 1. `./starchart.json5`, `./starchart.json`
//! 2. `<user config dir>/starchart/config.json5`, `<user config dir>/starchart/config.json`

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{ConfigError, Result};

/// File names looked up in the working directory.
const LOCAL_FILE_NAMES: &[&str] = &["starchart.json5", "starchart.json"];

/// Directory under the user config dir holding the user config.
const USER_CONFIG_DIR: &str = "starchart";

/// File names looked up in the user config directory.
const USER_FILE_NAMES: &[&str] = &["config.json5", "config.json"];

/// Lists every location a config file may live at, highest priority first.
///
/// The user locations are omitted when no config directory can be
/// determined.
#[must_use]
pub fn config_candidates() -> Vec<PathBuf> {
    let local = LOCAL_FILE_NAMES.iter().map(PathBuf::from);
    let user = dirs::config_dir()
        .map(|dir| dir.join(USER_CONFIG_DIR))
        .into_iter()
        .flat_map(|dir| USER_FILE_NAMES.iter().map(move |name| dir.join(name)));
    local.chain(user).collect()
}

/// Returns the first existing config file, if any.
#[must_use]
pub fn find_config_file() -> Option<PathBuf> {
    config_candidates().into_iter().find(|path| {
        let exists = path.is_file();
        trace!(path = %path.display(), exists, "probing config location");
        exists
    })
}

/// Returns the per-user configuration directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if it cannot be determined.
pub fn user_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(USER_CONFIG_DIR))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Reads and parses a configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content cannot be
/// parsed into `T`.
///
/// # Examples
///
/// ```no_run
/// use starchart_config::Config;
/// use starchart_config::persistence::read_config_file;
///
/// # fn main() -> starchart_config::Result<()> {
/// let config: Config = read_config_file("starchart.json5")?;
/// # Ok(())
/// # }
/// ```
pub fn read_config_file<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    if is_strict_json(path) {
        debug!(path = %path.display(), "parsing config as JSON");
        Ok(serde_json::from_str(&content)?)
    } else {
        debug!(path = %path.display(), "parsing config as JSON5");
        Ok(serde_json5::from_str(&content)?)
    }
}

/// Serializes `config` as pretty JSON into `path`, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn write_config_file<T: serde::Serialize>(path: impl AsRef<Path>, config: &T) -> Result<()> {
    let path = path.as_ref();
    let write_err = |source| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(write_err)?;
    debug!(path = %path.display(), "config written");
    Ok(())
}

fn is_strict_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        value: i32,
    }

    #[test]
    fn candidates_start_with_local_files() {
        let candidates = config_candidates();
        assert_eq!(candidates[0], PathBuf::from("starchart.json5"));
        assert_eq!(candidates[1], PathBuf::from("starchart.json"));
        if dirs::config_dir().is_some() {
            assert_eq!(candidates.len(), 4);
            assert!(candidates[2].ends_with("starchart/config.json5"));
        }
    }

    #[test]
    fn json5_file_allows_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.json5");
        std::fs::write(
            &path,
            r#"
            {
                // comment
                name: "demo",
                value: 7,
            }
            "#,
        )
        .unwrap();

        let sample: Sample = read_config_file(&path).unwrap();
        assert_eq!(sample.name, "demo");
        assert_eq!(sample.value, 7);
    }

    #[test]
    fn json_file_is_parsed_strictly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.json");
        std::fs::write(&path, "{ name: \"demo\", value: 7 }").unwrap();

        let err = read_config_file::<Sample>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_config_file::<Sample>("/nonexistent/starchart.json").unwrap_err();
        match err {
            ConfigError::ReadFile { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/starchart.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("config.json");
        let sample = Sample {
            name: "x".to_string(),
            value: 1,
        };

        write_config_file(&path, &sample).unwrap();
        let loaded: Sample = read_config_file(&path).unwrap();
        assert_eq!(loaded, sample);
    }

    #[test]
    fn user_config_dir_ends_with_app_name() {
        if dirs::config_dir().is_some() {
            assert!(user_config_dir().unwrap().ends_with(USER_CONFIG_DIR));
        }
    }
}
