//! JSON config file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error_handling::InitializationError;

/// Keys of the JSON config file. Every key is optional; unknown keys are
/// ignored.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub ip_file: Option<PathBuf>,
    pub url_base: Option<String>,
    pub batch_num: Option<usize>,
    pub db_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub pid: Option<PathBuf>,
    /// `"on"` or `"off"`
    pub daemon: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, InitializationError> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            InitializationError::ConfigError(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&data).map_err(|e| match e {
            InitializationError::ConfigError(msg) => {
                InitializationError::ConfigError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_json(data: &str) -> Result<Self, InitializationError> {
        serde_json::from_str(data).map_err(|e| {
            InitializationError::ConfigError(format!("invalid config file: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_keys() {
        let config = FileConfig::from_json(
            r#"{
                "ipFile": "./ip.txt",
                "urlBase": "http://ip.taobao.com/service/getIpInfo.php?ip=",
                "batchNum": 20,
                "dbFile": "./ip.db",
                "logFile": "./collector.log",
                "pid": "./collector.pid",
                "daemon": "off",
                "timeoutSeconds": 3
            }"#,
        )
        .unwrap();

        assert_eq!(config.ip_file, Some(PathBuf::from("./ip.txt")));
        assert_eq!(config.batch_num, Some(20));
        assert_eq!(config.log_file, Some(PathBuf::from("./collector.log")));
        assert_eq!(config.pid, Some(PathBuf::from("./collector.pid")));
        assert_eq!(config.daemon.as_deref(), Some("off"));
        assert_eq!(config.timeout_seconds, Some(3));
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(FileConfig::from_json("{}").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            FileConfig::from_json("{\"batchNum\": \"ten\"}"),
            Err(InitializationError::ConfigError(_))
        ));
        assert!(FileConfig::from_json("not json").is_err());
    }
}
