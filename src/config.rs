use crate::settings::SimulationSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Grid size, trial count, seed and confidence level
    pub settings: SimulationSettings,
    /// Sites opened per frame in the viewer
    pub steps_per_frame: usize,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;
        if config.version > CONFIG_VERSION {
            return Err(format!(
                "Config version {} is newer than supported version {}",
                config.version, CONFIG_VERSION
            ));
        }
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            settings: SimulationSettings::default(),
            steps_per_frame: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ConfidenceLevel;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig {
            version: 1,
            settings: SimulationSettings {
                grid_size: 64,
                trials: 250,
                seed: Some(1234),
                confidence: ConfidenceLevel::NinetyNine,
            },
            steps_per_frame: 12,
        };

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_file_save_and_load() {
        let config = AppConfig::default();

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        config.save_to_file(&path).unwrap();
        let loaded = AppConfig::load_from_file(&path).unwrap();

        assert_eq!(loaded.version, config.version);
        assert_eq!(loaded.settings, config.settings);
        assert_eq!(loaded.steps_per_frame, config.steps_per_frame);
    }

    #[test]
    fn test_newer_version_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = AppConfig {
            version: CONFIG_VERSION + 1,
            ..AppConfig::default()
        };
        config.save_to_file(temp_file.path()).unwrap();

        let err = AppConfig::load_from_file(temp_file.path()).unwrap_err();
        assert!(err.contains("newer"));
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "not valid json").unwrap();

        let result = AppConfig::load_from_file(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path/config.json"));
        assert!(result.is_err());
    }
}
