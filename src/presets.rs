use crate::settings::{ConfidenceLevel, SimulationSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A named run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: SimulationSettings,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        settings: SimulationSettings,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
        }
    }
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-in presets plus whatever lives in the user config directory
    pub fn new() -> Self {
        Self::with_dir(Self::presets_dir())
    }

    /// Use `dir` for user presets instead of the platform config directory
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: Self::builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    fn builtin_presets() -> Vec<Preset> {
        let preset = |name: &str, description: &str, grid_size: usize, trials: usize| {
            Preset::new(
                name,
                description,
                SimulationSettings {
                    grid_size,
                    trials,
                    ..Default::default()
                },
            )
        };

        vec![
            preset("Quick", "Small grid, fast rough estimate", 20, 30),
            preset("Classic", "200x200 grid, 100 trials", 200, 100),
            Preset::new(
                "Fine",
                "Large grid, tight 99% interval",
                SimulationSettings {
                    grid_size: 512,
                    trials: 50,
                    confidence: ConfidenceLevel::NinetyNine,
                    ..Default::default()
                },
            ),
            preset("Single", "Degenerate 1x1 grid, threshold is always 1", 1, 10),
        ]
    }

    /// Get the presets directory path
    fn presets_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("percolation-sim").join("presets"))
    }

    /// Load user presets from disk, skipping unreadable files
    fn load_user_presets(&mut self) {
        let Some(dir) = self.dir.as_deref() else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match Self::read_preset(&path) {
                Ok(preset) if self.is_builtin(&preset.name) => {
                    warn!(
                        name = %preset.name,
                        path = %path.display(),
                        "skipping preset: shadows a built-in"
                    );
                }
                Ok(preset) => {
                    debug!(name = %preset.name, path = %path.display(), "loaded user preset");
                    self.user.push(preset);
                }
                Err(e) => warn!(path = %path.display(), "skipping preset: {}", e),
            }
        }
    }

    fn read_preset(path: &Path) -> Result<Preset, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read preset file: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse preset file: {}", e))
    }

    fn file_name(name: &str) -> String {
        let stem = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();
        format!("{}.json", stem)
    }

    /// Built-in names are reserved, whatever their case
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtin.iter().any(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Save a preset to disk
    pub fn save_preset(&mut self, preset: Preset) -> Result<(), String> {
        if self.is_builtin(&preset.name) {
            return Err(format!("'{}' is a built-in preset name", preset.name));
        }
        let dir = self.dir.as_ref().ok_or("Could not determine config directory")?;

        fs::create_dir_all(dir).map_err(|e| format!("Failed to create presets directory: {}", e))?;

        let path = dir.join(Self::file_name(&preset.name));
        let json = serde_json::to_string_pretty(&preset)
            .map_err(|e| format!("Failed to serialize preset: {}", e))?;
        fs::write(&path, json).map_err(|e| format!("Failed to write preset file: {}", e))?;

        match self.user.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.user.push(preset),
        }

        Ok(())
    }

    /// Delete a user preset
    pub fn delete_preset(&mut self, name: &str) -> Result<(), String> {
        if self.is_builtin(name) {
            return Err(format!("Built-in preset '{}' cannot be deleted", name));
        }
        let dir = self.dir.as_ref().ok_or("Could not determine config directory")?;

        let position = self.user.iter().position(|p| p.name == name);
        let path = dir.join(Self::file_name(name));
        if position.is_none() && !path.exists() {
            return Err(format!("No user preset named '{}'", name));
        }

        if let Some(pos) = position {
            self.user.remove(pos);
        }
        if path.exists() {
            fs::remove_file(&path).map_err(|e| format!("Failed to delete preset file: {}", e))?;
        }

        Ok(())
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name, case-insensitively
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
