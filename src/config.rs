//! Application configuration.
//!
//! Settings live in an optional JSON file. Every field has a default, so a
//! file only needs the keys it changes:
//!
//! ```json
//! {
//!   "default_effect": "raytrace",
//!   "effects": { "particles": { "count": 100000, "spin": 0.5 } },
//!   "grading": { "saturation": 1.3 }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::driver::FrameDriver;
use crate::effect::Command;
use crate::error::ConfigError;
use crate::visuals::ColorGrading;

/// File looked for in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "vfxe.json";

fn default_effect() -> String {
    "particles".into()
}

fn default_camera_distance() -> f32 {
    Camera::new().distance
}

/// Window settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Present with vsync (`Fifo`) rather than as fast as possible.
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "vfxe".into(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    /// Effect started at launch.
    #[serde(default = "default_effect")]
    pub default_effect: String,
    /// Parameter overrides applied at startup: effect → parameter → value.
    #[serde(default)]
    pub effects: BTreeMap<String, BTreeMap<String, f32>>,
    #[serde(default = "default_camera_distance")]
    pub camera_distance: f32,
    /// Final color grading pass.
    #[serde(default = "ColorGrading::vivid")]
    pub grading: ColorGrading,
    /// Step the clock by this much every frame instead of the wall clock.
    #[serde(default)]
    pub fixed_delta: Option<f32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            default_effect: default_effect(),
            effects: BTreeMap::new(),
            camera_distance: default_camera_distance(),
            grading: ColorGrading::vivid(),
            fixed_delta: None,
        }
    }
}

impl AppConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load `path` if it exists. A missing or malformed file is logged and
    /// the defaults are used.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Parameter overrides as registry commands.
    pub fn commands(&self) -> Vec<Command> {
        self.effects
            .iter()
            .flat_map(|(effect, params)| {
                params
                    .iter()
                    .map(move |(param, &value)| Command::configure(effect.as_str(), param.as_str(), value))
            })
            .collect()
    }

    /// Build a driver from this configuration.
    ///
    /// Unknown effects or parameters in the overrides are logged and skipped.
    pub fn build_driver(&self) -> FrameDriver {
        let mut driver = FrameDriver::with_defaults(&self.default_effect);
        for command in self.commands() {
            driver.dispatch(command);
        }
        driver.camera.distance = self.camera_distance;
        driver.clock.set_fixed_delta(self.fixed_delta);
        driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.grading, ColorGrading::vivid());
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::from_json(
            r#"{
                "default_effect": "raytrace",
                "window": { "width": 800 },
                "effects": { "particles": { "count": 1000 } },
                "grading": { "saturation": 1.5 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.default_effect, "raytrace");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.grading.saturation, 1.5);
        // Fields missing inside a nested object fall back to that type's default
        assert_eq!(config.grading.contrast, 1.0);
        assert_eq!(config.commands(), vec![Command::configure("particles", "count", 1000.0)]);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            AppConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_or_default("/nonexistent/vfxe.json");
        assert_eq!(config, AppConfig::default());
        assert!(matches!(
            AppConfig::load("/nonexistent/vfxe.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("vfxe-config-{}.json", std::process::id()));
        let mut config = AppConfig::default();
        config.fixed_delta = Some(1.0 / 60.0);
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_build_driver_applies_overrides() {
        let config = AppConfig::from_json(
            r#"{
                "default_effect": "physics",
                "effects": {
                    "physics": { "count": 3 },
                    "sparkles": { "count": 3 }
                },
                "camera_distance": 20.0
            }"#,
        )
        .unwrap();
        let driver = config.build_driver();
        assert!(driver.registry.is_active("physics"));
        assert_eq!(driver.scene.len(), 3);
        assert_eq!(driver.camera.distance, 20.0);
    }
}
