use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Environment variable that may point at a JSON config file
pub const CONFIG_ENV: &str = "ASTAR_VIZ_CONFIG";

/// Settings of the visualizer, fixed once the window is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // missing fields keep their default values
pub struct Config {
    /// Number of cells along each side of the grid
    pub rows: usize,
    /// Side length of the grid in pixels
    pub grid_width: usize,
    pub panel_width: usize,
    /// How many search steps are shown per frame
    pub steps_per_frame: usize,
    pub draw_grid_lines: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: 70,
            grid_width: 700,
            panel_width: 100,
            steps_per_frame: 1,
            draw_grid_lines: true,
        }
    }
}

impl Config {
    /// Load the config file named by the first argument or by [`CONFIG_ENV`].
    /// Without either the defaults are used.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let path = std::env::args()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV).ok());

        match path {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self, anyhow::Error> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.rows == 0 {
            bail!("rows must be at least 1");
        }
        if self.grid_width < self.rows {
            bail!(
                "grid_width ({}) is too small for {} rows",
                self.grid_width,
                self.rows
            );
        }
        if self.steps_per_frame == 0 {
            bail!("steps_per_frame must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_json(r#"{ "rows": 20, "steps_per_frame": 5 }"#).unwrap();

        assert_eq!(config.rows, 20);
        assert_eq!(config.steps_per_frame, 5);
        assert_eq!(config.grid_width, 700);
        assert!(config.draw_grid_lines);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_json(r#"{ "rows": 0 }"#).is_err());
        assert!(Config::from_json(r#"{ "rows": 800 }"#).is_err());
        assert!(Config::from_json(r#"{ "steps_per_frame": 0 }"#).is_err());
        assert!(Config::from_json(r#"{ "rows": "many" }"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::load(Path::new("/nonexistent/astar.json")).is_err());
    }
}
