//! JSON simulation configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PicError, Result};
use crate::light_cone::particles_per_cell;

/// Gauge group, chosen once at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    U1,
    Su2,
    Su3,
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub group: GroupKind,
    pub grid: GridConfig,
    /// Time step.
    pub dt: f64,
    /// Gauge coupling g.
    #[serde(default = "default_coupling")]
    pub coupling: f64,
    /// Deposit particles on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub light_cone: Option<LightConeConfig>,
}

/// Periodic grid shape, one entry per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub num_cells: Vec<usize>,
    pub spacing: Vec<f64>,
}

/// Light-cone current generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConeConfig {
    /// Axis of motion.
    pub direction: usize,
    /// +1 or −1.
    #[serde(default = "default_orientation")]
    pub orientation: i32,
    #[serde(default = "default_refinement_iterations")]
    pub refinement_iterations: usize,
    #[serde(default = "default_cutoff_factor")]
    pub cutoff_factor: f64,
}

fn default_coupling() -> f64 {
    1.0
}

fn default_orientation() -> i32 {
    1
}

pub(crate) fn default_refinement_iterations() -> usize {
    100
}

pub(crate) fn default_cutoff_factor() -> f64 {
    1e-21
}

impl GridConfig {
    /// Check shape and spacing; the grid constructor repeats these checks.
    pub fn validate(&self) -> Result<()> {
        if self.num_cells.is_empty() {
            return Err(PicError::InvalidGrid("grid has no axes".to_string()));
        }
        if self.num_cells.len() != self.spacing.len() {
            return Err(PicError::InvalidGrid(format!(
                "{} cell counts but {} spacings",
                self.num_cells.len(),
                self.spacing.len()
            )));
        }
        if self.num_cells.contains(&0) {
            return Err(PicError::InvalidGrid("zero cells along an axis".to_string()));
        }
        if let Some(a) = self.spacing.iter().find(|a| !(**a > 0.0) || !a.is_finite()) {
            return Err(PicError::InvalidGrid(format!("spacing must be positive, got {a}")));
        }
        Ok(())
    }
}

impl SimulationConfig {
    pub fn dimensions(&self) -> usize {
        self.grid.num_cells.len()
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(PicError::InvalidParameter(format!("dt must be positive, got {}", self.dt)));
        }
        if !self.coupling.is_finite() {
            return Err(PicError::InvalidParameter(format!("coupling must be finite, got {}", self.coupling)));
        }
        if let Some(lc) = &self.light_cone {
            if lc.direction >= self.dimensions() {
                return Err(PicError::InvalidParameter(format!(
                    "light-cone direction {} out of range for {} dimensions",
                    lc.direction,
                    self.dimensions()
                )));
            }
            if lc.orientation != 1 && lc.orientation != -1 {
                return Err(PicError::InvalidParameter(format!(
                    "orientation must be +1 or -1, got {}",
                    lc.orientation
                )));
            }
            particles_per_cell(self.grid.spacing[lc.direction], self.dt)?;
        }
        Ok(())
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &str) -> Result<SimulationConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: SimulationConfig = serde_json::from_str(&json)?;
    config.validate()?;
    Ok(config)
}

/// Save a configuration to file.
pub fn save_config(path: &str, config: &SimulationConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig {
            group: GroupKind::Su2,
            grid: GridConfig {
                num_cells: vec![16, 8, 8],
                spacing: vec![1.0, 1.0, 1.0],
            },
            dt: 0.25,
            coupling: 2.0,
            parallel: true,
            light_cone: Some(LightConeConfig {
                direction: 0,
                orientation: -1,
                refinement_iterations: 10,
                cutoff_factor: 1e-20,
            }),
        }
    }

    #[test]
    fn test_defaults() {
        let json = r#"{
            "group": "su3",
            "grid": { "num_cells": [4, 4], "spacing": [0.5, 0.5] },
            "dt": 0.1,
            "light_cone": { "direction": 1 }
        }"#;
        let parsed: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.group, GroupKind::Su3);
        assert_eq!(parsed.coupling, 1.0);
        assert!(!parsed.parallel);
        let lc = parsed.light_cone.unwrap();
        assert_eq!(lc.orientation, 1);
        assert_eq!(lc.refinement_iterations, 100);
        assert_eq!(lc.cutoff_factor, 1e-21);
    }

    #[test]
    fn test_group_names() {
        assert_eq!(serde_json::to_string(&GroupKind::U1).unwrap(), "\"u1\"");
        assert!(serde_json::from_str::<GroupKind>("\"su4\"").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let mut bad = config();
        bad.grid.spacing.pop();
        assert!(matches!(bad.validate(), Err(PicError::InvalidGrid(_))));

        let mut bad = config();
        bad.grid.num_cells[1] = 0;
        assert!(matches!(bad.validate(), Err(PicError::InvalidGrid(_))));

        let mut bad = config();
        bad.grid.spacing[2] = -1.0;
        assert!(matches!(bad.validate(), Err(PicError::InvalidGrid(_))));

        let mut bad = config();
        bad.dt = 1.5;
        assert!(matches!(bad.validate(), Err(PicError::InvalidParameter(_))));

        let mut bad = config();
        if let Some(lc) = bad.light_cone.as_mut() {
            lc.direction = 3;
        }
        assert!(matches!(bad.validate(), Err(PicError::InvalidParameter(_))));

        let mut bad = config();
        if let Some(lc) = bad.light_cone.as_mut() {
            lc.orientation = 0;
        }
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join("phyz_pic_config_test.json");
        let path = path.to_string_lossy().to_string();
        save_config(&path, &config()).unwrap();
        let loaded = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.group, GroupKind::Su2);
        assert_eq!(loaded.grid, config().grid);
        assert_eq!(loaded.light_cone, config().light_cone);
        assert!(loaded.parallel);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/phyz_pic.json"),
            Err(PicError::IoError(_))
        ));
    }
}
