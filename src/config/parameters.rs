//! Parameter structures loaded from JSON, with defaults.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::graph::Neighborhood;
use crate::simulation::IntegrationScheme;

/// Top-level parameters container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub spatial: SpatialParameters,
    pub time: TimeParameters,
    pub vesicle: VesicleParameters,
}

impl SimulationParameters {
    /// Load parameters from JSON files, or use defaults if files don't exist
    pub fn load_or_default() -> Self {
        Self::load_from_dir("data/parameters")
    }

    /// Load parameters from specific directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            spatial: SpatialParameters::load_or_default(dir.join("spatial.json")),
            time: TimeParameters::load_or_default(dir.join("time.json")),
            vesicle: VesicleParameters::load_or_default(dir.join("vesicle.json")),
        }
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("node distance", self.spatial.node_distance_um),
            ("time step", self.time.time_step_sec),
            ("default vesicle radius", self.vesicle.default_radius_um),
            ("viscosity", self.vesicle.viscosity_pa_s),
            ("temperature", self.vesicle.temperature_K),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimulationError::config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.spatial.columns == 0 || self.spatial.rows == 0 {
            return Err(SimulationError::config("grid needs at least one row and column"));
        }
        if let Some(row) = self.spatial.membrane_row {
            if row < 0 || row as usize >= self.spatial.rows {
                return Err(SimulationError::config(format!(
                    "membrane row {} outside the {} grid rows",
                    row, self.spatial.rows
                )));
            }
        }
        if !(self.vesicle.membrane_margin_um.is_finite() && self.vesicle.membrane_margin_um >= 0.0) {
            return Err(SimulationError::config("membrane margin must be non-negative"));
        }
        Ok(())
    }
}

fn load_json_or_default<T, P>(path: P, label: &str) -> T
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    match std::fs::read_to_string(path.as_ref()) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(params) => {
                log::info!("Loaded {} parameters from {:?}", label, path.as_ref());
                params
            }
            Err(e) => {
                log::warn!("Failed to parse {} parameters: {}, using defaults", label, e);
                T::default()
            }
        },
        Err(_) => {
            log::info!("{} parameters file not found, using defaults", label);
            T::default()
        }
    }
}

/// Discretization of the simulated plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialParameters {
    /// Unit cell length (µm)
    pub node_distance_um: f64,
    pub columns: usize,
    pub rows: usize,
    pub neighborhood: Neighborhood,
    /// Row crossed by the plasma membrane; lower rows are cytoplasm
    pub membrane_row: Option<i32>,
}

impl SpatialParameters {
    /// Load from JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        load_json_or_default(path, "spatial")
    }
}

impl Default for SpatialParameters {
    fn default() -> Self {
        Self {
            node_distance_um: 1.0,
            columns: 10,
            rows: 10,
            neighborhood: Neighborhood::VonNeumann,
            membrane_row: None,
        }
    }
}

/// Time discretization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeParameters {
    /// Epoch length (s)
    pub time_step_sec: f64,
    pub integration_scheme: IntegrationScheme,
}

impl TimeParameters {
    /// Load from JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        load_json_or_default(path, "time")
    }
}

impl Default for TimeParameters {
    fn default() -> Self {
        Self {
            time_step_sec: 1e-6,
            integration_scheme: IntegrationScheme::Euler,
        }
    }
}

/// Vesicle layer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VesicleParameters {
    /// Radius of vesicles placed without an explicit size (µm)
    pub default_radius_um: f64,
    /// Safety margin kept to membrane segments (µm)
    pub membrane_margin_um: f64,
    /// Cytoplasmic viscosity for Brownian motion (Pa·s)
    pub viscosity_pa_s: f64,
    pub temperature_K: f64,
    /// Seed of the collision tie-break and motility generator
    pub seed: u64,
}

impl VesicleParameters {
    /// Load from JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        load_json_or_default(path, "vesicle")
    }
}

impl Default for VesicleParameters {
    fn default() -> Self {
        Self {
            default_radius_um: 0.05,
            membrane_margin_um: 0.01,
            // water at 37 °C
            viscosity_pa_s: 6.9e-4,
            temperature_K: 310.0,
            seed: 42,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimulationParameters::default().validate().is_ok());
    }

    #[test]
    fn test_missing_directory_falls_back() {
        let params = SimulationParameters::load_from_dir("/nonexistent/parameters");
        assert_eq!(params, SimulationParameters::default());
    }

    #[test]
    fn test_partial_json() {
        let params: SimulationParameters =
            serde_json::from_str(r#"{ "time": { "time_step_sec": 1e-5, "integration_scheme": "Midpoint" } }"#)
                .unwrap();
        assert_eq!(params.time.time_step_sec, 1e-5);
        assert_eq!(params.time.integration_scheme, IntegrationScheme::Midpoint);
        assert_eq!(params.spatial, SpatialParameters::default());
    }

    #[test]
    fn test_membrane_row_outside_grid() {
        let mut params = SimulationParameters::default();
        params.spatial.membrane_row = Some(10);
        assert!(params.validate().is_err());
    }
}
