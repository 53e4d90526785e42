use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Cache of option files already parsed, keyed by path
static OPTIONS_CACHE: Lazy<Mutex<HashMap<PathBuf, ModelOptions>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Run configuration consulted while deriving state.
///
/// Passed by reference into every component; nothing reads options from
/// process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Soil moisture layers
    pub n_layers: usize,
    /// Soil thermal nodes
    pub n_nodes: usize,
    /// Frost subareas per layer
    pub n_frost: usize,
    /// Elevation (snow) bands
    pub n_bands: usize,
    /// Full energy balance
    pub full_energy: bool,
    pub frozen_soil: bool,
    /// Approximate ground heat flux from the two surface nodes and damping depth
    pub quick_flux: bool,
    /// Implicit time integration of the soil thermal equation
    pub implicit: bool,
    /// Exponentially spaced thermal nodes
    pub exp_trans: bool,
    /// No-flux bottom boundary for the thermal solution
    pub no_flux: bool,
    /// Model time step (s)
    pub dt_seconds: f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            n_layers: 3,
            n_nodes: 3,
            n_frost: 1,
            n_bands: 1,
            full_energy: false,
            frozen_soil: false,
            quick_flux: true,
            implicit: true,
            exp_trans: false,
            no_flux: false,
            dt_seconds: 86_400.0,
        }
    }
}

impl ModelOptions {
    /// True when node moisture, conductivity and heat capacity are needed
    pub fn needs_node_properties(&self) -> bool {
        self.full_energy || self.frozen_soil
    }

    /// True when the explicit finite-difference stability bound applies
    pub fn needs_stability_check(&self) -> bool {
        self.frozen_soil && !self.quick_flux && !self.implicit
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_layers == 0 {
            return Err(ConfigError::invalid("n_layers", "at least one soil layer is required"));
        }
        if self.n_nodes < 3 {
            return Err(ConfigError::invalid(
                "n_nodes",
                format!("at least 3 thermal nodes are required, got {}", self.n_nodes),
            ));
        }
        if self.n_frost == 0 {
            return Err(ConfigError::invalid("n_frost", "at least one frost area is required"));
        }
        if self.n_bands == 0 {
            return Err(ConfigError::invalid("n_bands", "at least one elevation band is required"));
        }
        if !self.dt_seconds.is_finite() || self.dt_seconds <= 0.0 {
            return Err(ConfigError::invalid(
                "dt_seconds",
                format!("time step must be positive, got {}", self.dt_seconds),
            ));
        }
        if self.quick_flux && self.exp_trans {
            return Err(ConfigError::invalid(
                "exp_trans",
                "exponential node spacing cannot be combined with quick_flux",
            ));
        }
        Ok(())
    }

    /// Parse and validate options from a JSON string
    pub fn from_json_str(json_str: &str) -> Result<Self, ConfigError> {
        let options: ModelOptions = serde_json::from_str(json_str)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a JSON file, using the cache if the file was read before
    pub fn load<P: AsRef<Path>>(file_path: P) -> Result<Self, ConfigError> {
        let path_buf = file_path.as_ref().to_path_buf();

        if let Some(options) = Self::cache().get(&path_buf) {
            return Ok(options.clone());
        }

        let json_str = fs::read_to_string(&path_buf).map_err(|source| ConfigError::Io {
            path: path_buf.clone(),
            source,
        })?;
        let options = Self::from_json_str(&json_str)?;

        Self::cache().insert(path_buf, options.clone());
        Ok(options)
    }

    /// Forget every cached option file
    pub fn clear_cache() {
        Self::cache().clear();
    }

    pub fn cache_size() -> usize {
        Self::cache().len()
    }

    fn cache() -> std::sync::MutexGuard<'static, HashMap<PathBuf, ModelOptions>> {
        // a poisoned cache only holds fully parsed values
        OPTIONS_CACHE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_str_fills_defaults() {
        let options = ModelOptions::from_json_str(
            r#"{ "n_layers": 3, "n_nodes": 10, "frozen_soil": true, "quick_flux": false }"#,
        )
        .unwrap();

        assert_eq!(options.n_nodes, 10);
        assert!(options.frozen_soil);
        assert!(!options.quick_flux);
        assert_eq!(options.n_frost, 1);
        assert_eq!(options.dt_seconds, 86_400.0);
        assert!(options.needs_node_properties());
        assert!(!options.needs_stability_check());
    }

    #[test]
    fn test_validate_rejects_bad_options() {
        let too_few_nodes = ModelOptions {
            n_nodes: 2,
            ..ModelOptions::default()
        };
        assert!(matches!(
            too_few_nodes.validate(),
            Err(ConfigError::Invalid { field: "n_nodes", .. })
        ));

        let bad_dt = ModelOptions {
            dt_seconds: 0.0,
            ..ModelOptions::default()
        };
        assert!(bad_dt.validate().is_err());

        let exp_quick = ModelOptions {
            exp_trans: true,
            quick_flux: true,
            ..ModelOptions::default()
        };
        assert!(exp_quick.validate().is_err());
    }

    #[test]
    fn test_invalid_json() {
        let result = ModelOptions::from_json_str(r#"{"n_layers": "#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_load_caches_file() {
        let path = std::env::temp_dir().join(format!(
            "soil_thermal_state_options_{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{ "n_nodes": 5, "implicit": false }"#).unwrap();

        let first = ModelOptions::load(&path).unwrap();
        assert_eq!(first.n_nodes, 5);
        assert!(!first.implicit);

        // a second load is served from the cache even after the file is gone
        fs::remove_file(&path).unwrap();
        let second = ModelOptions::load(&path).unwrap();
        assert_eq!(first, second);
        assert!(ModelOptions::cache_size() >= 1);

        let missing = ModelOptions::load("/path/that/does/not/exist.json");
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
