/// Per-tile state of a grid cell
///
/// Primary state (layer moisture, frost-area ice, node temperatures) is
/// loaded by the caller; everything else here is derived in place.
use serde::{Deserialize, Serialize};

use crate::config::ModelOptions;
use crate::error::PropertyError;
use crate::tile::TileIndex;

/// One soil moisture layer of a tile
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LayerState {
    /// Total moisture, liquid and frozen (mm)
    pub moist: f64,
    /// Ice content of each frost subarea (mm)
    pub ice: Vec<f64>,
    /// Mean layer temperature (°C)
    pub temp: f64,
    /// Water table depth within this layer (m); the layer bottom when the
    /// table lies below it
    pub zwt: f64,
}

impl LayerState {
    pub fn new(moist: f64, n_frost: usize) -> Self {
        Self {
            moist,
            ice: vec![0.0; n_frost],
            temp: 0.0,
            zwt: 0.0,
        }
    }

    /// Ice content weighted by the frost subarea fractions (mm)
    pub fn weighted_ice(&self, frost_fract: &[f64]) -> f64 {
        self.ice.iter().zip(frost_fract).map(|(i, f)| i * f).sum()
    }
}

/// Soil moisture layers of a tile
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SoilColumnState {
    pub layers: Vec<LayerState>,
}

impl SoilColumnState {
    pub fn new(moist: &[f64], n_frost: usize) -> Self {
        Self {
            layers: moist.iter().map(|&m| LayerState::new(m, n_frost)).collect(),
        }
    }

    pub fn moist(&self) -> Vec<f64> {
        self.layers.iter().map(|l| l.moist).collect()
    }
}

/// Soil thermal node profile of a tile
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ThermalNodeState {
    /// Node temperatures (°C), primary state
    pub temp: Vec<f64>,
    /// Volumetric moisture per node
    pub moist: Vec<f64>,
    /// Volumetric ice per node
    pub ice: Vec<f64>,
    /// Thermal conductivity per node (W/m/K)
    pub kappa: Vec<f64>,
    /// Volumetric heat capacity per node (J/m³/K)
    pub cs: Vec<f64>,
    /// Depths where the profile crosses into above-freezing soil going down (m)
    pub frost_fronts: Vec<f64>,
    /// Depths where the profile crosses into frozen soil going down (m)
    pub thaw_fronts: Vec<f64>,
}

impl ThermalNodeState {
    pub fn new(temp: Vec<f64>) -> Self {
        let n = temp.len();
        Self {
            temp,
            moist: vec![0.0; n],
            ice: vec![0.0; n],
            kappa: vec![0.0; n],
            cs: vec![0.0; n],
            frost_fronts: Vec::new(),
            thaw_fronts: Vec::new(),
        }
    }
}

/// Water balance diagnostics of a tile
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TileDiagnostics {
    /// Saturated area fraction
    pub asat: f64,
    /// Water table depth of the column (m below surface)
    pub zwt: f64,
    /// Water table depth with all layers lumped into one (m below surface)
    pub zwt_lumped: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TileVars {
    pub soil: SoilColumnState,
    pub thermal: ThermalNodeState,
    pub diagnostics: TileDiagnostics,
}

/// All tile state of a grid cell, vegetation major and band minor
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CellVars {
    pub n_bands: usize,
    pub tiles: Vec<TileVars>,
}

impl CellVars {
    /// Cell state with every tile holding the same initial moisture and
    /// node temperatures
    pub fn uniform(
        options: &ModelOptions,
        n_veg_classes: usize,
        moist: &[f64],
        node_temp: &[f64],
    ) -> Self {
        let tile = TileVars {
            soil: SoilColumnState::new(moist, options.n_frost),
            thermal: ThermalNodeState::new(node_temp.to_vec()),
            diagnostics: TileDiagnostics::default(),
        };
        Self {
            n_bands: options.n_bands,
            tiles: vec![tile; n_veg_classes * options.n_bands],
        }
    }

    pub fn tile(&self, index: TileIndex) -> &TileVars {
        &self.tiles[index.veg * self.n_bands + index.band]
    }

    pub fn tile_mut(&mut self, index: TileIndex) -> &mut TileVars {
        &mut self.tiles[index.veg * self.n_bands + index.band]
    }

    /// Check every tile's arrays against the configured dimensions
    pub fn validate(&self, options: &ModelOptions, n_veg_classes: usize) -> Result<(), PropertyError> {
        if self.n_bands != options.n_bands {
            return Err(PropertyError::length("bands", options.n_bands, self.n_bands));
        }
        let expected_tiles = n_veg_classes * options.n_bands;
        if self.tiles.len() != expected_tiles {
            return Err(PropertyError::length("tiles", expected_tiles, self.tiles.len()));
        }
        for tile in &self.tiles {
            if tile.soil.layers.len() != options.n_layers {
                return Err(PropertyError::length("layers", options.n_layers, tile.soil.layers.len()));
            }
            if let Some(layer) = tile.soil.layers.iter().find(|l| l.ice.len() != options.n_frost) {
                return Err(PropertyError::length("layer ice", options.n_frost, layer.ice.len()));
            }
            let thermal = &tile.thermal;
            for (field, len) in [
                ("node temperatures", thermal.temp.len()),
                ("node moisture", thermal.moist.len()),
                ("node ice", thermal.ice.len()),
                ("node conductivity", thermal.kappa.len()),
                ("node heat capacity", thermal.cs.len()),
            ] {
                if len != options.n_nodes {
                    return Err(PropertyError::length(field, options.n_nodes, len));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_uniform_cell_layout() {
        let options = ModelOptions {
            n_bands: 2,
            n_frost: 3,
            ..ModelOptions::default()
        };
        let mut cell = CellVars::uniform(&options, 3, &[20.0, 60.0, 300.0], &[1.0, 2.0, 3.0]);
        assert_eq!(cell.tiles.len(), 6);
        assert!(cell.validate(&options, 3).is_ok());

        cell.tile_mut(TileIndex { veg: 2, band: 1 }).diagnostics.asat = 0.5;
        assert_eq!(cell.tiles[5].diagnostics.asat, 0.5);
        assert_eq!(cell.tile(TileIndex { veg: 0, band: 1 }).soil.layers[0].ice.len(), 3);
    }

    #[test]
    fn test_validate_catches_short_node_profile() {
        let options = ModelOptions::default();
        let mut cell = CellVars::uniform(&options, 2, &[20.0, 60.0, 300.0], &[1.0, 2.0, 3.0]);
        cell.tiles[1].thermal.temp.pop();
        assert_eq!(
            cell.validate(&options, 2),
            Err(PropertyError::length("node temperatures", 3, 2))
        );
    }

    #[test]
    fn test_weighted_ice() {
        let layer = LayerState {
            moist: 40.0,
            ice: vec![10.0, 30.0],
            temp: -1.0,
            zwt: 0.0,
        };
        assert_abs_diff_eq!(layer.weighted_ice(&[0.25, 0.75]), 25.0, epsilon = 1e-12);
    }
}
