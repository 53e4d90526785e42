/// Time-invariant soil description of a grid cell
///
/// `SoilParameters` is filled by the parameter file reader and only read
/// here. Moisture quantities are in mm of water per layer, depths in m,
/// bubbling pressure in cm, densities in kg/m³ and temperatures in °C.
pub mod properties;
pub mod water_table;

use serde::{Deserialize, Serialize};

use crate::config::ModelOptions;
use crate::constants::MM_PER_M;
use crate::error::PropertyError;

pub use water_table::WaterTableCurve;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilParameters {
    /// Thickness of each moisture layer (m)
    pub depth: Vec<f64>,
    /// Maximum moisture (porosity × depth) per layer (mm)
    pub max_moist: Vec<f64>,
    /// Residual volumetric moisture per layer
    pub resid_moist: Vec<f64>,
    /// Retention curve exponent (Brooks-Corey `3 + 2/λ`) per layer
    pub expt: Vec<f64>,
    /// Bubbling pressure per layer (cm)
    pub bubble: Vec<f64>,
    /// Quartz fraction of the mineral soil
    pub quartz: Vec<f64>,
    /// Organic fraction of the soil solids
    pub organic: Vec<f64>,
    pub bulk_density: Vec<f64>,
    pub soil_density: Vec<f64>,
    /// Bulk density of the mineral fraction alone
    pub bulk_dens_min: Vec<f64>,
    /// Particle density of the mineral fraction alone
    pub soil_dens_min: Vec<f64>,
    /// Variable infiltration curve shape parameter
    pub b_infilt: f64,
    /// Thermal damping depth (m); the bottom node sits here
    pub dp: f64,
    /// Mean annual soil temperature, the constant temperature at `dp` (°C)
    pub avg_temp: f64,
    /// Area fraction of each frost subarea, summing to 1
    pub frost_fract: Vec<f64>,
    /// Temperature spread across the frost subareas (°C)
    pub frost_slope: f64,
    /// Frozen soil physics is active for this cell
    pub fs_active: bool,
    /// Area fraction of each elevation band
    pub area_fract: Vec<f64>,
}

impl SoilParameters {
    /// Check every array against the configured dimensions and the scalar
    /// parameters for physical sense.
    pub fn validate(&self, options: &ModelOptions) -> Result<(), PropertyError> {
        let n_layers = options.n_layers;
        let per_layer: [(&'static str, &Vec<f64>); 11] = [
            ("depth", &self.depth),
            ("max_moist", &self.max_moist),
            ("resid_moist", &self.resid_moist),
            ("expt", &self.expt),
            ("bubble", &self.bubble),
            ("quartz", &self.quartz),
            ("organic", &self.organic),
            ("bulk_density", &self.bulk_density),
            ("soil_density", &self.soil_density),
            ("bulk_dens_min", &self.bulk_dens_min),
            ("soil_dens_min", &self.soil_dens_min),
        ];
        for (field, values) in per_layer {
            if values.len() != n_layers {
                return Err(PropertyError::length(field, n_layers, values.len()));
            }
        }
        if self.frost_fract.len() != options.n_frost {
            return Err(PropertyError::length(
                "frost_fract",
                options.n_frost,
                self.frost_fract.len(),
            ));
        }
        if self.area_fract.len() != options.n_bands {
            return Err(PropertyError::length(
                "area_fract",
                options.n_bands,
                self.area_fract.len(),
            ));
        }

        for (lidx, &d) in self.depth.iter().enumerate() {
            PropertyError::check_range("depth", lidx, d, f64::MIN_POSITIVE, f64::MAX)?;
        }
        for (lidx, &expt) in self.expt.iter().enumerate() {
            // the unfrozen water curve exponent -2/(expt-3) needs expt > 3
            if !(expt > 3.0) {
                return Err(PropertyError::OutOfRange {
                    property: "expt",
                    index: lidx,
                    value: expt,
                });
            }
        }
        for lidx in 0..n_layers {
            PropertyError::check_range("max_moist", lidx, self.max_moist[lidx], 0.0, f64::MAX)?;
            PropertyError::check_range("bubble", lidx, self.bubble[lidx], f64::MIN_POSITIVE, f64::MAX)?;
            PropertyError::check_range("soil_density", lidx, self.soil_density[lidx], f64::MIN_POSITIVE, f64::MAX)?;
            PropertyError::check_range("organic", lidx, self.organic[lidx], 0.0, 1.0)?;
            PropertyError::check_range("quartz", lidx, self.quartz[lidx], 0.0, 1.0)?;
        }
        PropertyError::check_range("b_infilt", 0, self.b_infilt, f64::MIN_POSITIVE, f64::MAX)?;
        PropertyError::check_range("dp", 0, self.dp, self.depth[0] * 2.0, f64::MAX)?;

        let frost_total: f64 = self.frost_fract.iter().sum();
        if (frost_total - 1.0).abs() > 1.0e-6 {
            return Err(PropertyError::Invalid(format!(
                "frost_fract sums to {frost_total}, expected 1"
            )));
        }
        Ok(())
    }

    pub fn n_layers(&self) -> usize {
        self.depth.len()
    }

    /// Depth of the top of each layer plus the bottom of the column (m)
    pub fn layer_boundaries(&self) -> Vec<f64> {
        let mut bounds = Vec::with_capacity(self.depth.len() + 1);
        let mut sum = 0.0;
        bounds.push(sum);
        for d in &self.depth {
            sum += d;
            bounds.push(sum);
        }
        bounds
    }

    pub fn total_depth(&self) -> f64 {
        self.depth.iter().sum()
    }

    /// Volumetric porosity of a layer
    pub fn porosity(&self, lidx: usize) -> f64 {
        self.max_moist[lidx] / (self.depth[lidx] * MM_PER_M)
    }

    /// Solid volume fraction of a layer
    pub fn soil_fraction(&self, lidx: usize) -> f64 {
        self.bulk_density[lidx] / self.soil_density[lidx]
    }

    /// Temperature offset of each frost subarea relative to the mean
    ///
    /// Subareas are spread linearly over `frost_slope`, each placed at the
    /// centroid of its cumulative area fraction.
    pub fn frost_offsets(&self) -> Vec<f64> {
        if self.frost_fract.len() <= 1 {
            return vec![0.0; self.frost_fract.len()];
        }
        let mut cumulative = 0.0;
        self.frost_fract
            .iter()
            .map(|&fract| {
                let centroid = cumulative + fract / 2.0;
                cumulative += fract;
                self.frost_slope * (centroid - 0.5)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Three layer loam column used across unit tests
    pub fn loam(options: &ModelOptions) -> SoilParameters {
        let n = options.n_layers;
        let depth: Vec<f64> = [0.1, 0.3, 1.6].iter().copied().cycle().take(n).collect();
        let porosity = 0.45;
        SoilParameters {
            max_moist: depth.iter().map(|d| d * porosity * MM_PER_M).collect(),
            resid_moist: vec![0.02; n],
            expt: vec![11.2; n],
            bubble: vec![14.66; n],
            quartz: vec![0.4; n],
            organic: vec![0.0; n],
            bulk_density: vec![1485.0; n],
            soil_density: vec![2685.0; n],
            bulk_dens_min: vec![1485.0; n],
            soil_dens_min: vec![2685.0; n],
            depth,
            b_infilt: 0.2,
            dp: 4.0,
            avg_temp: 5.0,
            frost_fract: vec![1.0 / options.n_frost as f64; options.n_frost],
            frost_slope: 2.0,
            fs_active: true,
            area_fract: vec![1.0 / options.n_bands as f64; options.n_bands],
        }
    }
}
