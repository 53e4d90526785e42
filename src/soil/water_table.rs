/// Soil moisture versus water table depth curves
///
/// For a given water table position inside a layer, the layer below the
/// table is saturated and the layer above follows the Brooks-Corey
/// retention curve as a function of height above the table. Tabulating
/// total layer moisture over water table positions from the layer top to
/// the layer bottom gives a curve that can be inverted by interpolation.

use crate::constants::{CM_PER_M, MM_PER_M, WATER_TABLE_CURVE_POINTS};
use crate::math_utils::interpolate_at;
use crate::soil::SoilParameters;

#[derive(Debug, Clone, PartialEq)]
pub struct WaterTableCurve {
    /// Water table depths (m below surface), increasing
    pub zwt: Vec<f64>,
    /// Layer moisture (mm) at each water table depth, non-increasing
    pub moist: Vec<f64>,
}

impl WaterTableCurve {
    /// Tabulate the curve of a layer spanning `top..top + depth`
    pub fn build(
        top: f64,
        depth: f64,
        max_moist: f64,
        resid_moist: f64,
        expt: f64,
        bubble: f64,
    ) -> Self {
        let porosity = max_moist / (depth * MM_PER_M);
        let resid = resid_moist.min(porosity);
        let lambda = 2.0 / (expt - 3.0);
        let hb = bubble / CM_PER_M;
        let bottom = top + depth;

        let mut zwt = Vec::with_capacity(WATER_TABLE_CURVE_POINTS);
        let mut moist = Vec::with_capacity(WATER_TABLE_CURVE_POINTS);
        for i in 0..WATER_TABLE_CURVE_POINTS {
            let z = top + depth * i as f64 / (WATER_TABLE_CURVE_POINTS - 1) as f64;
            let above = z - top;
            let below = bottom - z;
            let water = porosity * below + unsaturated_water(above, porosity, resid, lambda, hb);
            // rounding must not let a deeper table hold more water
            let water_mm = match moist.last() {
                Some(&previous) => (water * MM_PER_M).min(previous),
                None => max_moist,
            };
            zwt.push(z);
            moist.push(water_mm);
        }
        Self { zwt, moist }
    }

    /// Water table depth for a layer moisture of `moist` mm
    ///
    /// `None` when the layer is drier than a water table at its bottom
    /// allows, i.e. the water table lies below this layer.
    pub fn depth_for(&self, moist: f64) -> Option<f64> {
        let last = self.moist.len() - 1;
        if moist >= self.moist[0] {
            return Some(self.zwt[0]);
        }
        if moist < self.moist[last] {
            return None;
        }
        let i = self.moist.iter().position(|&m| m <= moist).unwrap_or(last);
        if self.moist[i] == moist {
            return Some(self.zwt[i]);
        }
        Some(interpolate_at(
            moist,
            self.moist[i - 1],
            self.moist[i],
            self.zwt[i - 1],
            self.zwt[i],
        ))
    }

    pub fn top(&self) -> f64 {
        self.zwt[0]
    }

    pub fn bottom(&self) -> f64 {
        self.zwt[self.zwt.len() - 1]
    }
}

/// Water (m) held in a column of height `height` above the water table
fn unsaturated_water(height: f64, porosity: f64, resid: f64, lambda: f64, hb: f64) -> f64 {
    if height <= hb {
        return porosity * height;
    }
    let tail = if (lambda - 1.0).abs() < 1.0e-12 {
        hb * (height / hb).ln()
    } else {
        hb.powf(lambda) * (height.powf(1.0 - lambda) - hb.powf(1.0 - lambda)) / (1.0 - lambda)
    };
    porosity * hb + resid * (height - hb) + (porosity - resid) * tail
}

/// Curves for each layer of a cell plus one for the whole column lumped together
#[derive(Debug, Clone, PartialEq)]
pub struct WaterTableCurves {
    pub layers: Vec<WaterTableCurve>,
    pub lumped: WaterTableCurve,
}

impl WaterTableCurves {
    pub fn from_soil(soil: &SoilParameters) -> Self {
        let bounds = soil.layer_boundaries();
        let layers = (0..soil.n_layers())
            .map(|l| {
                WaterTableCurve::build(
                    bounds[l],
                    soil.depth[l],
                    soil.max_moist[l],
                    soil.resid_moist[l],
                    soil.expt[l],
                    soil.bubble[l],
                )
            })
            .collect();

        let total_depth = soil.total_depth();
        let weighted = |values: &[f64]| -> f64 {
            values
                .iter()
                .zip(&soil.depth)
                .map(|(v, d)| v * d)
                .sum::<f64>()
                / total_depth
        };
        let lumped = WaterTableCurve::build(
            0.0,
            total_depth,
            soil.max_moist.iter().sum(),
            weighted(&soil.resid_moist),
            weighted(&soil.expt),
            weighted(&soil.bubble),
        );

        Self { layers, lumped }
    }
}
