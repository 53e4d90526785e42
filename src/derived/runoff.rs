//! Saturated area and water table diagnostics of a tile.

use crate::soil::SoilParameters;
use crate::soil::water_table::WaterTableCurves;
use crate::state::TileVars;

/// Result of the variable infiltration curve for one tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunoffAndSaturation {
    /// Saturated area fraction
    pub asat: f64,
    /// Surface runoff generated by `inflow` (mm)
    pub runoff: f64,
}

/// Saturated area fraction and runoff from the upper layers' moisture.
///
/// Uses the variable infiltration capacity curve over all layers except
/// the bottom one (the only layer of a single layer column).
pub fn compute_runoff_and_asat(soil: &SoilParameters, moist: &[f64], inflow: f64) -> RunoffAndSaturation {
    let n_top = moist.len().saturating_sub(1).max(1).min(moist.len());
    let top_max_moist: f64 = soil.max_moist[..n_top].iter().sum();
    let top_moist: f64 = moist[..n_top].iter().sum::<f64>().min(top_max_moist);

    if top_max_moist <= 0.0 {
        return RunoffAndSaturation {
            asat: 0.0,
            runoff: inflow.max(0.0),
        };
    }

    let b = soil.b_infilt;
    let ex = b / (1.0 + b);
    let asat = 1.0 - (1.0 - top_moist / top_max_moist).max(0.0).powf(ex);
    let max_infil = (1.0 + b) * top_max_moist;
    let i_0 = max_infil * (1.0 - (1.0 - asat).powf(1.0 / b));

    let runoff = if inflow == 0.0 {
        0.0
    } else if i_0 + inflow > max_infil {
        inflow - top_max_moist + top_moist
    } else {
        let basis = 1.0 - (i_0 + inflow) / max_infil;
        inflow - top_max_moist + top_moist + top_max_moist * basis.powf(1.0 + b)
    };

    RunoffAndSaturation {
        asat,
        runoff: runoff.max(0.0),
    }
}

/// Water table depths of a tile (m below surface)
#[derive(Debug, Clone, PartialEq)]
pub struct WaterTable {
    /// Per layer; the layer bottom when the table lies below the layer
    pub layers: Vec<f64>,
    /// Table of the lowest layer that is not saturated, 0 when every layer is
    pub column: f64,
    /// Table with all layers lumped into one
    pub lumped: f64,
}

pub fn compute_water_table(soil: &SoilParameters, curves: &WaterTableCurves, moist: &[f64]) -> WaterTable {
    let layers: Vec<f64> = curves
        .layers
        .iter()
        .zip(moist)
        .map(|(curve, &m)| curve.depth_for(m).unwrap_or_else(|| curve.bottom()))
        .collect();

    // walk up from the bottom past saturated layers
    let lowest_unsaturated = (0..moist.len())
        .rev()
        .find(|&l| soil.max_moist[l] - moist[l] > f64::EPSILON);
    let column = match lowest_unsaturated {
        Some(l) => layers[l],
        None => 0.0,
    };

    let total: f64 = moist.iter().sum();
    let lumped = curves
        .lumped
        .depth_for(total)
        .unwrap_or_else(|| curves.lumped.bottom());

    WaterTable {
        layers,
        column,
        lumped,
    }
}

/// Write saturation and water table diagnostics into a tile from the
/// snapshot moisture. The runoff diagnostic is not kept.
pub fn update_tile_diagnostics(
    soil: &SoilParameters,
    curves: &WaterTableCurves,
    moist: &[f64],
    tile: &mut TileVars,
) {
    let RunoffAndSaturation { asat, .. } = compute_runoff_and_asat(soil, moist, 0.0);
    let water_table = compute_water_table(soil, curves, moist);

    tile.diagnostics.asat = asat;
    tile.diagnostics.zwt = water_table.column;
    tile.diagnostics.zwt_lumped = water_table.lumped;
    for (layer, zwt) in tile.soil.layers.iter_mut().zip(water_table.layers) {
        layer.zwt = zwt;
    }
}
