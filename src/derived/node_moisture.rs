//! Layer moisture mapped onto the thermal nodes, with the node ice
//! content, conductivity and heat capacity that follow from it.

use crate::constants::{MM_PER_M, NODE_MOISTURE_TOLERANCE};
use crate::derived::node_grid::NodeGrid;
use crate::error::PropertyError;
use crate::soil::SoilParameters;
use crate::soil::properties::{
    SoilSolids, maximum_unfrozen_water, soil_conductivity, volumetric_heat_capacity,
};
use crate::state::ThermalNodeState;

/// Solid constituents of a layer as used by the conductivity model
pub fn layer_solids(soil: &SoilParameters, lidx: usize) -> SoilSolids {
    SoilSolids {
        soil_dens_min: soil.soil_dens_min[lidx],
        bulk_dens_min: soil.bulk_dens_min[lidx],
        quartz: soil.quartz[lidx],
        soil_density: soil.soil_density[lidx],
        bulk_density: soil.bulk_density[lidx],
        organic: soil.organic[lidx],
    }
}

/// Fill node moisture, ice, conductivity and heat capacity of a tile.
///
/// `layer_moist` is the tile's layer moisture (mm) before any update.
/// Ice only forms when `frozen` is set (frozen soil configured and active
/// for the cell) and the node is below 0 °C. Nothing is written unless
/// every node produces valid values.
pub fn distribute_node_moisture(
    grid: &NodeGrid,
    soil: &SoilParameters,
    layer_moist: &[f64],
    frozen: bool,
    thermal: &mut ThermalNodeState,
) -> Result<(), PropertyError> {
    let n_nodes = grid.n_nodes();
    if thermal.temp.len() != n_nodes {
        return Err(PropertyError::length("node temperatures", n_nodes, thermal.temp.len()));
    }
    if layer_moist.len() != soil.n_layers() {
        return Err(PropertyError::length("layer moisture", soil.n_layers(), layer_moist.len()));
    }

    let mut moist = Vec::with_capacity(n_nodes);
    let mut ice = Vec::with_capacity(n_nodes);
    let mut kappa = Vec::with_capacity(n_nodes);
    let mut cs = Vec::with_capacity(n_nodes);

    for nidx in 0..n_nodes {
        let placement = grid.placement[nidx];
        let node_moist = placement.blend(|l| layer_moist[l] / soil.depth[l] / MM_PER_M);
        let max_moist = grid.max_moist[nidx];

        PropertyError::check_range("node moisture", nidx, node_moist, 0.0, f64::MAX)?;
        if node_moist - max_moist > NODE_MOISTURE_TOLERANCE {
            return Err(PropertyError::NodeMoistureExceedsMaximum {
                node: nidx,
                moist: node_moist,
                max_moist,
            });
        }

        let temp = thermal.temp[nidx];
        if !temp.is_finite() {
            return Err(PropertyError::OutOfRange {
                property: "node temperature",
                index: nidx,
                value: temp,
            });
        }

        let solids = layer_solids(soil, placement.layer());
        let node_ice = if frozen && temp < 0.0 {
            let unfrozen = maximum_unfrozen_water(temp, max_moist, grid.bubble[nidx], grid.expt[nidx]);
            (node_moist - unfrozen).max(0.0)
        } else {
            0.0
        };
        let node_kappa = soil_conductivity(node_moist, node_moist - node_ice, &solids);

        let soil_fract = placement.blend(|l| soil.soil_fraction(l));
        let node_cs = volumetric_heat_capacity(
            soil_fract,
            node_moist - node_ice,
            node_ice,
            soil.organic[placement.layer()],
        );

        moist.push(node_moist);
        ice.push(PropertyError::check_range("node ice", nidx, node_ice, 0.0, node_moist)?);
        kappa.push(PropertyError::check_range("node conductivity", nidx, node_kappa, f64::MIN_POSITIVE, f64::MAX)?);
        cs.push(PropertyError::check_range("node heat capacity", nidx, node_cs, f64::MIN_POSITIVE, f64::MAX)?);
    }

    thermal.moist = moist;
    thermal.ice = ice;
    thermal.kappa = kappa;
    thermal.cs = cs;
    Ok(())
}
