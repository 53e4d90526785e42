/// Derived state reconstruction for one grid cell
///
/// Runs after a cell's primary state (layer moisture and ice, node
/// temperatures) has been restored. Two passes over the cell's tiles:
/// the first snapshots the layer state and writes the water table
/// diagnostics, the second fills the thermal node properties, checks the
/// explicit scheme stability, commits the snapshot, estimates layer ice and
/// locates freeze/thaw fronts.
pub mod fronts;
pub mod ice_content;
pub mod node_grid;
pub mod node_moisture;
pub mod runoff;
pub mod stability;

pub use fronts::find_fronts;
pub use ice_content::{FiniteDifferenceIce, IceContentEstimator, IceContext, QuickFluxIce, ice_estimator};
pub use node_grid::{NodeGrid, NodePlacement};
pub use node_moisture::distribute_node_moisture;
pub use runoff::{RunoffAndSaturation, WaterTable, compute_runoff_and_asat, compute_water_table};
pub use stability::{StabilityAdvisory, check_time_step, max_stable_time_step};

use tracing::{debug, trace};

use crate::config::ModelOptions;
use crate::error::{DerivedStateError, Stage};
use crate::snapshot::SoilColumnSnapshot;
use crate::soil::SoilParameters;
use crate::soil::water_table::WaterTableCurves;
use crate::state::CellVars;
use crate::tile::{TileIndex, TileSelector};

/// What a cell's derived state computation did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedStateReport {
    /// Tiles processed, vegetation major and band minor
    pub tiles: Vec<TileIndex>,
    /// Node grid of the cell; `None` when no tile had any area
    pub node_grid: Option<NodeGrid>,
    pub advisories: Vec<StabilityAdvisory>,
}

/// Restore the derived state of every tile of a cell in place.
///
/// `veg_cover` holds the cover fraction of each vegetation class followed
/// by bare soil. `scratch` is reshaped when it does not fit the cell. On
/// error none of the cell's derived state may be used.
pub fn compute_derived_state(
    options: &ModelOptions,
    soil: &SoilParameters,
    veg_cover: &[f64],
    cell: &mut CellVars,
    scratch: &mut SoilColumnSnapshot,
) -> Result<DerivedStateReport, DerivedStateError> {
    options.validate()?;
    soil.validate(options).map_err(DerivedStateError::soil)?;

    let selector = TileSelector::new(veg_cover, &soil.area_fract);
    let n_veg_classes = selector.n_veg_classes();
    cell.validate(options, n_veg_classes)?;
    if !scratch.fits(options, n_veg_classes) {
        scratch.reshape(options, n_veg_classes);
    }

    let tiles: Vec<TileIndex> = selector.select().into_iter().map(|t| t.index).collect();
    if tiles.is_empty() {
        debug!(n_veg_classes, "no tile with positive area, nothing to derive");
        return Ok(DerivedStateReport::default());
    }

    // snapshot and water table diagnostics
    let curves = WaterTableCurves::from_soil(soil);
    for &index in &tiles {
        let tile = cell.tile_mut(index);
        scratch.capture(index, &tile.soil);
        runoff::update_tile_diagnostics(soil, &curves, scratch.moist(index), tile);
    }

    let grid =
        NodeGrid::build(options, soil).map_err(|e| DerivedStateError::property(Stage::NodeGrid, None, e))?;
    let estimator = ice_estimator(options);
    let frozen = options.frozen_soil && soil.fs_active;
    let mut advisories = Vec::new();

    for &index in &tiles {
        trace!(veg = index.veg, band = index.band, estimator = estimator.name(), "deriving tile state");
        let tile = cell.tile_mut(index);

        if options.needs_node_properties() {
            distribute_node_moisture(&grid, soil, scratch.moist(index), frozen, &mut tile.thermal)
                .map_err(|e| DerivedStateError::property(Stage::NodeMoisture, Some(index), e))?;

            if options.needs_stability_check() {
                let advisory = check_time_step(
                    index,
                    options.dt_seconds,
                    tile.thermal.cs[1],
                    tile.thermal.kappa[1],
                    grid.surface_node_thickness(),
                );
                advisories.extend(advisory);
            }
        }

        scratch.commit(index, &mut tile.soil);

        let ctx = IceContext {
            soil,
            grid: &grid,
            node_temp: &tile.thermal.temp,
            frozen,
        };
        estimator
            .estimate(&ctx, &mut tile.soil.layers)
            .map_err(|e| DerivedStateError::property(Stage::IceContent, Some(index), e))?;

        if !options.quick_flux && soil.fs_active {
            find_fronts(&grid.zsum, &mut tile.thermal)
                .map_err(|e| DerivedStateError::property(Stage::FreezeThawFronts, Some(index), e))?;
        }
    }

    debug!(
        tiles = tiles.len(),
        advisories = advisories.len(),
        estimator = estimator.name(),
        "derived cell state"
    );

    Ok(DerivedStateReport {
        tiles,
        node_grid: Some(grid),
        advisories,
    })
}

/// [`compute_derived_state`] with a scratch buffer allocated for this call
pub fn compute_derived_state_owned(
    options: &ModelOptions,
    soil: &SoilParameters,
    veg_cover: &[f64],
    cell: &mut CellVars,
) -> Result<DerivedStateReport, DerivedStateError> {
    let mut scratch = SoilColumnSnapshot::for_cell(options, veg_cover.len());
    compute_derived_state(options, soil, veg_cover, cell, &mut scratch)
}
