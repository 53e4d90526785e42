/// Explicit soil thermal scheme stability check
///
/// Approximate only: heat capacity and conductivity change with moisture
/// and ice content during a run, so this checks the restored state.
use std::fmt;

use tracing::warn;

use crate::constants::EXPLICIT_STABILITY_COEFFICIENT;
use crate::tile::TileIndex;

/// Advice that the configured step is too long for the explicit scheme
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityAdvisory {
    pub tile: TileIndex,
    /// Configured time step (s)
    pub dt: f64,
    /// Largest stable time step (s)
    pub dt_max: f64,
    /// Thickness of the second node (m)
    pub node_spacing: f64,
    /// Heat capacity at the second node (J/m³/K)
    pub heat_capacity: f64,
    /// Thermal conductivity at the second node (W/m/K)
    pub conductivity: f64,
}

impl fmt::Display for StabilityAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frozen soil with an explicit thermal scheme is unstable for tile (veg {}, band {}): \
             time step {} s is too large for node spacing {} m, soil heat capacity {} J/m3/K \
             and soil thermal conductivity {} W/m/K. Switch to the implicit scheme \
             (recommended), shorten the time step to <= {} s, or use fewer thermal nodes.",
            self.tile.veg,
            self.tile.band,
            self.dt,
            self.node_spacing,
            self.heat_capacity,
            self.conductivity,
            self.dt_max
        )
    }
}

/// Largest stable explicit time step: `½ · Cs / κ · Δz²`
pub fn max_stable_time_step(heat_capacity: f64, conductivity: f64, node_spacing: f64) -> f64 {
    EXPLICIT_STABILITY_COEFFICIENT * heat_capacity / conductivity * node_spacing.powi(2)
}

/// Advisory when `dt` exceeds the stable step, logged as a warning.
///
/// Never fails; processing continues either way.
pub fn check_time_step(
    tile: TileIndex,
    dt: f64,
    heat_capacity: f64,
    conductivity: f64,
    node_spacing: f64,
) -> Option<StabilityAdvisory> {
    let dt_max = max_stable_time_step(heat_capacity, conductivity, node_spacing);
    if dt > dt_max {
        let advisory = StabilityAdvisory {
            tile,
            dt,
            dt_max,
            node_spacing,
            heat_capacity,
            conductivity,
        };
        warn!(veg = tile.veg, band = tile.band, "{advisory}");
        Some(advisory)
    } else {
        None
    }
}
