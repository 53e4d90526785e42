//! Zero-degree crossings of a tile's node temperature profile.

use crate::error::PropertyError;
use crate::math_utils::{interpolate_at, is_strictly_increasing};
use crate::state::ThermalNodeState;

/// Depth where the profile between two nodes reaches 0 °C
fn crossing_depth(t_upper: f64, t_lower: f64, z_upper: f64, z_lower: f64) -> f64 {
    interpolate_at(0.0, t_upper, t_lower, z_upper, z_lower)
}

/// Record frost and thaw front depths of `thermal`, shallowest first.
///
/// A frost front is the bottom of frozen soil: below-freezing above,
/// at or above freezing below. A thaw front is the bottom of thawed soil
/// lying on frozen ground. A node at exactly 0 °C counts as unfrozen below
/// frozen soil, so that front lies on the node itself. Previous fronts are
/// replaced.
pub fn find_fronts(zsum: &[f64], thermal: &mut ThermalNodeState) -> Result<(), PropertyError> {
    let temp = &thermal.temp;
    if temp.len() != zsum.len() {
        return Err(PropertyError::length("node temperatures", zsum.len(), temp.len()));
    }
    if !is_strictly_increasing(zsum) {
        return Err(PropertyError::NonMonotonicDepths("thermal node"));
    }
    if let Some(nidx) = temp.iter().position(|t| !t.is_finite()) {
        return Err(PropertyError::OutOfRange {
            property: "node temperature",
            index: nidx,
            value: temp[nidx],
        });
    }

    let mut frost_fronts = Vec::new();
    let mut thaw_fronts = Vec::new();
    for (z, t) in zsum.windows(2).zip(temp.windows(2)) {
        if t[0] < 0.0 && t[1] >= 0.0 {
            frost_fronts.push(crossing_depth(t[0], t[1], z[0], z[1]));
        } else if t[0] > 0.0 && t[1] <= 0.0 {
            thaw_fronts.push(crossing_depth(t[0], t[1], z[0], z[1]));
        }
    }

    thermal.frost_fronts = frost_fronts;
    thermal.thaw_fronts = thaw_fronts;
    Ok(())
}
