/// Layer ice content reconstructed from the soil temperature profile
///
/// Two estimators share one contract: every layer gets a mean temperature
/// and, when frozen soil is active, an ice content per frost subarea that
/// never exceeds the layer's moisture. Layer moisture above the layer's
/// capacity is trimmed to the capacity first.
use crate::config::ModelOptions;
use crate::constants::MM_PER_M;
use crate::derived::node_grid::NodeGrid;
use crate::error::PropertyError;
use crate::math_utils::{interpolate_at, is_strictly_increasing, profile_value_at, trapezoid_mean};
use crate::soil::SoilParameters;
use crate::soil::properties::maximum_unfrozen_water;
use crate::state::LayerState;

/// Everything an estimator may read for one tile
pub struct IceContext<'a> {
    pub soil: &'a SoilParameters,
    pub grid: &'a NodeGrid,
    /// Node temperatures of the tile (°C)
    pub node_temp: &'a [f64],
    /// Frozen soil configured and active for the cell
    pub frozen: bool,
}

pub trait IceContentEstimator {
    /// The name of this estimator
    fn name(&self) -> &str;

    /// Write layer temperature and frost-area ice into `layers`
    fn estimate(&self, ctx: &IceContext, layers: &mut [LayerState]) -> Result<(), PropertyError>;
}

/// The estimator matching the configured thermal scheme
pub fn ice_estimator(options: &ModelOptions) -> Box<dyn IceContentEstimator> {
    if options.quick_flux {
        Box::new(QuickFluxIce)
    } else {
        Box::new(FiniteDifferenceIce)
    }
}

/// Shared set-up: dimension checks, moisture trimmed to capacity, ice cleared
fn prepare_layers(soil: &SoilParameters, layers: &mut [LayerState]) -> Result<(), PropertyError> {
    if layers.len() != soil.n_layers() {
        return Err(PropertyError::length("layers", soil.n_layers(), layers.len()));
    }
    for (lidx, layer) in layers.iter_mut().enumerate() {
        if layer.ice.len() != soil.frost_fract.len() {
            return Err(PropertyError::length("layer ice", soil.frost_fract.len(), layer.ice.len()));
        }
        PropertyError::check_range("layer moisture", lidx, layer.moist, 0.0, f64::MAX)?;
        layer.moist = layer.moist.min(soil.max_moist[lidx]);
        layer.ice.iter_mut().for_each(|i| *i = 0.0);
    }
    Ok(())
}

/// Ice (mm) left when a layer holding `moist` sits at `temp`
fn layer_ice(soil: &SoilParameters, lidx: usize, moist: f64, temp: f64) -> f64 {
    let unfrozen = maximum_unfrozen_water(temp, soil.max_moist[lidx], soil.bubble[lidx], soil.expt[lidx]);
    (moist - unfrozen).clamp(0.0, moist)
}

/// Approximate profile from the two surface nodes and the damping depth
///
/// Linear between the surface node and the node at the bottom of the first
/// layer, then relaxing exponentially towards the mean annual temperature
/// with the damping depth as e-folding length.
pub struct QuickFluxIce;

impl QuickFluxIce {
    /// Mean temperature of the profile between depths `a` and `b`
    pub fn mean_temperature(t0: f64, t1: f64, tp: f64, d1: f64, dp: f64, a: f64, b: f64) -> f64 {
        let mut integral = 0.0;
        if a < d1 {
            let upper_end = b.min(d1);
            let ta = t0 + (t1 - t0) * a / d1;
            let tb = t0 + (t1 - t0) * upper_end / d1;
            integral += (upper_end - a) * (ta + tb) / 2.0;
        }
        if b > d1 {
            let lower_start = a.max(d1);
            integral += tp * (b - lower_start)
                + (t1 - tp) * dp * ((-(lower_start - d1) / dp).exp() - (-(b - d1) / dp).exp());
        }
        integral / (b - a)
    }
}

impl IceContentEstimator for QuickFluxIce {
    fn name(&self) -> &str {
        "quick_flux"
    }

    fn estimate(&self, ctx: &IceContext, layers: &mut [LayerState]) -> Result<(), PropertyError> {
        let soil = ctx.soil;
        if ctx.node_temp.len() < 2 {
            return Err(PropertyError::length("node temperatures", 2, ctx.node_temp.len()));
        }
        let (t0, t1, tp) = (ctx.node_temp[0], ctx.node_temp[1], soil.avg_temp);
        for (index, t) in [t0, t1, tp].into_iter().enumerate() {
            if !t.is_finite() {
                return Err(PropertyError::OutOfRange {
                    property: "quick flux temperature",
                    index,
                    value: t,
                });
            }
        }
        let d1 = soil.depth[0];
        if !(soil.dp > d1) {
            return Err(PropertyError::NonMonotonicDepths("quick flux"));
        }
        prepare_layers(soil, layers)?;

        let bounds = soil.layer_boundaries();
        let offsets = soil.frost_offsets();
        for (lidx, layer) in layers.iter_mut().enumerate() {
            layer.temp = Self::mean_temperature(t0, t1, tp, d1, soil.dp, bounds[lidx], bounds[lidx + 1]);
            if ctx.frozen {
                for (ice, offset) in layer.ice.iter_mut().zip(&offsets) {
                    *ice = layer_ice(soil, lidx, layer.moist, layer.temp + offset);
                }
            }
        }
        Ok(())
    }
}

/// Full node profile, sampled at every node inside a layer and at the
/// depths where each frost subarea crosses 0 °C
pub struct FiniteDifferenceIce;

impl FiniteDifferenceIce {
    /// Depths and temperatures of the profile across `top..bottom`,
    /// including the layer ends
    fn layer_samples(zsum: &[f64], temp: &[f64], top: f64, bottom: f64) -> (Vec<f64>, Vec<f64>) {
        let mut depths = vec![top];
        depths.extend(zsum.iter().copied().filter(|&z| z > top && z < bottom));
        depths.push(bottom);
        let temps = depths.iter().map(|&z| profile_value_at(zsum, temp, z)).collect();
        (depths, temps)
    }

    /// Add the depths where `temp + offset` crosses 0 °C between samples
    fn with_crossings(depths: &[f64], temps: &[f64], offset: f64) -> (Vec<f64>, Vec<f64>) {
        let mut out_depths = Vec::with_capacity(depths.len() * 2);
        let mut out_temps = Vec::with_capacity(depths.len() * 2);
        for i in 0..depths.len() {
            if i > 0 {
                let (ta, tb) = (temps[i - 1] + offset, temps[i] + offset);
                if (ta < 0.0 && tb > 0.0) || (ta > 0.0 && tb < 0.0) {
                    out_depths.push(interpolate_at(0.0, ta, tb, depths[i - 1], depths[i]));
                    out_temps.push(0.0);
                }
            }
            out_depths.push(depths[i]);
            out_temps.push(temps[i] + offset);
        }
        (out_depths, out_temps)
    }
}

impl IceContentEstimator for FiniteDifferenceIce {
    fn name(&self) -> &str {
        "finite_difference"
    }

    fn estimate(&self, ctx: &IceContext, layers: &mut [LayerState]) -> Result<(), PropertyError> {
        let soil = ctx.soil;
        let zsum = &ctx.grid.zsum;
        if ctx.node_temp.len() != zsum.len() {
            return Err(PropertyError::length("node temperatures", zsum.len(), ctx.node_temp.len()));
        }
        if !is_strictly_increasing(zsum) {
            return Err(PropertyError::NonMonotonicDepths("thermal node"));
        }
        if let Some(nidx) = ctx.node_temp.iter().position(|t| !t.is_finite()) {
            return Err(PropertyError::OutOfRange {
                property: "node temperature",
                index: nidx,
                value: ctx.node_temp[nidx],
            });
        }
        prepare_layers(soil, layers)?;

        let bounds = soil.layer_boundaries();
        let offsets = soil.frost_offsets();
        for (lidx, layer) in layers.iter_mut().enumerate() {
            let (depths, temps) = Self::layer_samples(zsum, ctx.node_temp, bounds[lidx], bounds[lidx + 1]);
            layer.temp = trapezoid_mean(&depths, &temps);
            if !ctx.frozen {
                continue;
            }

            let depth_mm = soil.depth[lidx] * MM_PER_M;
            let theta = layer.moist / depth_mm;
            let theta_max = soil.max_moist[lidx] / depth_mm;
            for (ice, &offset) in layer.ice.iter_mut().zip(&offsets) {
                let (sub_depths, sub_temps) = Self::with_crossings(&depths, &temps, offset);
                let ice_fraction: Vec<f64> = sub_temps
                    .iter()
                    .map(|&t| {
                        let unfrozen = maximum_unfrozen_water(t, theta_max, soil.bubble[lidx], soil.expt[lidx]);
                        (theta - unfrozen).max(0.0)
                    })
                    .collect();
                let mean_ice = trapezoid_mean(&sub_depths, &ice_fraction) * depth_mm;
                *ice = PropertyError::check_range("layer ice", lidx, mean_ice.clamp(0.0, layer.moist), 0.0, f64::MAX)?;
            }
        }
        Ok(())
    }
}
