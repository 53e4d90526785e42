/// Soil thermal node discretization of a grid cell
///
/// Depends only on the soil description and the configured node count, so
/// it is built once per cell and shared read-only by every tile.
use tracing::debug;

use crate::config::ModelOptions;
use crate::constants::{BOUNDARY_TOLERANCE_M, DAMPING_DEPTH_TOLERANCE_M, MM_PER_M};
use crate::error::PropertyError;
use crate::math_utils::is_strictly_increasing;
use crate::soil::SoilParameters;

/// Where a node sits relative to the soil moisture layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePlacement {
    /// Inside a layer, or below the column bottom (last layer)
    Within(usize),
    /// On the boundary between layer `upper` and layer `upper + 1`
    Boundary { upper: usize },
}

impl NodePlacement {
    /// Layer whose solid properties the node uses
    pub fn layer(&self) -> usize {
        match *self {
            NodePlacement::Within(l) => l,
            NodePlacement::Boundary { upper } => upper,
        }
    }

    /// Layer property at this node, averaged across a boundary
    pub fn blend(&self, per_layer: impl Fn(usize) -> f64) -> f64 {
        match *self {
            NodePlacement::Within(l) => per_layer(l),
            NodePlacement::Boundary { upper } => (per_layer(upper) + per_layer(upper + 1)) / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeGrid {
    /// Node depth below the surface (m)
    pub zsum: Vec<f64>,
    /// Node thickness (m)
    pub dz: Vec<f64>,
    pub placement: Vec<NodePlacement>,
    /// Maximum volumetric moisture per node
    pub max_moist: Vec<f64>,
    pub expt: Vec<f64>,
    /// Bubbling pressure per node (cm)
    pub bubble: Vec<f64>,
    /// Finite difference geometry: `z[n+2] - z[n]`
    pub alpha: Vec<f64>,
    /// `z[n+1] - z[n]`
    pub beta: Vec<f64>,
    /// `z[n+2] - z[n+1]`
    pub gamma: Vec<f64>,
}

impl NodeGrid {
    /// Derive node depths and node-level soil parameters for a cell
    pub fn build(options: &ModelOptions, soil: &SoilParameters) -> Result<Self, PropertyError> {
        let n_nodes = options.n_nodes;
        if n_nodes < 3 {
            return Err(PropertyError::Invalid(format!(
                "at least 3 thermal nodes are required, got {n_nodes}"
            )));
        }

        let (zsum, dz) = if options.exp_trans {
            exponential_spacing(n_nodes, soil.dp)
        } else {
            linear_spacing(n_nodes, soil.depth[0], soil.dp)
        };

        if !is_strictly_increasing(&zsum) {
            return Err(PropertyError::NonMonotonicDepths("thermal node"));
        }
        for (nidx, &thickness) in dz.iter().enumerate() {
            PropertyError::check_range("node thickness", nidx, thickness, f64::MIN_POSITIVE, f64::MAX)?;
        }
        let bottom = zsum[n_nodes - 1];
        if (bottom - soil.dp).abs() > DAMPING_DEPTH_TOLERANCE_M {
            return Err(PropertyError::Invalid(format!(
                "bottom node depth {bottom:.4} m does not match damping depth {:.4} m",
                soil.dp
            )));
        }

        let bounds = soil.layer_boundaries();
        let placement: Vec<NodePlacement> = zsum.iter().map(|&z| place_node(z, &bounds)).collect();

        let max_moist = placement
            .iter()
            .map(|p| p.blend(|l| soil.max_moist[l] / soil.depth[l] / MM_PER_M))
            .collect();
        let expt = placement.iter().map(|p| p.blend(|l| soil.expt[l])).collect();
        let bubble = placement.iter().map(|p| p.blend(|l| soil.bubble[l])).collect();

        let mut alpha = Vec::with_capacity(n_nodes - 1);
        let mut beta = Vec::with_capacity(n_nodes - 1);
        let mut gamma = Vec::with_capacity(n_nodes - 1);
        for nidx in 0..n_nodes - 2 {
            alpha.push(zsum[nidx + 2] - zsum[nidx]);
            beta.push(zsum[nidx + 1] - zsum[nidx]);
            gamma.push(zsum[nidx + 2] - zsum[nidx + 1]);
        }
        if options.no_flux {
            // mirror the last interval below the bottom node
            let last = zsum[n_nodes - 1] - zsum[n_nodes - 2];
            alpha.push(2.0 * last);
            beta.push(last);
            gamma.push(last);
        }

        debug!(
            n_nodes,
            bottom_m = bottom,
            exp_trans = options.exp_trans,
            "built soil thermal node grid"
        );

        Ok(Self {
            zsum,
            dz,
            placement,
            max_moist,
            expt,
            bubble,
            alpha,
            beta,
            gamma,
        })
    }

    pub fn n_nodes(&self) -> usize {
        self.zsum.len()
    }

    /// Thickness of the node below the surface node (m), the length scale
    /// of the explicit scheme stability bound
    pub fn surface_node_thickness(&self) -> f64 {
        self.dz[1]
    }
}

/// Nodes at the surface, the first layer depth `d1`, twice `d1`, then
/// evenly spaced to the damping depth.
fn linear_spacing(n_nodes: usize, d1: f64, dp: f64) -> (Vec<f64>, Vec<f64>) {
    let mut zsum = vec![0.0; n_nodes];
    let mut dz = vec![0.0; n_nodes];
    dz[0] = d1;
    dz[1] = d1;
    dz[2] = d1;
    zsum[1] = d1;
    zsum[2] = 2.0 * d1;

    let mut z = 2.0 * d1;
    let interior = (dp - 2.5 * d1) / (n_nodes as f64 - 3.5);
    for nidx in 3..n_nodes - 1 {
        dz[nidx] = interior;
        z += (dz[nidx] + dz[nidx - 1]) / 2.0;
        zsum[nidx] = z;
    }
    // the bottom node lands exactly on the damping depth
    dz[n_nodes - 1] = (dp - z - dz[n_nodes - 2] / 2.0) * 2.0;
    zsum[n_nodes - 1] = z + (dz[n_nodes - 2] + dz[n_nodes - 1]) / 2.0;
    (zsum, dz)
}

/// Node depths growing exponentially with index, bottom node at `dp`
fn exponential_spacing(n_nodes: usize, dp: f64) -> (Vec<f64>, Vec<f64>) {
    let bexp = (dp + 1.0).ln() / (n_nodes - 1) as f64;
    let zsum: Vec<f64> = (0..n_nodes).map(|i| (bexp * i as f64).exp() - 1.0).collect();

    let mut dz = vec![0.0; n_nodes];
    dz[0] = (zsum[1] - zsum[0]) / 2.0;
    for nidx in 1..n_nodes - 1 {
        dz[nidx] = (zsum[nidx + 1] - zsum[nidx - 1]) / 2.0;
    }
    dz[n_nodes - 1] = (zsum[n_nodes - 1] - zsum[n_nodes - 2]) / 2.0;
    (zsum, dz)
}

/// `bounds` holds the top of each layer followed by the column bottom.
pub(crate) fn place_node(z: f64, bounds: &[f64]) -> NodePlacement {
    let n_layers = bounds.len() - 1;
    for lidx in 0..n_layers - 1 {
        if (z - bounds[lidx + 1]).abs() <= BOUNDARY_TOLERANCE_M {
            return NodePlacement::Boundary { upper: lidx };
        }
        if z < bounds[lidx + 1] {
            return NodePlacement::Within(lidx);
        }
    }
    NodePlacement::Within(n_layers - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::test_support::loam;
    use approx::assert_abs_diff_eq;

    fn options(n_nodes: usize) -> ModelOptions {
        ModelOptions {
            n_nodes,
            frozen_soil: true,
            quick_flux: false,
            ..ModelOptions::default()
        }
    }

    #[test]
    fn test_three_nodes_at_surface_first_layer_and_damping_depth() {
        let opts = options(3);
        let grid = NodeGrid::build(&opts, &loam(&opts)).unwrap();
        assert_abs_diff_eq!(grid.zsum[0], 0.0);
        assert_abs_diff_eq!(grid.zsum[1], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(grid.zsum[2], 4.0, epsilon = 1e-9);
        assert_eq!(grid.alpha.len(), 1);
    }

    #[test]
    fn test_linear_spacing_reaches_damping_depth() {
        let opts = options(10);
        let grid = NodeGrid::build(&opts, &loam(&opts)).unwrap();
        assert_eq!(grid.n_nodes(), 10);
        assert_abs_diff_eq!(grid.zsum[2], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(grid.zsum[9], 4.0, epsilon = 1e-9);
        assert!(is_strictly_increasing(&grid.zsum));
        assert_abs_diff_eq!(grid.surface_node_thickness(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_exponential_spacing() {
        let opts = ModelOptions {
            exp_trans: true,
            ..options(8)
        };
        let grid = NodeGrid::build(&opts, &loam(&opts)).unwrap();
        assert_abs_diff_eq!(grid.zsum[0], 0.0);
        assert_abs_diff_eq!(grid.zsum[7], 4.0, epsilon = 1e-9);
        // spacing widens with depth
        for n in 1..7 {
            assert!(grid.zsum[n + 1] - grid.zsum[n] > grid.zsum[n] - grid.zsum[n - 1]);
        }
        // node 1 spans half of the two intervals around it, wider than the surface gap
        assert_abs_diff_eq!(grid.surface_node_thickness(), grid.zsum[2] / 2.0, epsilon = 1e-12);
        assert!(grid.surface_node_thickness() > grid.zsum[1]);
    }

    #[test]
    fn test_node_parameters_match_enclosing_layer() {
        let opts = options(10);
        let soil = loam(&opts);
        let grid = NodeGrid::build(&opts, &soil).unwrap();
        let bounds = soil.layer_boundaries();

        for (nidx, &z) in grid.zsum.iter().enumerate() {
            match grid.placement[nidx] {
                NodePlacement::Within(l) => {
                    assert!(z >= bounds[l] || l == 0);
                    assert_abs_diff_eq!(grid.max_moist[nidx], soil.porosity(l), epsilon = 1e-12);
                    assert_eq!(grid.expt[nidx], soil.expt[l]);
                    assert_eq!(grid.bubble[nidx], soil.bubble[l]);
                }
                NodePlacement::Boundary { upper } => {
                    assert_abs_diff_eq!(z, bounds[upper + 1], epsilon = 1e-9);
                    let mean = (soil.porosity(upper) + soil.porosity(upper + 1)) / 2.0;
                    assert_abs_diff_eq!(grid.max_moist[nidx], mean, epsilon = 1e-12);
                }
            }
        }
        // node 1 at 0.1 m sits on the first layer boundary
        assert_eq!(grid.placement[1], NodePlacement::Boundary { upper: 0 });
        // nodes below the 2 m column take the bottom layer's values
        assert_eq!(grid.placement[9], NodePlacement::Within(2));
    }

    #[test]
    fn test_boundary_average_with_contrasting_layers() {
        let opts = options(5);
        let mut soil = loam(&opts);
        soil.expt = vec![5.0, 9.0, 13.0];
        soil.bubble = vec![10.0, 20.0, 30.0];
        let grid = NodeGrid::build(&opts, &soil).unwrap();
        assert_eq!(grid.expt[0], 5.0);
        assert_eq!(grid.expt[1], 7.0);
        assert_eq!(grid.bubble[1], 15.0);
    }

    #[test]
    fn test_no_flux_adds_bottom_coefficients() {
        let opts = ModelOptions {
            no_flux: true,
            ..options(6)
        };
        let grid = NodeGrid::build(&opts, &loam(&opts)).unwrap();
        assert_eq!(grid.alpha.len(), 5);
        let last = grid.zsum[5] - grid.zsum[4];
        assert_abs_diff_eq!(grid.alpha[4], 2.0 * last, epsilon = 1e-12);
        assert_abs_diff_eq!(grid.beta[0], grid.zsum[1], epsilon = 1e-12);
    }

    #[test]
    fn test_shallow_damping_depth_fails() {
        let opts = options(6);
        let mut soil = loam(&opts);
        soil.dp = 0.22;
        assert!(NodeGrid::build(&opts, &soil).is_err());
    }

    #[test]
    fn test_build_is_repeatable() {
        let opts = options(7);
        let soil = loam(&opts);
        assert_eq!(NodeGrid::build(&opts, &soil), NodeGrid::build(&opts, &soil));
    }
}
