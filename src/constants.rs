pub const TO_KELVIN: f64 = 273.15; // freezing point of water, K
pub const GRAVITY_M_S2: f64 = 9.80616;
pub const LATENT_HEAT_FUSION_J_KG: f64 = 3.337e5;

pub const MM_PER_M: f64 = 1000.0;
pub const CM_PER_M: f64 = 100.0;

// Thermal conductivities used by the soil mixture model (W/m/K)
pub const KAPPA_ICE: f64 = 2.2;
pub const KAPPA_WATER: f64 = 0.57;
pub const KAPPA_ORGANIC_DRY: f64 = 0.05;
pub const KAPPA_ORGANIC_SOLID: f64 = 0.25;
pub const KAPPA_QUARTZ: f64 = 7.7;
pub const KAPPA_OTHER_MINERAL_LOW_QUARTZ: f64 = 3.0; // quartz fraction < 0.2
pub const KAPPA_OTHER_MINERAL: f64 = 2.2;
pub const LOW_QUARTZ_FRACTION: f64 = 0.2;

// Volumetric heat capacities of soil constituents (J/m³/K)
pub const CS_MINERAL: f64 = 2.0e6;
pub const CS_ORGANIC: f64 = 2.7e6;
pub const CS_WATER: f64 = 4.2e6;
pub const CS_ICE: f64 = 1.9e6;
pub const CS_AIR: f64 = 1.3e3;

/// Points on each moisture / water-table-depth curve.
pub const WATER_TABLE_CURVE_POINTS: usize = 11;

/// Allowed excess of node moisture over node capacity before the
/// distribution is rejected (volumetric fraction).
pub const NODE_MOISTURE_TOLERANCE: f64 = 1.0e-4;

/// Coefficient of the explicit-scheme stability bound between the first two nodes.
pub const EXPLICIT_STABILITY_COEFFICIENT: f64 = 0.5;

/// Tolerance used when deciding whether a node sits on a layer boundary (m).
pub const BOUNDARY_TOLERANCE_M: f64 = 1.0e-9;

/// Tolerance on the bottom node matching the damping depth (m).
pub const DAMPING_DEPTH_TOLERANCE_M: f64 = 5.0e-4;
