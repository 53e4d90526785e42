//! Soil water and thermal property relationships.

use crate::constants::{
    CS_AIR, CS_ICE, CS_MINERAL, CS_ORGANIC, CS_WATER, GRAVITY_M_S2, KAPPA_ICE, KAPPA_ORGANIC_DRY,
    KAPPA_ORGANIC_SOLID, KAPPA_OTHER_MINERAL, KAPPA_OTHER_MINERAL_LOW_QUARTZ, KAPPA_QUARTZ,
    KAPPA_WATER, LATENT_HEAT_FUSION_J_KG, LOW_QUARTZ_FRACTION, TO_KELVIN,
};

/// Largest liquid water content that can coexist with ice at `temp` °C.
///
/// Freezing point depression through the Brooks-Corey retention curve. The
/// result is in the units of `max_moist` (mm or volumetric fraction) and is
/// clamped to `[0, max_moist]`. At or above 0 °C all water may be liquid.
pub fn maximum_unfrozen_water(temp: f64, max_moist: f64, bubble: f64, expt: f64) -> f64 {
    if temp >= 0.0 {
        return max_moist;
    }
    let suction = (-LATENT_HEAT_FUSION_J_KG * temp) / (temp + TO_KELVIN)
        / (GRAVITY_M_S2 * bubble / 100.0);
    let unfrozen = max_moist * suction.powf(-2.0 / (expt - 3.0));
    unfrozen.clamp(0.0, max_moist)
}

/// Inputs of the soil thermal conductivity model for one layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilSolids {
    pub soil_dens_min: f64,
    pub bulk_dens_min: f64,
    pub quartz: f64,
    pub soil_density: f64,
    pub bulk_density: f64,
    pub organic: f64,
}

/// Thermal conductivity (W/m/K) of a soil with volumetric moisture `moist`
/// of which `unfrozen` is liquid.
///
/// Johansen's method with Farouki's mineral conductivities, mixing mineral
/// and organic solids. When `unfrozen == moist` the soil is treated as
/// unfrozen. The result never drops below the dry conductivity.
pub fn soil_conductivity(moist: f64, unfrozen: f64, solids: &SoilSolids) -> f64 {
    let kdry_min = (0.135 * solids.bulk_dens_min + 64.7)
        / (solids.soil_dens_min - 0.947 * solids.bulk_dens_min);
    let kdry = (1.0 - solids.organic) * kdry_min + solids.organic * KAPPA_ORGANIC_DRY;

    if moist <= 0.0 {
        return kdry;
    }

    let porosity = 1.0 - solids.bulk_density / solids.soil_density;
    let saturation = moist / porosity;

    let other_minerals = if solids.quartz < LOW_QUARTZ_FRACTION {
        KAPPA_OTHER_MINERAL_LOW_QUARTZ
    } else {
        KAPPA_OTHER_MINERAL
    };
    let ks_min = KAPPA_QUARTZ.powf(solids.quartz) * other_minerals.powf(1.0 - solids.quartz);
    let ks = (1.0 - solids.organic) * ks_min + solids.organic * KAPPA_ORGANIC_SOLID;

    let (ksat, kersten) = if unfrozen == moist {
        (
            ks.powf(1.0 - porosity) * KAPPA_WATER.powf(porosity),
            0.7 * saturation.log10() + 1.0,
        )
    } else {
        (
            ks.powf(1.0 - porosity)
                * KAPPA_ICE.powf(porosity - unfrozen)
                * KAPPA_WATER.powf(unfrozen),
            saturation,
        )
    };

    ((ksat - kdry) * kersten + kdry).max(kdry)
}

/// Volumetric heat capacity (J/m³/K) from constituent volume fractions.
///
/// Whatever volume is not solid, water or ice is air.
pub fn volumetric_heat_capacity(
    soil_fract: f64,
    water_fract: f64,
    ice_fract: f64,
    organic_fract: f64,
) -> f64 {
    CS_MINERAL * soil_fract * (1.0 - organic_fract)
        + CS_ORGANIC * soil_fract * organic_fract
        + CS_WATER * water_fract
        + CS_ICE * ice_fract
        + CS_AIR * (1.0 - (soil_fract + water_fract + ice_fract))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use more_asserts::{assert_gt, assert_lt};

    fn loam_solids() -> SoilSolids {
        SoilSolids {
            soil_dens_min: 2685.0,
            bulk_dens_min: 1485.0,
            quartz: 0.4,
            soil_density: 2685.0,
            bulk_density: 1485.0,
            organic: 0.0,
        }
    }

    #[test]
    fn test_unfrozen_water_above_freezing_is_max() {
        assert_eq!(maximum_unfrozen_water(0.0, 0.45, 14.66, 11.2), 0.45);
        assert_eq!(maximum_unfrozen_water(3.0, 180.0, 14.66, 11.2), 180.0);
    }

    #[test]
    fn test_unfrozen_water_decreases_with_temperature() {
        let warm = maximum_unfrozen_water(-0.5, 0.45, 14.66, 11.2);
        let cold = maximum_unfrozen_water(-5.0, 0.45, 14.66, 11.2);
        assert_lt!(cold, warm);
        assert_gt!(cold, 0.0);
        assert_lt!(warm, 0.45);
    }

    #[test]
    fn test_conductivity_dry_soil() {
        let solids = loam_solids();
        let kdry = (0.135 * 1485.0 + 64.7) / (2685.0 - 0.947 * 1485.0);
        assert_abs_diff_eq!(soil_conductivity(0.0, 0.0, &solids), kdry, epsilon = 1e-12);
    }

    #[test]
    fn test_conductivity_frozen_above_unfrozen() {
        let solids = loam_solids();
        let unfrozen = soil_conductivity(0.3, 0.3, &solids);
        let frozen = soil_conductivity(0.3, 0.05, &solids);
        assert_gt!(unfrozen, soil_conductivity(0.0, 0.0, &solids));
        assert_gt!(frozen, unfrozen);
    }

    #[test]
    fn test_heat_capacity_mixture() {
        let cs = volumetric_heat_capacity(0.5, 0.3, 0.1, 0.0);
        let expected = 2.0e6 * 0.5 + 4.2e6 * 0.3 + 1.9e6 * 0.1 + 1.3e3 * 0.1;
        assert_abs_diff_eq!(cs, expected, epsilon = 1e-6);
    }
}
