// Layer ice estimation tests
// Both estimators are driven with randomized profiles and compared where they must agree

use approx::assert_abs_diff_eq;
use more_asserts::{assert_ge, assert_le};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use soil_thermal_state::derived::{FiniteDifferenceIce, IceContentEstimator, IceContext, NodeGrid, QuickFluxIce};
use soil_thermal_state::{ModelOptions, SoilColumnState, SoilParameters};

fn create_test_soil(n_frost: usize) -> SoilParameters {
    let depth = vec![0.1, 0.3, 1.6];
    SoilParameters {
        max_moist: depth.iter().map(|d| d * 0.45 * 1000.0).collect(),
        resid_moist: vec![0.02; 3],
        expt: vec![11.2, 11.2, 13.6],
        bubble: vec![14.66, 14.66, 30.2],
        quartz: vec![0.4; 3],
        organic: vec![0.0; 3],
        bulk_density: vec![1485.0; 3],
        soil_density: vec![2685.0; 3],
        bulk_dens_min: vec![1485.0; 3],
        soil_dens_min: vec![2685.0; 3],
        depth,
        b_infilt: 0.2,
        dp: 4.0,
        avg_temp: 5.0,
        frost_fract: vec![1.0 / n_frost as f64; n_frost],
        frost_slope: 2.0,
        fs_active: true,
        area_fract: vec![1.0],
    }
}

fn create_test_grid(soil: &SoilParameters, n_nodes: usize) -> NodeGrid {
    let options = ModelOptions {
        n_nodes,
        n_frost: soil.frost_fract.len(),
        frozen_soil: true,
        quick_flux: false,
        ..ModelOptions::default()
    };
    NodeGrid::build(&options, soil).unwrap()
}

fn estimators() -> Vec<Box<dyn IceContentEstimator>> {
    vec![Box::new(QuickFluxIce), Box::new(FiniteDifferenceIce)]
}

#[test]
fn test_ice_never_exceeds_moisture() {
    let soil = create_test_soil(3);
    let grid = create_test_grid(&soil, 9);
    let mut rng = StdRng::seed_from_u64(1234);

    for estimator in estimators() {
        for _ in 0..200 {
            let temps: Vec<f64> = (0..grid.n_nodes()).map(|_| rng.random_range(-25.0..10.0)).collect();
            let moist: Vec<f64> = soil.max_moist.iter().map(|m| m * rng.random_range(0.0..1.0)).collect();
            let mut column = SoilColumnState::new(&moist, 3);
            let ctx = IceContext {
                soil: &soil,
                grid: &grid,
                node_temp: &temps,
                frozen: true,
            };
            estimator.estimate(&ctx, &mut column.layers).unwrap();

            for (lidx, layer) in column.layers.iter().enumerate() {
                assert_le!(layer.moist, soil.max_moist[lidx]);
                for &ice in &layer.ice {
                    assert_ge!(ice, 0.0);
                    assert_le!(ice, layer.moist, "{} layer {lidx}", estimator.name());
                }
                assert_le!(layer.weighted_ice(&soil.frost_fract), soil.max_moist[lidx]);
            }
        }
    }
}

#[test]
fn test_estimators_agree_without_freezing() {
    let soil = create_test_soil(2);
    let grid = create_test_grid(&soil, 6);
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..50 {
        // warm enough that no frost subarea reaches 0 °C
        let temps: Vec<f64> = (0..grid.n_nodes())
            .map(|_| rng.random_range(soil.frost_slope..12.0))
            .collect();
        let moist: Vec<f64> = soil.max_moist.iter().map(|m| m * rng.random_range(0.2..1.0)).collect();
        let ctx = IceContext {
            soil: &soil,
            grid: &grid,
            node_temp: &temps,
            frozen: true,
        };

        let mut quick = SoilColumnState::new(&moist, 2);
        let mut full = SoilColumnState::new(&moist, 2);
        QuickFluxIce.estimate(&ctx, &mut quick.layers).unwrap();
        FiniteDifferenceIce.estimate(&ctx, &mut full.layers).unwrap();

        for (q, f) in quick.layers.iter().zip(&full.layers) {
            assert_eq!(q.ice, f.ice);
            assert!(q.ice.iter().all(|&i| i == 0.0));
            assert_eq!(q.moist, f.moist);
        }
    }
}

#[test]
fn test_isothermal_column_matches_between_estimators() {
    // with T0 = T1 = avg_temp both profiles are flat
    let soil = create_test_soil(1);
    let grid = create_test_grid(&soil, 5);
    let temps = vec![soil.avg_temp; 5];
    let ctx = IceContext {
        soil: &soil,
        grid: &grid,
        node_temp: &temps,
        frozen: true,
    };
    let mut quick = SoilColumnState::new(&[20.0, 80.0, 400.0], 1);
    let mut full = quick.clone();
    QuickFluxIce.estimate(&ctx, &mut quick.layers).unwrap();
    FiniteDifferenceIce.estimate(&ctx, &mut full.layers).unwrap();

    for (q, f) in quick.layers.iter().zip(&full.layers) {
        assert_abs_diff_eq!(q.temp, f.temp, epsilon = 1e-9);
    }
}

#[test]
fn test_colder_frost_areas_hold_more_ice() {
    let soil = create_test_soil(4);
    let grid = create_test_grid(&soil, 5);
    let temps = vec![-1.5, -1.0, -0.5, 1.0, 5.0];
    let ctx = IceContext {
        soil: &soil,
        grid: &grid,
        node_temp: &temps,
        frozen: true,
    };
    let mut column = SoilColumnState::new(&[40.0, 120.0, 600.0], 4);
    FiniteDifferenceIce.estimate(&ctx, &mut column.layers).unwrap();

    let ice = &column.layers[0].ice;
    for f in 1..ice.len() {
        assert_ge!(ice[f - 1], ice[f]);
    }
    assert!(ice[0] > ice[3]);
}
