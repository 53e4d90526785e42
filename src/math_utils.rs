/// Numerical helpers shared by the soil column reconstruction
///
/// Interpolation along depth profiles, profile averaging and the
/// `assert_deviation!` test macro.

/// Assert that the percentage deviation between two values is below a threshold
///
/// # Examples
/// ```
/// use soil_thermal_state::assert_deviation;
///
/// assert_deviation!(0.101, 0.1, 2.0);
/// ```
#[macro_export]
macro_rules! assert_deviation {
    ($actual:expr, $expected:expr, $max_deviation:expr) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, actual_val, expected_val
                );
            }
        }
    };
    ($actual:expr, $expected:expr, $max_deviation:expr, $($arg:tt)+) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%: {}\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, format_args!($($arg)+), actual_val, expected_val
                );
            }
        }
    };
}

/// Linear interpolation between two values
///
/// # Examples
/// ```
/// use soil_thermal_state::math_utils::lerp;
///
/// assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
/// ```
pub fn lerp(a: f64, b: f64, ratio: f64) -> f64 {
    a + (b - a) * ratio
}

/// Inverse linear interpolation - the ratio at which `value` sits between `a` and `b`
///
/// Returns 0.0 for a degenerate interval.
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Value at `x` on the line through (`x0`, `y0`) and (`x1`, `y1`)
///
/// Used to find the depth at which a temperature profile reaches a given
/// temperature: `x` values are temperatures, `y` values are depths.
pub fn interpolate_at(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    lerp(y0, y1, inverse_lerp(x0, x1, x))
}

/// Profile value at depth `z` by piecewise-linear interpolation over `depths`
///
/// Depths beyond either end take the end value.
pub fn profile_value_at(depths: &[f64], values: &[f64], z: f64) -> f64 {
    let n = depths.len().min(values.len());
    if n == 0 {
        return f64::NAN;
    }
    if z <= depths[0] {
        return values[0];
    }
    if z >= depths[n - 1] {
        return values[n - 1];
    }
    let upper = depths[..n].partition_point(|&d| d < z);
    interpolate_at(z, depths[upper - 1], depths[upper], values[upper - 1], values[upper])
}

/// Depth-weighted mean of a sampled profile (trapezoid rule)
///
/// A single sample, or a zero-length span, returns the first value.
pub fn trapezoid_mean(depths: &[f64], values: &[f64]) -> f64 {
    let n = depths.len().min(values.len());
    if n == 0 {
        return f64::NAN;
    }
    let span = depths[n - 1] - depths[0];
    if n == 1 || span <= 0.0 {
        return values[0];
    }
    let area: f64 = (1..n)
        .map(|i| (depths[i] - depths[i - 1]) * (values[i] + values[i - 1]) / 2.0)
        .sum();
    area / span
}

pub fn is_strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[1] > w[0])
}

/// Percentage deviation of `actual` from `expected`
///
/// # Examples
/// ```
/// use soil_thermal_state::math_utils::deviation;
///
/// assert_eq!(deviation(105.0, 100.0), 5.0);
/// ```
pub fn deviation(actual: f64, expected: f64) -> f64 {
    if expected.abs() < f64::EPSILON {
        if actual.abs() < f64::EPSILON {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        ((actual - expected).abs() / expected.abs()) * 100.0
    }
}
