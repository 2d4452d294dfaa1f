// Abramowitz & Stegun 26.2.17, |error| < 7.5e-8
const P: f64 = 0.2316419;
const A1: f64 = 0.319381530;
const A2: f64 = -0.356563782;
const A3: f64 = 1.781477937;
const A4: f64 = -1.821255978;
const A5: f64 = 1.330274429;

const INV_SQRT_TWO_PI: f64 = 0.398_942_280_401_432_7;

/// Standard normal density.
#[inline]
pub fn density(x: f64) -> f64 {
    INV_SQRT_TWO_PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF via a five-term rational polynomial in
/// `t = 1 / (1 + p * x)`.
pub fn cdf(x: f64) -> f64 {
    // the polynomial is only valid for x >= 0
    if x < 0.0 {
        return 1.0 - cdf(-x);
    }

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    1.0 - density(x) * poly
}

#[test]
fn cdf_symmetry() {
    let x = 1.5;
    assert!((cdf(x) + cdf(-x) - 1.0).abs() < 1e-7);
}

#[test]
fn cdf_bounds() {
    assert!((cdf(0.0) - 0.5).abs() < 1e-7);
    assert!(cdf(-10.0) < 1e-6);
    assert!(cdf(10.0) > 1.0 - 1e-6);
    assert_eq!(cdf(-60.0), 0.0);
    assert_eq!(cdf(60.0), 1.0);
}

#[test]
fn cdf_standard_values() {
    use approx::assert_abs_diff_eq;

    assert_abs_diff_eq!(cdf(1.0), 0.8413, epsilon = 1e-3);
    assert_abs_diff_eq!(cdf(2.0), 0.9772, epsilon = 1e-3);
    assert_abs_diff_eq!(cdf(-1.0), 0.1587, epsilon = 1e-3);
}

#[test]
fn density_values() {
    use approx::assert_relative_eq;

    assert_relative_eq!(density(0.0), 0.398_942_280_4, max_relative = 1e-9);
    assert_relative_eq!(density(1.0), density(-1.0));
    assert_relative_eq!(density(1.0), 0.241_970_724_5, max_relative = 1e-9);
}

#[test]
fn matches_statrs_within_approximation_error() {
    use statrs::distribution::{ ContinuousCDF, Normal };

    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut x = -6.0;
    while x <= 6.0 {
        let diff = (cdf(x) - normal.cdf(x)).abs();
        assert!(diff < 1.5e-7, "cdf({x}) off by {diff}");
        x += 0.05;
    }
}

#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn symmetric(x in -40.0f64..40.0) {
            prop_assert!((cdf(x) + cdf(-x) - 1.0).abs() < 1e-7);
        }

        #[test]
        fn strictly_increasing(x in -5.0f64..5.0, step in 1e-3f64..2.0) {
            prop_assert!(cdf(x) < cdf(x + step));
        }

        #[test]
        fn in_unit_interval(x in proptest::num::f64::NORMAL) {
            let p = cdf(x);
            prop_assert!((0.0..=1.0).contains(&p));
            prop_assert!(density(x) >= 0.0);
        }
    }
}
