use crate::contract::{ Contract, OptionKind };
use crate::error::PricingResult;
use crate::normal::cdf;

/// Black-Scholes `d1` and `d2`. Fails on zero volatility or expiry instead
/// of dividing by zero.
pub fn d1_d2(contract: &Contract) -> PricingResult<(f64, f64)> {
    contract.ensure_simulatable()?;

    let vol_sqrt_t = contract.diffusion();
    let d1 =
        ((contract.spot / contract.strike).ln() +
            (contract.risk_free_rate + (contract.volatility * contract.volatility) / 2.0) *
                contract.years_to_expiry) /
        vol_sqrt_t;
    Ok((d1, d1 - vol_sqrt_t))
}

pub fn price(contract: &Contract) -> PricingResult<f64> {
    let (d1, d2) = d1_d2(contract)?;
    let discounted_strike = contract.strike * contract.discount_factor();

    let price = match contract.kind {
        OptionKind::Call => contract.spot * cdf(d1) - discounted_strike * cdf(d2),
        OptionKind::Put => discounted_strike * cdf(-d2) - contract.spot * cdf(-d1),
    };
    // the cdf approximation can push a worthless option a hair below zero
    Ok(price.max(0.0))
}

/// `N(d1)` for a call, `N(d1) - 1` for a put. Saturates at exactly 1 / 0 (call)
/// or 0 / -1 (put) once the cdf rounds off deep in or out of the money.
pub fn delta(contract: &Contract) -> PricingResult<f64> {
    let (d1, _) = d1_d2(contract)?;
    Ok(match contract.kind {
        OptionKind::Call => cdf(d1),
        OptionKind::Put => cdf(d1) - 1.0,
    })
}

#[cfg(test)]
fn option(spot: f64, strike: f64, volatility: f64, years_to_expiry: f64, kind: OptionKind) -> Contract {
    Contract::new("TEST", spot, strike, 0.05, volatility, years_to_expiry, kind).unwrap()
}

#[test]
fn atm_call() {
    let price = price(&option(100.0, 100.0, 0.2, 1.0, OptionKind::Call)).unwrap();
    assert!((price - 10.4506).abs() < 1e-3, "atm call {}", price);
}

#[test]
fn atm_put() {
    let price = price(&option(100.0, 100.0, 0.2, 1.0, OptionKind::Put)).unwrap();
    assert!((price - 5.5735).abs() < 1e-3, "atm put {}", price);
}

#[test]
fn put_call_parity() {
    use approx::assert_abs_diff_eq;

    for (spot, strike) in [(100.0, 100.0), (80.0, 120.0), (150.0, 90.0)] {
        let call = price(&option(spot, strike, 0.3, 0.75, OptionKind::Call)).unwrap();
        let put = price(&option(spot, strike, 0.3, 0.75, OptionKind::Put)).unwrap();
        let rhs = spot - strike * (-0.05f64 * 0.75).exp();
        assert_abs_diff_eq!(call - put, rhs, epsilon = 1e-6);
    }
}

#[test]
fn moneyness() {
    assert!(price(&option(110.0, 100.0, 0.2, 1.0, OptionKind::Call)).unwrap() >= 10.0);
    assert!(price(&option(150.0, 100.0, 0.2, 1.0, OptionKind::Call)).unwrap() >= 50.0);

    let otm = price(&option(90.0, 100.0, 0.2, 1.0, OptionKind::Call)).unwrap();
    assert!(otm > 0.0 && otm < 10.0);

    let deep_otm = price(&option(50.0, 100.0, 0.2, 1.0, OptionKind::Call)).unwrap();
    assert!(deep_otm > 0.0 && deep_otm < 1.0);

    assert!(price(&option(100.0, 100.0, 0.8, 1.0, OptionKind::Call)).unwrap() > 0.0);
    assert!(price(&option(100.0, 100.0, 0.2, 0.001, OptionKind::Call)).unwrap() < 0.3);
}

#[test]
fn delta_bounds() {
    let call = delta(&option(100.0, 100.0, 0.2, 1.0, OptionKind::Call)).unwrap();
    assert!(call > 0.0 && call < 1.0);
    assert!((call - 0.64).abs() < 0.1);

    let put = delta(&option(100.0, 100.0, 0.2, 1.0, OptionKind::Put)).unwrap();
    assert!(put > -1.0 && put < 0.0);
    assert!((call - put - 1.0).abs() < 1e-12);
}

#[test]
fn degenerate_inputs_are_rejected() {
    use crate::error::PricingError;

    let mut contract = option(100.0, 100.0, 0.2, 1.0, OptionKind::Call);
    contract.volatility = 0.0;
    assert!(matches!(price(&contract), Err(PricingError::DegenerateParameter { .. })));
    assert!(matches!(delta(&contract), Err(PricingError::DegenerateParameter { .. })));

    let mut contract = option(100.0, 100.0, 0.2, 1.0, OptionKind::Put);
    contract.years_to_expiry = 0.0;
    assert!(matches!(price(&contract), Err(PricingError::DegenerateParameter { .. })));
}

#[test]
fn delta_saturates_deep_in_the_money() {
    let call = delta(&option(1000.0, 1.0, 0.2, 1.0, OptionKind::Call)).unwrap();
    let put = delta(&option(1000.0, 1.0, 0.2, 1.0, OptionKind::Put)).unwrap();
    assert_eq!(call, 1.0);
    assert_eq!(put, 0.0);
}
