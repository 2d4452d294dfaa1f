use crate::contract::Contract;
use crate::error::{ PricingError, PricingResult };
use crate::sampler::PathSampler;

/// Plain terminal-value Monte Carlo price, one normal draw per path.
///
/// `S_T = S * exp((r - sigma^2 / 2) * T + sigma * sqrt(T) * Z)`, payoffs are
/// averaged over `num_paths` and discounted by `exp(-r * T)`.
pub fn price(contract: &Contract, num_paths: usize, sampler: &mut PathSampler) -> PricingResult<f64> {
    contract.ensure_simulatable()?;
    if num_paths == 0 {
        return Err(PricingError::InvalidPathCount(num_paths));
    }

    let drift = contract.drift();
    let diffusion = contract.diffusion();
    let mut total_payoff: f64 = 0.0;

    for _ in 0..num_paths {
        let z = sampler.next_standard_normal();
        let terminal_price = contract.spot * (drift + diffusion * z).exp();
        total_payoff += contract.kind.payoff(terminal_price, contract.strike);
    }

    Ok((total_payoff / (num_paths as f64)) * contract.discount_factor())
}

#[cfg(test)]
fn option(spot: f64, strike: f64, volatility: f64, years_to_expiry: f64, kind: crate::contract::OptionKind) -> Contract {
    Contract::new("TEST", spot, strike, 0.05, volatility, years_to_expiry, kind).unwrap()
}

#[test]
fn determinism() {
    use crate::contract::OptionKind;

    let contract = option(100.0, 100.0, 0.2, 1.0, OptionKind::Call);
    let first = price(&contract, 100_000, &mut PathSampler::new(42)).unwrap();
    let second = price(&contract, 100_000, &mut PathSampler::new(42)).unwrap();
    assert!((first - second).abs() < 1e-10);
}

#[test]
fn converges_to_analytic_call() {
    use crate::{ bs, contract::OptionKind };

    let contract = option(100.0, 100.0, 0.2, 1.0, OptionKind::Call);
    let actual_price = bs::price(&contract).unwrap();
    let price = price(&contract, 1_000_000, &mut PathSampler::new(42)).unwrap();
    println!("mc call {} vs {}", price, actual_price);
    assert!((price - actual_price).abs() <= actual_price * 0.01);
    assert!((price - 10.45).abs() < 0.15);
}

#[test]
fn converges_to_analytic_put() {
    use crate::{ bs, contract::OptionKind };

    let contract = option(100.0, 100.0, 0.2, 1.0, OptionKind::Put);
    let actual_price = bs::price(&contract).unwrap();
    let price = price(&contract, 1_000_000, &mut PathSampler::new(42)).unwrap();
    println!("mc put {} vs {}", price, actual_price);
    assert!((price - actual_price).abs() <= actual_price * 0.01);
}

#[test]
fn in_the_money_lower_bounds() {
    use crate::contract::OptionKind;

    let call = price(&option(110.0, 100.0, 0.2, 1.0, OptionKind::Call), 100_000, &mut PathSampler::new(42));
    assert!(call.unwrap() >= 10.0 * 0.95);

    let put = price(&option(90.0, 100.0, 0.2, 1.0, OptionKind::Put), 100_000, &mut PathSampler::new(42));
    assert!(put.unwrap() >= 10.0 * 0.95);

    let otm = price(&option(100.0, 100.0, 0.2, 1.0, OptionKind::Call), 10_000, &mut PathSampler::new(42));
    assert!(otm.unwrap() >= 0.0);
}

#[test]
fn short_expiry_and_high_volatility() {
    use crate::{ bs, contract::OptionKind };

    let short = option(100.0, 100.0, 0.2, 0.01, OptionKind::Call);
    let actual_price = bs::price(&short).unwrap();
    let price_short = price(&short, 100_000, &mut PathSampler::new(42)).unwrap();
    assert!((price_short - actual_price).abs() <= (actual_price * 0.05).max(0.01));

    let wild = option(100.0, 100.0, 0.8, 1.0, OptionKind::Call);
    let actual_price = bs::price(&wild).unwrap();
    let price_wild = price(&wild, 500_000, &mut PathSampler::new(42)).unwrap();
    assert!((price_wild - actual_price).abs() <= actual_price * 0.02);
}

#[test]
fn error_shrinks_with_more_paths() {
    use crate::{ bs, contract::OptionKind };

    let contract = option(100.0, 100.0, 0.2, 1.0, OptionKind::Call);
    let actual_price = bs::price(&contract).unwrap();

    // root-mean-square error over a fixed set of seeds
    let rmse = |num_paths: usize| {
        let seeds = 256;
        let sum_sq: f64 = (0..seeds)
            .map(|seed| {
                let mut sampler = PathSampler::new(1_000 + seed);
                (price(&contract, num_paths, &mut sampler).unwrap() - actual_price).powi(2)
            })
            .sum();
        (sum_sq / (seeds as f64)).sqrt()
    };

    let base = rmse(1_000);
    let doubled = rmse(2_000);
    let tenfold = rmse(20_000);
    println!("rmse {} -> {} -> {}", base, doubled, tenfold);
    assert!(doubled < base);
    assert!(tenfold < doubled);
}

#[test]
fn rejects_degenerate_inputs() {
    use crate::contract::OptionKind;

    let mut contract = option(100.0, 100.0, 0.2, 1.0, OptionKind::Call);
    assert!(matches!(
        price(&contract, 0, &mut PathSampler::new(1)),
        Err(PricingError::InvalidPathCount(0))
    ));

    contract.years_to_expiry = 0.0;
    assert!(matches!(
        price(&contract, 10, &mut PathSampler::new(1)),
        Err(PricingError::DegenerateParameter { .. })
    ));
}
