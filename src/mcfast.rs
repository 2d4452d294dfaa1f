use bytemuck::cast;
use wide::*;

use crate::contract::Contract;
use crate::error::{ PricingError, PricingResult };
use crate::sampler::PathSampler;

/// Normal variates drawn from the sampler per refill.
pub const BATCH_SIZE: usize = 1024;
const LANES: usize = 4;

/// Same estimator as [`crate::mc::price`], evaluated a batch at a time.
///
/// Draws are taken from the sampler in the same order as the scalar engine,
/// so both agree up to summation order and the rounding of the vector `exp`.
pub fn price(contract: &Contract, num_paths: usize, sampler: &mut PathSampler) -> PricingResult<f64> {
    contract.ensure_simulatable()?;
    if num_paths == 0 {
        return Err(PricingError::InvalidPathCount(num_paths));
    }

    let num_batches = num_paths / BATCH_SIZE;
    let remainder = num_paths % BATCH_SIZE;

    let drift = contract.drift();
    let diffusion = contract.diffusion();

    // sign folds the put payoff into max(sign * (S_T - K), 0)
    let sign = contract.kind.sign();
    let spot_f64x4 = f64x4::splat(sign * contract.spot);
    let strike_f64x4 = f64x4::splat(sign * contract.strike);
    let drift_f64x4 = f64x4::splat(drift);
    let diffusion_f64x4 = f64x4::splat(diffusion);
    let zeros = f64x4::splat(0.0);

    let mut randoms = [0.0f64; BATCH_SIZE];
    let mut total_payoff: f64 = 0.0;

    for _ in 0..num_batches {
        sampler.fill_standard_normal(&mut randoms);

        let mut batch_payoff = f64x4::splat(0.0);
        for chunk in randoms.chunks_exact(LANES) {
            let z = f64x4::from([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let growth = f64x4::mul_add(z, diffusion_f64x4, drift_f64x4).exp();
            batch_payoff += (spot_f64x4 * growth - strike_f64x4).max(zeros);
        }

        let lanes: [f64; LANES] = cast(batch_payoff);
        total_payoff += lanes.iter().sum::<f64>();
    }

    for _ in 0..remainder {
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
fn converges_to_analytic() {
    use crate::{ bs, contract::OptionKind };

    for kind in [OptionKind::Call, OptionKind::Put] {
        let contract = option(100.0, 100.0, 0.2, 1.0, kind);
        let actual_price = bs::price(&contract).unwrap();
        let price = price(&contract, 1_000_000, &mut PathSampler::new(42)).unwrap();
        println!("mcfast {:?} {} vs {}", kind, price, actual_price);
        assert!((price - actual_price).abs() <= actual_price * 0.01);
    }
}

#[test]
fn matches_scalar_engine() {
    use crate::{ contract::OptionKind, mc };

    // full batches only, remainder only, and a mix of both
    for num_paths in [4 * BATCH_SIZE, 1, 777, 10 * BATCH_SIZE + 333] {
        for contract in [
            option(100.0, 100.0, 0.2, 1.0, OptionKind::Call),
            option(90.0, 110.0, 0.35, 0.5, OptionKind::Put),
            option(130.0, 100.0, 0.15, 2.0, OptionKind::Call),
        ] {
            let scalar = mc::price(&contract, num_paths, &mut PathSampler::new(99)).unwrap();
            let batched = price(&contract, num_paths, &mut PathSampler::new(99)).unwrap();
            let tolerance = 1e-6 * scalar.abs().max(1e-12);
            assert!(
                (scalar - batched).abs() <= tolerance,
                "{num_paths} paths: scalar {scalar} vs batched {batched}"
            );
        }
    }
}

#[test]
fn leaves_sampler_where_scalar_engine_does() {
    use crate::{ contract::OptionKind, mc };

    let contract = option(100.0, 100.0, 0.2, 1.0, OptionKind::Call);
    let mut scalar = PathSampler::new(5);
    let mut batched = PathSampler::new(5);
    mc::price(&contract, 2 * BATCH_SIZE + 17, &mut scalar).unwrap();
    price(&contract, 2 * BATCH_SIZE + 17, &mut batched).unwrap();
    assert_eq!(scalar.next_standard_normal().to_bits(), batched.next_standard_normal().to_bits());
}

#[test]
fn rejects_degenerate_inputs() {
    use crate::contract::OptionKind;

    let mut contract = option(100.0, 100.0, 0.2, 1.0, OptionKind::Put);
    assert!(matches!(
        price(&contract, 0, &mut PathSampler::new(1)),
        Err(PricingError::InvalidPathCount(0))
    ));

    contract.volatility = 0.0;
    assert!(matches!(
        price(&contract, BATCH_SIZE, &mut PathSampler::new(1)),
        Err(PricingError::DegenerateParameter { .. })
    ));
}
