use monte_carlo_options_ranker::{ bs, loader, EngineKind, ParallelExecutor, SimulationConfig };

const BOOK: &str = "symbol,S,K,r,sigma,T,isCall
ATM_CALL,100,100,0.05,0.2,1,1
ATM_PUT,100,100,0.05,0.2,1,0
";

const LADDER: &str = "symbol,S,K,r,sigma,T,isCall
LOW_K,100,80,0.05,0.2,1,1
MID_K,100,100,0.05,0.2,1,1
HIGH_K,100,120,0.05,0.2,1,1
FAR_PUT,100,70,0.05,0.2,1,0
";

fn ranked_ids(csv: &str, engine: EngineKind, num_paths: usize) -> Vec<(String, f64)> {
    let contracts = loader::read_contracts(csv.as_bytes()).unwrap();
    let config = SimulationConfig::builder()
        .num_paths(num_paths)
        .base_seed(12345)
        .workers(2)
        .engine(engine)
        .build()
        .unwrap();
    let outcome = ParallelExecutor::new(config).unwrap().run(&contracts).unwrap();
    assert_eq!(outcome.total_paths, (contracts.len() * num_paths) as u64);

    for (result, contract) in outcome.results.iter().zip(&contracts) {
        let analytic = bs::price(contract).unwrap();
        assert!(
            (result.price - analytic).abs() <= (analytic * 0.03).max(0.1),
            "{} priced {} vs analytic {}",
            result.id,
            result.price,
            analytic
        );
    }

    outcome
        .ranked()
        .into_iter()
        .map(|r| (r.id, r.price))
        .collect()
}

#[test]
fn atm_call_and_put_rank_the_same_under_both_engines() {
    let reference = ranked_ids(BOOK, EngineKind::Reference, 1_000_000);
    let batched = ranked_ids(BOOK, EngineKind::Batched, 1_000_000);

    let ids = |v: &[(String, f64)]| v.iter().map(|(id, _)| id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&reference), ["ATM_CALL", "ATM_PUT"]);
    assert_eq!(ids(&reference), ids(&batched));

    // same seeds, same draw order: prices differ only by rounding
    for ((_, a), (_, b)) in reference.iter().zip(&batched) {
        assert!((a - b).abs() <= 1e-6 * a.abs());
    }
}

#[test]
fn strike_ladder_ranks_by_price_over_strike() {
    let reference = ranked_ids(LADDER, EngineKind::Reference, 200_000);
    let batched = ranked_ids(LADDER, EngineKind::Batched, 200_000);

    let ids: Vec<&str> = reference.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, ["LOW_K", "MID_K", "HIGH_K", "FAR_PUT"]);
    let batched_ids: Vec<&str> = batched.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, batched_ids);
}

#[test]
fn bad_row_stops_the_run_before_pricing() {
    let csv = "symbol,S,K,r,sigma,T,isCall\nOK,100,100,0.05,0.2,1,1\nBAD,100,100,0.05,0,1,1\n";
    let err = loader::read_contracts(csv.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("BAD"));
}
