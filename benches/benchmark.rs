use monte_carlo_options_ranker::{
    mc,
    mcfast,
    Contract,
    EngineKind,
    OptionKind,
    ParallelExecutor,
    PathSampler,
    SimulationConfig,
};
use criterion::{ criterion_group, criterion_main, Criterion };

const START_STRIKE: i32 = 50;
const END_STRIKE: i32 = 162;
const SPOT: f64 = 110.0;
const YEARS_TO_EXPIRY: f64 = 0.5;
const RISK_FREE_RATE: f64 = 0.05;
const VOLATILITY: f64 = 0.25;

fn ladder() -> Vec<Contract> {
    (START_STRIKE..END_STRIKE)
        .map(|strike| {
            let kind = if strike % 2 == 0 { OptionKind::Call } else { OptionKind::Put };
            Contract::new(
                format!("K{strike}"),
                SPOT,
                strike as f64,
                RISK_FREE_RATE,
                VOLATILITY,
                YEARS_TO_EXPIRY,
                kind
            ).unwrap()
        })
        .collect()
}

fn criterion_benchmark_engines(c: &mut Criterion) {
    let contract = Contract::new("ATM", 100.0, 100.0, RISK_FREE_RATE, 0.2, 1.0, OptionKind::Call).unwrap();

    c.bench_function("reference 100000 paths", |b| b.iter(|| {
        let mut sampler = PathSampler::new(12345);
        mc::price(&contract, 100_000, &mut sampler).unwrap()
    }));

    c.bench_function("batched 100000 paths", |b| b.iter(|| {
        let mut sampler = PathSampler::new(12345);
        mcfast::price(&contract, 100_000, &mut sampler).unwrap()
    }));
}

fn criterion_benchmark_batch(c: &mut Criterion) {
    let contracts = ladder();

    for engine in [EngineKind::Reference, EngineKind::Batched] {
        let config = SimulationConfig::builder().num_paths(10_000).engine(engine).build().unwrap();
        let executor = ParallelExecutor::new(config).unwrap();

        c.bench_function(&format!("{engine} ladder {} x 10000", contracts.len()), |b| b.iter(|| {
            executor.run(&contracts).unwrap()
        }));
    }
}

criterion_group!(benches, criterion_benchmark_engines, criterion_benchmark_batch);
criterion_main!(benches);
