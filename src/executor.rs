//! Prices a batch of contracts across a fixed pool of workers.
//!
//! The output buffer is split into one exclusive `&mut` slice per
//! partition before any worker starts, so no slot is ever written by two
//! threads and the hot loop takes no locks.

use std::any::Any;
use std::panic::{ self, AssertUnwindSafe };
use std::time::{ Duration, Instant };

use rayon::prelude::*;
use rayon::{ ThreadPool, ThreadPoolBuilder };
use tracing::{ debug, info, warn };

use crate::bs;
use crate::config::SimulationConfig;
use crate::contract::{ Contract, SimulationResult };
use crate::error::{ PricingError, PricingResult };
use crate::partition::{ self, WorkPartition };
use crate::ranker;
use crate::sampler::PathSampler;

/// Results of one batch, index-aligned with the input contracts.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub results: Vec<SimulationResult>,
    pub elapsed: Duration,
    pub total_paths: u64,
}

impl BatchOutcome {
    /// Simulated paths per second of wall-clock time spent in the workers.
    pub fn paths_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.total_paths as f64) / secs
        } else {
            0.0
        }
    }

    pub fn ranked(self) -> Vec<SimulationResult> {
        ranker::rank(self.results)
    }
}

pub struct ParallelExecutor {
    config: SimulationConfig,
    pool: ThreadPool,
}

impl ParallelExecutor {
    pub fn new(config: SimulationConfig) -> PricingResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers())
            .thread_name(|i| format!("mc-worker-{i}"))
            .build()
            .map_err(|e| PricingError::Config(format!("failed to build worker pool: {e}")))?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Partitions `contracts` over the configured workers and prices them.
    pub fn run(&self, contracts: &[Contract]) -> PricingResult<BatchOutcome> {
        let partitions = partition::partition(contracts.len(), self.config.workers());
        self.run_with_partitions(contracts, &partitions)
    }

    /// Prices `contracts` with one worker per partition. Worker `i` seeds its
    /// sampler from the base seed and `i`, and writes only the slots of its
    /// own range. Returns once every worker has finished; the first failure
    /// (by worker index) aborts the batch.
    pub fn run_with_partitions(
        &self,
        contracts: &[Contract],
        partitions: &[WorkPartition]
    ) -> PricingResult<BatchOutcome> {
        if !partition::covers(partitions, contracts.len()) {
            return Err(
                PricingError::Config(
                    format!("partitions do not tile [0, {}) exactly", contracts.len())
                )
            );
        }
        for contract in contracts {
            contract.validate()?;
        }

        let num_paths = self.config.num_paths();
        info!(
            contracts = contracts.len(),
            workers = partitions.len(),
            num_paths,
            engine = %self.config.engine(),
            base_seed = self.config.base_seed(),
            "pricing batch"
        );

        let mut slots: Vec<Option<SimulationResult>> = vec![None; contracts.len()];
        let mut jobs = Vec::with_capacity(partitions.len());
        let mut rest: &mut [Option<SimulationResult>] = &mut slots;
        for (worker, part) in partitions.iter().enumerate() {
            let (own, tail) = std::mem::take(&mut rest).split_at_mut(part.len());
            jobs.push((worker, *part, own));
            rest = tail;
        }

        let start = Instant::now();
        let outcomes: Vec<PricingResult<()>> = self.pool.install(|| {
            jobs.into_par_iter()
                .map(|(worker, part, own)| self.run_worker(contracts, worker, part, own))
                .collect()
        });
        let elapsed = start.elapsed();

        first_failure(outcomes)?;

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| PricingError::WorkerFailure {
                    worker: owner_of(partitions, i),
                    reason: format!("no result written for contract {i}"),
                })
            })
            .collect::<PricingResult<Vec<_>>>()?;

        let total_paths = (contracts.len() as u64) * (num_paths as u64);
        info!(elapsed_ms = elapsed.as_millis() as u64, total_paths, "batch complete");

        Ok(BatchOutcome { results, elapsed, total_paths })
    }

    fn run_worker(
        &self,
        contracts: &[Contract],
        worker: usize,
        part: WorkPartition,
        out: &mut [Option<SimulationResult>]
    ) -> PricingResult<()> {
        let seed = self.config.worker_seed(worker);

        let outcome = panic::catch_unwind(
            AssertUnwindSafe(|| -> PricingResult<()> {
                let mut sampler = PathSampler::new(seed);
                for (slot, contract) in out.iter_mut().zip(&contracts[part.range()]) {
                    let price = self.config
                        .engine()
                        .price(contract, self.config.num_paths(), &mut sampler)?;
                    let delta = bs::delta(contract)?;
                    *slot = Some(SimulationResult::new(contract, price, delta));
                }
                Ok(())
            })
        );

        match outcome {
            Ok(Ok(())) => {
                debug!(worker, seed, start = part.start, end = part.end, "worker finished");
                Ok(())
            }
            Ok(Err(err)) => Err(PricingError::WorkerFailure { worker, reason: err.to_string() }),
            Err(payload) => Err(PricingError::WorkerFailure { worker, reason: panic_message(payload) }),
        }
    }
}

/// Called once every worker has returned. The lowest worker index wins.
fn first_failure(outcomes: Vec<PricingResult<()>>) -> PricingResult<()> {
    match outcomes.into_iter().find_map(Result::err) {
        Some(err) => {
            warn!(error = %err, "batch aborted");
            Err(err)
        }
        None => Ok(()),
    }
}

fn owner_of(partitions: &[WorkPartition], index: usize) -> usize {
    partitions
        .iter()
        .position(|p| p.range().contains(&index))
        .unwrap_or(0)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
fn book() -> Vec<Contract> {
    use crate::contract::OptionKind;

    (0..13)
        .map(|i| {
            let strike = 80.0 + 3.0 * (i as f64);
            let kind = if i % 2 == 0 { OptionKind::Call } else { OptionKind::Put };
            Contract::new(format!("OPT{i:02}"), 100.0, strike, 0.03, 0.25, 0.75, kind).unwrap()
        })
        .collect()
}

#[cfg(test)]
fn executor(workers: usize, engine: crate::config::EngineKind) -> ParallelExecutor {
    let config = SimulationConfig::builder()
        .num_paths(20_000)
        .base_seed(12345)
        .workers(workers)
        .engine(engine)
        .build()
        .unwrap();
    ParallelExecutor::new(config).unwrap()
}

#[test]
fn results_are_index_aligned() {
    use crate::config::EngineKind;

    let contracts = book();
    let outcome = executor(4, EngineKind::Reference).run(&contracts).unwrap();
    assert_eq!(outcome.results.len(), contracts.len());
    assert_eq!(outcome.total_paths, 13 * 20_000);
    for (result, contract) in outcome.results.iter().zip(&contracts) {
        assert_eq!(result.id, contract.id);
        assert!(result.price >= 0.0);
        assert!(result.delta > -1.0 && result.delta < 1.0);
        assert_eq!(result.expected_return, result.price / contract.strike);
    }
}

#[test]
fn reproducible_for_fixed_worker_count() {
    use crate::config::EngineKind;

    let contracts = book();
    for engine in [EngineKind::Reference, EngineKind::Batched] {
        let first = executor(3, engine).run(&contracts).unwrap();
        let second = executor(3, engine).run(&contracts).unwrap();
        for (a, b) in first.results.iter().zip(&second.results) {
            assert_eq!(a.price.to_bits(), b.price.to_bits());
        }
    }
}

#[test]
fn worker_matches_sequential_pricing() {
    use crate::config::EngineKind;

    // worker w prices its range in order from one sampler seeded base + w
    let contracts = book();
    let exec = executor(3, EngineKind::Reference);
    let outcome = exec.run(&contracts).unwrap();

    for (worker, part) in partition::partition(contracts.len(), 3).iter().enumerate() {
        let mut sampler = PathSampler::new(12345 + (worker as u64));
        for i in part.range() {
            let expected = crate::mc::price(&contracts[i], 20_000, &mut sampler).unwrap();
            assert_eq!(outcome.results[i].price.to_bits(), expected.to_bits());
        }
    }
}

#[test]
fn more_workers_than_contracts_and_empty_batches() {
    use crate::config::EngineKind;

    let contracts = book();
    let few = &contracts[..2];
    let outcome = executor(8, EngineKind::Batched).run(few).unwrap();
    assert_eq!(outcome.results.len(), 2);

    let outcome = executor(8, EngineKind::Batched).run(&[]).unwrap();
    assert!(outcome.results.is_empty());
    assert_eq!(outcome.total_paths, 0);
}

#[test]
fn invalid_contract_fails_before_simulation() {
    use crate::config::EngineKind;

    let mut contracts = book();
    contracts[5].volatility = 0.0;
    let err = executor(2, EngineKind::Reference).run(&contracts).unwrap_err();
    assert!(matches!(err, PricingError::InvalidInput { ref id, .. } if id == "OPT05"));
}

#[test]
fn rejects_partitions_with_gaps() {
    use crate::config::EngineKind;

    let contracts = book();
    let gapped = [WorkPartition { start: 0, end: 5 }, WorkPartition { start: 6, end: 13 }];
    let err = executor(2, EngineKind::Reference).run_with_partitions(&contracts, &gapped);
    assert!(matches!(err, Err(PricingError::Config(_))));
}

#[test]
fn throughput() {
    let outcome = BatchOutcome {
        results: Vec::new(),
        elapsed: Duration::from_millis(500),
        total_paths: 1_000_000,
    };
    assert!((outcome.paths_per_second() - 2_000_000.0).abs() < 1e-6);
}

#[test]
fn degenerate_contract_inside_a_worker_fails_that_worker() {
    use crate::config::EngineKind;

    let mut contracts = book();
    contracts[4].years_to_expiry = 0.0;
    let exec = executor(2, EngineKind::Reference);

    let mut out: Vec<Option<SimulationResult>> = vec![None; 6];
    let err = exec
        .run_worker(&contracts, 0, WorkPartition { start: 0, end: 6 }, &mut out)
        .unwrap_err();
    match err {
        PricingError::WorkerFailure { worker, reason } => {
            assert_eq!(worker, 0);
            assert!(reason.contains("OPT04"), "{reason}");
        }
        other => panic!("expected worker failure, got {other:?}"),
    }
    // slots before the bad contract were written, the rest were not
    assert!(out[..4].iter().all(Option::is_some));
    assert!(out[4..].iter().all(Option::is_none));
}

#[test]
fn lowest_worker_failure_wins() {
    let failure = |worker: usize| PricingError::WorkerFailure { worker, reason: "bad".to_string() };

    assert!(first_failure(vec![Ok(()), Ok(())]).is_ok());
    let err = first_failure(vec![Ok(()), Err(failure(1)), Ok(()), Err(failure(3))]).unwrap_err();
    assert!(matches!(err, PricingError::WorkerFailure { worker: 1, .. }));
}

#[test]
fn panic_payloads_become_messages() {
    assert_eq!(panic_message(Box::new("boom")), "boom");
    assert_eq!(panic_message(Box::new(String::from("kaboom"))), "kaboom");
    assert_eq!(panic_message(Box::new(42u32)), "worker panicked");
}
