//! Run-time configuration for a pricing batch.

use std::fmt;

use crate::contract::Contract;
use crate::error::{ PricingError, PricingResult };
use crate::sampler::{ PathSampler, SeedDerivation };
use crate::{ mc, mcfast };

pub const DEFAULT_NUM_PATHS: usize = 1_000_000;
pub const DEFAULT_BASE_SEED: u64 = 12345;
/// Used when the hardware parallelism cannot be queried.
pub const FALLBACK_WORKERS: usize = 4;

/// Which Monte Carlo kernel prices each contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum EngineKind {
    /// One draw and one payoff at a time.
    #[default]
    Reference,
    /// 1024-draw batches evaluated four lanes at a time.
    Batched,
}

impl EngineKind {
    #[inline]
    pub fn price(self, contract: &Contract, num_paths: usize, sampler: &mut PathSampler) -> PricingResult<f64> {
        match self {
            EngineKind::Reference => mc::price(contract, num_paths, sampler),
            EngineKind::Batched => mcfast::price(contract, num_paths, sampler),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Reference => write!(f, "reference"),
            EngineKind::Batched => write!(f, "batched"),
        }
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(FALLBACK_WORKERS)
}

/// Immutable settings handed to [`crate::executor::ParallelExecutor`].
/// Build with [`SimulationConfig::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    num_paths: usize,
    base_seed: u64,
    workers: usize,
    engine: EngineKind,
    seed_derivation: SeedDerivation,
}

impl SimulationConfig {
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    #[inline]
    pub fn num_paths(&self) -> usize {
        self.num_paths
    }

    #[inline]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[inline]
    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    #[inline]
    pub fn seed_derivation(&self) -> SeedDerivation {
        self.seed_derivation
    }

    /// Seed for the sampler owned by `worker`.
    #[inline]
    pub fn worker_seed(&self, worker: usize) -> u64 {
        self.seed_derivation.derive(self.base_seed, worker)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulationConfigBuilder {
    num_paths: Option<usize>,
    base_seed: Option<u64>,
    workers: Option<usize>,
    engine: EngineKind,
    seed_derivation: SeedDerivation,
}

impl SimulationConfigBuilder {
    pub fn num_paths(mut self, num_paths: usize) -> Self {
        self.num_paths = Some(num_paths);
        self
    }

    pub fn base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = Some(base_seed);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn seed_derivation(mut self, seed_derivation: SeedDerivation) -> Self {
        self.seed_derivation = seed_derivation;
        self
    }

    pub fn build(self) -> PricingResult<SimulationConfig> {
        let num_paths = self.num_paths.unwrap_or(DEFAULT_NUM_PATHS);
        if num_paths == 0 {
            return Err(PricingError::InvalidPathCount(num_paths));
        }
        let workers = self.workers.unwrap_or_else(default_workers);
        if workers == 0 {
            return Err(PricingError::Config("worker count must be at least 1".to_string()));
        }

        Ok(SimulationConfig {
            num_paths,
            base_seed: self.base_seed.unwrap_or(DEFAULT_BASE_SEED),
            workers,
            engine: self.engine,
            seed_derivation: self.seed_derivation,
        })
    }
}

#[test]
fn defaults() {
    let config = SimulationConfig::builder().build().unwrap();
    assert_eq!(config.num_paths(), 1_000_000);
    assert_eq!(config.base_seed(), 12345);
    assert!(config.workers() >= 1);
    assert_eq!(config.engine(), EngineKind::Reference);
    assert_eq!(config.seed_derivation(), SeedDerivation::Sequential);
    assert_eq!(config.worker_seed(2), 12347);
}

#[test]
fn overrides_and_validation() {
    let config = SimulationConfig::builder()
        .num_paths(5_000)
        .base_seed(7)
        .workers(3)
        .engine(EngineKind::Batched)
        .build()
        .unwrap();
    assert_eq!(config.num_paths(), 5_000);
    assert_eq!(config.base_seed(), 7);
    assert_eq!(config.workers(), 3);
    assert_eq!(config.engine().to_string(), "batched");

    assert!(matches!(
        SimulationConfig::builder().num_paths(0).build(),
        Err(PricingError::InvalidPathCount(0))
    ));
    assert!(matches!(SimulationConfig::builder().workers(0).build(), Err(PricingError::Config(_))));
}

#[test]
fn engine_dispatch() {
    use crate::contract::OptionKind;

    let contract = Contract::new("TEST", 100.0, 100.0, 0.05, 0.2, 1.0, OptionKind::Call).unwrap();
    let via_kind = EngineKind::Batched.price(&contract, 3_000, &mut PathSampler::new(3)).unwrap();
    let direct = mcfast::price(&contract, 3_000, &mut PathSampler::new(3)).unwrap();
    assert_eq!(via_kind.to_bits(), direct.to_bits());
}
