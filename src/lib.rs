pub mod bs;
pub mod config;
pub mod contract;
pub mod error;
pub mod executor;
pub mod loader;
pub mod mc;
pub mod mcfast;
pub mod normal;
pub mod partition;
pub mod ranker;
pub mod sampler;

pub use config::{ EngineKind, SimulationConfig };
pub use contract::{ Contract, OptionKind, SimulationResult };
pub use error::{ PricingError, PricingResult };
pub use executor::{ BatchOutcome, ParallelExecutor };
pub use partition::WorkPartition;
pub use sampler::{ PathSampler, SeedDerivation };
