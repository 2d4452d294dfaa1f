/// Everything that can go wrong between loading a contract file and ranking
/// the priced batch.
///
/// Input problems are reported per contract before any simulation starts.
/// Once workers are running, any failure aborts the whole batch.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("invalid contract '{id}': {reason}")]
    InvalidInput { id: String, reason: String },

    #[error("degenerate parameter for '{id}': {name} = {value}, must be strictly positive")]
    DegenerateParameter {
        id: String,
        name: &'static str,
        value: f64,
    },

    #[error("invalid path count {0}: at least one path is required")]
    InvalidPathCount(usize),

    #[error("config error: {0}")]
    Config(String),

    #[error("worker {worker} failed: {reason}")]
    WorkerFailure { worker: usize, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type PricingResult<T> = Result<T, PricingError>;

#[test]
fn error_messages_name_the_contract() {
    let err = PricingError::DegenerateParameter {
        id: "AAPL_C".to_string(),
        name: "volatility",
        value: 0.0,
    };
    let msg = err.to_string();
    assert!(msg.contains("AAPL_C"));
    assert!(msg.contains("volatility"));

    let err = PricingError::WorkerFailure {
        worker: 3,
        reason: "boom".to_string(),
    };
    assert_eq!(err.to_string(), "worker 3 failed: boom");
}
