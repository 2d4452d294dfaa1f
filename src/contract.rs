use serde::Serialize;

use crate::error::{PricingError, PricingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    /// 1.0 for a call, -1.0 for a put. Multiplying spot and strike by this
    /// turns both payoffs into `max(sign * (S_T - K), 0)`.
    #[inline(always)]
    pub fn sign(self) -> f64 {
        match self {
            OptionKind::Call => 1.0,
            OptionKind::Put => -1.0,
        }
    }

    #[inline(always)]
    pub fn payoff(self, terminal_price: f64, strike: f64) -> f64 {
        match self {
            OptionKind::Call => (terminal_price - strike).max(0.0),
            OptionKind::Put => (strike - terminal_price).max(0.0),
        }
    }
}

/// A European option on a single underlying. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub id: String,
    pub spot: f64,
    pub strike: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
    pub years_to_expiry: f64,
    pub kind: OptionKind,
}

impl Contract {
    pub fn new(
        id: impl Into<String>,
        spot: f64,
        strike: f64,
        risk_free_rate: f64,
        volatility: f64,
        years_to_expiry: f64,
        kind: OptionKind
    ) -> PricingResult<Self> {
        let contract = Self {
            id: id.into(),
            spot,
            strike,
            risk_free_rate,
            volatility,
            years_to_expiry,
            kind,
        };
        contract.validate()?;
        Ok(contract)
    }

    /// Rejects anything the loader would have rejected.
    pub fn validate(&self) -> PricingResult<()> {
        if self.id.trim().is_empty() {
            return Err(self.invalid("identifier is empty".to_string()));
        }
        for (name, value) in [
            ("spot price", self.spot),
            ("strike price", self.strike),
            ("volatility", self.volatility),
            ("time to maturity", self.years_to_expiry),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(self.invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !self.risk_free_rate.is_finite() {
            return Err(self.invalid(format!("risk-free rate is not finite: {}", self.risk_free_rate)));
        }
        Ok(())
    }

    /// Guard used by the pricers: both the closed form and the simulation
    /// divide by or scale with `sigma * sqrt(T)`.
    pub fn ensure_simulatable(&self) -> PricingResult<()> {
        for (name, value) in [
            ("volatility", self.volatility),
            ("time to maturity", self.years_to_expiry),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(PricingError::DegenerateParameter {
                    id: self.id.clone(),
                    name,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Risk-neutral log drift over the whole life, `(r - sigma^2 / 2) * T`.
    #[inline]
    pub fn drift(&self) -> f64 {
        (self.risk_free_rate - 0.5 * self.volatility * self.volatility) * self.years_to_expiry
    }

    /// `sigma * sqrt(T)`
    #[inline]
    pub fn diffusion(&self) -> f64 {
        self.volatility * self.years_to_expiry.sqrt()
    }

    #[inline]
    pub fn discount_factor(&self) -> f64 {
        (-self.risk_free_rate * self.years_to_expiry).exp()
    }

    fn invalid(&self, reason: String) -> PricingError {
        PricingError::InvalidInput {
            id: self.id.clone(),
            reason,
        }
    }
}

/// Output of pricing one contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    #[serde(rename = "symbol")]
    pub id: String,
    pub price: f64,
    pub delta: f64,
    pub expected_return: f64,
}

impl SimulationResult {
    pub fn new(contract: &Contract, price: f64, delta: f64) -> Self {
        Self {
            id: contract.id.clone(),
            price,
            delta,
            expected_return: price / contract.strike,
        }
    }
}

#[test]
fn rejects_non_positive_inputs() {
    assert!(Contract::new("A", 100.0, 100.0, 0.05, 0.2, 1.0, OptionKind::Call).is_ok());
    assert!(Contract::new("", 100.0, 100.0, 0.05, 0.2, 1.0, OptionKind::Call).is_err());
    assert!(Contract::new("A", 0.0, 100.0, 0.05, 0.2, 1.0, OptionKind::Call).is_err());
    assert!(Contract::new("A", 100.0, -1.0, 0.05, 0.2, 1.0, OptionKind::Put).is_err());
    assert!(Contract::new("A", 100.0, 100.0, 0.05, 0.0, 1.0, OptionKind::Put).is_err());
    assert!(Contract::new("A", 100.0, 100.0, 0.05, 0.2, 0.0, OptionKind::Call).is_err());
    assert!(Contract::new("A", 100.0, 100.0, f64::NAN, 0.2, 1.0, OptionKind::Call).is_err());
    // negative rates are allowed
    assert!(Contract::new("A", 100.0, 100.0, -0.01, 0.2, 1.0, OptionKind::Call).is_ok());
}

#[test]
fn degenerate_guard_catches_hand_built_contracts() {
    let contract = Contract {
        id: "ZERO_VOL".to_string(),
        spot: 100.0,
        strike: 100.0,
        risk_free_rate: 0.05,
        volatility: 0.0,
        years_to_expiry: 1.0,
        kind: OptionKind::Call,
    };
    match contract.ensure_simulatable() {
        Err(PricingError::DegenerateParameter { name, .. }) => assert_eq!(name, "volatility"),
        other => panic!("expected degenerate parameter error, got {other:?}"),
    }
}

#[test]
fn payoffs_and_expected_return() {
    assert_eq!(OptionKind::Call.payoff(120.0, 100.0), 20.0);
    assert_eq!(OptionKind::Call.payoff(80.0, 100.0), 0.0);
    assert_eq!(OptionKind::Put.payoff(80.0, 100.0), 20.0);
    assert_eq!(OptionKind::Put.payoff(120.0, 100.0), 0.0);

    let contract = Contract::new("A", 100.0, 50.0, 0.05, 0.2, 1.0, OptionKind::Call).unwrap();
    let result = SimulationResult::new(&contract, 10.0, 0.6);
    assert_eq!(result.expected_return, 0.2);
    assert_eq!(result.id, "A");
}
