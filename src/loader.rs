//! Reads contracts from CSV with the header `symbol,S,K,r,sigma,T,isCall`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::contract::{ Contract, OptionKind };
use crate::error::PricingResult;

#[derive(Debug, Deserialize)]
struct ContractRecord {
    symbol: String,
    #[serde(rename = "S")]
    spot: f64,
    #[serde(rename = "K")]
    strike: f64,
    r: f64,
    sigma: f64,
    #[serde(rename = "T")]
    years_to_expiry: f64,
    // 1 means call; integer-valued floats such as `1.0` are truncated
    #[serde(rename = "isCall")]
    is_call: f64,
}

impl ContractRecord {
    fn into_contract(self) -> PricingResult<Contract> {
        let kind = if self.is_call.trunc() == 1.0 { OptionKind::Call } else { OptionKind::Put };
        Contract::new(self.symbol, self.spot, self.strike, self.r, self.sigma, self.years_to_expiry, kind)
    }
}

pub fn load_contracts(path: impl AsRef<Path>) -> PricingResult<Vec<Contract>> {
    let path = path.as_ref();
    let contracts = read_contracts(File::open(path)?)?;
    debug!(path = %path.display(), count = contracts.len(), "loaded contracts");
    Ok(contracts)
}

/// Parses and validates every record; the first bad record fails the load.
pub fn read_contracts<R: Read>(reader: R) -> PricingResult<Vec<Contract>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut contracts = Vec::new();
    for record in reader.deserialize::<ContractRecord>() {
        contracts.push(record?.into_contract()?);
    }
    Ok(contracts)
}

#[test]
fn parses_calls_and_puts() {
    let data = "symbol,S,K,r,sigma,T,isCall\n\
                AAPL_C,100,100,0.05,0.2,1,1\n\
                \n\
                AAPL_P, 100, 95, 0.05, 0.2, 0.5, 0\n";
    let contracts = read_contracts(data.as_bytes()).unwrap();
    assert_eq!(contracts.len(), 2);
    assert_eq!(contracts[0].id, "AAPL_C");
    assert_eq!(contracts[0].kind, OptionKind::Call);
    assert_eq!(contracts[1].kind, OptionKind::Put);
    assert_eq!(contracts[1].strike, 95.0);
    assert_eq!(contracts[1].years_to_expiry, 0.5);
}

#[test]
fn rejects_invalid_records() {
    use crate::error::PricingError;

    let bad_strike = "symbol,S,K,r,sigma,T,isCall\nX,100,0,0.05,0.2,1,1\n";
    assert!(matches!(
        read_contracts(bad_strike.as_bytes()),
        Err(PricingError::InvalidInput { ref id, .. }) if id == "X"
    ));

    let not_a_number = "symbol,S,K,r,sigma,T,isCall\nX,abc,100,0.05,0.2,1,1\n";
    assert!(matches!(read_contracts(not_a_number.as_bytes()), Err(PricingError::Csv(_))));
}

#[test]
fn missing_file() {
    use crate::error::PricingError;

    assert!(matches!(load_contracts("/definitely/not/here.csv"), Err(PricingError::Io(_))));
}

#[test]
fn call_flag_accepts_integer_valued_floats() {
    let data = "symbol,S,K,r,sigma,T,isCall\nC,100,100,0.05,0.2,1,1.0\nP,100,100,0.05,0.2,1,0.0\n";
    let contracts = read_contracts(data.as_bytes()).unwrap();
    assert_eq!(contracts[0].kind, OptionKind::Call);
    assert_eq!(contracts[1].kind, OptionKind::Put);

    let garbage = "symbol,S,K,r,sigma,T,isCall\nC,100,100,0.05,0.2,1,yes\n";
    assert!(matches!(read_contracts(garbage.as_bytes()), Err(crate::error::PricingError::Csv(_))));
}
