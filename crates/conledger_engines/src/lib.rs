#![forbid(unsafe_code)]

pub mod aggregator;
pub mod reference_oracle;
pub mod symbolic_fhe;
