#![doc = include_str!("../README.md")]

mod calc;
pub mod error;
pub mod eval;
pub mod field;
pub mod graph;
pub mod inputs;
pub mod wtns;

pub use calc::{GraphCalculator, WitnessCalculator, calc_witness};
pub use error::Error;
