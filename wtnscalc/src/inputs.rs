//! Input signal assignments.
//!
//! Inputs arrive as a JSON object mapping signal names to values. A value is
//! an integer, a decimal or `0x` hex string (either may carry a leading `-`),
//! or an arbitrarily nested array of those; arrays are flattened in order.
//! Fractional numbers are rejected, and integers past 2^64 must be quoted.

use std::collections::BTreeMap;

use num_bigint::{BigInt, BigUint, Sign};
use serde_json::Value;

use crate::{error::InputError, field::Felt, graph::Graph};

/// A parsed assignment, not yet tied to any graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputAssignment {
    values: BTreeMap<String, Vec<BigInt>>,
}

/// Parses the JSON input document.
pub fn parse(bytes: &[u8]) -> Result<InputAssignment, InputError> {
    let root: Value = serde_json::from_slice(bytes)?;
    let Value::Object(entries) = root else {
        return Err(InputError::NotAnObject);
    };
    let mut values = BTreeMap::new();
    for (name, value) in &entries {
        let mut flat = Vec::new();
        flatten(name, value, &mut flat)?;
        values.insert(name.clone(), flat);
    }
    log::debug!(
        "parsed {} input signals from {} bytes of JSON",
        values.len(),
        bytes.len()
    );
    Ok(InputAssignment { values })
}

fn flatten(signal: &str, value: &Value, out: &mut Vec<BigInt>) -> Result<(), InputError> {
    match value {
        Value::Number(n) => out.push(number(signal, n)?),
        Value::String(s) => out.push(text(signal, s)?),
        Value::Array(items) => {
            for item in items {
                flatten(signal, item, out)?;
            }
        }
        _ => return Err(InputError::UnsupportedValue(signal.into())),
    }
    Ok(())
}

fn number(signal: &str, n: &serde_json::Number) -> Result<BigInt, InputError> {
    if let Some(v) = n.as_u64() {
        return Ok(v.into());
    }
    if let Some(v) = n.as_i64() {
        return Ok(v.into());
    }
    Err(InputError::NonInteger(signal.into()))
}

fn text(signal: &str, s: &str) -> Result<BigInt, InputError> {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (Sign::Minus, rest),
        None => (Sign::Plus, s),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
        None => BigUint::parse_bytes(digits.as_bytes(), 10),
    };
    match magnitude {
        Some(m) => Ok(BigInt::from_biguint(sign, m)),
        None => Err(InputError::BadNumberText {
            signal: signal.into(),
            text: s.into(),
        }),
    }
}

impl InputAssignment {
    /// Materializes the input slot vector for `graph`.
    ///
    /// Every signal the graph declares must be assigned with exactly its
    /// declared length, and every assigned name must be declared. All checks
    /// run before the slot vector is allocated; a rejected assignment
    /// reserves nothing. Slot 0 is set to one, every other slot takes its
    /// value from its signal.
    pub fn bind(&self, graph: &Graph) -> Result<Vec<Felt>, InputError> {
        for name in self.values.keys() {
            if graph.signal(name).is_none() {
                return Err(InputError::UnknownSignal(name.clone()));
            }
        }
        let mut pairs = Vec::with_capacity(graph.signals().len());
        for decl in graph.signals() {
            let values = self
                .values
                .get(&decl.name)
                .ok_or_else(|| InputError::MissingSignal(decl.name.clone()))?;
            if values.len() != decl.len {
                return Err(InputError::SignalCount {
                    signal: decl.name.clone(),
                    expected: decl.len as u64,
                    got: values.len(),
                });
            }
            pairs.push((decl, values));
        }

        let field = graph.field();
        let mut slots = vec![field.zero(); graph.n_inputs()];
        slots[0] = field.one();
        for (decl, values) in pairs {
            let range = &mut slots[decl.offset..decl.offset + decl.len];
            for (slot, value) in range.iter_mut().zip(values) {
                *slot = field.felt_from_signed(value);
            }
        }
        Ok(slots)
    }
}
