//! Ready-made circuit graphs over the BN254 scalar field.
//!
//! These are small, hand-built graphs for tests, benchmarks and demos; real
//! deployments load compiled graph blobs from disk instead.

use num_bigint::BigUint;
use wtnscalc::graph::{DuoOp, GraphBuilder};

lazy_static::lazy_static! {
    /// Scalar field prime of the BN254 curve, the field circom targets by
    /// default.
    pub static ref BN254_PRIME: BigUint = BigUint::parse_bytes(
        b"21888242871839275222246405745257275088548364400416034343698204186575808495617",
        10,
    )
    .unwrap();
}

/// Two-input multiplier. Witness `[1, a*b, a, b]`; signal `in` holds `[a, b]`.
pub fn multiplier2() -> Vec<u8> {
    let mut b = GraphBuilder::new(BN254_PRIME.clone(), 3);
    let one = b.input(0);
    let a = b.input(1);
    let bb = b.input(2);
    let prod = b.duo(DuoOp::Mul, a, bb);
    b.witness(one);
    b.witness(prod);
    b.witness(a);
    b.witness(bb);
    b.signal("in", 1, 2);
    b.build()
}

/// Sum of `n` squares, `n >= 1`. Witness `[1, sum, x1, .., xn]`; signal `in`
/// holds the `x` values.
pub fn sum_of_squares(n: u64) -> Vec<u8> {
    let mut b = GraphBuilder::new(BN254_PRIME.clone(), n + 1);
    let one = b.input(0);
    let xs: Vec<usize> = (1..=n).map(|slot| b.input(slot)).collect();
    let mut acc = None;
    for &x in &xs {
        let square = b.duo(DuoOp::Mul, x, x);
        acc = Some(match acc {
            None => square,
            Some(prev) => b.duo(DuoOp::Add, prev, square),
        });
    }
    b.witness(one);
    if let Some(sum) = acc {
        b.witness(sum);
    }
    for &x in &xs {
        b.witness(x);
    }
    b.signal("in", 1, n);
    b.build()
}

/// Signed comparator. Witness `[1, a<b, max(a,b), a, b]` with signals `a`
/// and `b`, one slot each.
pub fn comparator() -> Vec<u8> {
    let mut b = GraphBuilder::new(BN254_PRIME.clone(), 3);
    let one = b.input(0);
    let a = b.input(1);
    let bb = b.input(2);
    let lt = b.duo(DuoOp::Lt, a, bb);
    let max = b.select(lt, bb, a);
    b.witness(one);
    b.witness(lt);
    b.witness(max);
    b.witness(a);
    b.witness(bb);
    b.signal("a", 1, 1);
    b.signal("b", 2, 1);
    b.build()
}
