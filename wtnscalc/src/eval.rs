//! Graph evaluation.

use std::cmp::Ordering;

use crate::{
    error::EvalError,
    field::{Felt, Field},
    graph::{DuoOp, Graph, Node, UnoOp},
};

/// Propagates the input slots through the graph and returns the witness
/// values in witness order.
///
/// `slots` must be the slot vector produced by
/// [`InputAssignment::bind`](crate::inputs::InputAssignment::bind) for this
/// graph; its length has to match [`Graph::n_inputs`].
pub fn witness(graph: &Graph, slots: &[Felt]) -> Result<Vec<Felt>, EvalError> {
    debug_assert_eq!(slots.len(), graph.n_inputs());
    let values = node_values(graph, slots)?;
    log::debug!(
        "evaluated {} nodes into {} witness values",
        values.len(),
        graph.witness_map().len()
    );
    Ok(graph
        .witness_map()
        .iter()
        .map(|&node| values[node].clone())
        .collect())
}

// Nodes are stored in evaluation order, so one forward pass suffices.
fn node_values(graph: &Graph, slots: &[Felt]) -> Result<Vec<Felt>, EvalError> {
    let f = graph.field();
    let mut values: Vec<Felt> = Vec::with_capacity(graph.nodes().len());
    for (idx, node) in graph.nodes().iter().enumerate() {
        let value = match node {
            Node::Input(slot) => slots[*slot].clone(),
            Node::Const(c) => c.clone(),
            Node::Uno { op, a } => uno(f, *op, &values[*a]),
            Node::Duo { op, a, b } => duo(f, *op, &values[*a], &values[*b], idx)?,
            Node::Tres { cond, then, other } => {
                if f.is_true(&values[*cond]) {
                    values[*then].clone()
                } else {
                    values[*other].clone()
                }
            }
        };
        values.push(value);
    }
    Ok(values)
}

fn uno(f: &Field, op: UnoOp, a: &Felt) -> Felt {
    match op {
        UnoOp::Neg => f.neg(a),
        UnoOp::Id => a.clone(),
        UnoOp::Lnot => f.bool_felt(!f.is_true(a)),
    }
}

fn duo(f: &Field, op: DuoOp, a: &Felt, b: &Felt, node: usize) -> Result<Felt, EvalError> {
    Ok(match op {
        DuoOp::Add => f.add(a, b),
        DuoOp::Sub => f.sub(a, b),
        DuoOp::Mul => f.mul(a, b),
        DuoOp::Div => f.div(a, b).ok_or(EvalError::DivisionByZero(node))?,
        DuoOp::Pow => f.pow(a, b),
        DuoOp::Idiv => f.int_div(a, b).ok_or(EvalError::DivisionByZero(node))?,
        DuoOp::Mod => f.rem(a, b).ok_or(EvalError::DivisionByZero(node))?,
        DuoOp::Eq => f.bool_felt(a == b),
        DuoOp::Neq => f.bool_felt(a != b),
        DuoOp::Lt => f.bool_felt(f.cmp_signed(a, b) == Ordering::Less),
        DuoOp::Gt => f.bool_felt(f.cmp_signed(a, b) == Ordering::Greater),
        DuoOp::Leq => f.bool_felt(f.cmp_signed(a, b) != Ordering::Greater),
        DuoOp::Geq => f.bool_felt(f.cmp_signed(a, b) != Ordering::Less),
        DuoOp::Land => f.bool_felt(f.is_true(a) && f.is_true(b)),
        DuoOp::Lor => f.bool_felt(f.is_true(a) || f.is_true(b)),
        DuoOp::Band => f.band(a, b),
        DuoOp::Bor => f.bor(a, b),
        DuoOp::Bxor => f.bxor(a, b),
        DuoOp::Shl => f.shl(a, b),
        DuoOp::Shr => f.shr(a, b),
    })
}
