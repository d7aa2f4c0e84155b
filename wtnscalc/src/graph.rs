//! Circuit graph blobs.
//!
//! A compiled circuit is a flat dataflow graph serialized as a little-endian
//! binary blob:
//!
//! ```text
//! magic    8 bytes   "wtnsgrph"
//! version  u32       currently 1
//! prime    u32 len, then len bytes LE
//! inputs   u64       input slot count, slot 0 holds the constant one
//! nodes    u64 count, then per node a tag byte:
//!            0  input     u64 slot
//!            1  constant  u32 len, then len bytes LE
//!            2  unary     u8 opcode, u64 operand
//!            3  binary    u8 opcode, u64 lhs, u64 rhs
//!            4  ternary   u8 opcode (0 = select), u64 cond, u64 then, u64 else
//! witness  u64 count, then count u64 node indices in witness order
//! signals  u32 count, then per signal u32 name len, the UTF-8 name,
//!            u64 slot offset, u64 slot count
//! ```
//!
//! Node operands always refer to earlier nodes, so a decoded graph is in
//! evaluation order by construction. Signal ranges partition the slots above
//! 0, so the declared input space is never wider than what the signal table
//! accounts for. [`Graph::parse`] rejects anything else; the evaluator never
//! bounds-checks.

use std::str;

use num_bigint::BigUint;

use crate::{
    error::{GraphError, MAX_INPUT_SLOTS},
    field::{Felt, Field},
};

pub const GRAPH_MAGIC: [u8; 8] = *b"wtnsgrph";
pub const GRAPH_VERSION: u32 = 1;

// Smallest possible encodings, used to bound count-driven allocations by the
// bytes actually present in the buffer.
const MIN_NODE_BYTES: usize = 5;
const WITNESS_ENTRY_BYTES: usize = 8;
const MIN_SIGNAL_BYTES: usize = 21;

//===----------------------------------------------------------------------===//
// Operations
//===----------------------------------------------------------------------===//

macro_rules! opcodes {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }
    };
}

opcodes! {
    /// Unary operations.
    pub enum UnoOp {
        Neg = 0,
        Id = 1,
        Lnot = 2,
    }
}

opcodes! {
    /// Binary operations. Comparisons use the signed-value convention and
    /// produce 0 or 1; `Idiv` and `Mod` act on the canonical residues.
    pub enum DuoOp {
        Add = 0,
        Sub = 1,
        Mul = 2,
        Div = 3,
        Pow = 4,
        Idiv = 5,
        Mod = 6,
        Eq = 7,
        Neq = 8,
        Lt = 9,
        Gt = 10,
        Leq = 11,
        Geq = 12,
        Land = 13,
        Lor = 14,
        Band = 15,
        Bor = 16,
        Bxor = 17,
        Shl = 18,
        Shr = 19,
    }
}

//===----------------------------------------------------------------------===//
// Graph
//===----------------------------------------------------------------------===//

/// One dataflow node. Operand indices point at earlier nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Reads an input slot.
    Input(usize),
    /// A constant, stored canonical.
    Const(Felt),
    Uno { op: UnoOp, a: usize },
    Duo { op: DuoOp, a: usize, b: usize },
    /// `cond != 0 ? then : other`.
    Tres { cond: usize, then: usize, other: usize },
}

/// A named run of input slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalDecl {
    pub name: String,
    pub offset: usize,
    pub len: usize,
}

/// A decoded and validated circuit graph.
#[derive(Clone, Debug)]
pub struct Graph {
    field: Field,
    n_inputs: usize,
    nodes: Vec<Node>,
    witness_map: Vec<usize>,
    signals: Vec<SignalDecl>,
}

impl Graph {
    /// Decodes a graph blob, validating every reference it contains.
    pub fn parse(bytes: &[u8]) -> Result<Self, GraphError> {
        let mut r = Reader::new(bytes);

        if r.take(8, "magic")? != GRAPH_MAGIC {
            return Err(GraphError::BadMagic);
        }
        let version = r.u32("version")?;
        if version != GRAPH_VERSION {
            return Err(GraphError::UnsupportedVersion(version));
        }

        let prime_len = r.u32("prime length")?;
        let prime = BigUint::from_bytes_le(r.take(prime_len as usize, "prime")?);
        if prime < 2usize.into() {
            return Err(GraphError::InvalidPrime);
        }
        let field = Field::new(prime);

        let n_inputs_raw = r.u64("input count")?;
        if n_inputs_raw == 0 {
            return Err(GraphError::NoInputs);
        }
        if n_inputs_raw > MAX_INPUT_SLOTS {
            return Err(GraphError::TooManyInputs(n_inputs_raw));
        }
        let n_inputs = n_inputs_raw as usize;

        let n_nodes = r.count64("node", MIN_NODE_BYTES)?;
        let mut nodes = Vec::with_capacity(n_nodes);
        for idx in 0..n_nodes {
            let tag = r.u8("node tag")?;
            let node = match tag {
                0 => {
                    let slot = r.u64("input slot")?;
                    if slot >= n_inputs_raw {
                        return Err(GraphError::InputSlotOutOfRange {
                            node: idx,
                            slot,
                            limit: n_inputs_raw,
                        });
                    }
                    Node::Input(slot as usize)
                }
                1 => {
                    let len = r.u32("constant length")?;
                    let raw = BigUint::from_bytes_le(r.take(len as usize, "constant")?);
                    Node::Const(field.felt(raw))
                }
                2 => {
                    let code = r.u8("unary opcode")?;
                    let op = UnoOp::from_code(code).ok_or(GraphError::UnknownOpcode {
                        node: idx,
                        kind: "unary",
                        code,
                    })?;
                    let a = r.operand(idx)?;
                    Node::Uno { op, a }
                }
                3 => {
                    let code = r.u8("binary opcode")?;
                    let op = DuoOp::from_code(code).ok_or(GraphError::UnknownOpcode {
                        node: idx,
                        kind: "binary",
                        code,
                    })?;
                    let a = r.operand(idx)?;
                    let b = r.operand(idx)?;
                    Node::Duo { op, a, b }
                }
                4 => {
                    let code = r.u8("ternary opcode")?;
                    if code != 0 {
                        return Err(GraphError::UnknownOpcode {
                            node: idx,
                            kind: "ternary",
                            code,
                        });
                    }
                    let cond = r.operand(idx)?;
                    let then = r.operand(idx)?;
                    let other = r.operand(idx)?;
                    Node::Tres { cond, then, other }
                }
                tag => return Err(GraphError::UnknownTag { node: idx, tag }),
            };
            nodes.push(node);
        }

        let n_witness = r.count64("witness", WITNESS_ENTRY_BYTES)?;
        let mut witness_map = Vec::with_capacity(n_witness);
        for index in 0..n_witness {
            let node = r.u64("witness entry")?;
            if node >= nodes.len() as u64 {
                return Err(GraphError::WitnessOutOfRange { index, node });
            }
            witness_map.push(node as usize);
        }

        let n_signals = r.count32("signal", MIN_SIGNAL_BYTES)?;
        let mut signals: Vec<SignalDecl> = Vec::with_capacity(n_signals);
        for _ in 0..n_signals {
            let name_len = r.u32("signal name length")?;
            let name = str::from_utf8(r.take(name_len as usize, "signal name")?)
                .map_err(|_| GraphError::SignalNameEncoding)?;
            if name.is_empty() {
                return Err(GraphError::SignalNameEncoding);
            }
            if signals.iter().any(|s| s.name == name) {
                return Err(GraphError::DuplicateSignal(name.into()));
            }
            let offset = r.u64("signal offset")?;
            let len = r.u64("signal length")?;
            // Slot 0 is reserved for the constant one and may not be named.
            let end = offset.checked_add(len);
            if offset == 0 || len == 0 || end.is_none_or(|end| end > n_inputs_raw) {
                return Err(GraphError::SignalRangeInvalid {
                    name: name.into(),
                    offset,
                    len,
                });
            }
            for prior in &signals {
                let (po, pl) = (prior.offset as u64, prior.len as u64);
                if offset < po + pl && po < offset + len {
                    return Err(GraphError::SignalOverlap(prior.name.clone(), name.into()));
                }
            }
            signals.push(SignalDecl {
                name: name.into(),
                offset: offset as usize,
                len: len as usize,
            });
        }

        // Ranges are disjoint and inside [1, n_inputs), so full coverage of
        // the slots above 0 reduces to the lengths summing to n_inputs - 1.
        let covered: u64 = signals.iter().map(|s| s.len as u64).sum();
        if covered != n_inputs_raw - 1 {
            return Err(GraphError::UncoveredSlots(n_inputs_raw - 1 - covered));
        }

        match r.remaining() {
            0 => {
                log::debug!(
                    "parsed graph: {} nodes, {} witness values, {} signals, {}-bit prime",
                    nodes.len(),
                    witness_map.len(),
                    signals.len(),
                    field.prime().bits()
                );
                Ok(Self {
                    field,
                    n_inputs,
                    nodes,
                    witness_map,
                    signals,
                })
            }
            extra => Err(GraphError::TrailingBytes(extra)),
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Input slot count, including the constant-one slot 0.
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node indices in witness order.
    pub fn witness_map(&self) -> &[usize] {
        &self.witness_map
    }

    /// Declared input signals, in blob order.
    pub fn signals(&self) -> &[SignalDecl] {
        &self.signals
    }

    pub fn signal(&self, name: &str) -> Option<&SignalDecl> {
        self.signals.iter().find(|s| s.name == name)
    }
}

//===----------------------------------------------------------------------===//
// Reader
//===----------------------------------------------------------------------===//

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], GraphError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(GraphError::Truncated(what))?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, GraphError> {
        Ok(self.take(1, what)?[0])
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, GraphError> {
        let mut le = [0u8; 4];
        le.copy_from_slice(self.take(4, what)?);
        Ok(u32::from_le_bytes(le))
    }

    fn u64(&mut self, what: &'static str) -> Result<u64, GraphError> {
        let mut le = [0u8; 8];
        le.copy_from_slice(self.take(8, what)?);
        Ok(u64::from_le_bytes(le))
    }

    /// Reads a u64 element count and bounds it by the bytes left in the
    /// buffer, so `Vec::with_capacity` never outruns the input.
    fn count64(&mut self, what: &'static str, min_elem: usize) -> Result<usize, GraphError> {
        let count = self.u64(what)?;
        let count = usize::try_from(count).map_err(|_| GraphError::CountOverflow(what))?;
        if count > self.remaining() / min_elem {
            return Err(GraphError::Truncated(what));
        }
        Ok(count)
    }

    fn count32(&mut self, what: &'static str, min_elem: usize) -> Result<usize, GraphError> {
        let count = self.u32(what)? as usize;
        if count > self.remaining() / min_elem {
            return Err(GraphError::Truncated(what));
        }
        Ok(count)
    }

    /// Reads a node operand and checks it refers to an earlier node.
    fn operand(&mut self, node: usize) -> Result<usize, GraphError> {
        let operand = self.u64("operand")?;
        if operand >= node as u64 {
            return Err(GraphError::ForwardReference { node, operand });
        }
        Ok(operand as usize)
    }
}

//===----------------------------------------------------------------------===//
// GraphBuilder
//===----------------------------------------------------------------------===//

/// Builds graph blobs in memory.
///
/// Node methods return the index of the node they append; feed those indices
/// back in as operands. The builder performs no validation of its own, the
/// produced blob goes through [`Graph::parse`] like any other.
#[derive(Clone, Debug)]
pub struct GraphBuilder {
    prime: BigUint,
    n_inputs: u64,
    nodes: Vec<BuilderNode>,
    witness: Vec<u64>,
    signals: Vec<(String, u64, u64)>,
}

#[derive(Clone, Debug)]
enum BuilderNode {
    Input(u64),
    Const(BigUint),
    Uno(UnoOp, u64),
    Duo(DuoOp, u64, u64),
    Tres(u64, u64, u64),
}

impl GraphBuilder {
    /// Starts a graph over the given prime with `n_inputs` slots, slot 0
    /// being the constant one.
    pub fn new(prime: BigUint, n_inputs: u64) -> Self {
        Self {
            prime,
            n_inputs,
            nodes: Vec::new(),
            witness: Vec::new(),
            signals: Vec::new(),
        }
    }

    fn push(&mut self, node: BuilderNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn input(&mut self, slot: u64) -> usize {
        self.push(BuilderNode::Input(slot))
    }

    pub fn constant(&mut self, value: BigUint) -> usize {
        self.push(BuilderNode::Const(value))
    }

    pub fn uno(&mut self, op: UnoOp, a: usize) -> usize {
        self.push(BuilderNode::Uno(op, a as u64))
    }

    pub fn duo(&mut self, op: DuoOp, a: usize, b: usize) -> usize {
        self.push(BuilderNode::Duo(op, a as u64, b as u64))
    }

    pub fn select(&mut self, cond: usize, then: usize, other: usize) -> usize {
        self.push(BuilderNode::Tres(cond as u64, then as u64, other as u64))
    }

    /// Appends a node to the witness, in order.
    pub fn witness(&mut self, node: usize) {
        self.witness.push(node as u64);
    }

    pub fn signal(&mut self, name: impl Into<String>, offset: u64, len: u64) {
        self.signals.push((name.into(), offset, len));
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&GRAPH_MAGIC);
        push_u32(&mut out, GRAPH_VERSION);

        let prime = self.prime.to_bytes_le();
        push_u32(&mut out, prime.len() as u32);
        out.extend_from_slice(&prime);
        push_u64(&mut out, self.n_inputs);

        push_u64(&mut out, self.nodes.len() as u64);
        for node in &self.nodes {
            match node {
                BuilderNode::Input(slot) => {
                    out.push(0);
                    push_u64(&mut out, *slot);
                }
                BuilderNode::Const(value) => {
                    let bytes = value.to_bytes_le();
                    out.push(1);
                    push_u32(&mut out, bytes.len() as u32);
                    out.extend_from_slice(&bytes);
                }
                BuilderNode::Uno(op, a) => {
                    out.push(2);
                    out.push(op.code());
                    push_u64(&mut out, *a);
                }
                BuilderNode::Duo(op, a, b) => {
                    out.push(3);
                    out.push(op.code());
                    push_u64(&mut out, *a);
                    push_u64(&mut out, *b);
                }
                BuilderNode::Tres(cond, then, other) => {
                    out.push(4);
                    out.push(0);
                    push_u64(&mut out, *cond);
                    push_u64(&mut out, *then);
                    push_u64(&mut out, *other);
                }
            }
        }

        push_u64(&mut out, self.witness.len() as u64);
        for node in &self.witness {
            push_u64(&mut out, *node);
        }

        push_u32(&mut out, self.signals.len() as u32);
        for (name, offset, len) in &self.signals {
            push_u32(&mut out, name.len() as u32);
            out.extend_from_slice(name.as_bytes());
            push_u64(&mut out, *offset);
            push_u64(&mut out, *len);
        }

        out
    }
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_graph() -> GraphBuilder {
        // witness = [1, a*b, a, b] over F_97
        let mut b = GraphBuilder::new(BigUint::from(97usize), 3);
        let one = b.input(0);
        let a = b.input(1);
        let bb = b.input(2);
        let prod = b.duo(DuoOp::Mul, a, bb);
        b.witness(one);
        b.witness(prod);
        b.witness(a);
        b.witness(bb);
        b.signal("in", 1, 2);
        b
    }

    #[test]
    fn builds_and_parses() {
        let g = Graph::parse(&small_graph().build()).unwrap();
        assert_eq!(g.n_inputs(), 3);
        assert_eq!(g.nodes().len(), 4);
        assert_eq!(g.witness_map(), &[0, 3, 1, 2]);
        assert_eq!(
            g.nodes()[3],
            Node::Duo {
                op: DuoOp::Mul,
                a: 1,
                b: 2
            }
        );
        let sig = g.signal("in").unwrap();
        assert_eq!((sig.offset, sig.len), (1, 2));
        assert!(g.signal("out").is_none());
        assert_eq!(*g.field().prime(), BigUint::from(97usize));
    }

    #[test]
    fn rejects_empty_and_foreign_buffers() {
        assert!(matches!(
            Graph::parse(&[]),
            Err(GraphError::Truncated("magic"))
        ));
        assert!(matches!(
            Graph::parse(b"not a graph blob at all"),
            Err(GraphError::BadMagic)
        ));
    }

    #[test]
    fn rejects_bad_version() {
        let mut blob = small_graph().build();
        blob[8] = 9;
        assert!(matches!(
            Graph::parse(&blob),
            Err(GraphError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn rejects_truncation_and_trailing_bytes() {
        let blob = small_graph().build();
        let cut = &blob[..blob.len() - 1];
        assert!(matches!(Graph::parse(cut), Err(GraphError::Truncated(_))));

        let mut extended = blob.clone();
        extended.push(0);
        assert!(matches!(
            Graph::parse(&extended),
            Err(GraphError::TrailingBytes(1))
        ));
    }

    #[test]
    fn rejects_degenerate_primes() {
        for prime in [0usize, 1] {
            let b = GraphBuilder::new(BigUint::from(prime), 1);
            assert!(matches!(
                Graph::parse(&b.build()),
                Err(GraphError::InvalidPrime)
            ));
        }
    }

    #[test]
    fn rejects_zero_input_slots() {
        let b = GraphBuilder::new(BigUint::from(97usize), 0);
        assert!(matches!(Graph::parse(&b.build()), Err(GraphError::NoInputs)));
    }

    #[test]
    fn input_slot_count_is_capped() {
        // Parse does no per-slot work, so the at-cap case stays cheap.
        let mut b = GraphBuilder::new(BigUint::from(97usize), MAX_INPUT_SLOTS);
        b.signal("in", 1, MAX_INPUT_SLOTS - 1);
        let g = Graph::parse(&b.build()).unwrap();
        assert_eq!(g.n_inputs() as u64, MAX_INPUT_SLOTS);

        let mut b = GraphBuilder::new(BigUint::from(97usize), MAX_INPUT_SLOTS + 1);
        b.signal("in", 1, MAX_INPUT_SLOTS);
        assert!(matches!(
            Graph::parse(&b.build()),
            Err(GraphError::TooManyInputs(n)) if n == MAX_INPUT_SLOTS + 1
        ));
    }

    #[test]
    fn rejects_forward_references() {
        let mut b = GraphBuilder::new(BigUint::from(97usize), 1);
        // Node 0 referring to itself is the smallest forward reference.
        b.duo(DuoOp::Add, 0, 0);
        assert!(matches!(
            Graph::parse(&b.build()),
            Err(GraphError::ForwardReference {
                node: 0,
                operand: 0
            })
        ));
    }

    #[test]
    fn rejects_out_of_range_input_slot() {
        let mut b = GraphBuilder::new(BigUint::from(97usize), 2);
        b.input(5);
        assert!(matches!(
            Graph::parse(&b.build()),
            Err(GraphError::InputSlotOutOfRange {
                node: 0,
                slot: 5,
                limit: 2
            })
        ));
    }

    #[test]
    fn rejects_unknown_tags_and_opcodes() {
        let mut b = small_graph();
        b.uno(UnoOp::Neg, 0);
        let mut blob = b.build();
        // The 10-byte unary node [tag, opcode, operand] sits right before
        // the 40-byte witness section and the 26-byte signal section.
        let node_start = blob.len() - (8 + 4 * 8) - (4 + 4 + 2 + 16) - 10;
        blob[node_start] = 9;
        assert!(matches!(
            Graph::parse(&blob),
            Err(GraphError::UnknownTag { node: 4, tag: 9 })
        ));
        blob[node_start] = 2;
        blob[node_start + 1] = 77;
        assert!(matches!(
            Graph::parse(&blob),
            Err(GraphError::UnknownOpcode {
                node: 4,
                kind: "unary",
                code: 77
            })
        ));
    }

    #[test]
    fn rejects_witness_entries_past_the_nodes() {
        let mut b = GraphBuilder::new(BigUint::from(97usize), 1);
        b.input(0);
        b.witness(7);
        assert!(matches!(
            Graph::parse(&b.build()),
            Err(GraphError::WitnessOutOfRange { index: 0, node: 7 })
        ));
    }

    #[test]
    fn rejects_bad_signal_tables() {
        let mut b = small_graph();
        b.signal("in", 1, 1);
        assert!(matches!(
            Graph::parse(&b.build()),
            Err(GraphError::DuplicateSignal(name)) if name == "in"
        ));

        let mut b = small_graph();
        b.signal("also", 2, 1);
        assert!(matches!(
            Graph::parse(&b.build()),
            Err(GraphError::SignalOverlap(a, c)) if a == "in" && c == "also"
        ));

        for (offset, len) in [(0u64, 1u64), (1, 0), (2, 2)] {
            let mut b = GraphBuilder::new(BigUint::from(97usize), 3);
            b.signal("sig", offset, len);
            assert!(matches!(
                Graph::parse(&b.build()),
                Err(GraphError::SignalRangeInvalid { .. })
            ));
        }
    }

    #[test]
    fn rejects_uncovered_input_slots() {
        // Slot 2 is declared but belongs to no signal.
        let mut b = GraphBuilder::new(BigUint::from(97usize), 3);
        b.input(1);
        b.signal("a", 1, 1);
        assert!(matches!(
            Graph::parse(&b.build()),
            Err(GraphError::UncoveredSlots(1))
        ));

        // An empty signal table only works for the constant slot.
        let b = GraphBuilder::new(BigUint::from(97usize), 2);
        assert!(matches!(
            Graph::parse(&b.build()),
            Err(GraphError::UncoveredSlots(1))
        ));
    }

    #[test]
    fn rejects_non_utf8_signal_names() {
        let mut b = GraphBuilder::new(BigUint::from(97usize), 2);
        b.signal("x", 1, 1);
        let mut blob = b.build();
        // The name "x" sits just before the two trailing u64 range fields.
        let pos = blob.len() - 17;
        assert_eq!(blob[pos], b'x');
        blob[pos] = 0xff;
        assert!(matches!(
            Graph::parse(&blob),
            Err(GraphError::SignalNameEncoding)
        ));
    }

    #[test]
    fn count_fields_cannot_outrun_the_buffer() {
        // A header that promises u64::MAX nodes but carries none.
        let mut b = GraphBuilder::new(BigUint::from(97usize), 1);
        b.input(0);
        let mut blob = b.build();
        let nodes_count_at = 8 + 4 + 4 + 1 + 8;
        blob[nodes_count_at..nodes_count_at + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            Graph::parse(&blob),
            Err(GraphError::Truncated("node") | GraphError::CountOverflow("node"))
        ));
    }
}
