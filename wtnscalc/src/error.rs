//! Error types.

use thiserror::Error;

/// Upper bound on the number of input slots a graph may declare.
///
/// The slot count is a bare integer in the graph header, and this ceiling
/// alone does not bound memory: the real guarantee is that every slot above
/// 0 must belong to a declared signal ([`GraphError::UncoveredSlots`]) and
/// that binding validates per-signal value counts before the slot vector is
/// allocated. Memory therefore tracks the caller's input document, never a
/// bare header count. 2^28 slots is far beyond any circuit this engine is
/// used with.
pub const MAX_INPUT_SLOTS: u64 = 1 << 28;

/// Error raised while decoding or validating a circuit graph blob.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The blob ended in the middle of the named field.
    #[error("unexpected end of graph data while reading {0}")]
    Truncated(&'static str),
    /// The blob does not start with the graph magic bytes.
    #[error("bad magic bytes, not a circuit graph")]
    BadMagic,
    /// The blob's format version is not understood by this engine.
    #[error("unsupported graph version {0}")]
    UnsupportedVersion(u32),
    /// The prime field modulus is empty, zero or one.
    #[error("invalid field prime")]
    InvalidPrime,
    /// The graph declares no input slots; slot 0 must exist to hold the
    /// constant one.
    #[error("graph declares no input slots")]
    NoInputs,
    /// More input slots than [`MAX_INPUT_SLOTS`].
    #[error("graph declares {0} input slots, more than the supported maximum")]
    TooManyInputs(u64),
    /// A count field does not fit in this platform's address space.
    #[error("graph {0} count does not fit in memory on this platform")]
    CountOverflow(&'static str),
    /// A node tag byte is unknown.
    #[error("node {node}: unknown node tag {tag}")]
    UnknownTag { node: usize, tag: u8 },
    /// An opcode byte is unknown for its node kind.
    #[error("node {node}: unknown {kind} opcode {code}")]
    UnknownOpcode {
        node: usize,
        kind: &'static str,
        code: u8,
    },
    /// A node operand refers to itself or a later node.
    #[error("node {node}: operand {operand} is not an earlier node")]
    ForwardReference { node: usize, operand: u64 },
    /// An input node reads a slot outside the declared input space.
    #[error("node {node}: input slot {slot} out of range (graph has {limit})")]
    InputSlotOutOfRange { node: usize, slot: u64, limit: u64 },
    /// A witness map entry refers to a node that does not exist.
    #[error("witness entry {index} refers to missing node {node}")]
    WitnessOutOfRange { index: usize, node: u64 },
    /// An input signal name is empty or not valid UTF-8.
    #[error("input signal name is empty or not valid UTF-8")]
    SignalNameEncoding,
    /// The same input signal name appears twice.
    #[error("input signal {0:?} declared twice")]
    DuplicateSignal(String),
    /// An input signal range is empty, covers slot 0 or exceeds the slot count.
    #[error("input signal {name:?}: slot range [{offset}, {offset}+{len}) is invalid")]
    SignalRangeInvalid { name: String, offset: u64, len: u64 },
    /// Two input signal ranges overlap.
    #[error("input signals {0:?} and {1:?} overlap")]
    SignalOverlap(String, String),
    /// Some slots above 0 belong to no signal; the declared slot space must
    /// be fully accounted for by the signal table.
    #[error("{0} input slot(s) not covered by any signal")]
    UncoveredSlots(u64),
    /// Bytes remain after the last expected field.
    #[error("{0} trailing byte(s) after graph data")]
    TrailingBytes(usize),
}

/// Error raised while decoding the input assignment JSON or binding it to a
/// graph's declared input signals.
#[derive(Error, Debug)]
pub enum InputError {
    /// The buffer is not valid JSON.
    #[error("inputs are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON root is not an object.
    #[error("input root must be a JSON object mapping signal names to values")]
    NotAnObject,
    /// A value is a boolean, null or nested object.
    #[error("signal {0:?}: unsupported JSON value, expected number, string or array")]
    UnsupportedValue(String),
    /// A JSON number is fractional or too large for a JSON integer.
    #[error("signal {0:?}: non-integer number (values above 2^64 must be quoted strings)")]
    NonInteger(String),
    /// A string value did not parse as a decimal or 0x-prefixed hex integer.
    #[error("signal {signal:?}: cannot parse {text:?} as a field value")]
    BadNumberText { signal: String, text: String },
    /// The assignment names a signal the graph does not declare.
    #[error("unknown input signal {0:?}")]
    UnknownSignal(String),
    /// The assignment has the wrong number of values for a signal.
    #[error("signal {signal:?}: expected {expected} value(s), got {got}")]
    SignalCount {
        signal: String,
        expected: u64,
        got: usize,
    },
    /// A signal declared by the graph has no assignment.
    #[error("missing input signal {0:?}")]
    MissingSignal(String),
}

/// Error raised while propagating signals through the graph.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Division, integer division, modulo or inversion by zero.
    #[error("node {0}: division by zero")]
    DivisionByZero(usize),
}

/// Top-level witness calculation error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed circuit graph: {0}")]
    Graph(#[from] GraphError),
    #[error("invalid input assignment: {0}")]
    Input(#[from] InputError),
    #[error("witness evaluation failed: {0}")]
    Eval(#[from] EvalError),
}
