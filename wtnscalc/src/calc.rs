//! Witness calculation.

use crate::{error::Error, eval, graph::Graph, inputs, wtns};

/// Anything that turns a circuit artifact and a JSON input document into an
/// encoded witness file.
///
/// The trait is the seam between circuit-specific entry points and the
/// engine behind them; callers hold a calculator and never look inside the
/// artifact bytes.
pub trait WitnessCalculator {
    fn calc_witness(&self, circuit: &[u8], inputs: &[u8]) -> Result<Vec<u8>, Error>;
}

/// The graph-interpreting calculator: parses a graph blob, binds the inputs
/// and writes the witness file.
#[derive(Clone, Copy, Debug, Default)]
pub struct GraphCalculator;

impl WitnessCalculator for GraphCalculator {
    fn calc_witness(&self, circuit: &[u8], inputs: &[u8]) -> Result<Vec<u8>, Error> {
        let graph = Graph::parse(circuit)?;
        let assignment = inputs::parse(inputs)?;
        let slots = assignment.bind(&graph)?;
        let witness = eval::witness(&graph, &slots)?;
        let encoded = wtns::encode(graph.field().prime(), &witness);
        log::debug!(
            "circuit of {} bytes and inputs of {} bytes produced a {} byte witness",
            circuit.len(),
            inputs.len(),
            encoded.len()
        );
        Ok(encoded)
    }
}

/// One-shot calculation with the default [`GraphCalculator`].
pub fn calc_witness(circuit: &[u8], inputs: &[u8]) -> Result<Vec<u8>, Error> {
    GraphCalculator.calc_witness(circuit, inputs)
}
