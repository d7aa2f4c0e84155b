//! Command line front end for the witness calculator.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use wtnscalc::{calc_witness, graph::Graph};

#[derive(Parser, Debug)]
#[command(name = "wtnscalc", version, about)]
struct Cli {
    /// Log what the engine does while it runs.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate a witness from a circuit graph and a JSON input file.
    Calc {
        /// Compiled circuit graph.
        circuit: PathBuf,
        /// JSON input assignment.
        inputs: PathBuf,
        /// Where to write the witness file.
        #[arg(short, long, default_value = "out.wtns")]
        output: PathBuf,
    },
    /// Print a summary of a circuit graph.
    Info {
        /// Compiled circuit graph.
        circuit: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    match cli.command {
        Command::Calc {
            circuit,
            inputs,
            output,
        } => calc(&circuit, &inputs, &output),
        Command::Info { circuit } => info(&circuit),
    }
}

fn calc(circuit: &Path, inputs: &Path, output: &Path) -> Result<()> {
    let circuit_bytes = read(circuit)?;
    let input_bytes = read(inputs)?;
    let encoded = calc_witness(&circuit_bytes, &input_bytes)?;
    fs::write(output, &encoded)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("wrote {} ({} bytes)", output.display(), encoded.len());
    Ok(())
}

fn info(circuit: &Path) -> Result<()> {
    let graph = Graph::parse(&read(circuit)?)?;
    let prime = graph.field().prime();
    println!("prime:   {prime} ({} bits)", prime.bits());
    println!("inputs:  {} slots", graph.n_inputs());
    println!("nodes:   {}", graph.nodes().len());
    println!("witness: {} values", graph.witness_map().len());
    println!("signals:");
    for signal in graph.signals() {
        println!(
            "  {}  slots [{}..{}]",
            signal.name,
            signal.offset,
            signal.offset + signal.len
        );
    }
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}
