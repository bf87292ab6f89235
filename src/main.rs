use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fs;
use std::time::Instant;

use clap::{value_parser, Arg, ArgMatches, Command};
use log::{debug, error, info};

use rzxcz::compiler::{CircuitExpander, CircuitReducer, CompileError, DecompositionTable};
use rzxcz::quantum::gate::format_matrix;
use rzxcz::quantum::{equivalent_up_to_phase, source_unitary, CircuitBuilder, GateOccurrence, StandardGate};
use rzxcz::synthesis::{config_from_seed, round2, Synthesizer};

/// Entry-wise tolerance for `--check`; angles are rounded to two decimals
const CHECK_TOLERANCE: f64 = 0.05;

fn main() {
    let matches = build_command().get_matches();

    if matches.get_flag("verbose") {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::init();
    }

    if let Err(e) = run(&matches) {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn build_command() -> Command {
    Command::new("rzxcz")
        .about("Compile a quantum circuit to the {Rx, Rz, CZ} gate set")
        .arg(Arg::new("circuit").help("JSON circuit file, e.g. [[\"H\", 0], [\"CNOT\", 1, 0]]"))
        .arg(Arg::new("table").long("table").help("Load the decomposition table from this JSON file"))
        .arg(
            Arg::new("save-table")
                .long("save-table")
                .help("Write the decomposition table to this JSON file"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .short('s')
                .default_value("1")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Verify the output unitary against the input circuit")
                .action(clap::ArgAction::SetTrue),
        )
}

/// I0 H0 X0 Y1 Z1 Rx(3.14)0 Rz(0.79)0 CZ(0,1) CNOT(1,0) Ry(1.57)0
fn demo_circuit() -> Vec<GateOccurrence> {
    CircuitBuilder::new()
        .i(0)
        .h(0)
        .x(0)
        .y(1)
        .z(1)
        .rx(round2(PI), 0)
        .rz(round2(FRAC_PI_4), 0)
        .cz(0, 1)
        .cnot(1, 0)
        .ry(round2(FRAC_PI_2), 0)
        .build()
}

fn run(matches: &ArgMatches) -> Result<(), CompileError> {
    let start = Instant::now();
    let seed = *matches.get_one::<u64>("seed").unwrap_or(&1);
    let config = config_from_seed(seed);

    let mut table = match matches.get_one::<String>("table") {
        Some(path) => DecompositionTable::load(path)?,
        None => DecompositionTable::with_defaults(),
    };
    table.populate(&StandardGate::SINGLE_QUBIT, &config)?;
    info!("decomposition table ready with {} gates", table.len());

    if let Some(path) = matches.get_one::<String>("save-table") {
        table.save(path)?;
        info!("decomposition table written to {}", path);
    }

    let input: Vec<GateOccurrence> = match matches.get_one::<String>("circuit") {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => demo_circuit(),
    };

    println!("Input circuit ({} gates):", input.len());
    for occurrence in &input {
        println!("  {}", occurrence);
    }

    let mut synthesizer = Synthesizer::new(config);
    let expanded = CircuitExpander::new(&table, &mut synthesizer).expand(&input)?;
    println!("\nExpanded circuit ({} gates):", expanded.len());
    print!("{}", expanded);

    let reduced = CircuitReducer::default().reduce(&expanded);
    println!("\nReduced circuit ({} gates):", reduced.len());
    print!("{}", reduced);

    if matches.get_flag("check") {
        let qubit_count = input
            .iter()
            .flat_map(|o| o.qubits())
            .max()
            .map_or(1, |q| q + 1);
        let verdict = match (source_unitary(&input, qubit_count), reduced.unitary(qubit_count)) {
            (Some(source), Some(output)) if equivalent_up_to_phase(&source, &output, CHECK_TOLERANCE) => "equivalent",
            (Some(source), Some(output)) => {
                debug!("input unitary:\n{}", format_matrix(&source));
                debug!("output unitary:\n{}", format_matrix(&output));
                "NOT equivalent"
            }
            _ => "not checkable",
        };
        println!("\nCheck: output is {} to the input up to global phase", verdict);
    }

    info!("Elapsed time: {:.3?}", start.elapsed());
    Ok(())
}
