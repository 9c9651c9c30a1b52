//! Command-line driver: parses arguments, configures logging, and runs the
//! distributed simulation with its serial cross-check.

use clap::Parser;
use red_blue::SimConfig;
use red_blue::engine::runner;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "red_blue",
    version,
    about = "Distributed red/blue cellular automaton"
)]
struct Args {
    /// Grid side length.
    #[arg(short = 'n', long = "gridsize")]
    gridsize: usize,

    /// Tile side length in cells; must divide the grid size.
    #[arg(short = 't', long = "tilesize")]
    tilesize: usize,

    /// Percentage of one color that finishes a tile, 1-100.
    #[arg(short = 'c', long = "threshold")]
    threshold: u32,

    /// Iteration cap.
    #[arg(short = 'm', long = "max_iters")]
    max_iters: u32,

    /// Chattier logging.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Pretty-print the initial and final grids.
    #[arg(short = 'p', long = "print")]
    print: bool,

    /// Total rank count including the coordinator.
    #[arg(long = "procs", default_value_t = 4)]
    procs: usize,

    /// Seed for the initial grid; random when omitted.
    #[arg(long = "seed")]
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = SimConfig {
        grid_size: args.gridsize,
        tile_size: args.tilesize,
        threshold: args.threshold,
        max_iters: args.max_iters,
        procs: args.procs,
        seed: args.seed,
        verbose: args.verbose,
        print: args.print,
    };

    if let Err(err) = runner::run(&config) {
        eprintln!("Error {}: {err}", err.exit_code());
        std::process::exit(err.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
