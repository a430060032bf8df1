use clap::{Parser, ValueHint};
use ctor::ctor;
use eyre::{Report, WrapErr};
use log::{info, LevelFilter};
use reanet::io::network_json::network_write_json;
use reanet::io::network_writer::network_write_text;
use reanet::run::ingest::run_ingest;
use reanet::utils::global_init::{global_init, setup_logger};
use std::path::PathBuf;

#[ctor]
fn init() {
  global_init();
}

/// Incrementally builds a phylogenetic reassortment network for
/// segmented-genome viruses from a table of dated, per-segment mutation
/// profiles.
#[derive(Parser, Debug)]
#[clap(name = "reanet")]
#[clap(author, version)]
pub struct ReanetArgs {
  /// Path to the input mutations table.
  ///
  /// A comma-separated file with header `date,id,<segments>`; each segment
  /// field of a data row is a colon-separated list of mutation tokens.
  #[clap(long, short = 'm')]
  #[clap(value_hint = ValueHint::FilePath)]
  pub mutations: PathBuf,

  /// Path to the output network dump.
  ///
  /// If the required directory tree does not exist, it will be created.
  #[clap(long, short = 'n')]
  #[clap(value_hint = ValueHint::AnyPath)]
  pub network: PathBuf,

  /// Path to an optional machine-readable JSON dump of the network.
  #[clap(long)]
  #[clap(value_hint = ValueHint::AnyPath)]
  pub output_json: Option<PathBuf>,

  /// Set verbosity level of console output
  #[clap(long, conflicts_with = "silent")]
  pub verbosity: Option<LevelFilter>,

  /// Disable all console output. Same as --verbosity=off
  #[clap(long, conflicts_with = "verbosity")]
  pub silent: bool,
}

fn main() -> Result<(), Report> {
  let args = ReanetArgs::parse();

  let filter_level = if args.silent {
    LevelFilter::Off
  } else {
    args.verbosity.unwrap_or(LevelFilter::Info)
  };
  setup_logger(filter_level);

  let network = run_ingest(&args.mutations)?;

  network_write_text(&network, &args.network)
    .wrap_err_with(|| format!("When writing network dump {:#?}", args.network))?;

  if let Some(output_json) = &args.output_json {
    network_write_json(&network, output_json)
      .wrap_err_with(|| format!("When writing network JSON {output_json:#?}"))?;
  }

  let counts = network.count_branch_mutations();
  info!("Network has {} nodes", network.node_count());
  info!("Total number of mutations is {}", counts.total);
  for (segment, count) in network.segments().iter().zip(&counts.per_segment) {
    info!("Number of mutations in segment {segment} is {count}");
  }

  Ok(())
}
