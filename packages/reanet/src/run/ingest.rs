use crate::graph::graft::{graft_at_root, graft_sample};
use crate::graph::network::Network;
use crate::io::fs::read_file_to_string;
use crate::io::mutations_csv::MutationsTableReader;
use eyre::{Report, WrapErr};
use log::info;
use std::path::Path;

/// Builds the network from mutations-table text. The header fixes the segment
/// list; the first data row is grafted at the root, every later row through
/// the general grafter. The first error halts the ingest.
pub fn ingest_str(data: &str) -> Result<Network, Report> {
  let mut reader = MutationsTableReader::from_str(data)?;
  let mut network = Network::new(reader.segments().clone());

  let mut n_samples: usize = 0;
  while let Some(row) = reader.next_row()? {
    info!("Grafting '{}'", row.id);
    if n_samples == 0 {
      graft_at_root(&mut network, &row.id, &row.date, row.mutations)
    } else {
      graft_sample(&mut network, &row.id, &row.date, row.mutations)
    }
    .wrap_err_with(|| format!("When placing sample '{}' into the network", row.id))?;
    n_samples += 1;
  }

  info!(
    "Placed {n_samples} samples; the network has {} nodes",
    network.node_count()
  );
  Ok(network)
}

pub fn run_ingest(filepath: impl AsRef<Path>) -> Result<Network, Report> {
  let filepath = filepath.as_ref();
  let data = read_file_to_string(filepath)?;
  ingest_str(&data).wrap_err_with(|| format!("When ingesting mutations table {filepath:#?}"))
}
