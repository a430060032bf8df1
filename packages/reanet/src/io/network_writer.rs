use crate::graph::network::Network;
use crate::io::fs::create_file;
use eyre::{Report, WrapErr};
use itertools::Itertools;
use std::io::Write;
use std::path::Path;

/// Renders the network dump: node names, one edge line per non-root node, and
/// the mutation totals. Nodes and edges appear in lexicographic name order;
/// every segment is listed on every edge line, empty sets as `[]`.
pub fn format_network_text(network: &Network) -> String {
  let mut out = String::new();

  out.push_str("Network Nodes:\n");
  for key in network.iter_keys_by_name() {
    out.push_str(network.get_node(key).name());
    out.push('\n');
  }

  out.push_str("Network Edges:\n");
  for key in network.iter_keys_by_name() {
    let node = network.get_node(key);
    // A reassortment junction has one line; its start is the first
    // per-segment parent in segment order. Junction inbound edges carry no
    // mutations, the JSON dump lists them all.
    let parents = node.parents();
    let Some(start) = parents.first() else {
      continue;
    };
    let mutations = network
      .segments()
      .iter()
      .zip(node.branch_mutations().iter())
      .map(|(segment, muts)| format!("{segment}:[{}]", muts.iter().join(", ")))
      .join(" ");
    out.push_str(&format!(
      "Start: {} End: {} Mutations: {mutations}\n",
      network.get_node(*start).name(),
      node.name()
    ));
  }

  let counts = network.count_branch_mutations();
  out.push_str(&format!("Total number of mutations: {}\n", counts.total));
  for (segment, count) in network.segments().iter().zip(&counts.per_segment) {
    out.push_str(&format!("Number of mutations in segment {segment} is {count}\n"));
  }

  out
}

pub fn network_write_text(network: &Network, filepath: impl AsRef<Path>) -> Result<(), Report> {
  let filepath = filepath.as_ref();
  let mut file = create_file(filepath)?;
  file
    .write_all(format_network_text(network).as_bytes())
    .wrap_err_with(|| format!("When writing network to {filepath:#?}"))
}
