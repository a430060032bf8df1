use crate::graph::network::Network;
use crate::graph::node::{Inbound, NodeKey};
use crate::io::fs::create_file;
use eyre::{Report, WrapErr};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Machine-readable form of the network. Unlike the text dump, every inbound
/// edge of a reassortment junction is listed, tagged with the segments it
/// covers.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkJson {
  pub segments: Vec<String>,
  pub nodes: Vec<NodeJson>,
  pub edges: Vec<EdgeJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeJson {
  pub name: String,
  pub date: String,
  pub reassortment: bool,
  pub sample_mutations: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeJson {
  pub start: String,
  pub end: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub segments: Option<Vec<String>>,
  pub mutations: BTreeMap<String, Vec<String>>,
}

fn mutations_map(network: &Network, key: NodeKey, sample: bool) -> BTreeMap<String, Vec<String>> {
  let node = network.get_node(key);
  let sets = if sample {
    node.sample_mutations()
  } else {
    node.branch_mutations()
  };
  network
    .segments()
    .iter()
    .zip(sets.iter())
    .map(|(segment, muts)| (segment.to_owned(), muts.iter().cloned().collect()))
    .collect()
}

pub fn network_to_json(network: &Network) -> NetworkJson {
  let mut nodes = Vec::new();
  let mut edges = Vec::new();

  for key in network.iter_keys_by_name() {
    let node = network.get_node(key);
    nodes.push(NodeJson {
      name: node.name().to_owned(),
      date: node.date().to_owned(),
      reassortment: node.is_reassortment(),
      sample_mutations: mutations_map(network, key, true),
    });

    match node.inbound() {
      Inbound::Detached => {}
      Inbound::Single(parent) => edges.push(EdgeJson {
        start: network.get_node(*parent).name().to_owned(),
        end: node.name().to_owned(),
        segments: None,
        mutations: mutations_map(network, key, false),
      }),
      Inbound::PerSegment(_) => {
        for parent in node.parents() {
          let covered: Vec<String> = (0..network.segments().len())
            .filter(|&segment| node.parent_for_segment(segment) == Some(parent))
            .map(|segment| network.segments().name(segment).to_owned())
            .collect();
          edges.push(EdgeJson {
            start: network.get_node(parent).name().to_owned(),
            end: node.name().to_owned(),
            segments: Some(covered),
            mutations: BTreeMap::new(),
          });
        }
      }
    }
  }

  NetworkJson {
    segments: network.segments().iter().map(str::to_owned).collect(),
    nodes,
    edges,
  }
}

pub fn network_write_json(network: &Network, filepath: impl AsRef<Path>) -> Result<(), Report> {
  let filepath = filepath.as_ref();
  let file = create_file(filepath)?;
  serde_json::to_writer_pretty(file, &network_to_json(network))
    .wrap_err_with(|| format!("When writing network JSON to {filepath:#?}"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::graft::{graft_at_root, graft_sample};
  use crate::graph::mutations::SegmentMutations;
  use crate::graph::segments::Segments;
  use crate::io::mutations_csv::parse_mutation_list;
  use pretty_assertions::assert_eq;

  fn muts(s1: &str, s2: &str) -> SegmentMutations {
    SegmentMutations::from_sets(vec![parse_mutation_list(s1), parse_mutation_list(s2)])
  }

  #[test]
  fn lists_every_junction_inbound_edge_with_its_segments() {
    let mut net = Network::new(Segments::new(["S1", "S2"]));
    graft_at_root(&mut net, "A", "2001-01-01", muts("x1", "y1")).unwrap();
    graft_sample(&mut net, "B", "2001-02-01", muts("x1:x2", "y1:y2")).unwrap();
    graft_sample(&mut net, "D", "2001-03-01", muts("x1:x2", "y1")).unwrap();

    let json = network_to_json(&net);
    assert_eq!(json.segments, vec!["S1".to_owned(), "S2".to_owned()]);

    let junction = json.nodes.iter().find(|n| n.name == "R_1").unwrap();
    assert!(junction.reassortment);

    let inbound: Vec<&EdgeJson> = json.edges.iter().filter(|e| e.end == "R_1").collect();
    assert_eq!(inbound.len(), 2);
    assert_eq!(inbound[0].start, "H_2_R_1");
    assert_eq!(inbound[0].segments, Some(vec!["S1".to_owned()]));
    assert_eq!(inbound[1].start, "H_3_R_1");
    assert_eq!(inbound[1].segments, Some(vec!["S2".to_owned()]));
  }

  #[test]
  fn serializes_plain_edges_without_segment_tags() {
    let mut net = Network::new(Segments::new(["S1", "S2"]));
    graft_at_root(&mut net, "A", "2001-01-01", muts("x1", "y1")).unwrap();

    let json = network_to_json(&net);
    let edge = json.edges.iter().find(|e| e.end == "A").unwrap();
    assert_eq!(edge.start, "Root");
    assert_eq!(edge.segments, None);
    assert_eq!(edge.mutations["S1"], vec!["x1".to_owned()]);

    let text = serde_json::to_string(&json).unwrap();
    assert!(!text.contains("\"segments\":null"));
  }
}
