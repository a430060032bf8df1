use crate::graph::mutations::SegmentMutations;
use crate::graph::node::{Node, NodeKey};
use crate::graph::segments::Segments;
use crate::utils::error::NetworkError;
use std::collections::BTreeMap;

pub const ROOT_NAME: &str = "Root";

/// Branch-mutation totals over the whole network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationCounts {
  pub total: usize,
  pub per_segment: Vec<usize>,
}

/// The reassortment network. Owns every node in an arena; all edges are
/// `NodeKey` indices into it. Node names are unique and looked up through an
/// ordered map, which also fixes the iteration order of dumps.
#[derive(Debug, Clone)]
pub struct Network {
  segments: Segments,
  nodes: Vec<Node>,
  names: BTreeMap<String, NodeKey>,
  root: NodeKey,
  h_index: usize,
  r_index: usize,
}

impl Network {
  /// Creates the network together with its root node: empty per-segment
  /// mutation sets, empty date, no parent.
  pub fn new(segments: Segments) -> Self {
    let n_segments = segments.len();
    let mut network = Self {
      segments,
      nodes: Vec::new(),
      names: BTreeMap::new(),
      root: NodeKey::new(0),
      h_index: 1,
      r_index: 1,
    };
    let root = network
      .add_node(ROOT_NAME, "", SegmentMutations::empty(n_segments))
      .expect("the network is empty, the root name cannot collide");
    network.root = root;
    network
  }

  pub fn segments(&self) -> &Segments {
    &self.segments
  }

  pub fn root(&self) -> NodeKey {
    self.root
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn get_node(&self, key: NodeKey) -> &Node {
    &self.nodes[key.index()]
  }

  pub fn get_node_mut(&mut self, key: NodeKey) -> &mut Node {
    &mut self.nodes[key.index()]
  }

  pub fn find_node(&self, name: &str) -> Result<NodeKey, NetworkError> {
    self
      .names
      .get(name)
      .copied()
      .ok_or_else(|| NetworkError::NodeNotFound(name.to_owned()))
  }

  /// Node keys in lexicographic name order.
  pub fn iter_keys_by_name(&self) -> impl Iterator<Item = NodeKey> + '_ {
    self.names.values().copied()
  }

  pub fn add_node(
    &mut self,
    name: impl Into<String>,
    date: impl Into<String>,
    sample_mutations: SegmentMutations,
  ) -> Result<NodeKey, NetworkError> {
    let name = name.into();
    if self.names.contains_key(&name) {
      return Err(NetworkError::DuplicateName(name));
    }
    let key = NodeKey::new(self.nodes.len());
    self.names.insert(name.clone(), key);
    self.nodes.push(Node::new(name, date, sample_mutations));
    Ok(key)
  }

  /// Fresh name for a hidden bifurcation node.
  pub fn next_hidden_name(&mut self) -> String {
    let name = format!("H_{}", self.h_index);
    self.h_index += 1;
    name
  }

  /// Fresh name for a hidden node anchoring the reassortment junction `r_name`.
  pub fn next_hidden_name_for(&mut self, r_name: &str) -> String {
    let name = format!("H_{}_{}", self.h_index, r_name);
    self.h_index += 1;
    name
  }

  /// Fresh name for a reassortment junction.
  pub fn next_reassortment_name(&mut self) -> String {
    let name = format!("R_{}", self.r_index);
    self.r_index += 1;
    name
  }

  /// Wires `parent` → `child` and records `branch_mutations` on the child's
  /// inbound edge. The child must not already have a parent, and the edge must
  /// not close a cycle.
  pub fn add_branch(
    &mut self,
    parent: NodeKey,
    child: NodeKey,
    branch_mutations: SegmentMutations,
  ) -> Result<(), NetworkError> {
    self.ensure_acyclic(parent, child)?;
    self.get_node_mut(child).set_parent(parent)?;
    self.get_node_mut(child).set_branch_mutations(branch_mutations);
    self.get_node_mut(parent).add_child(child);
    Ok(())
  }

  /// Wires one inbound edge of a reassortment junction: `parent` becomes the
  /// per-segment parent of `child` for each segment in `segments`. Junction
  /// inbound edges carry no mutations.
  pub fn add_branch_for_segments(
    &mut self,
    parent: NodeKey,
    child: NodeKey,
    segments: &[usize],
  ) -> Result<(), NetworkError> {
    self.ensure_acyclic(parent, child)?;
    let n_segments = self.segments.len();
    self.get_node_mut(child).set_parent_for_segments(segments, parent, n_segments)?;
    self.get_node_mut(parent).add_child(child);
    Ok(())
  }

  /// Unwires `parent` → `child`: detaches the child's inbound side (which also
  /// clears its inbound-edge mutations) and drops it from the parent's child
  /// list.
  pub fn remove_branch(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), NetworkError> {
    if !self.get_node(child).has_parent(parent) {
      return Err(NetworkError::NotAChild {
        parent: self.get_node(parent).name().to_owned(),
        child: self.get_node(child).name().to_owned(),
      });
    }
    self.get_node_mut(child).remove_parent();
    if !self.get_node_mut(parent).remove_child(child) {
      return Err(NetworkError::NotAChild {
        parent: self.get_node(parent).name().to_owned(),
        child: self.get_node(child).name().to_owned(),
      });
    }
    Ok(())
  }

  /// Sums inbound-edge mutations over every node, in total and per segment.
  pub fn count_branch_mutations(&self) -> MutationCounts {
    let mut per_segment = vec![0; self.segments.len()];
    for node in &self.nodes {
      for (segment, muts) in node.branch_mutations().iter().enumerate() {
        per_segment[segment] += muts.len();
      }
    }
    MutationCounts {
      total: per_segment.iter().sum(),
      per_segment,
    }
  }

  /// Rejects the edge `parent` → `child` if `child` is already an ancestor of
  /// `parent` on any segment.
  fn ensure_acyclic(&self, parent: NodeKey, child: NodeKey) -> Result<(), NetworkError> {
    let mut frontier = vec![parent];
    let mut visited = vec![false; self.nodes.len()];
    while let Some(key) = frontier.pop() {
      if key == child {
        return Err(NetworkError::CycleDetected {
          parent: self.get_node(parent).name().to_owned(),
          child: self.get_node(child).name().to_owned(),
        });
      }
      if visited[key.index()] {
        continue;
      }
      visited[key.index()] = true;
      frontier.extend(self.get_node(key).parents());
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::mutations::MutationSet;
  use pretty_assertions::assert_eq;

  fn network() -> Network {
    Network::new(Segments::new(["S1", "S2"]))
  }

  fn muts(s1: &str, s2: &str) -> SegmentMutations {
    let parse = |t: &str| -> MutationSet { t.split(':').filter(|m| !m.is_empty()).map(str::to_owned).collect() };
    SegmentMutations::from_sets(vec![parse(s1), parse(s2)])
  }

  #[test]
  fn creates_root_on_construction() {
    let net = network();
    assert_eq!(net.node_count(), 1);
    let root = net.get_node(net.root());
    assert_eq!(root.name(), ROOT_NAME);
    assert_eq!(root.parent(), None);
    assert!(root.sample_mutations().is_all_empty());
  }

  #[test]
  fn rejects_duplicate_names() {
    let mut net = network();
    net.add_node("A", "2001-01-01", muts("x1", "y1")).unwrap();
    assert_eq!(
      net.add_node("A", "2001-02-01", muts("", "")),
      Err(NetworkError::DuplicateName("A".to_owned()))
    );
    assert_eq!(net.node_count(), 2);
  }

  #[test]
  fn find_node_reports_unknown_names() {
    let net = network();
    assert_eq!(net.find_node("nope"), Err(NetworkError::NodeNotFound("nope".to_owned())));
  }

  #[test]
  fn add_branch_wires_both_endpoints() {
    let mut net = network();
    let a = net.add_node("A", "2001-01-01", muts("x1", "y1")).unwrap();
    net.add_branch(net.root(), a, muts("x1", "y1")).unwrap();

    assert_eq!(net.get_node(a).parent(), Some(net.root()));
    assert_eq!(net.get_node(net.root()).children(), &[a]);
    assert_eq!(net.get_node(a).branch_mutations(), &muts("x1", "y1"));
    assert_eq!(net.get_node(net.root()).out_degree(), 1);
    assert_eq!(net.get_node(a).in_degree(), 1);
  }

  #[test]
  fn add_branch_rejects_second_parent() {
    let mut net = network();
    let a = net.add_node("A", "", muts("", "")).unwrap();
    let b = net.add_node("B", "", muts("", "")).unwrap();
    net.add_branch(net.root(), a, muts("", "")).unwrap();
    net.add_branch(net.root(), b, muts("", "")).unwrap();
    assert_eq!(net.add_branch(a, b, muts("", "")), Err(NetworkError::ParentAlreadySet("B".to_owned())));
  }

  #[test]
  fn add_branch_rejects_cycles() {
    let mut net = network();
    let a = net.add_node("A", "", muts("", "")).unwrap();
    let b = net.add_node("B", "", muts("", "")).unwrap();
    net.add_branch(net.root(), a, muts("", "")).unwrap();
    net.add_branch(a, b, muts("", "")).unwrap();
    assert_eq!(
      net.add_branch(b, a, muts("", "")),
      Err(NetworkError::CycleDetected {
        parent: "B".to_owned(),
        child: "A".to_owned(),
      })
    );
  }

  #[test]
  fn remove_branch_detaches_and_reports_missing_edges() {
    let mut net = network();
    let a = net.add_node("A", "", muts("x1", "")).unwrap();
    net.add_branch(net.root(), a, muts("x1", "")).unwrap();

    net.remove_branch(net.root(), a).unwrap();
    assert_eq!(net.get_node(a).parent(), None);
    assert!(net.get_node(a).branch_mutations().is_all_empty());
    assert_eq!(net.get_node(net.root()).children(), &[] as &[NodeKey]);

    assert_eq!(
      net.remove_branch(net.root(), a),
      Err(NetworkError::NotAChild {
        parent: "Root".to_owned(),
        child: "A".to_owned(),
      })
    );
  }

  #[test]
  fn hidden_and_reassortment_names_are_unique_and_monotonic() {
    let mut net = network();
    assert_eq!(net.next_hidden_name(), "H_1");
    let r = net.next_reassortment_name();
    assert_eq!(r, "R_1");
    assert_eq!(net.next_hidden_name_for(&r), "H_2_R_1");
    assert_eq!(net.next_hidden_name(), "H_3");
    assert_eq!(net.next_reassortment_name(), "R_2");
  }

  #[test]
  fn counts_branch_mutations_per_segment() {
    let mut net = network();
    let a = net.add_node("A", "", muts("x1", "y1")).unwrap();
    let b = net.add_node("B", "", muts("x1:x2", "y1")).unwrap();
    net.add_branch(net.root(), a, muts("x1", "y1")).unwrap();
    net.add_branch(a, b, muts("x2", "")).unwrap();

    let counts = net.count_branch_mutations();
    assert_eq!(counts.total, 3);
    assert_eq!(counts.per_segment, vec![2, 1]);
  }
}
