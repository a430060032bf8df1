use crate::graph::mutations::SegmentMutations;
use crate::utils::error::NetworkError;
use std::fmt;

/// Index of a node in the network arena. Keys are never invalidated: nodes are
/// created at ingestion and live for the lifetime of the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(usize);

impl NodeKey {
  pub(crate) const fn new(index: usize) -> Self {
    Self(index)
  }

  pub const fn index(self) -> usize {
    self.0
  }
}

impl fmt::Display for NodeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// The inbound side of a node.
///
/// A non-reassortment node inherits every segment from one parent. A
/// reassortment junction inherits each segment from the parent recorded at that
/// segment's index. `Detached` covers the root and the transient state of a node
/// whose inbound edge was removed during a graft rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
  Detached,
  Single(NodeKey),
  PerSegment(Vec<Option<NodeKey>>),
}

#[derive(Debug, Clone)]
pub struct Node {
  name: String,
  date: String,
  sample_mutations: SegmentMutations,
  branch_mutations: SegmentMutations,
  inbound: Inbound,
  children: Vec<NodeKey>,
  reassortment: bool,
  in_degree: usize,
  out_degree: usize,
}

impl Node {
  pub fn new(name: impl Into<String>, date: impl Into<String>, sample_mutations: SegmentMutations) -> Self {
    let n_segments = sample_mutations.n_segments();
    Self {
      name: name.into(),
      date: date.into(),
      sample_mutations,
      branch_mutations: SegmentMutations::empty(n_segments),
      inbound: Inbound::Detached,
      children: Vec::new(),
      reassortment: false,
      in_degree: 0,
      out_degree: 0,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn date(&self) -> &str {
    &self.date
  }

  pub fn sample_mutations(&self) -> &SegmentMutations {
    &self.sample_mutations
  }

  /// Mutations acquired on the inbound edge from this node's parent.
  pub fn branch_mutations(&self) -> &SegmentMutations {
    &self.branch_mutations
  }

  pub fn set_branch_mutations(&mut self, branch_mutations: SegmentMutations) {
    self.branch_mutations = branch_mutations;
  }

  pub fn inbound(&self) -> &Inbound {
    &self.inbound
  }

  /// The single parent of a non-reassortment node.
  pub fn parent(&self) -> Option<NodeKey> {
    match &self.inbound {
      Inbound::Single(parent) => Some(*parent),
      Inbound::Detached | Inbound::PerSegment(_) => None,
    }
  }

  /// The parent this node inherits `segment` from.
  pub fn parent_for_segment(&self, segment: usize) -> Option<NodeKey> {
    match &self.inbound {
      Inbound::Detached => None,
      Inbound::Single(parent) => Some(*parent),
      Inbound::PerSegment(parents) => parents[segment],
    }
  }

  /// All distinct inbound neighbors, in segment order for junctions.
  pub fn parents(&self) -> Vec<NodeKey> {
    match &self.inbound {
      Inbound::Detached => Vec::new(),
      Inbound::Single(parent) => vec![*parent],
      Inbound::PerSegment(parents) => {
        let mut seen = Vec::new();
        for parent in parents.iter().flatten() {
          if !seen.contains(parent) {
            seen.push(*parent);
          }
        }
        seen
      }
    }
  }

  pub fn has_parent(&self, key: NodeKey) -> bool {
    match &self.inbound {
      Inbound::Detached => false,
      Inbound::Single(parent) => *parent == key,
      Inbound::PerSegment(parents) => parents.contains(&Some(key)),
    }
  }

  pub fn set_parent(&mut self, parent: NodeKey) -> Result<(), NetworkError> {
    match self.inbound {
      Inbound::Detached => {
        self.inbound = Inbound::Single(parent);
        self.in_degree += 1;
        Ok(())
      }
      Inbound::Single(_) | Inbound::PerSegment(_) => Err(NetworkError::ParentAlreadySet(self.name.clone())),
    }
  }

  /// Records `parent` as the inbound neighbor for each listed segment of a
  /// reassortment junction. Counts as one inbound edge.
  pub fn set_parent_for_segments(
    &mut self,
    segments: &[usize],
    parent: NodeKey,
    n_segments: usize,
  ) -> Result<(), NetworkError> {
    if matches!(self.inbound, Inbound::Single(_)) {
      return Err(NetworkError::ParentAlreadySet(self.name.clone()));
    }
    if matches!(self.inbound, Inbound::Detached) {
      self.inbound = Inbound::PerSegment(vec![None; n_segments]);
    }
    let Inbound::PerSegment(parents) = &mut self.inbound else {
      unreachable!()
    };
    for &segment in segments {
      if parents[segment].is_some() {
        return Err(NetworkError::ParentAlreadySet(self.name.clone()));
      }
      parents[segment] = Some(parent);
    }
    self.in_degree += 1;
    Ok(())
  }

  /// Detaches the inbound side and clears the inbound-edge mutations.
  pub fn remove_parent(&mut self) {
    if !matches!(self.inbound, Inbound::Detached) {
      self.in_degree -= 1;
    }
    self.inbound = Inbound::Detached;
    self.branch_mutations.clear();
  }

  pub fn children(&self) -> &[NodeKey] {
    &self.children
  }

  pub fn add_child(&mut self, child: NodeKey) {
    self.children.push(child);
    self.out_degree += 1;
  }

  /// Removes `child` from the child list. Returns whether it was present;
  /// removing an absent child is reported to the caller, not ignored.
  #[must_use]
  pub fn remove_child(&mut self, child: NodeKey) -> bool {
    match self.children.iter().position(|&c| c == child) {
      Some(position) => {
        self.children.remove(position);
        self.out_degree -= 1;
        true
      }
      None => false,
    }
  }

  pub fn mark_reassortment(&mut self) {
    self.reassortment = true;
  }

  pub fn is_reassortment(&self) -> bool {
    self.reassortment
  }

  pub fn in_degree(&self) -> usize {
    self.in_degree
  }

  pub fn out_degree(&self) -> usize {
    self.out_degree
  }
}
