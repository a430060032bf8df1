use std::collections::BTreeSet;

/// A set of mutation tokens for one segment. Tokens are opaque; only equality
/// matters. Ordered storage keeps iteration and dumps deterministic.
pub type MutationSet = BTreeSet<String>;

/// Result of partitioning a mutation set against a reference set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitMutsResult {
  /// Mutations also present in the reference set.
  pub shared: MutationSet,
  /// Mutations absent from the reference set.
  pub rest: MutationSet,
}

/// Partitions `muts` into the part shared with `reference` and the remainder.
pub fn split_muts(muts: &MutationSet, reference: &MutationSet) -> SplitMutsResult {
  let mut result = SplitMutsResult::default();
  for mutation in muts {
    if reference.contains(mutation) {
      result.shared.insert(mutation.clone());
    } else {
      result.rest.insert(mutation.clone());
    }
  }
  result
}

/// Removes every member of `other` from `muts`.
pub fn remove_all(muts: &mut MutationSet, other: &MutationSet) {
  for mutation in other {
    muts.remove(mutation);
  }
}

/// Per-segment mutation sets, dense over the segment list declared by the input
/// header. Index `i` corresponds to the `i`-th segment; an absent segment is an
/// empty set at its index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentMutations {
  sets: Vec<MutationSet>,
}

impl SegmentMutations {
  pub fn empty(n_segments: usize) -> Self {
    Self {
      sets: vec![MutationSet::new(); n_segments],
    }
  }

  pub fn from_sets(sets: Vec<MutationSet>) -> Self {
    Self { sets }
  }

  pub fn n_segments(&self) -> usize {
    self.sets.len()
  }

  pub fn get(&self, segment: usize) -> &MutationSet {
    &self.sets[segment]
  }

  pub fn get_mut(&mut self, segment: usize) -> &mut MutationSet {
    &mut self.sets[segment]
  }

  pub fn iter(&self) -> impl Iterator<Item = &MutationSet> {
    self.sets.iter()
  }

  pub fn is_all_empty(&self) -> bool {
    self.sets.iter().all(BTreeSet::is_empty)
  }

  /// Total number of mutations across all segments.
  pub fn count(&self) -> usize {
    self.sets.iter().map(BTreeSet::len).sum()
  }

  pub fn clear(&mut self) {
    for set in &mut self.sets {
      set.clear();
    }
  }
}
