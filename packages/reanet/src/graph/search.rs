use crate::graph::mutations::{remove_all, split_muts, MutationSet};
use crate::graph::network::Network;
use crate::graph::node::NodeKey;
use crate::utils::error::NetworkError;
use log::trace;

/// Outcome of the per-segment placement search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
  /// The node under which the sample attaches for this segment.
  pub attachment: NodeKey,
  /// Sample mutations not explained by the path root → attachment; these end up
  /// on the sample's own inbound edge.
  pub residual: MutationSet,
  /// Mutations encountered on the descent that the sample does not carry; used
  /// to decide how the attachment's inbound edge is split.
  pub conflicting_on_path: MutationSet,
}

struct BestChild {
  key: NodeKey,
  matching: MutationSet,
  conflicting: MutationSet,
  empty_branch: bool,
}

/// Descends the network from the root, per segment, greedily following the
/// child whose inbound branch shares the most mutations with what is left of
/// the sample's set.
///
/// Child selection keeps a running best over the stored child order: a child is
/// taken when its matching count strictly exceeds the running best's, or when
/// its branch set for this segment is empty. An empty branch costs nothing to
/// pass through, so such a child is always a valid candidate, and equal-standing
/// ties keep the first child encountered. The search stops when the chosen
/// child would contribute zero matches over a non-empty branch, i.e. when no
/// child was selected at all.
pub fn place_segment(network: &Network, sample: NodeKey, segment: usize) -> Result<Placement, NetworkError> {
  let mut residual = network.get_node(sample).sample_mutations().get(segment).clone();
  let mut conflicting_on_path = MutationSet::new();
  let mut current = network.root();

  // Each step moves strictly downward, so any longer walk means the ancestry
  // invariants are broken.
  let limit = 100 * network.node_count();
  let mut steps = 0;

  loop {
    let mut best: Option<BestChild> = None;
    for &child_key in network.get_node(current).children() {
      let branch = network.get_node(child_key).branch_mutations().get(segment);
      let empty_branch = branch.is_empty();
      let split = split_muts(branch, &residual);

      let selected = match &best {
        None => empty_branch || !split.shared.is_empty(),
        Some(running) => {
          if empty_branch {
            !running.empty_branch
          } else {
            split.shared.len() > running.matching.len()
          }
        }
      };
      if selected {
        best = Some(BestChild {
          key: child_key,
          matching: split.shared,
          conflicting: split.rest,
          empty_branch,
        });
      }
    }

    let Some(chosen) = best else {
      return Ok(Placement {
        attachment: current,
        residual,
        conflicting_on_path,
      });
    };

    trace!(
      "placement: segment '{}': descending from '{}' into '{}' ({} matching, {} conflicting)",
      network.segments().name(segment),
      network.get_node(current).name(),
      network.get_node(chosen.key).name(),
      chosen.matching.len(),
      chosen.conflicting.len()
    );

    remove_all(&mut residual, &chosen.matching);
    conflicting_on_path.extend(chosen.conflicting);
    current = chosen.key;

    steps += 1;
    if steps > limit {
      return Err(NetworkError::SearchDivergence {
        sample: network.get_node(sample).name().to_owned(),
        segment: network.segments().name(segment).to_owned(),
        limit,
      });
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::mutations::SegmentMutations;
  use crate::graph::segments::Segments;
  use maplit::btreeset;
  use pretty_assertions::assert_eq;

  fn muts(s1: &str, s2: &str) -> SegmentMutations {
    let parse = |t: &str| -> MutationSet { t.split(':').filter(|m| !m.is_empty()).map(str::to_owned).collect() };
    SegmentMutations::from_sets(vec![parse(s1), parse(s2)])
  }

  fn network() -> Network {
    Network::new(Segments::new(["S1", "S2"]))
  }

  #[test]
  fn empty_network_attaches_at_root_with_full_residual() {
    let mut net = network();
    let sample = net.add_node("Q", "", muts("x1:x2", "")).unwrap();

    let placement = place_segment(&net, sample, 0).unwrap();
    assert_eq!(placement.attachment, net.root());
    assert_eq!(placement.residual, btreeset! {"x1".to_owned(), "x2".to_owned()});
    assert!(placement.conflicting_on_path.is_empty());
  }

  #[test]
  fn descends_while_matches_remain() {
    let mut net = network();
    let a = net.add_node("A", "", muts("x1", "y1")).unwrap();
    let b = net.add_node("B", "", muts("x1:x2", "y1")).unwrap();
    net.add_branch(net.root(), a, muts("x1", "y1")).unwrap();
    net.add_branch(a, b, muts("x2", "")).unwrap();
    let sample = net.add_node("Q", "", muts("x1:x2:x9", "y1")).unwrap();

    let placement = place_segment(&net, sample, 0).unwrap();
    assert_eq!(placement.attachment, b);
    assert_eq!(placement.residual, btreeset! {"x9".to_owned()});
    assert!(placement.conflicting_on_path.is_empty());
  }

  #[test]
  fn stops_above_a_branch_with_no_matches() {
    let mut net = network();
    let a = net.add_node("A", "", muts("x1", "y1")).unwrap();
    net.add_branch(net.root(), a, muts("x1", "y1")).unwrap();
    let sample = net.add_node("Q", "", muts("x7", "")).unwrap();

    let placement = place_segment(&net, sample, 0).unwrap();
    assert_eq!(placement.attachment, net.root());
    assert_eq!(placement.residual, btreeset! {"x7".to_owned()});
  }

  #[test]
  fn collects_conflicting_mutations_along_the_path() {
    let mut net = network();
    let a = net.add_node("A", "", muts("x1:x5", "y1")).unwrap();
    net.add_branch(net.root(), a, muts("x1:x5", "y1")).unwrap();
    let sample = net.add_node("Q", "", muts("x1:x9", "")).unwrap();

    let placement = place_segment(&net, sample, 0).unwrap();
    assert_eq!(placement.attachment, a);
    assert_eq!(placement.residual, btreeset! {"x9".to_owned()});
    assert_eq!(placement.conflicting_on_path, btreeset! {"x5".to_owned()});
  }

  #[test]
  fn empty_branch_child_is_selected_over_unmatched_siblings() {
    // Root with children C1 (empty S1 branch) and C2 ({x1}); a residual that
    // does not match C2 descends through C1.
    let mut net = network();
    let c1 = net.add_node("C1", "", muts("", "y1")).unwrap();
    let c2 = net.add_node("C2", "", muts("x1", "y2")).unwrap();
    net.add_branch(net.root(), c1, muts("", "y1")).unwrap();
    net.add_branch(net.root(), c2, muts("x1", "y2")).unwrap();
    let sample = net.add_node("Q", "", muts("z9", "")).unwrap();

    let placement = place_segment(&net, sample, 0).unwrap();
    assert_eq!(placement.attachment, c1);
    assert_eq!(placement.residual, btreeset! {"z9".to_owned()});
    assert!(placement.conflicting_on_path.is_empty());
  }

  #[test]
  fn later_sibling_with_more_matches_displaces_empty_branch_pick() {
    let mut net = network();
    let c1 = net.add_node("C1", "", muts("", "y1")).unwrap();
    let c2 = net.add_node("C2", "", muts("x1:x2", "y2")).unwrap();
    net.add_branch(net.root(), c1, muts("", "y1")).unwrap();
    net.add_branch(net.root(), c2, muts("x1:x2", "y2")).unwrap();
    let sample = net.add_node("Q", "", muts("x1:x2:x9", "")).unwrap();

    let placement = place_segment(&net, sample, 0).unwrap();
    assert_eq!(placement.attachment, c2);
    assert_eq!(placement.residual, btreeset! {"x9".to_owned()});
  }

  #[test]
  fn equal_match_counts_keep_the_first_child() {
    let mut net = network();
    let c1 = net.add_node("C1", "", muts("x1", "")).unwrap();
    let c2 = net.add_node("C2", "", muts("x2", "")).unwrap();
    net.add_branch(net.root(), c1, muts("x1", "")).unwrap();
    net.add_branch(net.root(), c2, muts("x2", "")).unwrap();
    let sample = net.add_node("Q", "", muts("x1:x2", "")).unwrap();

    let placement = place_segment(&net, sample, 0).unwrap();
    assert_eq!(placement.attachment, c1);
  }

  #[test]
  fn consecutive_empty_branches_keep_the_first_child() {
    let mut net = network();
    let c1 = net.add_node("C1", "", muts("", "y1")).unwrap();
    let c2 = net.add_node("C2", "", muts("", "y2")).unwrap();
    net.add_branch(net.root(), c1, muts("", "y1")).unwrap();
    net.add_branch(net.root(), c2, muts("", "y2")).unwrap();
    let sample = net.add_node("Q", "", muts("x1", "")).unwrap();

    let placement = place_segment(&net, sample, 0).unwrap();
    assert_eq!(placement.attachment, c1);
  }

  #[test]
  fn empty_segment_descends_through_empty_branches_only() {
    let mut net = network();
    let a = net.add_node("A", "", muts("x1", "y1")).unwrap();
    net.add_branch(net.root(), a, muts("x1", "y1")).unwrap();
    let sample = net.add_node("Q", "", muts("", "")).unwrap();

    let placement = place_segment(&net, sample, 0).unwrap();
    assert_eq!(placement.attachment, net.root());
    assert!(placement.residual.is_empty());
    assert!(placement.conflicting_on_path.is_empty());
  }
}
