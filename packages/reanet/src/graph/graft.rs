use crate::graph::mutations::{split_muts, SegmentMutations};
use crate::graph::network::Network;
use crate::graph::node::NodeKey;
use crate::graph::search::{place_segment, Placement};
use crate::make_internal_report;
use crate::utils::error::NetworkError;
use eyre::{Report, WrapErr};
use log::debug;

/// Places the first sample: a direct child of the root carrying its full
/// mutation profile on the inbound edge.
pub fn graft_at_root(
  network: &mut Network,
  name: &str,
  date: &str,
  sample_mutations: SegmentMutations,
) -> Result<NodeKey, Report> {
  let sample = network.add_node(name, date, sample_mutations.clone())?;
  debug_assert_eq!(network.node_count(), 2);
  debug!("graft: '{name}' as first child of root");
  network.add_branch(network.root(), sample, sample_mutations)?;
  Ok(sample)
}

/// Places a sample into the existing network: runs the placement search per
/// segment, groups segments by attachment node, and rewrites the graph with a
/// hidden bifurcation (one group) or a reassortment junction (several groups).
pub fn graft_sample(
  network: &mut Network,
  name: &str,
  date: &str,
  sample_mutations: SegmentMutations,
) -> Result<NodeKey, Report> {
  let sample = network.add_node(name, date, sample_mutations)?;
  let n_segments = network.segments().len();

  let placements = (0..n_segments)
    .map(|segment| place_segment(network, sample, segment))
    .collect::<Result<Vec<Placement>, NetworkError>>()
    .wrap_err_with(|| format!("When searching for attachment points of sample '{name}'"))?;

  for (segment, placement) in placements.iter().enumerate() {
    debug!(
      "graft: '{}' segment '{}': attachment '{}', {} residual, {} conflicting on path",
      name,
      network.segments().name(segment),
      network.get_node(placement.attachment).name(),
      placement.residual.len(),
      placement.conflicting_on_path.len()
    );
  }

  // Segments grouped by attachment node, in order of first appearance; this
  // fixes the allocation order of hidden nodes.
  let mut groups: Vec<(NodeKey, Vec<usize>)> = Vec::new();
  for (segment, placement) in placements.iter().enumerate() {
    match groups.iter_mut().find(|(key, _)| *key == placement.attachment) {
      Some((_, segments)) => segments.push(segment),
      None => groups.push((placement.attachment, vec![segment])),
    }
  }

  let residual = SegmentMutations::from_sets(placements.iter().map(|p| p.residual.clone()).collect());

  if groups.len() == 1 {
    graft_single_group(network, sample, groups[0].0, &placements, residual)
      .wrap_err_with(|| format!("When grafting sample '{name}'"))?;
  } else {
    if let Some((parent, child)) = parent_child_pair(network, &groups) {
      return Err(
        NetworkError::Unsupported {
          sample: name.to_owned(),
          parent: network.get_node(parent).name().to_owned(),
          child: network.get_node(child).name().to_owned(),
        }
        .into(),
      );
    }
    graft_reassortment(network, sample, &groups, &placements, residual)
      .wrap_err_with(|| format!("When grafting reassorted sample '{name}'"))?;
  }
  Ok(sample)
}

/// With exactly two attachment groups, detects the configuration where one
/// attachment is the other's parent. There is no sound rewrite for it.
fn parent_child_pair(network: &Network, groups: &[(NodeKey, Vec<usize>)]) -> Option<(NodeKey, NodeKey)> {
  if let [(first, _), (second, _)] = groups {
    if network.get_node(*first).has_parent(*second) {
      return Some((*second, *first));
    }
    if network.get_node(*second).has_parent(*first) {
      return Some((*first, *second));
    }
  }
  None
}

/// Partitions the attachment's inbound-edge mutations into the part shared
/// with the sample's descent (`common`, moved above the new node) and the part
/// the sample conflicts with (`unique`, left on the attachment's own edge).
/// For segments outside `segments_in_group` the whole branch is unique: that
/// side of a reassortment rewrite contributes nothing to foreign segments.
fn split_attachment_branch(
  branch: &SegmentMutations,
  placements: &[Placement],
  segments_in_group: Option<&[usize]>,
) -> (SegmentMutations, SegmentMutations) {
  let n_segments = branch.n_segments();
  let mut common = SegmentMutations::empty(n_segments);
  let mut unique = SegmentMutations::empty(n_segments);
  for segment in 0..n_segments {
    if segments_in_group.is_some_and(|segments| !segments.contains(&segment)) {
      *unique.get_mut(segment) = branch.get(segment).clone();
      continue;
    }
    let split = split_muts(branch.get(segment), &placements[segment].conflicting_on_path);
    *common.get_mut(segment) = split.rest;
    *unique.get_mut(segment) = split.shared;
  }
  (common, unique)
}

fn graft_single_group(
  network: &mut Network,
  sample: NodeKey,
  attachment: NodeKey,
  placements: &[Placement],
  residual: SegmentMutations,
) -> Result<(), Report> {
  if attachment == network.root() {
    debug!("graft: '{}' as child of root", network.get_node(sample).name());
    network.add_branch(attachment, sample, residual)?;
    return Ok(());
  }

  let (parent, branch_mutations, is_reassortment, attachment_name) = {
    let node = network.get_node(attachment);
    (
      node.parent(),
      node.branch_mutations().clone(),
      node.is_reassortment(),
      node.name().to_owned(),
    )
  };

  if is_reassortment {
    // Junction inbound edges carry no mutations, so there is nothing to split.
    network.add_branch(attachment, sample, residual)?;
    return Ok(());
  }

  let (common, unique) = split_attachment_branch(&branch_mutations, placements, None);

  // The attachment's whole inbound edge is shared with the sample and the
  // sample matches the attachment exactly on some segment: it belongs below
  // the attachment, not beside it.
  let identical_somewhere = placements
    .iter()
    .any(|p| p.residual.is_empty() && p.conflicting_on_path.is_empty());
  if unique.is_all_empty() && identical_somewhere {
    debug!(
      "graft: '{}' as child of '{attachment_name}'",
      network.get_node(sample).name()
    );
    network.add_branch(attachment, sample, residual)?;
    return Ok(());
  }

  let parent =
    parent.ok_or_else(|| make_internal_report!("Attachment node '{attachment_name}' is expected to have a parent"))?;
  debug!(
    "graft: '{}' along branch from '{}' to '{attachment_name}'",
    network.get_node(sample).name(),
    network.get_node(parent).name()
  );

  let hidden_name = network.next_hidden_name();
  let n_segments = network.segments().len();
  let hidden = network.add_node(hidden_name, "", SegmentMutations::empty(n_segments))?;
  network.remove_branch(parent, attachment)?;
  network.add_branch(parent, hidden, common)?;
  network.add_branch(hidden, attachment, unique)?;
  network.add_branch(hidden, sample, residual)?;
  Ok(())
}

fn graft_reassortment(
  network: &mut Network,
  sample: NodeKey,
  groups: &[(NodeKey, Vec<usize>)],
  placements: &[Placement],
  residual: SegmentMutations,
) -> Result<(), Report> {
  let n_segments = network.segments().len();
  let junction_name = network.next_reassortment_name();
  debug!(
    "graft: reassortment detected for '{}', allocating '{junction_name}'",
    network.get_node(sample).name()
  );
  let junction = network.add_node(junction_name.clone(), "", SegmentMutations::empty(n_segments))?;
  network.get_node_mut(junction).mark_reassortment();

  for (attachment, segments) in groups {
    let (parent, branch_mutations, is_reassortment, attachment_name) = {
      let node = network.get_node(*attachment);
      (
        node.parent(),
        node.branch_mutations().clone(),
        node.is_reassortment(),
        node.name().to_owned(),
      )
    };

    if *attachment == network.root() || is_reassortment {
      // No single inbound edge to split: the junction inherits these segments
      // straight from the attachment node.
      network.add_branch_for_segments(*attachment, junction, segments)?;
      continue;
    }

    let parent = parent
      .ok_or_else(|| make_internal_report!("Attachment node '{attachment_name}' is expected to have a parent"))?;
    let (common, unique) = split_attachment_branch(&branch_mutations, placements, Some(segments.as_slice()));

    let hidden_name = network.next_hidden_name_for(&junction_name);
    let hidden = network.add_node(hidden_name, "", SegmentMutations::empty(n_segments))?;
    network.remove_branch(parent, *attachment)?;
    network.add_branch(parent, hidden, common)?;
    network.add_branch(hidden, *attachment, unique)?;
    network.add_branch_for_segments(hidden, junction, segments)?;
  }

  network.add_branch(junction, sample, residual)?;
  Ok(())
}
