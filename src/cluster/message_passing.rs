/// Message-passing clustering
///
/// Every sequence picks at most one preferred parent among its neighbors: a
/// neighbor qualifies when its count is at least `parent_to_child` times the
/// sequence's own and it ranks strictly above the sequence. Among qualifying
/// neighbors the highest count wins, ties going to the lowest id (the
/// lexicographically smaller sequence). Canonicals are then propagated along
/// preferences pass by pass until nothing changes.
///
/// Because a preferred parent always outranks its child, preferences cannot
/// form a cycle, and equal-count chains are never merged unless the ratio
/// is at most 1.
use crate::bio::{SeqId, SequenceTable};
use crate::matching::{Neighbor, NeighborSource};
use crate::StarlingError;
use std::cmp::Ordering;

pub fn assign<S: NeighborSource>(
    table: &SequenceTable,
    mut source: S,
    parent_to_child: f64,
) -> crate::Result<Vec<SeqId>> {
    let preferred = preferred_parents(table, &mut source, parent_to_child)?;
    propagate(table, &preferred)
}

/// The parent each sequence would accept, if any.
pub fn preferred_parents<S: NeighborSource>(
    table: &SequenceTable,
    source: &mut S,
    parent_to_child: f64,
) -> crate::Result<Vec<Option<SeqId>>> {
    let mut preferred = Vec::with_capacity(table.len());
    let mut neighbors: Vec<Neighbor> = Vec::new();

    for (child, entry) in table.iter() {
        source.neighbors_into(child, &mut neighbors)?;
        let threshold = parent_to_child * entry.count as f64;
        let best = neighbors
            .iter()
            .filter(|n| {
                table.get(n.id).count as f64 >= threshold
                    && table.rank_cmp(n.id, child) == Ordering::Less
            })
            .min_by(|a, b| table.rank_cmp(a.id, b.id))
            .map(|n| n.id);
        preferred.push(best);
    }
    Ok(preferred)
}

fn propagate(table: &SequenceTable, preferred: &[Option<SeqId>]) -> crate::Result<Vec<SeqId>> {
    let n = table.len();
    let order = table.ranked_ids();
    let mut canonical: Vec<SeqId> = (0..n as SeqId).collect();

    // Each pass settles at least one more level of every preference chain.
    let max_passes = n + 1;
    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = 0usize;
        for &child in &order {
            if let Some(parent) = preferred[child as usize] {
                let target = canonical[parent as usize];
                if canonical[child as usize] != target {
                    canonical[child as usize] = target;
                    changed += 1;
                }
            }
        }
        tracing::debug!("Message passing pass {}: {} sequences moved", passes, changed);

        if changed == 0 {
            break;
        }
        if passes > max_passes {
            return Err(StarlingError::InvariantViolation(format!(
                "message passing did not converge after {} passes",
                passes
            )));
        }
    }

    Ok(canonical)
}
