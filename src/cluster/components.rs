/// Connected components of the match graph
///
/// Any chain of matches links sequences into one cluster, regardless of
/// counts. The canonical of a component is its best-ranked member.
use crate::bio::{SeqId, SequenceTable};
use crate::matching::{Neighbor, NeighborSource};
use crate::StarlingError;
use petgraph::unionfind::UnionFind;

pub fn assign<S: NeighborSource>(table: &SequenceTable, mut source: S) -> crate::Result<Vec<SeqId>> {
    let n = table.len();
    let mut sets: UnionFind<usize> = UnionFind::new(n);
    let mut neighbors: Vec<Neighbor> = Vec::new();

    for (id, _) in table.iter() {
        source.neighbors_into(id, &mut neighbors)?;
        for neighbor in &neighbors {
            sets.union(id as usize, neighbor.id as usize);
        }
    }

    // The first member of each set in rank order is its canonical.
    let mut canonical_of_root: Vec<Option<SeqId>> = vec![None; n];
    for id in table.ranked_ids() {
        canonical_of_root[sets.find_mut(id as usize)].get_or_insert(id);
    }

    let mut parent = Vec::with_capacity(n);
    for id in 0..n {
        let root = sets.find_mut(id);
        let canonical = canonical_of_root[root].ok_or_else(|| {
            StarlingError::InvariantViolation(format!("component of sequence {} has no canonical", id))
        })?;
        parent.push(canonical);
    }

    let components = canonical_of_root.iter().filter(|c| c.is_some()).count();
    tracing::debug!("Components: {} sequences in {} components", n, components);
    Ok(parent)
}
