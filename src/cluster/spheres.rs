/// Sphere clustering
///
/// Walk sequences in rank order. The first unabsorbed sequence becomes a
/// canonical and absorbs every still-unabsorbed neighbor within tau. Absorbed
/// sequences are never searched, so with a [`LiveSearch`] source only the
/// canonicals cost a trie walk.
///
/// [`LiveSearch`]: crate::matching::LiveSearch
use crate::bio::{SeqId, SequenceTable};
use crate::matching::{Neighbor, NeighborSource};
use bit_vec::BitVec;

pub fn assign<S: NeighborSource>(table: &SequenceTable, mut source: S) -> crate::Result<Vec<SeqId>> {
    let n = table.len();
    let mut parent: Vec<SeqId> = (0..n as SeqId).collect();
    let mut absorbed = BitVec::from_elem(n, false);
    let mut neighbors: Vec<Neighbor> = Vec::new();
    let mut centers = 0usize;

    for center in table.ranked_ids() {
        if absorbed[center as usize] {
            continue;
        }
        absorbed.set(center as usize, true);
        centers += 1;

        source.neighbors_into(center, &mut neighbors)?;
        for neighbor in &neighbors {
            let id = neighbor.id as usize;
            if !absorbed[id] {
                absorbed.set(id, true);
                parent[id] = center;
            }
        }
    }

    tracing::debug!("Spheres: {} centers searched", centers);
    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::MatchGraph;
    use crate::MatchRecord;

    /// Counts a source's queries so tests can see which sequences were searched.
    struct Recording<'g> {
        graph: &'g MatchGraph,
        queried: Vec<SeqId>,
    }

    impl NeighborSource for Recording<'_> {
        fn neighbors_into(&mut self, id: SeqId, out: &mut Vec<Neighbor>) -> crate::Result<()> {
            self.queried.push(id);
            let mut graph = self.graph;
            NeighborSource::neighbors_into(&mut graph, id, out)
        }
    }

    fn path_graph(table: &SequenceTable, path: &[&str]) -> MatchGraph {
        let mut records = Vec::new();
        for pair in path.windows(2) {
            let a = table.find(pair[0].as_bytes()).unwrap();
            let b = table.find(pair[1].as_bytes()).unwrap();
            records.push(MatchRecord { query: a, found: b, distance: 1 });
            records.push(MatchRecord { query: b, found: a, distance: 1 });
        }
        MatchGraph::from_records(table.len(), &records).unwrap()
    }

    #[test]
    fn test_heaviest_sequence_claims_its_ball() {
        // AAAA - AAAT - AATT: only AAAT is within one step of the center
        let table = SequenceTable::from_counts([("AAAA", 50), ("AAAT", 2), ("AATT", 1)]).unwrap();
        let graph = path_graph(&table, &["AAAA", "AAAT", "AATT"]);
        let mut source = Recording { graph: &graph, queried: Vec::new() };
        let parent = assign(&table, &mut source).unwrap();

        let id = |s: &str| table.find(s.as_bytes()).unwrap();
        assert_eq!(parent[id("AAAT") as usize], id("AAAA"));
        assert_eq!(parent[id("AATT") as usize], id("AATT"));
        // AAAT was absorbed and never searched
        assert_eq!(source.queried, vec![id("AAAA"), id("AATT")]);
    }

    #[test]
    fn test_ratio_is_ignored() {
        let table = SequenceTable::from_counts([("AAAA", 3), ("AAAT", 3)]).unwrap();
        let graph = path_graph(&table, &["AAAA", "AAAT"]);
        let parent = assign(&table, &graph).unwrap();
        assert_eq!(parent, vec![0, 0]);
    }

    #[test]
    fn test_no_edges_gives_singletons() {
        let table = SequenceTable::from_counts([("AAAA", 1), ("CCCC", 1), ("GGGG", 1)]).unwrap();
        let graph = MatchGraph::from_records(table.len(), &[]).unwrap();
        assert_eq!(assign(&table, &graph).unwrap(), vec![0, 1, 2]);
    }
}
