use crate::bio::SeqId;
use crate::matching::MatchRecord;
use crate::StarlingError;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Neighbor {
    pub distance: u8,
    pub id: SeqId,
}

/// Undirected match graph: one node per sequence, node index equal to its
/// `SeqId`, edges weighted by edit distance.
#[derive(Debug, Clone, Default)]
pub struct MatchGraph {
    graph: UnGraph<SeqId, u8>,
}

impl MatchGraph {
    /// Build the graph from match records. A pair reported from both ends
    /// becomes a single edge; the two reports must agree on the distance.
    pub fn from_records(node_count: usize, records: &[MatchRecord]) -> crate::Result<Self> {
        let mut graph = UnGraph::<SeqId, u8>::with_capacity(node_count, records.len() / 2);
        for id in 0..node_count {
            graph.add_node(id as SeqId);
        }

        for record in records {
            if record.query as usize >= node_count || record.found as usize >= node_count {
                return Err(StarlingError::InvariantViolation(format!(
                    "match record {:?} refers to a sequence outside the table",
                    record
                )));
            }
            let a = NodeIndex::new(record.query as usize);
            let b = NodeIndex::new(record.found as usize);
            match graph.find_edge(a, b) {
                Some(edge) if graph[edge] != record.distance => {
                    return Err(StarlingError::InvariantViolation(format!(
                        "sequences {} and {} matched at distances {} and {}",
                        record.query, record.found, graph[edge], record.distance
                    )));
                }
                Some(_) => {}
                None => {
                    graph.add_edge(a, b, record.distance);
                }
            }
        }

        Ok(Self { graph })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Neighbors of `id` sorted by distance, then id.
    pub fn neighbors(&self, id: SeqId) -> Vec<Neighbor> {
        let mut out = Vec::new();
        self.fill_neighbors(id, &mut out);
        out
    }

    /// Replace `out` with the sorted neighbors of `id`.
    pub fn fill_neighbors(&self, id: SeqId, out: &mut Vec<Neighbor>) {
        out.clear();
        out.extend(self.graph.edges(NodeIndex::new(id as usize)).map(|edge| {
            let other = if edge.source().index() == id as usize {
                edge.target()
            } else {
                edge.source()
            };
            Neighbor {
                distance: *edge.weight(),
                id: self.graph[other],
            }
        }));
        out.sort_unstable();
    }

    pub fn degree(&self, id: SeqId) -> usize {
        self.graph.edges(NodeIndex::new(id as usize)).count()
    }

    /// Each undirected edge once, as `(lower id, higher id, distance)`.
    pub fn edges(&self) -> impl Iterator<Item = (SeqId, SeqId, u8)> + '_ {
        self.graph.edge_references().map(move |edge| {
            let a = self.graph[edge.source()];
            let b = self.graph[edge.target()];
            (a.min(b), a.max(b), *edge.weight())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(query: SeqId, found: SeqId, distance: u8) -> MatchRecord {
        MatchRecord {
            query,
            found,
            distance,
        }
    }

    #[test]
    fn test_neighbors_sorted_by_distance_then_id() {
        let records = vec![
            record(0, 3, 2),
            record(0, 2, 1),
            record(0, 1, 2),
            record(1, 0, 2),
            record(2, 0, 1),
            record(3, 0, 2),
        ];
        let graph = MatchGraph::from_records(4, &records).unwrap();

        let ids: Vec<SeqId> = graph.neighbors(0).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(graph.degree(1), 1);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.neighbors(3), vec![Neighbor { distance: 2, id: 0 }]);
    }

    #[test]
    fn test_one_sided_record_is_visible_from_both_ends() {
        let graph = MatchGraph::from_records(2, &[record(1, 0, 1)]).unwrap();
        assert_eq!(graph.neighbors(0), vec![Neighbor { distance: 1, id: 1 }]);
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(0, 1, 1)]);
    }

    #[test]
    fn test_disagreeing_distances_rejected() {
        let err = MatchGraph::from_records(2, &[record(0, 1, 1), record(1, 0, 2)]).unwrap_err();
        assert!(matches!(err, StarlingError::InvariantViolation(_)));
    }

    #[test]
    fn test_out_of_range_record_rejected() {
        let err = MatchGraph::from_records(2, &[record(0, 5, 1)]).unwrap_err();
        assert!(matches!(err, StarlingError::InvariantViolation(_)));
    }

    #[test]
    fn test_isolated_nodes() {
        let graph = MatchGraph::from_records(3, &[]).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert!(graph.neighbors(2).is_empty());
    }
}
