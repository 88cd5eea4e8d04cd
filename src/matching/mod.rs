pub mod engine;
pub mod graph;

pub use engine::{MatchEngine, MatchRecord};
pub use graph::{MatchGraph, Neighbor};

use crate::bio::SeqId;
use crate::index::SearchTower;

/// Answers "which sequences lie within tau of `id`", either from a prebuilt
/// graph or by searching on demand.
pub trait NeighborSource {
    /// Replace `out` with the neighbors of `id`, sorted by distance then id.
    fn neighbors_into(&mut self, id: SeqId, out: &mut Vec<Neighbor>) -> crate::Result<()>;
}

impl<S: NeighborSource + ?Sized> NeighborSource for &mut S {
    fn neighbors_into(&mut self, id: SeqId, out: &mut Vec<Neighbor>) -> crate::Result<()> {
        (**self).neighbors_into(id, out)
    }
}

impl NeighborSource for &MatchGraph {
    fn neighbors_into(&mut self, id: SeqId, out: &mut Vec<Neighbor>) -> crate::Result<()> {
        self.fill_neighbors(id, out);
        Ok(())
    }
}

/// On-demand search through a single tower, for algorithms that only query
/// a subset of the sequences.
pub struct LiveSearch<'e, 'a> {
    engine: &'e MatchEngine<'a>,
    tower: SearchTower,
    records: Vec<MatchRecord>,
    queries: usize,
}

impl<'e, 'a> LiveSearch<'e, 'a> {
    pub fn new(engine: &'e MatchEngine<'a>) -> Self {
        Self {
            engine,
            tower: SearchTower::new(),
            records: Vec::new(),
            queries: 0,
        }
    }

    /// Number of searches run so far.
    pub fn queries(&self) -> usize {
        self.queries
    }
}

impl NeighborSource for LiveSearch<'_, '_> {
    fn neighbors_into(&mut self, id: SeqId, out: &mut Vec<Neighbor>) -> crate::Result<()> {
        self.records.clear();
        self.engine.find_matches(id, &mut self.tower, &mut self.records)?;
        self.queries += 1;

        out.clear();
        out.extend(self.records.iter().map(|r| Neighbor {
            distance: r.distance,
            id: r.found,
        }));
        out.sort_unstable();
        Ok(())
    }
}
