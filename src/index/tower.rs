/// Reusable scratch state for one trie descent at a time.
///
/// A tower holds the explicit DFS stack, one banded DP row per trie depth and
/// the encoded query. Each worker owns exactly one and reuses it for every
/// query it runs; `prepare` resets it between queries.
use crate::index::trie::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchFrame {
    pub node: NodeId,
    pub depth: u32,
    /// Alphabet code on the edge into `node`.
    pub symbol: u8,
    /// Substitutions so far (Hamming descent only).
    pub mismatches: u8,
}

#[derive(Debug, Default)]
pub struct SearchTower {
    stack: Vec<SearchFrame>,
    rows: Vec<u8>,
    width: usize,
    query: Vec<u8>,
    peak: usize,
}

impl SearchTower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the row table for a query of `query_len` symbols descending at
    /// most `max_depth` levels, and empty the stack.
    pub fn prepare(&mut self, query_len: usize, max_depth: usize) -> crate::Result<()> {
        self.stack.clear();
        self.width = query_len + 1;
        let cells = (max_depth + 1) * self.width;
        if self.rows.len() < cells {
            self.rows.try_reserve(cells - self.rows.len())?;
            self.rows.resize(cells, 0);
        }
        Ok(())
    }

    pub fn push(&mut self, frame: SearchFrame) -> crate::Result<()> {
        self.stack.try_reserve(1)?;
        self.stack.push(frame);
        self.peak = self.peak.max(self.stack.len());
        Ok(())
    }

    pub fn pop(&mut self) -> Option<SearchFrame> {
        self.stack.pop()
    }

    pub fn is_drained(&self) -> bool {
        self.stack.is_empty()
    }

    /// Deepest the stack has grown over this tower's lifetime.
    pub fn peak(&self) -> usize {
        self.peak
    }

    pub fn row(&self, depth: usize) -> &[u8] {
        &self.rows[depth * self.width..(depth + 1) * self.width]
    }

    pub fn row_mut(&mut self, depth: usize) -> &mut [u8] {
        &mut self.rows[depth * self.width..(depth + 1) * self.width]
    }

    /// The row at `depth - 1` and a mutable row at `depth`.
    pub fn rows_at(&mut self, depth: usize) -> (&[u8], &mut [u8]) {
        debug_assert!(depth > 0);
        let width = self.width;
        let (before, after) = self.rows.split_at_mut(depth * width);
        (&before[(depth - 1) * width..], &mut after[..width])
    }

    pub fn query(&self) -> &[u8] {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Vec<u8> {
        &mut self.query
    }
}
