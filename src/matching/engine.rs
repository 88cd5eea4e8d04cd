/// Branch-and-bound search of the trie for sequences within tau edits
///
/// The Levenshtein descent keeps one DP row per trie depth in the tower. Row
/// `d` holds the distance between the `d`-symbol trie path and every query
/// prefix, but only the band `|j - d| <= tau` is ever written: any cell
/// outside it exceeds tau, so reads outside the band return `tau + 1`.
/// Cell values are capped at `tau + 1` as well.
use crate::bio::{SeqId, SequenceTable};
use crate::core::config::{check_tau, Metric, SearchMode};
use crate::index::{SearchFrame, SearchTower, SearchTrie, NO_CHILD, ROOT};
use crate::utils::parallel::{build_thread_pool, chunk_size_for_parallelism};
use crate::StarlingError;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// `found` lies within `distance` edits of `query`. Never a self match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchRecord {
    pub query: SeqId,
    pub found: SeqId,
    pub distance: u8,
}

pub struct MatchEngine<'a> {
    table: &'a SequenceTable,
    trie: &'a SearchTrie,
    tau: u8,
    mode: SearchMode,
}

impl<'a> MatchEngine<'a> {
    pub fn new(
        table: &'a SequenceTable,
        trie: &'a SearchTrie,
        tau: u8,
        mode: SearchMode,
    ) -> crate::Result<Self> {
        check_tau(tau)?;
        if trie.sequence_count() != table.len() {
            return Err(StarlingError::InvariantViolation(format!(
                "trie indexes {} sequences but the table holds {}",
                trie.sequence_count(),
                table.len()
            )));
        }
        Ok(Self {
            table,
            trie,
            tau,
            mode,
        })
    }

    pub fn tau(&self) -> u8 {
        self.tau
    }

    pub fn table(&self) -> &'a SequenceTable {
        self.table
    }

    /// Append a record for every other table sequence within tau of `query`.
    pub fn find_matches(
        &self,
        query: SeqId,
        tower: &mut SearchTower,
        out: &mut Vec<MatchRecord>,
    ) -> crate::Result<()> {
        let sequence = &self.table.get(query).sequence;
        self.trie.alphabet().encode_into(sequence, tower.query_mut())?;
        self.descend(Some(query), tower, |found, distance| {
            out.push(MatchRecord {
                query,
                found,
                distance,
            })
        })
    }

    /// Search an arbitrary sequence; an exact hit is reported at distance 0.
    pub fn search(
        &self,
        sequence: &[u8],
        tower: &mut SearchTower,
    ) -> crate::Result<Vec<(SeqId, u8)>> {
        self.trie.alphabet().encode_into(sequence, tower.query_mut())?;
        let mut hits = Vec::new();
        self.descend(None, tower, |found, distance| hits.push((found, distance)))?;
        hits.sort_unstable_by_key(|&(found, distance)| (distance, found));
        Ok(hits)
    }

    fn descend<F>(&self, exclude: Option<SeqId>, tower: &mut SearchTower, emit: F) -> crate::Result<()>
    where
        F: FnMut(SeqId, u8),
    {
        // The query lives in the tower; move it out so rows and stack can be
        // borrowed mutably, and put it back on every path.
        let query = std::mem::take(tower.query_mut());
        let result = match self.trie.metric() {
            Metric::Levenshtein => self.descend_levenshtein(&query, exclude, tower, emit),
            Metric::Hamming => self.descend_hamming(&query, exclude, tower, emit),
        };
        *tower.query_mut() = query;
        debug_assert!(result.is_err() || tower.is_drained());
        result
    }

    fn descend_levenshtein<F>(
        &self,
        query: &[u8],
        exclude: Option<SeqId>,
        tower: &mut SearchTower,
        mut emit: F,
    ) -> crate::Result<()>
    where
        F: FnMut(SeqId, u8),
    {
        let m = query.len();
        let tau = self.tau as usize;
        let cap = self.tau + 1;
        tower.prepare(m, self.trie.max_depth())?;

        let root = tower.row_mut(0);
        for (j, cell) in root.iter_mut().enumerate() {
            *cell = if j <= tau { j as u8 } else { cap };
        }
        if self.should_expand(ROOT, 0, m, tower.row(0)) {
            self.push_children(ROOT, 0, tower, |_| 0)?;
        }

        while let Some(frame) = tower.pop() {
            let depth = frame.depth as usize;
            {
                let (prev, cur) = tower.rows_at(depth);
                fill_row(prev, cur, depth, frame.symbol, query, self.tau);
            }

            let row = tower.row(depth);
            if let Some(found) = self.trie.terminal(frame.node) {
                if depth.abs_diff(m) <= tau && row[m] <= self.tau && Some(found) != exclude {
                    emit(found, row[m]);
                }
            }

            if self.should_expand(frame.node, depth, m, row) {
                self.push_children(frame.node, frame.depth, tower, |_| 0)?;
            }
        }
        Ok(())
    }

    /// Whether any terminal below `node` can still come within tau. The height
    /// bound adds the query symbols that remain unmatched even if the deepest
    /// path below is used in full.
    fn should_expand(&self, node: u32, depth: usize, m: usize, row: &[u8]) -> bool {
        if self.mode == SearchMode::Exhaustive {
            return true;
        }
        let tau = self.tau as usize;
        let height = self.trie.node(node).height as usize;
        if height == 0 {
            return false;
        }
        let lo = depth.saturating_sub(tau);
        let hi = m.min(depth + tau);
        (lo..=hi).any(|j| row[j] as usize + (m - j).saturating_sub(height) <= tau)
    }

    fn descend_hamming<F>(
        &self,
        query: &[u8],
        exclude: Option<SeqId>,
        tower: &mut SearchTower,
        mut emit: F,
    ) -> crate::Result<()>
    where
        F: FnMut(SeqId, u8),
    {
        let m = query.len();
        tower.prepare(m, 0)?;
        if m == 0 {
            return Ok(());
        }
        self.push_children(ROOT, 0, tower, |code| (code != query[0]) as u8)?;

        while let Some(frame) = tower.pop() {
            if self.mode == SearchMode::Pruned && frame.mismatches > self.tau {
                continue;
            }
            let depth = frame.depth as usize;
            if depth == m {
                if let Some(found) = self.trie.terminal(frame.node) {
                    if frame.mismatches <= self.tau && Some(found) != exclude {
                        emit(found, frame.mismatches);
                    }
                }
                continue;
            }
            let base = frame.mismatches;
            let next = query[depth];
            self.push_children(frame.node, frame.depth, tower, |code| {
                base.saturating_add((code != next) as u8)
            })?;
        }
        Ok(())
    }

    /// Push children in reverse alphabet order so they pop in alphabet order.
    fn push_children<M>(
        &self,
        node: u32,
        depth: u32,
        tower: &mut SearchTower,
        mismatches: M,
    ) -> crate::Result<()>
    where
        M: Fn(u8) -> u8,
    {
        for (code, &child) in self.trie.children(node).iter().enumerate().rev() {
            if child == NO_CHILD {
                continue;
            }
            let code = code as u8;
            tower.push(SearchFrame {
                node: child,
                depth: depth + 1,
                symbol: code,
                mismatches: mismatches(code),
            })?;
        }
        Ok(())
    }

    /// Run `find_matches` for every sequence on a pool of `threads` workers.
    ///
    /// Each chunk task owns one tower and one output buffer; buffers are
    /// concatenated after the join and sorted, so the result does not depend
    /// on the thread count or on scheduling.
    pub fn find_all(&self, threads: usize, progress: &ProgressBar) -> crate::Result<Vec<MatchRecord>> {
        let n = self.table.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let pool = build_thread_pool(threads)?;
        let chunk = chunk_size_for_parallelism(n, pool.current_num_threads());
        let ids: Vec<SeqId> = (0..n as SeqId).collect();

        let buffers: Vec<Vec<MatchRecord>> = pool.install(|| {
            ids.par_chunks(chunk)
                .map(|chunk| -> crate::Result<Vec<MatchRecord>> {
                    let mut tower = SearchTower::new();
                    let mut out = Vec::new();
                    for &id in chunk {
                        self.find_matches(id, &mut tower, &mut out)?;
                    }
                    progress.inc(chunk.len() as u64);
                    tracing::trace!(
                        "Chunk starting at {} produced {} records, stack peak {}",
                        chunk[0],
                        out.len(),
                        tower.peak()
                    );
                    Ok(out)
                })
                .collect::<crate::Result<Vec<_>>>()
        })?;

        let total: usize = buffers.iter().map(Vec::len).sum();
        let mut records = Vec::new();
        records.try_reserve_exact(total)?;
        for buffer in buffers {
            records.extend(buffer);
        }
        records.sort_unstable();

        tracing::debug!(
            "Found {} match records for {} sequences on {} threads in {:.2}s",
            records.len(),
            n,
            pool.current_num_threads(),
            start.elapsed().as_secs_f64()
        );
        Ok(records)
    }
}

/// Compute row `depth` from row `depth - 1` after consuming trie symbol
/// `symbol`. Only cells in the band are written.
fn fill_row(prev: &[u8], cur: &mut [u8], depth: usize, symbol: u8, query: &[u8], tau: u8) {
    let m = query.len();
    let band = tau as usize;
    let cap = tau + 1;
    let lo = depth.saturating_sub(band);
    let hi = m.min(depth + band);
    let prev_cell = |j: usize| -> u8 {
        if j.abs_diff(depth - 1) <= band {
            prev[j]
        } else {
            cap
        }
    };

    for j in lo..=hi {
        let value = if j == 0 {
            depth as u8
        } else {
            let substitute = prev_cell(j - 1) + (query[j - 1] != symbol) as u8;
            let delete = prev_cell(j) + 1;
            let insert = if j > lo { cur[j - 1] + 1 } else { cap };
            substitute.min(delete).min(insert)
        };
        cur[j] = value.min(cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::Alphabet;

    fn engine_for(table: &SequenceTable, metric: Metric) -> SearchTrie {
        SearchTrie::build(table, &Alphabet::nucleotide(), metric).unwrap()
    }

    fn matches_of(table: &SequenceTable, trie: &SearchTrie, tau: u8, seq: &str) -> Vec<(String, u8)> {
        let engine = MatchEngine::new(table, trie, tau, SearchMode::Pruned).unwrap();
        let mut tower = SearchTower::new();
        let mut out = Vec::new();
        let id = table.find(seq.as_bytes()).unwrap();
        engine.find_matches(id, &mut tower, &mut out).unwrap();
        let mut found: Vec<(String, u8)> = out
            .into_iter()
            .map(|r| (table.get(r.found).to_string(), r.distance))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_substitution_insertion_deletion() {
        let table = SequenceTable::from_counts([
            ("ACGTACGT", 1),
            ("ACGAACGT", 1), // substitution
            ("ACGTTACGT", 1), // insertion
            ("ACGACGT", 1),  // deletion
            ("TTTTTTTT", 1),
        ])
        .unwrap();
        let trie = engine_for(&table, Metric::Levenshtein);

        assert_eq!(
            matches_of(&table, &trie, 1, "ACGTACGT"),
            vec![
                ("ACGAACGT".to_string(), 1),
                ("ACGACGT".to_string(), 1),
                ("ACGTTACGT".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_self_match_excluded_and_tau_zero() {
        let table = SequenceTable::from_counts([("AAAA", 3), ("AAAT", 1)]).unwrap();
        let trie = engine_for(&table, Metric::Levenshtein);
        assert!(matches_of(&table, &trie, 0, "AAAA").is_empty());
        assert_eq!(matches_of(&table, &trie, 1, "AAAA"), vec![("AAAT".to_string(), 1)]);
    }

    #[test]
    fn test_prefix_sequences_match_by_length_difference() {
        let table = SequenceTable::from_counts([("ACG", 1), ("ACGTT", 1), ("ACGTTTT", 1)]).unwrap();
        let trie = engine_for(&table, Metric::Levenshtein);
        assert_eq!(matches_of(&table, &trie, 2, "ACG"), vec![("ACGTT".to_string(), 2)]);
        assert_eq!(
            matches_of(&table, &trie, 2, "ACGTT"),
            vec![("ACG".to_string(), 2), ("ACGTTTT".to_string(), 2)]
        );
    }

    #[test]
    fn test_reported_distance_is_minimal() {
        // one substitution or a deletion plus an insertion
        let table = SequenceTable::from_counts([("GATTACA", 1), ("GATTGCA", 1)]).unwrap();
        let trie = engine_for(&table, Metric::Levenshtein);
        assert_eq!(matches_of(&table, &trie, 3, "GATTACA"), vec![("GATTGCA".to_string(), 1)]);
    }

    #[test]
    fn test_hamming_ignores_indels() {
        let table = SequenceTable::from_counts([("ACGTAC", 1), ("CGTACA", 1), ("ACGTAA", 1)]).unwrap();
        let trie = engine_for(&table, Metric::Hamming);
        // CGTACA is one shift away but six substitutions away
        assert_eq!(matches_of(&table, &trie, 2, "ACGTAC"), vec![("ACGTAA".to_string(), 1)]);
    }

    #[test]
    fn test_tau_above_maximum_rejected() {
        let table = SequenceTable::from_counts([("ACGT", 1)]).unwrap();
        let trie = engine_for(&table, Metric::Levenshtein);
        let err = MatchEngine::new(&table, &trie, crate::MAX_TAU + 1, SearchMode::Pruned)
            .err()
            .unwrap();
        assert!(matches!(err, StarlingError::Config(_)));
    }

    #[test]
    fn test_search_arbitrary_sequence() {
        let table = SequenceTable::from_counts([("ACGT", 1), ("ACGA", 1), ("GGGG", 1)]).unwrap();
        let trie = engine_for(&table, Metric::Levenshtein);
        let engine = MatchEngine::new(&table, &trie, 1, SearchMode::Pruned).unwrap();
        let mut tower = SearchTower::new();

        let hits = engine.search(b"ACGT", &mut tower).unwrap();
        assert_eq!(hits, vec![(table.find(b"ACGT").unwrap(), 0), (table.find(b"ACGA").unwrap(), 1)]);

        assert!(engine.search(b"ACGX", &mut tower).is_err());
        // the tower is still usable after an encoding failure
        assert_eq!(engine.search(b"GGGA", &mut tower).unwrap().len(), 1);
    }

    #[test]
    fn test_find_all_is_sorted_and_symmetric() {
        let table = SequenceTable::from_counts([
            ("AAAA", 100),
            ("AAAT", 10),
            ("TTTT", 50),
            ("TTTA", 5),
        ])
        .unwrap();
        let trie = engine_for(&table, Metric::Levenshtein);
        let engine = MatchEngine::new(&table, &trie, 1, SearchMode::Pruned).unwrap();
        let records = engine.find_all(2, &ProgressBar::hidden()).unwrap();

        assert_eq!(records.len(), 4);
        assert!(records.windows(2).all(|w| w[0] < w[1]));
        for r in &records {
            assert!(records.contains(&MatchRecord {
                query: r.found,
                found: r.query,
                distance: r.distance
            }));
        }
    }
}
