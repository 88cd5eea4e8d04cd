use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Stable index of a unique sequence within its [`SequenceTable`].
pub type SeqId = u32;

/// One distinct sequence and how often it was observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueSequence {
    pub sequence: Vec<u8>,
    pub count: u64,
    /// 1-based numbers of the raw records carrying this sequence.
    pub ids: Vec<u64>,
    /// Position of the first occurrence in the input stream.
    pub first_seen: usize,
}

impl UniqueSequence {
    pub fn new(sequence: Vec<u8>, count: u64) -> Self {
        Self {
            sequence,
            count,
            ids: Vec::new(),
            first_seen: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

impl std::fmt::Display for UniqueSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&String::from_utf8_lossy(&self.sequence))
    }
}

/// Deduplicated input, sorted lexicographically by sequence.
///
/// Index order is lexicographic order, so `SeqId`s are reproducible for a
/// given multiset of reads no matter how the reads were ordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceTable {
    entries: Vec<UniqueSequence>,
}

impl SequenceTable {
    /// Collapse raw reads into unique sequences. Reads are upper-cased and
    /// numbered from 1 in iteration order; empty reads are skipped.
    pub fn from_reads<I, S>(reads: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut unique: IndexMap<Vec<u8>, UniqueSequence> = IndexMap::new();
        let mut skipped = 0usize;

        for (index, read) in reads.into_iter().enumerate() {
            let read = read.as_ref();
            if read.is_empty() {
                skipped += 1;
                continue;
            }
            let key = read.to_ascii_uppercase();
            let entry = unique.entry(key).or_insert_with_key(|key| UniqueSequence {
                first_seen: index,
                ..UniqueSequence::new(key.clone(), 0)
            });
            entry.count += 1;
            entry.ids.push(index as u64 + 1);
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} empty reads", skipped);
        }

        Self::finish(unique)
    }

    /// Build from pre-counted sequences. Case-insensitive duplicates are
    /// merged by summing their counts.
    pub fn from_counts<I, S>(counts: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<[u8]>,
    {
        let mut unique: IndexMap<Vec<u8>, UniqueSequence> = IndexMap::new();

        for (index, (sequence, count)) in counts.into_iter().enumerate() {
            let sequence = sequence.as_ref();
            if count == 0 {
                return Err(crate::StarlingError::Config(format!(
                    "sequence {} has a count of zero",
                    String::from_utf8_lossy(sequence)
                )));
            }
            if sequence.is_empty() {
                return Err(crate::StarlingError::Config(
                    "empty sequence in count table".to_string(),
                ));
            }
            let key = sequence.to_ascii_uppercase();
            unique
                .entry(key)
                .or_insert_with_key(|key| UniqueSequence {
                    first_seen: index,
                    ..UniqueSequence::new(key.clone(), 0)
                })
                .count += count;
        }

        Self::finish(unique)
    }

    fn finish(unique: IndexMap<Vec<u8>, UniqueSequence>) -> crate::Result<Self> {
        if unique.len() > SeqId::MAX as usize {
            return Err(crate::StarlingError::Resource(format!(
                "{} unique sequences exceed the index limit",
                unique.len()
            )));
        }

        let mut entries: Vec<UniqueSequence> = unique.into_values().collect();
        entries.sort_unstable_by(|a, b| a.sequence.cmp(&b.sequence));

        tracing::debug!("Sequence table holds {} unique sequences", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: SeqId) -> &UniqueSequence {
        &self.entries[id as usize]
    }

    pub fn entries(&self) -> &[UniqueSequence] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeqId, &UniqueSequence)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i as SeqId, entry))
    }

    /// Look up a sequence (exact, case-insensitive).
    pub fn find(&self, sequence: &[u8]) -> Option<SeqId> {
        let key = sequence.to_ascii_uppercase();
        self.entries
            .binary_search_by(|entry| entry.sequence.as_slice().cmp(&key))
            .ok()
            .map(|i| i as SeqId)
    }

    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn max_len(&self) -> usize {
        self.entries.iter().map(|e| e.len()).max().unwrap_or(0)
    }

    pub fn median_len(&self) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        let mut lengths: Vec<usize> = self.entries.iter().map(|e| e.len()).collect();
        let mid = lengths.len() / 2;
        *lengths.select_nth_unstable(mid).1
    }

    /// Rank order: higher count first, then lower `SeqId` (lexicographic).
    pub fn rank_cmp(&self, a: SeqId, b: SeqId) -> Ordering {
        self.get(b)
            .count
            .cmp(&self.get(a).count)
            .then_with(|| a.cmp(&b))
    }

    /// All ids, best-ranked first.
    pub fn ranked_ids(&self) -> Vec<SeqId> {
        let mut ids: Vec<SeqId> = (0..self.len() as SeqId).collect();
        ids.sort_unstable_by(|&a, &b| self.rank_cmp(a, b));
        ids
    }
}
