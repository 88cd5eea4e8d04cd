//! Shared helpers for the integration tests: brute-force distance references
//! and seeded barcode generators.
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use starling::SequenceTable;

pub const BASES: &[u8] = b"ACGT";

/// Full Levenshtein distance by the textbook DP.
pub fn levenshtein(a: &[u8], b: &[u8]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

pub fn hamming(a: &[u8], b: &[u8]) -> usize {
    assert_eq!(a.len(), b.len(), "hamming needs equal lengths");
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Every ordered pair `(a, b, d)` of distinct table sequences with `d <= tau`.
pub fn brute_force_matches(
    table: &SequenceTable,
    tau: u8,
    distance: fn(&[u8], &[u8]) -> usize,
) -> Vec<(u32, u32, u8)> {
    let mut out = Vec::new();
    for (a, ea) in table.iter() {
        for (b, eb) in table.iter() {
            if a == b {
                continue;
            }
            let d = distance(&ea.sequence, &eb.sequence);
            if d <= tau as usize {
                out.push((a, b, d as u8));
            }
        }
    }
    out.sort_unstable();
    out
}

pub fn random_barcode(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| BASES[rng.gen_range(0..4)]).collect()
}

/// One random edit: substitution, insertion or deletion.
pub fn mutate(rng: &mut StdRng, seq: &[u8]) -> Vec<u8> {
    let mut out = seq.to_vec();
    let pos = rng.gen_range(0..out.len());
    match rng.gen_range(0..3) {
        0 => {
            let other = BASES.iter().copied().filter(|&b| b != out[pos]).collect::<Vec<_>>();
            out[pos] = other[rng.gen_range(0..other.len())];
        }
        1 => out.insert(pos, BASES[rng.gen_range(0..4)]),
        _ if out.len() > 1 => {
            out.remove(pos);
        }
        _ => out.push(BASES[rng.gen_range(0..4)]),
    }
    out
}

/// Reads drawn from `centers` true barcodes, each read carrying up to
/// `max_errors` random edits. Deterministic for a given seed.
pub fn noisy_reads(seed: u64, centers: usize, reads_per_center: usize, len: usize, max_errors: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut reads = Vec::new();
    for _ in 0..centers {
        let center = random_barcode(&mut rng, len);
        for _ in 0..reads_per_center {
            let mut read = center.clone();
            for _ in 0..rng.gen_range(0..=max_errors) {
                read = mutate(&mut rng, &read);
            }
            reads.push(read);
        }
    }
    reads
}

/// Fixed-length variant of [`noisy_reads`] using substitutions only.
pub fn noisy_fixed_length_reads(seed: u64, centers: usize, reads_per_center: usize, len: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut reads = Vec::new();
    for _ in 0..centers {
        let center = random_barcode(&mut rng, len);
        for _ in 0..reads_per_center {
            let mut read = center.clone();
            if rng.gen_bool(0.3) {
                let pos = rng.gen_range(0..len);
                read[pos] = BASES[rng.gen_range(0..4)];
            }
            reads.push(read);
        }
    }
    reads
}
