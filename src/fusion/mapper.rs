use rustc_hash::FxHashMap;

use super::{FusionReference, Match};
use crate::error::ScanError;
use crate::fastq::FastqRecord;

pub trait Mapper: Sync {
    fn map_read(&self, read: &FastqRecord) -> Option<Match>;
}

#[derive(Debug, Clone)]
pub struct MapperOptions {
    pub seed_len: usize,
    pub max_mismatch: usize,
    /// Bases required on each side of the break.
    pub min_flank: usize,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self { seed_len: 16, max_mismatch: 4, min_flank: 12 }
    }
}

pub struct JunctionMapper {
    junctions: Vec<Vec<u8>>,
    breaks: Vec<usize>,
    index: FxHashMap<u64, Vec<(u32, u32)>>,
    options: MapperOptions,
}

impl JunctionMapper {
    pub fn new(references: &[FusionReference], options: MapperOptions) -> Result<Self, ScanError> {
        if options.seed_len == 0 || options.seed_len > 32 {
            return Err(ScanError::InvalidConfig(format!("seed length must be in 1..=32, got {}", options.seed_len)));
        }

        let mut index: FxHashMap<u64, Vec<(u32, u32)>> = FxHashMap::default();
        let mut junctions = Vec::with_capacity(references.len());
        let mut breaks = Vec::with_capacity(references.len());
        for (r, fusion) in references.iter().enumerate() {
            let junction = fusion.junction().into_bytes();
            for (pos, kmer) in kmers(&junction, options.seed_len) {
                index.entry(kmer).or_default().push((r as u32, pos as u32));
            }
            junctions.push(junction);
            breaks.push(fusion.break_pos());
        }
        log::debug!("Indexed {} seeds of length {} over {} junctions", index.len(), options.seed_len, junctions.len());

        Ok(Self { junctions, breaks, index, options })
    }

    // read position p lines up with junction position p + offset
    fn evaluate(&self, seq: &[u8], r: usize, offset: i64) -> Option<(usize, usize)> {
        let junction = &self.junctions[r];
        let start = (-offset).max(0);
        let end = (seq.len() as i64).min(junction.len() as i64 - offset);
        if start >= end {
            return None;
        }
        let read_break = self.breaks[r] as i64 - offset;
        let flank = self.options.min_flank as i64;
        if read_break - start < flank || end - read_break < flank {
            return None;
        }

        let mut mismatches = 0;
        for p in start..end {
            if seq[p as usize].to_ascii_uppercase() != junction[(p + offset) as usize] {
                mismatches += 1;
                if mismatches > self.options.max_mismatch {
                    return None;
                }
            }
        }
        Some((mismatches, read_break as usize))
    }
}

impl Mapper for JunctionMapper {
    fn map_read(&self, read: &FastqRecord) -> Option<Match> {
        let seq = read.seq.as_bytes();

        let mut candidates: Vec<(u32, i64)> = Vec::new();
        for (pos, kmer) in kmers(seq, self.options.seed_len) {
            if let Some(hits) = self.index.get(&kmer) {
                candidates.extend(hits.iter().map(|&(r, rpos)| (r, rpos as i64 - pos as i64)));
            }
        }
        candidates.sort_unstable();
        candidates.dedup();

        // (mismatches, reference, read_break)
        let mut best: Option<(usize, usize, usize)> = None;
        for (r, offset) in candidates {
            let r = r as usize;
            if let Some((mismatches, read_break)) = self.evaluate(seq, r, offset) {
                if best.map_or(true, |(bm, br, _)| (mismatches, r) < (bm, br)) {
                    best = Some((mismatches, r, read_break));
                }
            }
        }

        best.map(|(mismatches, r, read_break)| Match::new(r, read.clone(), read_break, mismatches))
    }
}

fn encode(b: u8) -> Option<u64> {
    match b.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// 2-bit packed k-mers with their start positions. Windows containing N are skipped.
fn kmers(seq: &[u8], k: usize) -> Vec<(usize, u64)> {
    let mut out = Vec::with_capacity(seq.len().saturating_sub(k) + 1);
    if k == 0 || seq.len() < k {
        return out;
    }
    let mask = if k == 32 { u64::MAX } else { (1u64 << (2 * k)) - 1 };
    let mut kmer = 0u64;
    let mut valid = 0usize;
    for (i, &b) in seq.iter().enumerate() {
        match encode(b) {
            Some(code) => {
                kmer = ((kmer << 2) | code) & mask;
                valid += 1;
            }
            None => valid = 0,
        }
        if valid >= k {
            out.push((i + 1 - k, kmer));
        }
    }
    out
}
