mod overlap;

use crate::fastq::FastqRecord;
use crate::threading::ReadPair;
use self::overlap::OverlapAnalyzer;

pub trait PairMerger: Sync {
    fn merge(&self, pair: &ReadPair) -> Option<FastqRecord>;
}

#[derive(Debug, Clone)]
pub struct OverlapMerger {
    pub overlap_len_require: usize,
    pub overlap_diff_limit: usize,
    pub overlap_diff_percent_limit: f32,
}

impl Default for OverlapMerger {
    fn default() -> Self {
        Self { overlap_len_require: 30, overlap_diff_limit: 5, overlap_diff_percent_limit: 0.2 }
    }
}

impl OverlapMerger {
    pub fn new(overlap_len_require: usize, overlap_diff_limit: usize, overlap_diff_percent_limit: u8) -> Self {
        Self {
            overlap_len_require,
            overlap_diff_limit,
            overlap_diff_percent_limit: overlap_diff_percent_limit as f32 / 100.0,
        }
    }
}

impl PairMerger for OverlapMerger {
    fn merge(&self, pair: &ReadPair) -> Option<FastqRecord> {
        let r1 = &pair.left;
        let rc2 = pair.right.reverse_complement();
        let res = OverlapAnalyzer::analyze(
            r1.seq.as_bytes(),
            rc2.seq.as_bytes(),
            self.overlap_len_require.max(1),
            self.overlap_diff_limit,
            self.overlap_diff_percent_limit,
        );
        if !res.overlapped {
            return None;
        }

        let s1 = r1.seq.as_bytes();
        let q1 = r1.qual.as_bytes();
        let s2 = rc2.seq.as_bytes();
        let q2 = rc2.qual.as_bytes();
        let ol = res.overlap_len;

        let mut seq: Vec<u8> = Vec::with_capacity(s1.len() + s2.len());
        let mut qual: Vec<u8> = Vec::with_capacity(s1.len() + s2.len());

        // start of the overlap in R1 and in rc(R2)
        let (start1, start2) = if res.offset >= 0 {
            let off = res.offset as usize;
            seq.extend_from_slice(&s1[..off]);
            qual.extend_from_slice(&q1[..off]);
            (off, 0)
        } else {
            // insert shorter than the reads: everything outside the overlap is adapter
            (0, (-res.offset) as usize)
        };

        for i in 0..ol {
            let (b1, b2) = (s1[start1 + i], s2[start2 + i]);
            let (v1, v2) = (q1[start1 + i], q2[start2 + i]);
            if b1 == b2 || v1 >= v2 {
                seq.push(b1);
                qual.push(v1.max(v2));
            } else {
                seq.push(b2);
                qual.push(v2);
            }
        }

        if res.offset >= 0 {
            seq.extend_from_slice(&s2[ol..]);
            qual.extend_from_slice(&q2[ol..]);
        }

        let name = format!("{} merged_offset_{}_overlap_{}_diff_{}", r1.name, res.offset, ol, res.diff);
        Some(FastqRecord::new(
            name,
            String::from_utf8_lossy(&seq).into_owned(),
            "+".to_string(),
            String::from_utf8_lossy(&qual).into_owned(),
        ))
    }
}
