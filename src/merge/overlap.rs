pub struct OverlapResult {
    pub overlapped: bool,
    pub offset: i32,
    pub overlap_len: usize,
    pub diff: usize,
}

pub struct OverlapAnalyzer;

impl OverlapAnalyzer {
    /// Finds where `seq1` (R1) overlaps `s2` (the reverse complement of R2).
    ///
    /// A non-negative offset means `seq1[offset..]` lines up with `s2[0..]`;
    /// a negative offset means `s2[-offset..]` lines up with `seq1[0..]`.
    pub fn analyze(seq1: &[u8], s2: &[u8], min_overlap: usize, diff_limit: usize, diff_percent_limit: f32) -> OverlapResult {
        let len1 = seq1.len();
        let len2 = s2.len();

        let mut best_offset = 0;
        let mut best_diff = usize::MAX;
        let mut best_overlap_len = 0;
        let mut found = false;

        // Direction 1: R1 starts before S2 (offset >= 0)
        for offset in 0..len1 {
            let overlap_len = std::cmp::min(len1 - offset, len2);
            if overlap_len < min_overlap { break; }

            let limit = std::cmp::min(diff_limit, (overlap_len as f32 * diff_percent_limit) as usize);
            let diff = count_diff(&seq1[offset..], &s2[0..overlap_len], overlap_len, limit);

            if diff <= limit && (diff < best_diff || (diff == best_diff && overlap_len > best_overlap_len)) {
                best_diff = diff;
                best_offset = offset as i32;
                best_overlap_len = overlap_len;
                found = true;
            }
        }

        // Direction 2: S2 starts before R1 (offset < 0)
        for offset_pos in 1..len2 {
            let overlap_len = std::cmp::min(len2 - offset_pos, len1);
            if overlap_len < min_overlap { break; }

            let limit = std::cmp::min(diff_limit, (overlap_len as f32 * diff_percent_limit) as usize);
            let diff = count_diff(&s2[offset_pos..], &seq1[0..overlap_len], overlap_len, limit);

            if diff <= limit && (diff < best_diff || (diff == best_diff && overlap_len > best_overlap_len)) {
                best_diff = diff;
                best_offset = -(offset_pos as i32);
                best_overlap_len = overlap_len;
                found = true;
            }
        }

        OverlapResult {
            overlapped: found,
            offset: best_offset,
            overlap_len: best_overlap_len,
            diff: best_diff,
        }
    }
}

// stops counting once `limit` is exceeded
fn count_diff(s1: &[u8], s2: &[u8], len: usize, limit: usize) -> usize {
    let mut diff = 0;
    for i in 0..len {
        if s1[i] != s2[i] {
            diff += 1;
            if diff > limit {
                break;
            }
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_positive_offset() {
        let s1 = b"TTTTTACGTACGGATCCAGT";
        let s2 = b"ACGTACGGATCCAGTCCCCC";
        let res = OverlapAnalyzer::analyze(s1, s2, 10, 2, 0.2);
        assert!(res.overlapped);
        assert_eq!(res.offset, 5);
        assert_eq!(res.overlap_len, 15);
        assert_eq!(res.diff, 0);
    }

    #[test]
    fn finds_negative_offset() {
        let s1 = b"ACGTACGGATCCAGT";
        let s2 = b"GGGACGTACGGATCCAGT";
        let res = OverlapAnalyzer::analyze(s1, s2, 10, 2, 0.2);
        assert!(res.overlapped);
        assert_eq!(res.offset, -3);
        assert_eq!(res.overlap_len, 15);
    }

    #[test]
    fn short_overlap_is_rejected() {
        let res = OverlapAnalyzer::analyze(b"AAAAAAAACGT", b"CGTGGGGGGGG", 10, 2, 0.2);
        assert!(!res.overlapped);
    }
}
