use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::fastq::FastqRecord;
use crate::threading::ReadPair;

#[derive(Debug, Clone)]
pub struct Match {
    pub reference: usize,
    pub read: FastqRecord,
    /// Position in `read` of the first downstream base.
    pub read_break: usize,
    pub mismatches: usize,
    pub reversed: bool,
    pub origin: Option<Arc<ReadPair>>,
}

impl Match {
    pub fn new(reference: usize, read: FastqRecord, read_break: usize, mismatches: usize) -> Self {
        Self { reference, read, read_break, mismatches, reversed: false, origin: None }
    }

    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    pub fn add_original_pair(&mut self, pair: Arc<ReadPair>) {
        self.origin = Some(pair);
    }

    // read_break is a byte offset
    pub fn upstream_part(&self) -> Cow<'_, str> {
        let seq = self.read.seq.as_bytes();
        String::from_utf8_lossy(&seq[..self.read_break.min(seq.len())])
    }

    pub fn downstream_part(&self) -> Cow<'_, str> {
        let seq = self.read.seq.as_bytes();
        String::from_utf8_lossy(&seq[self.read_break.min(seq.len())..])
    }
}

/// Pileup order: reads with the longest upstream part first, then fewer mismatches.
/// Name and sequence break the remaining ties so the order is total.
pub fn by_strength(a: &Match, b: &Match) -> Ordering {
    b.read_break
        .cmp(&a.read_break)
        .then(a.mismatches.cmp(&b.mismatches))
        .then_with(|| a.read.name.cmp(&b.read.name))
        .then_with(|| a.read.seq.cmp(&b.read.seq))
        .then(a.reversed.cmp(&b.reversed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(name: &str, read_break: usize, mismatches: usize) -> Match {
        let read = FastqRecord::new(name.to_string(), "ACGTACGTAC".to_string(), "+".to_string(), "IIIIIIIIII".to_string());
        Match::new(0, read, read_break, mismatches)
    }

    #[test]
    fn longer_upstream_sorts_first() {
        assert_eq!(by_strength(&m("a", 7, 0), &m("b", 3, 0)), Ordering::Less);
        assert_eq!(by_strength(&m("a", 5, 0), &m("b", 5, 2)), Ordering::Less);
        assert_eq!(by_strength(&m("b", 5, 1), &m("a", 5, 1)), Ordering::Greater);
        assert_eq!(by_strength(&m("a", 5, 1), &m("a", 5, 1)), Ordering::Equal);
    }

    #[test]
    fn splits_read_at_break() {
        let x = m("a", 4, 0);
        assert_eq!(x.upstream_part(), "ACGT");
        assert_eq!(x.downstream_part(), "ACGTAC");
    }

    #[test]
    fn split_inside_multibyte_character_does_not_panic() {
        let mut x = m("a", 4, 0);
        x.read.seq = "ACG\u{e9}TAC".to_string();
        assert_eq!(x.upstream_part(), "ACG\u{fffd}");
        assert_eq!(x.downstream_part(), "\u{fffd}TAC");
    }
}
