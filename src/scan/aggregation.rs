use std::cmp::Ordering;
use std::sync::Mutex;

use crate::error::ScanError;
use crate::fusion::Match;

pub struct MatchAggregation {
    buckets: Mutex<Vec<Vec<Match>>>,
    references: usize,
}

impl MatchAggregation {
    pub fn new(references: usize) -> Self {
        let mut buckets = Vec::with_capacity(references);
        buckets.resize_with(references, Vec::new);
        Self { buckets: Mutex::new(buckets), references }
    }

    pub fn record(&self, m: Match) -> Result<(), ScanError> {
        if m.reference >= self.references {
            return Err(ScanError::UnknownReference(m.reference));
        }
        let mut buckets = self.buckets.lock().map_err(|_| ScanError::Poisoned("match aggregation"))?;
        buckets[m.reference].push(m);
        Ok(())
    }

    pub fn into_matches(self) -> Result<FusionMatches, ScanError> {
        let buckets = self.buckets.into_inner().map_err(|_| ScanError::Poisoned("match aggregation"))?;
        Ok(FusionMatches { buckets })
    }
}

#[derive(Debug, Default)]
pub struct FusionMatches {
    buckets: Vec<Vec<Match>>,
}

impl FusionMatches {
    /// Sorts every reference's matches. Sorting an already sorted list leaves it unchanged.
    pub fn finalize<F>(&mut self, order: F)
    where
        F: Fn(&Match, &Match) -> Ordering,
    {
        for bucket in self.buckets.iter_mut() {
            bucket.sort_by(&order);
        }
    }

    pub fn for_reference(&self, reference: usize) -> &[Match] {
        self.buckets.get(reference).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Match]> {
        self.buckets.iter().map(Vec::as_slice)
    }

    pub fn references(&self) -> usize {
        self.buckets.len()
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fastq::FastqRecord;
    use crate::fusion::by_strength;
    use std::thread;

    fn synthetic(reference: usize, worker: usize, i: usize) -> Match {
        let read = FastqRecord::new(format!("@w{}_{}", worker, i), "ACGT".to_string(), "+".to_string(), "IIII".to_string());
        Match::new(reference, read, i % 17, i % 3)
    }

    #[test]
    fn concurrent_records_are_neither_lost_nor_duplicated() {
        let workers = 8;
        let per_worker = 2_000;
        let agg = MatchAggregation::new(5);
        thread::scope(|s| {
            for w in 0..workers {
                let agg = &agg;
                s.spawn(move || {
                    for i in 0..per_worker {
                        agg.record(synthetic((w + i) % 5, w, i)).unwrap();
                    }
                });
            }
        });
        let matches = agg.into_matches().unwrap();
        assert_eq!(matches.total(), workers * per_worker);

        let mut names: Vec<&str> = matches.iter().flatten().map(|m| m.read.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), workers * per_worker);
    }

    // each match lands in its own reference's slot, never in a shared first bucket
    #[test]
    fn matches_are_bucketed_by_their_own_reference() {
        let agg = MatchAggregation::new(3);
        agg.record(synthetic(2, 0, 0)).unwrap();
        agg.record(synthetic(1, 0, 1)).unwrap();
        agg.record(synthetic(2, 0, 2)).unwrap();
        let matches = agg.into_matches().unwrap();
        assert_eq!(matches.for_reference(0).len(), 0);
        assert_eq!(matches.for_reference(1).len(), 1);
        assert_eq!(matches.for_reference(2).len(), 2);
        assert!(matches.iter().enumerate().all(|(r, ms)| ms.iter().all(|m| m.reference == r)));
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let agg = MatchAggregation::new(2);
        assert!(matches!(agg.record(synthetic(2, 0, 0)), Err(ScanError::UnknownReference(2))));
    }

    #[test]
    fn finalize_sorts_and_is_idempotent() {
        let agg = MatchAggregation::new(1);
        for i in 0..100 {
            agg.record(synthetic(0, i % 4, i)).unwrap();
        }
        let mut matches = agg.into_matches().unwrap();
        matches.finalize(by_strength);
        let sorted = matches.for_reference(0);
        assert!(sorted.windows(2).all(|w| by_strength(&w[0], &w[1]) != Ordering::Greater));

        let first: Vec<String> = sorted.iter().map(|m| m.read.name.clone()).collect();
        matches.finalize(by_strength);
        let second: Vec<String> = matches.for_reference(0).iter().map(|m| m.read.name.clone()).collect();
        assert_eq!(first, second);
    }
}
