use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::error::ScanError;
use crate::fastq::FastqRecord;
use crate::fusion::Mapper;
use crate::merge::PairMerger;
use crate::threading::{Pack, ReadPair};
use super::aggregation::MatchAggregation;
use super::repository::PackRepository;
use super::{AbortOnPanic, ScanStats};

pub struct ScanWorker<'a, M: ?Sized, G: ?Sized> {
    pub id: usize,
    pub mapper: &'a M,
    pub merger: &'a G,
    pub aggregation: &'a MatchAggregation,
    pub stats: &'a ScanStats,
}

impl<'a, M, G> ScanWorker<'a, M, G>
where
    M: Mapper + ?Sized,
    G: PairMerger + ?Sized,
{
    pub fn run(&self, repo: &PackRepository) -> Result<(), ScanError> {
        let _guard = AbortOnPanic(repo);
        log::debug!("Scan worker {} started", self.id);
        let result = self.consume(repo);
        if let Err(e) = &result {
            log::warn!("Scan worker {} failed: {}", self.id, e);
            repo.abort();
        }
        log::debug!("Scan worker {} finished", self.id);
        result
    }

    fn consume(&self, repo: &PackRepository) -> Result<(), ScanError> {
        while let Some(pack) = repo.dequeue()? {
            self.scan_pack(pack)?;
        }
        Ok(())
    }

    pub fn scan_pack(&self, pack: Pack) -> Result<(), ScanError> {
        self.stats.packs.fetch_add(1, Ordering::Relaxed);
        for pair in pack.pairs {
            self.scan_pair(pair)?;
        }
        Ok(())
    }

    pub fn scan_pair(&self, pair: ReadPair) -> Result<(), ScanError> {
        self.stats.pairs.fetch_add(1, Ordering::Relaxed);
        let pair = Arc::new(pair);

        // if merged successfully, only the merged read is searched
        if let Some(merged) = self.merger.merge(&pair) {
            self.stats.merged_pairs.fetch_add(1, Ordering::Relaxed);
            let merged_rc = merged.reverse_complement();
            self.map_and_record(&merged, &pair, false)?;
            self.map_and_record(&merged_rc, &pair, false)?;
            return Ok(());
        }

        let rc1 = pair.left.reverse_complement();
        let rc2 = pair.right.reverse_complement();
        self.map_and_record(&pair.left, &pair, false)?;
        self.map_and_record(&pair.right, &pair, false)?;
        self.map_and_record(&rc1, &pair, true)?;
        self.map_and_record(&rc2, &pair, true)?;
        Ok(())
    }

    fn map_and_record(&self, read: &FastqRecord, pair: &Arc<ReadPair>, reversed: bool) -> Result<(), ScanError> {
        self.stats.mapping_attempts.fetch_add(1, Ordering::Relaxed);
        if let Some(mut m) = self.mapper.map_read(read) {
            m.set_reversed(reversed);
            m.add_original_pair(Arc::clone(pair));
            self.aggregation.record(m)?;
            self.stats.matches.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}
