//! Concurrent scanning pipeline.
//!
//! One producer batches read pairs into packs and pushes them through a
//! bounded [`PackRepository`]. A fixed pool of [`ScanWorker`]s pulls packs,
//! maps every pair against the fusion references and records matches into a
//! shared [`MatchAggregation`]. After every thread has joined, the matches of
//! each reference are sorted once and handed out as [`FusionMatches`].

mod aggregation;
mod producer;
mod repository;
mod worker;

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::ScanError;
use crate::fastq::PairSource;
use crate::fusion::{Mapper, Match};
use crate::merge::PairMerger;

pub use self::aggregation::{FusionMatches, MatchAggregation};
pub use self::producer::{produce, ProduceSummary};
pub use self::repository::PackRepository;
pub use self::worker::ScanWorker;

// how many read pairs one pack has
pub const PACK_SIZE: usize = 1000;

// ring slots of the pack repository
pub const PACK_NUM_LIMIT: usize = 10000;

// if the number of in memory packs reaches this limit, the producer waits
pub const PACK_IN_MEM_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub batch_size: usize,
    pub ring_capacity: usize,
    pub soft_limit: usize,
    pub workers: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: PACK_SIZE,
            ring_capacity: PACK_NUM_LIMIT,
            soft_limit: PACK_IN_MEM_LIMIT,
            workers: 4,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.batch_size == 0 {
            return Err(ScanError::InvalidConfig("pack size must be at least 1".to_string()));
        }
        if self.ring_capacity < 2 {
            return Err(ScanError::InvalidConfig(format!("ring capacity must be at least 2, got {}", self.ring_capacity)));
        }
        if self.soft_limit == 0 {
            return Err(ScanError::InvalidConfig("pack in-memory limit must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(ScanError::InvalidConfig("at least one scan thread is required".to_string()));
        }
        if self.soft_limit >= self.ring_capacity - 1 {
            log::warn!(
                "Pack in-memory limit {} is not below the ring capacity {}, the ring throttles first",
                self.soft_limit,
                self.ring_capacity - 1
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ScanStats {
    pub packs: AtomicU64,
    pub pairs: AtomicU64,
    pub merged_pairs: AtomicU64,
    pub mapping_attempts: AtomicU64,
    pub matches: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub packs: u64,
    pub pairs: u64,
    pub merged_pairs: u64,
    pub mapping_attempts: u64,
    pub matches: u64,
}

impl ScanStats {
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            packs: self.packs.load(Ordering::Relaxed),
            pairs: self.pairs.load(Ordering::Relaxed),
            merged_pairs: self.merged_pairs.load(Ordering::Relaxed),
            mapping_attempts: self.mapping_attempts.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
        }
    }
}

pub struct ScanOutcome {
    pub matches: FusionMatches,
    pub summary: ScanSummary,
    pub produced: ProduceSummary,
}

// Aborts the repository if the owning thread unwinds, so nobody waits for it forever.
pub(crate) struct AbortOnPanic<'r>(pub(crate) &'r PackRepository);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abort();
        }
    }
}

/// Scans every pair of `source` and returns the matches of each of the
/// `references` references, sorted by `order`.
pub fn scan<S, M, G, F>(
    source: S,
    references: usize,
    mapper: &M,
    merger: &G,
    config: &ScanConfig,
    order: F,
) -> Result<ScanOutcome, ScanError>
where
    S: PairSource + Send,
    M: Mapper + ?Sized,
    G: PairMerger + ?Sized,
    F: Fn(&Match, &Match) -> CmpOrdering,
{
    config.validate()?;
    log::info!(
        "Scanning with {} threads, pack size {}, ring capacity {}, pack in-memory limit {}",
        config.workers, config.batch_size, config.ring_capacity, config.soft_limit
    );

    let repo = PackRepository::new(config.ring_capacity, config.soft_limit)?;
    let aggregation = MatchAggregation::new(references);
    let stats = ScanStats::default();
    let mut source = source;

    let (produced, worker_results) = crossbeam::scope(|scope| {
        let repo = &repo;
        let producer = scope.spawn(move |_| {
            let _guard = AbortOnPanic(repo);
            produce(&mut source, repo, config.batch_size)
        });

        let workers: Vec<_> = (0..config.workers)
            .map(|id| {
                let worker = ScanWorker { id, mapper, merger, aggregation: &aggregation, stats: &stats };
                scope.spawn(move |_| worker.run(repo))
            })
            .collect();

        let produced = producer.join().unwrap_or(Err(ScanError::ThreadPanicked("producer")));
        let worker_results: Vec<Result<(), ScanError>> = workers
            .into_iter()
            .map(|h| h.join().unwrap_or(Err(ScanError::ThreadPanicked("scan worker"))))
            .collect();
        (produced, worker_results)
    })
    .map_err(|_| ScanError::ThreadPanicked("scan"))?;

    // report the root cause rather than the abort it triggered
    let mut errors: Vec<ScanError> = worker_results.into_iter().filter_map(Result::err).collect();
    let produced = match produced {
        Ok(p) => Some(p),
        Err(e) => {
            errors.insert(0, e);
            None
        }
    };
    if let Some(pos) = errors.iter().position(|e| !matches!(e, ScanError::Aborted)) {
        return Err(errors.swap_remove(pos));
    }
    if let Some(e) = errors.pop() {
        return Err(e);
    }
    let produced = produced.ok_or(ScanError::Aborted)?;

    let mut matches = aggregation.into_matches()?;
    // sort the matches to make the pileup more clear
    matches.finalize(order);

    let summary = stats.summary();
    log::info!(
        "Scanned {} read pairs ({} merged), {} mapping attempts, {} matches",
        summary.pairs, summary.merged_pairs, summary.mapping_attempts, summary.matches
    );
    Ok(ScanOutcome { matches, summary, produced })
}
