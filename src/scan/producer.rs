use crate::error::ScanError;
use crate::fastq::PairSource;
use crate::threading::Pack;
use super::repository::PackRepository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProduceSummary {
    pub packs: u64,
    pub pairs: u64,
    pub peak_backlog: u64,
}

/// Drains `source` into packs of `batch_size` pairs and signals end of
/// production once, whether or not the source failed.
pub fn produce<S: PairSource>(source: &mut S, repo: &PackRepository, batch_size: usize) -> Result<ProduceSummary, ScanError> {
    let result = fill_packs(source, repo, batch_size);
    if let Err(e) = &result {
        log::warn!("Producer stopped early: {}", e);
    }
    // a failed signal must not hide the source error
    let signaled = repo.signal_end_of_production();
    let summary = result?;
    signaled?;
    log::info!("Produced {} read pairs in {} packs", summary.pairs, summary.packs);
    Ok(summary)
}

fn fill_packs<S: PairSource>(source: &mut S, repo: &PackRepository, batch_size: usize) -> Result<ProduceSummary, ScanError> {
    let batch_size = batch_size.max(1);
    let mut summary = ProduceSummary::default();
    let mut pack = Pack::with_capacity(0, batch_size);

    loop {
        let pair = match source.next_pair() {
            Ok(Some(pair)) => pair,
            Ok(None) => break,
            Err(e) => {
                if !pack.is_empty() {
                    log::warn!("Dropping {} read pairs of unfinished pack {}", pack.len(), pack.id);
                }
                return Err(e);
            }
        };
        pack.pairs.push(pair);
        summary.pairs += 1;

        // a full pack
        if pack.len() == batch_size {
            let next = Pack::with_capacity(summary.packs + 1, batch_size);
            push_pack(repo, std::mem::replace(&mut pack, next), &mut summary)?;

            // if the consumers are far behind, wait before starting the next pack
            if repo.backlog()? >= repo.soft_limit() {
                log::debug!("Backlog reached {} packs, producer waiting", repo.soft_limit());
                repo.wait_below_soft_limit()?;
            }
        }
    }

    // the last pack
    if !pack.is_empty() {
        push_pack(repo, pack, &mut summary)?;
    }
    Ok(summary)
}

fn push_pack(repo: &PackRepository, pack: Pack, summary: &mut ProduceSummary) -> Result<(), ScanError> {
    let backlog = repo.enqueue(pack)?;
    summary.packs += 1;
    summary.peak_backlog = summary.peak_backlog.max(backlog);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fastq::FastqRecord;
    use crate::threading::ReadPair;

    fn pairs(n: usize) -> std::vec::IntoIter<ReadPair> {
        (0..n)
            .map(|i| {
                let r = FastqRecord::new(format!("@p{}", i), "ACGT".into(), "+".into(), "IIII".into());
                ReadPair::new(r.clone(), r)
            })
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn drain(repo: &PackRepository) -> Vec<Pack> {
        std::iter::from_fn(|| repo.dequeue().unwrap()).collect()
    }

    #[test]
    fn batches_into_full_and_partial_packs() {
        let repo = PackRepository::new(16, 16).unwrap();
        let summary = produce(&mut pairs(7), &repo, 3).unwrap();
        assert_eq!(summary.packs, 3);
        assert_eq!(summary.pairs, 7);
        let packs = drain(&repo);
        assert_eq!(packs.iter().map(Pack::len).collect::<Vec<_>>(), vec![3, 3, 1]);
        assert_eq!(packs.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 1, 2]);
        let names: Vec<String> = packs.iter().flat_map(|p| p.pairs.iter().map(|pr| pr.left.name.clone())).collect();
        assert_eq!(names, (0..7).map(|i| format!("@p{}", i)).collect::<Vec<_>>());
    }

    #[test]
    fn empty_source_enqueues_nothing_and_finishes() {
        let repo = PackRepository::new(4, 4).unwrap();
        let summary = produce(&mut pairs(0), &repo, 3).unwrap();
        assert_eq!(summary, ProduceSummary::default());
        assert!(repo.is_finished().unwrap());
        assert!(repo.dequeue().unwrap().is_none());
    }

    #[test]
    fn exact_multiple_has_no_trailing_pack() {
        let repo = PackRepository::new(16, 16).unwrap();
        let summary = produce(&mut pairs(9), &repo, 3).unwrap();
        assert_eq!(summary.packs, 3);
        assert!(drain(&repo).iter().all(|p| p.len() == 3));
    }

    struct FailingSource(usize);

    impl PairSource for FailingSource {
        fn next_pair(&mut self) -> Result<Option<ReadPair>, ScanError> {
            if self.0 == 0 {
                return Err(ScanError::UnpairedInput);
            }
            self.0 -= 1;
            let r = FastqRecord::new("@x".into(), "A".into(), "+".into(), "I".into());
            Ok(Some(ReadPair::new(r.clone(), r)))
        }
    }

    #[test]
    fn source_error_still_signals_end_of_production() {
        let repo = PackRepository::new(16, 16).unwrap();
        let res = produce(&mut FailingSource(4), &repo, 3);
        assert!(matches!(res, Err(ScanError::UnpairedInput)));
        assert!(repo.is_finished().unwrap());
        assert_eq!(drain(&repo).len(), 1);
    }

    #[test]
    fn source_error_drops_only_the_unfinished_pack() {
        let repo = PackRepository::new(16, 16).unwrap();
        // packs of 3: the 4th pair sits in an unfinished pack when the source fails
        assert!(produce(&mut FailingSource(4), &repo, 3).is_err());
        let packs = drain(&repo);
        assert_eq!(packs.iter().map(Pack::len).sum::<usize>(), 3);
        assert_eq!(packs[0].id, 0);
    }
}
