use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::ScanError;
use crate::threading::Pack;

// Slots, cursors and the end-of-production flag live behind one lock so that
// a consumer sees "empty" and "finished" in a single observation.
struct Ring {
    slots: Vec<Option<Pack>>,
    write_pos: usize,
    read_pos: usize,
    written: u64,
    read: u64,
    finished: bool,
    aborted: bool,
}

impl Ring {
    fn is_empty(&self) -> bool {
        self.write_pos == self.read_pos
    }

    // one slot always stays empty
    fn is_full(&self) -> bool {
        (self.write_pos + 1) % self.slots.len() == self.read_pos
    }

    fn backlog(&self) -> u64 {
        self.written - self.read
    }
}

/// Fixed-capacity circular buffer of packs with blocking enqueue/dequeue.
pub struct PackRepository {
    ring: Mutex<Ring>,
    not_full: Condvar,
    not_empty: Condvar,
    soft_limit: u64,
}

impl PackRepository {
    /// `capacity` ring slots hold at most `capacity - 1` packs.
    /// The producer additionally throttles itself once `soft_limit` packs are in flight.
    pub fn new(capacity: usize, soft_limit: usize) -> Result<Self, ScanError> {
        if capacity < 2 {
            return Err(ScanError::InvalidConfig(format!("ring capacity must be at least 2, got {}", capacity)));
        }
        if soft_limit == 0 {
            return Err(ScanError::InvalidConfig("pack in-memory limit must be at least 1".to_string()));
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Ok(Self {
            ring: Mutex::new(Ring {
                slots,
                write_pos: 0,
                read_pos: 0,
                written: 0,
                read: 0,
                finished: false,
                aborted: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            soft_limit: soft_limit as u64,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ring>, ScanError> {
        self.ring.lock().map_err(|_| ScanError::Poisoned("pack repository"))
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner).slots.len() - 1
    }

    pub fn soft_limit(&self) -> u64 {
        self.soft_limit
    }

    /// Blocks until a slot is free, stores the pack and returns the backlog including it.
    pub fn enqueue(&self, pack: Pack) -> Result<u64, ScanError> {
        let mut ring = self.lock()?;
        while ring.is_full() && !ring.aborted {
            ring = self.not_full.wait(ring).map_err(|_| ScanError::Poisoned("pack repository"))?;
        }
        if ring.aborted {
            return Err(ScanError::Aborted);
        }
        if ring.finished {
            return Err(ScanError::CorruptRing(format!("pack {} enqueued after end of production", pack.id)));
        }

        let pos = ring.write_pos;
        if ring.slots[pos].is_some() {
            return Err(ScanError::CorruptRing(format!("write slot {} still occupied", pos)));
        }
        ring.slots[pos] = Some(pack);
        ring.write_pos = (pos + 1) % ring.slots.len();
        ring.written += 1;
        let backlog = ring.backlog();
        drop(ring);

        self.not_empty.notify_one();
        Ok(backlog)
    }

    /// Blocks until a pack is available. Returns `None` once production has
    /// finished and the ring is drained, or after an abort.
    pub fn dequeue(&self) -> Result<Option<Pack>, ScanError> {
        let mut ring = self.lock()?;
        loop {
            if ring.aborted {
                return Ok(None);
            }
            if !ring.is_empty() {
                break;
            }
            if ring.finished {
                return Ok(None);
            }
            ring = self.not_empty.wait(ring).map_err(|_| ScanError::Poisoned("pack repository"))?;
        }

        let pos = ring.read_pos;
        let pack = ring.slots[pos]
            .take()
            .ok_or_else(|| ScanError::CorruptRing(format!("read slot {} is empty", pos)))?;
        ring.read_pos = (pos + 1) % ring.slots.len();
        ring.read += 1;
        drop(ring);

        // the producer may wait either for a slot or for the soft limit
        self.not_full.notify_all();
        Ok(Some(pack))
    }

    /// Suspends the producer until fewer than `soft_limit` packs are in flight.
    pub fn wait_below_soft_limit(&self) -> Result<(), ScanError> {
        let mut ring = self.lock()?;
        while ring.backlog() >= self.soft_limit && !ring.aborted {
            ring = self.not_full.wait(ring).map_err(|_| ScanError::Poisoned("pack repository"))?;
        }
        if ring.aborted {
            return Err(ScanError::Aborted);
        }
        Ok(())
    }

    pub fn signal_end_of_production(&self) -> Result<(), ScanError> {
        let mut ring = self.lock()?;
        ring.finished = true;
        drop(ring);
        self.not_empty.notify_all();
        Ok(())
    }

    /// Fatal stop: wakes every waiter, later enqueues fail and dequeues report end of stream.
    pub fn abort(&self) {
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        ring.aborted = true;
        drop(ring);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    pub fn backlog(&self) -> Result<u64, ScanError> {
        Ok(self.lock()?.backlog())
    }

    pub fn is_finished(&self) -> Result<bool, ScanError> {
        Ok(self.lock()?.finished)
    }
}
