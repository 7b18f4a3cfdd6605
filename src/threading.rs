use crate::fastq::FastqRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    pub left: FastqRecord,
    pub right: FastqRecord,
}

impl ReadPair {
    pub fn new(left: FastqRecord, right: FastqRecord) -> Self {
        Self { left, right }
    }
}

#[derive(Debug)]
pub struct Pack {
    pub id: u64,
    pub pairs: Vec<ReadPair>,
}

impl Pack {
    pub fn with_capacity(id: u64, capacity: usize) -> Self {
        Self { id, pairs: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
