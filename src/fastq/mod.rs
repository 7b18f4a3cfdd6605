use std::io::{self, BufRead, BufReader};
use std::fs::File;
use flate2::read::MultiGzDecoder;

use crate::error::ScanError;
use crate::threading::ReadPair;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub name: String,
    pub seq: String,
    pub plus: String,
    pub qual: String,
}

impl FastqRecord {
    pub fn new(name: String, seq: String, plus: String, qual: String) -> Self {
        Self { name, seq, plus, qual }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// The read as it would appear on the opposite strand. Quality is reversed, name kept.
    pub fn reverse_complement(&self) -> FastqRecord {
        FastqRecord {
            name: self.name.clone(),
            seq: reverse_complement(self.seq.as_bytes()),
            plus: self.plus.clone(),
            qual: self.qual.chars().rev().collect(),
        }
    }
}

pub fn complement(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        _ => b'N',
    }
}

pub fn reverse_complement(seq: &[u8]) -> String {
    let mut res = String::with_capacity(seq.len());
    for b in seq.iter().rev() {
        res.push(complement(b.to_ascii_uppercase()) as char);
    }
    res
}

/// Yields read pairs one at a time until exhausted.
pub trait PairSource {
    fn next_pair(&mut self) -> Result<Option<ReadPair>, ScanError>;
}

impl PairSource for std::vec::IntoIter<ReadPair> {
    fn next_pair(&mut self) -> Result<Option<ReadPair>, ScanError> {
        Ok(self.next())
    }
}

pub struct Reader {
    reader: Box<dyn BufRead + Send>,
    label: String,
}

impl Reader {
    pub fn new(path: &str) -> Result<Self, ScanError> {
        let f = File::open(path)?;
        let reader: Box<dyn BufRead + Send> = if path.ends_with(".gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(f)))
        } else {
            Box::new(BufReader::new(f))
        };
        Ok(Self { reader, label: path.to_string() })
    }

    pub fn from_reader<R: io::Read + Send + 'static>(inner: R, label: &str) -> Self {
        Self { reader: Box::new(BufReader::new(inner)), label: label.to_string() }
    }

    fn malformed(&self, reason: impl Into<String>) -> ScanError {
        ScanError::MalformedFastq { path: self.label.clone(), reason: reason.into() }
    }

    fn read_trimmed(&mut self, buf: &mut String) -> Result<bool, ScanError> {
        if self.reader.read_line(buf)? == 0 {
            return Ok(false);
        }
        if buf.ends_with('\n') { buf.pop(); }
        if buf.ends_with('\r') { buf.pop(); }
        Ok(true)
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>, ScanError> {
        let mut name = String::new();
        let mut seq = String::new();
        let mut plus = String::new();
        let mut qual = String::new();

        // skip blank lines between records and at the end of file
        loop {
            if !self.read_trimmed(&mut name)? {
                return Ok(None);
            }
            if !name.is_empty() {
                break;
            }
        }
        if !name.starts_with('@') {
            return Err(self.malformed(format!("header line does not start with '@': {}", name)));
        }
        if !self.read_trimmed(&mut seq)? || !self.read_trimmed(&mut plus)? || !self.read_trimmed(&mut qual)? {
            return Err(self.malformed(format!("truncated record {}", name)));
        }
        if !plus.starts_with('+') {
            return Err(self.malformed(format!("separator line of {} does not start with '+'", name)));
        }
        if !seq.is_ascii() || !qual.is_ascii() {
            return Err(self.malformed(format!("non-ASCII sequence or quality in {}", name)));
        }
        if seq.len() != qual.len() {
            return Err(self.malformed(format!(
                "sequence and quality length differ in {} ({} vs {})",
                name, seq.len(), qual.len()
            )));
        }

        Ok(Some(FastqRecord { name, seq, plus, qual }))
    }
}

pub struct FastqPairReader {
    left: Reader,
    right: Reader,
}

impl FastqPairReader {
    pub fn new(read1: &str, read2: &str) -> Result<Self, ScanError> {
        Ok(Self::from_readers(Reader::new(read1)?, Reader::new(read2)?))
    }

    pub fn from_readers(left: Reader, right: Reader) -> Self {
        Self { left, right }
    }
}

impl PairSource for FastqPairReader {
    fn next_pair(&mut self) -> Result<Option<ReadPair>, ScanError> {
        match (self.left.next_record()?, self.right.next_record()?) {
            (Some(left), Some(right)) => Ok(Some(ReadPair::new(left, right))),
            (None, None) => Ok(None),
            _ => Err(ScanError::UnpairedInput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &'static str) -> Reader {
        Reader::from_reader(text.as_bytes(), "test.fq")
    }

    #[test]
    fn reverse_complement_reverses_quality() {
        let rec = FastqRecord::new("@r".into(), "AACGTN".into(), "+".into(), "ABCDEF".into());
        let rc = rec.reverse_complement();
        assert_eq!(rc.seq, "NACGTT");
        assert_eq!(rc.qual, "FEDCBA");
        assert_eq!(rc.name, "@r");
    }

    #[test]
    fn reads_records_until_eof() {
        let mut r = reader("@a\nACGT\n+\nIIII\n\n@b\nGG\n+\nII\n");
        assert_eq!(r.next_record().unwrap().unwrap().seq, "ACGT");
        assert_eq!(r.next_record().unwrap().unwrap().name, "@b");
        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn rejects_quality_length_mismatch() {
        let mut r = reader("@a\nACGT\n+\nIII\n");
        assert!(matches!(r.next_record(), Err(ScanError::MalformedFastq { .. })));
    }

    #[test]
    fn rejects_non_ascii_sequence() {
        let mut r = reader("@a\nACéGT\n+\nIIIIII\n");
        assert!(matches!(r.next_record(), Err(ScanError::MalformedFastq { .. })));
        let mut r = reader("@a\nACGT\n+\nIIé\n");
        assert!(matches!(r.next_record(), Err(ScanError::MalformedFastq { .. })));
    }

    #[test]
    fn rejects_truncated_record() {
        let mut r = reader("@a\nACGT\n");
        assert!(matches!(r.next_record(), Err(ScanError::MalformedFastq { .. })));
    }

    #[test]
    fn pair_reader_detects_unequal_files() {
        let left = reader("@a\nACGT\n+\nIIII\n@b\nACGT\n+\nIIII\n");
        let right = reader("@a\nACGT\n+\nIIII\n");
        let mut pairs = FastqPairReader::from_readers(left, right);
        assert!(pairs.next_pair().unwrap().is_some());
        assert!(matches!(pairs.next_pair(), Err(ScanError::UnpairedInput)));
    }
}
