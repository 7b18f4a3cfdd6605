mod mapper;
mod matches;

use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::error::ScanError;

pub use self::mapper::{JunctionMapper, Mapper, MapperOptions};
pub use self::matches::{by_strength, Match};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionReference {
    pub name: String,
    pub upstream: String,
    pub downstream: String,
}

impl FusionReference {
    pub fn new(name: &str, upstream: &str, downstream: &str) -> Self {
        Self {
            name: name.to_string(),
            upstream: upstream.to_ascii_uppercase(),
            downstream: downstream.to_ascii_uppercase(),
        }
    }

    pub fn junction(&self) -> String {
        format!("{}{}", self.upstream, self.downstream)
    }

    /// Position of the first downstream base inside the junction sequence.
    pub fn break_pos(&self) -> usize {
        self.upstream.len()
    }
}

pub fn load_references(path: &str) -> Result<Vec<FusionReference>, ScanError> {
    let f = File::open(path)?;
    parse_references(BufReader::new(f))
}

/// Parses `name,upstream,downstream` lines. Blank lines and `#` comments are skipped.
pub fn parse_references<R: BufRead>(reader: R) -> Result<Vec<FusionReference>, ScanError> {
    let mut refs = Vec::new();
    let mut names = FxHashSet::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let invalid = |reason: String| ScanError::InvalidReference { line: line_no, reason };

        let fields: Vec<&str> = trimmed.split(',').map(|s| s.trim()).collect();
        if fields.len() != 3 {
            return Err(invalid(format!("expected 3 comma separated fields, found {}", fields.len())));
        }
        let (name, upstream, downstream) = (fields[0], fields[1], fields[2]);
        if name.is_empty() {
            return Err(invalid("empty fusion name".to_string()));
        }
        for (label, seq) in [("upstream", upstream), ("downstream", downstream)] {
            if seq.is_empty() {
                return Err(invalid(format!("empty {} sequence for {}", label, name)));
            }
            if let Some(c) = seq.chars().find(|c| !matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T' | 'N')) {
                return Err(invalid(format!("invalid base '{}' in {} sequence of {}", c, label, name)));
            }
        }
        if !names.insert(name.to_string()) {
            return Err(invalid(format!("duplicated fusion name {}", name)));
        }
        refs.push(FusionReference::new(name, upstream, downstream));
    }

    if refs.is_empty() {
        return Err(ScanError::InvalidReference { line: 0, reason: "no fusion defined".to_string() });
    }
    log::info!("Loaded {} fusion references", refs.len());
    Ok(refs)
}
