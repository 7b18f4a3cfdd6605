use std::fs::File;
use std::io::{BufWriter, Write};

use serde::Serialize;

use crate::error::ScanError;
use crate::fusion::{FusionReference, Match};
use crate::scan::{FusionMatches, ScanSummary};

/// Consumes the finalized matches. Sinks never mutate them.
pub trait ReportSink {
    fn write(&mut self, references: &[FusionReference], matches: &FusionMatches, summary: &ScanSummary) -> Result<(), ScanError>;
}

pub(crate) fn check_references(references: &[FusionReference], matches: &FusionMatches) -> Result<(), ScanError> {
    if references.len() != matches.references() {
        return Err(ScanError::InvalidConfig(format!(
            "{} fusion references but matches for {}",
            references.len(),
            matches.references()
        )));
    }
    Ok(())
}

pub fn strand(m: &Match) -> char {
    if m.reversed { '-' } else { '+' }
}

/// Upstream and downstream parts of every match, padded so the breaks line up.
pub fn pileup(matches: &[Match]) -> Vec<String> {
    let widest = matches.iter().map(|m| m.upstream_part().len()).max().unwrap_or(0);
    matches
        .iter()
        .map(|m| {
            let up = m.upstream_part();
            format!("{}{} {}", " ".repeat(widest - up.len()), up, m.downstream_part())
        })
        .collect()
}

pub struct TextReport<W: Write> {
    out: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn write(&mut self, references: &[FusionReference], matches: &FusionMatches, summary: &ScanSummary) -> Result<(), ScanError> {
        check_references(references, matches)?;
        writeln!(self.out, "Scanned {} read pairs, {} merged, {} supporting reads", summary.pairs, summary.merged_pairs, summary.matches)?;
        for (fusion, ms) in references.iter().zip(matches.iter()) {
            if ms.is_empty() {
                continue;
            }
            writeln!(self.out)?;
            writeln!(self.out, "#{} ({} reads, {} upstream + {} downstream bases)", fusion.name, ms.len(), fusion.upstream.len(), fusion.downstream.len())?;
            for (i, (m, line)) in ms.iter().zip(pileup(ms)).enumerate() {
                writeln!(self.out, "{}, mismatches {}, strand {}, {}", i + 1, m.mismatches, strand(m), m.read.name)?;
                writeln!(self.out, "{}", line)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonMatch<'a> {
    read: &'a str,
    seq: &'a str,
    read_break: usize,
    mismatches: usize,
    strand: String,
    pair: Option<(&'a str, &'a str)>,
}

#[derive(Serialize)]
struct JsonFusion<'a> {
    name: &'a str,
    upstream: &'a str,
    downstream: &'a str,
    count: usize,
    matches: Vec<JsonMatch<'a>>,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a serde_json::Value>,
    summary: &'a ScanSummary,
    fusions: Vec<JsonFusion<'a>>,
}

pub struct JsonReport {
    path: String,
    title: String,
    options: Option<serde_json::Value>,
}

impl JsonReport {
    pub fn new(path: &str, title: &str) -> Self {
        Self { path: path.to_string(), title: title.to_string(), options: None }
    }

    /// Echoes the run options in the report.
    pub fn with_options<T: Serialize>(mut self, options: &T) -> Result<Self, ScanError> {
        self.options = Some(serde_json::to_value(options)?);
        Ok(self)
    }
}

impl ReportSink for JsonReport {
    fn write(&mut self, references: &[FusionReference], matches: &FusionMatches, summary: &ScanSummary) -> Result<(), ScanError> {
        check_references(references, matches)?;
        let fusions = references
            .iter()
            .zip(matches.iter())
            .map(|(fusion, ms)| JsonFusion {
                name: &fusion.name,
                upstream: &fusion.upstream,
                downstream: &fusion.downstream,
                count: ms.len(),
                matches: ms
                    .iter()
                    .map(|m| JsonMatch {
                        read: &m.read.name,
                        seq: &m.read.seq,
                        read_break: m.read_break,
                        mismatches: m.mismatches,
                        strand: strand(m).to_string(),
                        pair: m.origin.as_ref().map(|p| (p.left.name.as_str(), p.right.name.as_str())),
                    })
                    .collect(),
            })
            .collect();
        let doc = JsonDocument { title: &self.title, options: self.options.as_ref(), summary, fusions };

        let mut w = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut w, &doc)?;
        w.flush()?;
        log::info!("JSON report written to {}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fastq::FastqRecord;
    use crate::scan::MatchAggregation;

    fn record(seq: &str, read_break: usize, reversed: bool) -> Match {
        let read = FastqRecord::new(format!("@{}", seq), seq.to_string(), "+".to_string(), "I".repeat(seq.len()));
        let mut m = Match::new(0, read, read_break, 0);
        m.set_reversed(reversed);
        m
    }

    #[test]
    fn pileup_aligns_breaks() {
        let lines = pileup(&[record("AAAACC", 4, false), record("AACCCC", 2, true)]);
        assert_eq!(lines, vec!["AAAA CC".to_string(), "  AA CCCC".to_string()]);
    }

    #[test]
    fn pileup_splits_on_bytes() {
        // a multi-byte character straddling the break must not panic
        let mut m = record("AAAACC", 4, false);
        m.read.seq = "AAA\u{e9}CC".to_string();
        let lines = pileup(&[m]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("CC"));
    }

    #[test]
    fn sinks_reject_mismatched_reference_count() {
        let refs = vec![FusionReference::new("A_B", "AAAA", "CCCC")];
        let matches = MatchAggregation::new(2).into_matches().unwrap();
        let mut sink = TextReport::new(Vec::new());
        let res = sink.write(&refs, &matches, &ScanSummary::default());
        assert!(matches!(res, Err(ScanError::InvalidConfig(_))));
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn text_report_lists_only_fusions_with_reads() {
        let refs = vec![FusionReference::new("A_B", "AAAA", "CCCC"), FusionReference::new("C_D", "GGGG", "TTTT")];
        let agg = MatchAggregation::new(2);
        agg.record(record("AAAACC", 4, false)).unwrap();
        let matches = agg.into_matches().unwrap();

        let mut sink = TextReport::new(Vec::new());
        sink.write(&refs, &matches, &ScanSummary::default()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains("#A_B (1 reads"));
        assert!(!text.contains("#C_D"));
        assert!(text.contains("strand +"));
    }
}
