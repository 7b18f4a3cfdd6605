use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::error::ScanError;
use crate::fusion::FusionReference;
use crate::report::{check_references, pileup, strand, ReportSink};
use crate::scan::{FusionMatches, ScanSummary};

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn write_html_report<W: Write>(
    f: &mut W,
    references: &[FusionReference],
    matches: &FusionMatches,
    summary: &ScanSummary,
    title: &str,
) -> io::Result<()> {
    let title = escape(title);

    writeln!(f, "<!DOCTYPE html>")?;
    writeln!(f, "<html>")?;
    writeln!(f, "<head>")?;
    writeln!(f, "<meta charset=\"utf-8\">")?;
    writeln!(f, "<title>{}</title>", title)?;
    writeln!(f, "<style>")?;
    writeln!(f, "body {{ font-family: Arial, sans-serif; margin: 20px; }}")?;
    writeln!(f, "table {{ border-collapse: collapse; width: 100%; max-width: 800px; }}")?;
    writeln!(f, "th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}")?;
    writeln!(f, "th {{ background-color: #f2f2f2; }}")?;
    writeln!(f, "h1 {{ color: #333; }}")?;
    writeln!(f, "pre {{ font-family: monospace; background-color: #fafafa; padding: 8px; overflow-x: auto; }}")?;
    writeln!(f, "</style>")?;
    writeln!(f, "</head>")?;
    writeln!(f, "<body>")?;

    writeln!(f, "<h1>{}</h1>", title)?;

    writeln!(f, "<h2>General Statistics</h2>")?;
    writeln!(f, "<table>")?;
    writeln!(f, "<tr><th>Metric</th><th>Value</th></tr>")?;
    writeln!(f, "<tr><td>Read Pairs</td><td>{}</td></tr>", summary.pairs)?;
    writeln!(f, "<tr><td>Merged Pairs</td><td>{}</td></tr>", summary.merged_pairs)?;
    writeln!(f, "<tr><td>Mapping Attempts</td><td>{}</td></tr>", summary.mapping_attempts)?;
    writeln!(f, "<tr><td>Supporting Reads</td><td>{}</td></tr>", summary.matches)?;
    writeln!(f, "</table>")?;

    writeln!(f, "<h2>Fusions</h2>")?;
    writeln!(f, "<table>")?;
    writeln!(f, "<tr><th>Fusion</th><th>Supporting Reads</th></tr>")?;
    for (fusion, ms) in references.iter().zip(matches.iter()) {
        writeln!(f, "<tr><td>{}</td><td>{}</td></tr>", escape(&fusion.name), ms.len())?;
    }
    writeln!(f, "</table>")?;

    for (fusion, ms) in references.iter().zip(matches.iter()) {
        if ms.is_empty() {
            continue;
        }
        writeln!(f, "<h2>{}</h2>", escape(&fusion.name))?;
        writeln!(f, "<table>")?;
        writeln!(f, "<tr><th>#</th><th>Read</th><th>Strand</th><th>Mismatches</th></tr>")?;
        for (i, m) in ms.iter().enumerate() {
            writeln!(f, "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>", i + 1, escape(&m.read.name), strand(m), m.mismatches)?;
        }
        writeln!(f, "</table>")?;
        writeln!(f, "<pre>")?;
        for line in pileup(ms) {
            writeln!(f, "{}", escape(&line))?;
        }
        writeln!(f, "</pre>")?;
    }

    writeln!(f, "</body>")?;
    writeln!(f, "</html>")?;

    Ok(())
}

pub struct HtmlReport {
    path: String,
    title: String,
}

impl HtmlReport {
    pub fn new(path: &str, title: &str) -> Self {
        Self { path: path.to_string(), title: title.to_string() }
    }
}

impl ReportSink for HtmlReport {
    fn write(&mut self, references: &[FusionReference], matches: &FusionMatches, summary: &ScanSummary) -> Result<(), ScanError> {
        check_references(references, matches)?;
        let mut f = BufWriter::new(File::create(&self.path)?);
        write_html_report(&mut f, references, matches, summary, &self.title)?;
        f.flush()?;
        log::info!("HTML report written to {}", self.path);
        Ok(())
    }
}
