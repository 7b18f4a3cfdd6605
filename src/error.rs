use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid fusion reference at line {line}: {reason}")]
    InvalidReference { line: usize, reason: String },
    #[error("Malformed FASTQ in {path}: {reason}")]
    MalformedFastq { path: String, reason: String },
    #[error("PE input files have different number of reads")]
    UnpairedInput,
    #[error("Lock poisoned: {0}")]
    Poisoned(&'static str),
    #[error("Pack repository corrupted: {0}")]
    CorruptRing(String),
    #[error("Scan aborted")]
    Aborted,
    #[error("Match refers to unknown fusion reference #{0}")]
    UnknownReference(usize),
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}
