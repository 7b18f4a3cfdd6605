pub mod config;
pub mod error;
pub mod fastq;
pub mod fusion;
pub mod html_report;
pub mod merge;
pub mod report;
pub mod scan;
pub mod threading;
