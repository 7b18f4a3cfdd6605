use clap::{Parser, ArgAction};
use serde::Serialize;

use crate::fusion::MapperOptions;
use crate::merge::OverlapMerger;
use crate::scan::{ScanConfig, PACK_IN_MEM_LIMIT, PACK_NUM_LIMIT, PACK_SIZE};

#[derive(Parser, Debug, Clone, Serialize)]
#[command(name = "fusescan-rs", version = "0.1.0", about = "Paired-end fusion boundary scanner (Rust)")]
pub struct Cli {
    #[arg(short='f', long="fusion")]
    pub fusion: String,
    #[arg(short='i', long="in1")]
    pub in1: String,
    #[arg(short='I', long="in2")]
    pub in2: String,

    // Reporting
    #[arg(long="html", default_value = "")]
    pub html: String,
    #[arg(short='j', long="json", default_value = "")]
    pub json: String,
    #[arg(short='R', long="report_title", default_value = "fusescan report")]
    pub report_title: String,

    // Threading
    #[arg(short='t', long="thread", default_value_t=4)]
    pub thread: usize,

    // Performance tuning
    #[arg(long="pack_size", default_value_t=PACK_SIZE)]
    pub pack_size: usize,
    #[arg(long="ring_capacity", default_value_t=PACK_NUM_LIMIT)]
    pub ring_capacity: usize,
    #[arg(long="pack_in_mem_limit", default_value_t=PACK_IN_MEM_LIMIT)]
    pub pack_in_mem_limit: usize,

    // Read pair merging
    #[arg(long="overlap_len_require", default_value_t=30)]
    pub overlap_len_require: usize,
    #[arg(long="overlap_diff_limit", default_value_t=5)]
    pub overlap_diff_limit: usize,
    #[arg(long="overlap_diff_percent_limit", default_value_t=20)]
    pub overlap_diff_percent_limit: u8,

    // Fusion mapping
    #[arg(long="seed_len", default_value_t=16)]
    pub seed_len: usize,
    #[arg(long="max_mismatch", default_value_t=4)]
    pub max_mismatch: usize,
    #[arg(long="min_flank", default_value_t=12)]
    pub min_flank: usize,

    #[arg(short='v', long="verbose", action=ArgAction::SetTrue)]
    pub verbose: bool,
}

impl Cli {
    pub fn thread_num(&self) -> usize {
        if self.thread == 0 { num_cpus::get() } else { self.thread }
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            batch_size: self.pack_size,
            ring_capacity: self.ring_capacity,
            soft_limit: self.pack_in_mem_limit,
            workers: self.thread_num(),
        }
    }

    pub fn mapper_options(&self) -> MapperOptions {
        MapperOptions {
            seed_len: self.seed_len,
            max_mismatch: self.max_mismatch,
            min_flank: self.min_flank,
        }
    }

    pub fn merger(&self) -> OverlapMerger {
        OverlapMerger::new(self.overlap_len_require, self.overlap_diff_limit, self.overlap_diff_percent_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_pipeline_constants() {
        let cli = Cli::parse_from(["fusescan-rs", "-f", "fusions.csv", "-i", "r1.fq", "-I", "r2.fq"]);
        let cfg = cli.scan_config();
        assert_eq!(cfg.batch_size, PACK_SIZE);
        assert_eq!(cfg.ring_capacity, PACK_NUM_LIMIT);
        assert_eq!(cfg.soft_limit, PACK_IN_MEM_LIMIT);
        assert_eq!(cfg.workers, 4);
        assert!(cli.html.is_empty() && cli.json.is_empty());
        assert_eq!(cli.mapper_options().seed_len, 16);
    }

    #[test]
    fn zero_threads_means_all_cpus() {
        let cli = Cli::parse_from(["fusescan-rs", "-f", "f", "-i", "a", "-I", "b", "-t", "0", "--pack_size", "7"]);
        assert_eq!(cli.scan_config().workers, num_cpus::get());
        assert_eq!(cli.scan_config().batch_size, 7);
    }
}
