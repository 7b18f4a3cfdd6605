use anyhow::Context;
use clap::Parser;
use log::{error, info, Level};
use simple_logger::init_with_level;

use fusescan_rs::config::Cli;
use fusescan_rs::fastq::FastqPairReader;
use fusescan_rs::fusion::{by_strength, load_references, JunctionMapper};
use fusescan_rs::html_report::HtmlReport;
use fusescan_rs::report::{JsonReport, ReportSink, TextReport};
use fusescan_rs::scan::scan;

fn run(cli: &Cli) -> anyhow::Result<()> {
    let fusions = load_references(&cli.fusion)
        .with_context(|| format!("failed to load fusion references from {}", cli.fusion))?;
    let mapper = JunctionMapper::new(&fusions, cli.mapper_options())?;
    let merger = cli.merger();

    let reader = FastqPairReader::new(&cli.in1, &cli.in2)
        .with_context(|| format!("failed to open {} / {}", cli.in1, cli.in2))?;
    let outcome = scan(reader, fusions.len(), &mapper, &merger, &cli.scan_config(), by_strength)?;

    let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(TextReport::new(std::io::stdout().lock()))];
    if !cli.json.is_empty() {
        sinks.push(Box::new(JsonReport::new(&cli.json, &cli.report_title).with_options(cli)?));
    }
    if !cli.html.is_empty() {
        sinks.push(Box::new(HtmlReport::new(&cli.html, &cli.report_title)));
    }
    for sink in sinks.iter_mut() {
        sink.write(&fusions, &outcome.matches, &outcome.summary)?;
    }
    Ok(())
}

fn main() {
    let start = std::time::Instant::now();
    let cli = Cli::parse();
    let level = if cli.verbose { Level::Debug } else { Level::Info };
    init_with_level(level).unwrap_or_else(|e| {
        eprintln!("Error: failed to initialise logging: {}", e);
        std::process::exit(1);
    });

    run(&cli).unwrap_or_else(|e| {
        error!("{:#}", e);
        std::process::exit(1);
    });

    info!("Elapsed time: {:?}", start.elapsed());
}
