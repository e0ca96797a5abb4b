use capstat::{AnalysisConfig, AnalysisResult, Filter, PacketAnalyzer};
use clap::Parser;
use crossbeam_channel::{unbounded, Receiver, Sender};
use dotenv::dotenv;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Summarize pcap/pcapng captures: protocols, endpoints, HTTP requests and DNS queries.
#[derive(Parser, Debug)]
#[command(name = "capstat", version, about)]
struct Args {
    /// Capture files to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Only count frames to or from this IP address
    #[arg(long)]
    address: Option<String>,

    /// Only count frames containing this layer (Ethernet, IPv4, IPv6, TCP, UDP, DNS, HTTPRequest, HTTPResponse)
    #[arg(long)]
    protocol: Option<String>,

    /// Only count frames with this source or destination port
    #[arg(long)]
    port: Option<u16>,

    /// Entries kept in each ranking and list
    #[arg(long, default_value_t = capstat::config::DEFAULT_TOP_N)]
    top: usize,

    /// Worker threads (defaults to one per file, bounded by available cores)
    #[arg(long)]
    jobs: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn filter(&self) -> Option<Filter> {
        let filter = Filter {
            address: self.address.clone(),
            protocol: self.protocol.clone(),
            port: self.port,
        };
        (!filter.is_empty()).then_some(filter)
    }

    fn workers(&self) -> usize {
        let cores = thread::available_parallelism().map_or(1, |n| n.get());
        self.jobs
            .unwrap_or_else(|| self.files.len().min(cores))
            .max(1)
    }
}

type Outcome = (usize, PathBuf, capstat::Result<AnalysisResult>);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("capstat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || running_clone.store(false, Ordering::SeqCst))?;

    let analyzer = PacketAnalyzer::new(AnalysisConfig::default().with_top_n(args.top))
        .with_cancel(running.clone());
    let filter = args.filter();

    let (job_tx, job_rx) = unbounded::<(usize, PathBuf)>();
    let (result_tx, result_rx) = unbounded::<Outcome>();

    let workers: Vec<_> = (0..args.workers())
        .map(|_| {
            let analyzer = analyzer.clone();
            let filter = filter.clone();
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            thread::spawn(move || run_worker(analyzer, filter, jobs, results))
        })
        .collect();
    drop(result_tx);

    for job in args.files.iter().cloned().enumerate() {
        job_tx.send(job)?;
    }
    drop(job_tx);

    let mut outcomes: Vec<Outcome> = result_rx.iter().collect();
    for worker in workers {
        if worker.join().is_err() {
            error!("analysis worker panicked");
        }
    }
    outcomes.sort_by_key(|(order, _, _)| *order);

    let mut failures = 0;
    for (_, path, outcome) in outcomes {
        let document = match outcome {
            Ok(result) => {
                info!(
                    file = %path.display(),
                    packets = result.total_packets,
                    "analysis finished"
                );
                json!({ "file": path.display().to_string(), "result": result })
            }
            Err(e) => {
                failures += 1;
                error!(file = %path.display(), "analysis failed: {}", e);
                json!({ "file": path.display().to_string(), "error": e.to_string() })
            }
        };
        if args.pretty {
            println!("{}", serde_json::to_string_pretty(&document)?);
        } else {
            println!("{}", serde_json::to_string(&document)?);
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn run_worker(
    analyzer: PacketAnalyzer,
    filter: Option<Filter>,
    jobs: Receiver<(usize, PathBuf)>,
    results: Sender<Outcome>,
) {
    for (order, path) in jobs {
        let outcome = analyzer.analyze_file(&path, filter.as_ref());
        if let Err(e) = results.send((order, path, outcome)) {
            error!("channel error: {}", e);
            return;
        }
    }
}
