//! s3-ferry - Single-file transfer between local storage and an S3 store
//!
//! Host adapter around the library core: parses the flat parameter record,
//! runs the transfer, prints one JSON result record on stdout and exits 0 on
//! success, 1 on failure. Logs go to stderr so stdout stays machine-readable.

use clap::Parser;
use s3_ferry::config::{ConnectionProfile, TransferConfig, TransferDirection, TransferRequest};
use s3_ferry::transfer::{self, TransferResult};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// s3-ferry - upload or download a single file against an S3-compatible store
#[derive(Parser, Debug)]
#[command(name = "s3-ferry")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// host:port of the S3-compatible endpoint
    #[arg(long = "endpoint_url")]
    endpoint_url: String,

    /// Access key id
    #[arg(long)]
    ak: String,

    /// Secret access key
    #[arg(long)]
    sk: String,

    /// Source path (local absolute path for upload; bucket/key for download)
    #[arg(long)]
    src: String,

    /// Destination path (mirror of src)
    #[arg(long)]
    dest: String,

    /// Multipart chunk size in mebibytes
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    bs: u64,

    /// Max concurrent chunk transfers
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    concurrency: u64,

    /// Connect timeout in seconds
    #[arg(long = "connect_timeout", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    connect_timeout: u64,

    /// Read timeout in seconds
    #[arg(long = "read_timeout", default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    read_timeout: u64,

    /// Transfer direction (upload or download)
    #[arg(long, default_value = "upload")]
    state: String,

    /// Validate parameters only; no network or filesystem activity
    #[arg(long)]
    check: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging; stderr only, stdout carries the result record
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting s3-ferry v{}", env!("CARGO_PKG_VERSION"));

    // Check mode validates parameter shape only; nothing is touched and the
    // record reports no change
    if args.check {
        let record = TransferResult {
            success: false,
            message: String::new(),
            src: args.src.clone(),
            dest: args.dest.clone(),
        };
        println!("{}", serde_json::to_string(&record)?);
        return Ok(());
    }

    let result = run(&args).await;
    let success = result.success;
    println!("{}", serde_json::to_string(&result)?);

    if success {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

/// Resolve the parameter record and run the transfer
///
/// Every outcome, including fatal configuration errors, lands in the same
/// result shape; nothing escapes as a panic or raw error.
async fn run(args: &Args) -> TransferResult {
    // Direction parse is fatal and happens before anything else
    let direction: TransferDirection = match args.state.parse() {
        Ok(direction) => direction,
        Err(err) => return TransferResult::failed(err.message, &args.src, &args.dest),
    };

    let request = match TransferRequest::from_paths(direction, &args.src, &args.dest) {
        Ok(request) => request,
        Err(err) => return TransferResult::failed(err.message, &args.src, &args.dest),
    };

    let mut profile = ConnectionProfile::new(&args.endpoint_url, &args.ak, &args.sk);
    profile.connect_timeout_secs = args.connect_timeout;
    profile.read_timeout_secs = args.read_timeout;

    let config = TransferConfig {
        chunk_size_mib: args.bs,
        concurrency: args.concurrency as usize,
    };

    match transfer::run(&profile, &request, &config).await {
        Ok(mut result) => {
            // The record echoes the caller's strings byte-for-byte
            result.src = args.src.clone();
            result.dest = args.dest.clone();
            result
        }
        Err(err) => TransferResult::failed(err.message, &args.src, &args.dest),
    }
}
