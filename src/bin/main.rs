use pacer::*;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target URL for the requests
    url: String,

    /// Total number of requests to send
    #[arg(allow_negative_numbers = true)]
    requests: i64,

    /// Total time in seconds over which the requests are paced
    #[arg(allow_negative_numbers = true)]
    time: f64,

    /// Start delay mode: uniform, staggered, or a rate curve
    /// (const:A, linear:M,B, sin:A,B,C, exp:A,B,C)
    #[arg(short, long, default_value_t = Pacing::Uniform)]
    pacing: Pacing,

    /// Per-request timeout in seconds (no timeout by default)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Show a progress bar on stderr
    #[arg(long, default_value_t = false)]
    progress: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new(args.url, args.requests, args.time)?
        .with_pacing(args.pacing)
        .with_timeout(args.timeout.map(Duration::from_secs));
    let total = config.requests();
    let dispatcher = Dispatcher::new(config)?;

    let pb = if args.progress {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(ProgressStyle::with_template(
            "{spinner} {elapsed_precise} [{bar:40}] {pos}/{len}",
        )?);
        pb
    } else {
        ProgressBar::hidden()
    };

    let (tx, mut rx) = mpsc::channel::<UnitReport>(100);

    let h = tokio::spawn(async move {
        while let Some(report) = rx.recv().await {
            pb.suspend(|| println!("{}", report.outcome));
            pb.inc(1);
        }
        pb.finish();
    });

    dispatcher.run(tx).await;
    h.await?;

    Ok(())
}
