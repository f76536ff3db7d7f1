//! Command-line front end for the extraction orchestrator
//!
//! Reads the archive's central directory, then extracts everything or a
//! single entry. With `-b` the run happens on a background thread while this
//! thread renders the shared progress state with an indicatif bar.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use unspool::{Args, Dispatch, ExtractOptions, Outcome, ProgressMonitor, Unzip, format_size};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = match args.quiet {
        0 => Level::INFO,
        1 => Level::WARN,
        _ => Level::ERROR,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env()?;
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let unzip = Unzip::open(&args.zipfile)
        .with_context(|| format!("Failed to read ZIP archive: {}", args.zipfile.display()))?;
    let output_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let options = ExtractOptions::from(&args);
    let progress = ProgressMonitor::new();

    let dispatch = match &args.entry {
        Some(name) => unzip.extract_file_by_name(
            name,
            &output_dir,
            &options,
            args.rename.as_deref(),
            &progress,
            args.background,
        ),
        None => unzip.extract_all(&options, &output_dir, &progress, args.background),
    }
    .with_context(|| format!("Failed to extract {}", args.zipfile.display()))?;

    let total_work = progress.snapshot().total_work;
    if let Dispatch::Background(handle) = dispatch {
        watch(&progress, args.quiet == 0);
        if handle.join().is_err() {
            bail!("extraction thread panicked");
        }
    }

    match progress.outcome() {
        Some(Outcome::Success) => {
            if args.quiet == 0 {
                println!(
                    "Extracted {} ({}) to {}",
                    args.entry.as_deref().unwrap_or("archive"),
                    format_size(total_work),
                    output_dir.display()
                );
            }
            Ok(())
        },
        Some(Outcome::Cancelled) => bail!("extraction cancelled"),
        Some(Outcome::Error(e)) => {
            Err(e).with_context(|| format!("Failed to extract {}", args.zipfile.display()))
        },
        None => bail!("extraction ended without an outcome"),
    }
}

/// Render a background run until it leaves the busy state.
fn watch(progress: &ProgressMonitor, show_bar: bool) {
    let bar = if show_bar {
        let pb = ProgressBar::new(progress.snapshot().total_work);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    while progress.is_busy() {
        if let Some(ref pb) = bar {
            let snap = progress.snapshot();
            pb.set_position(snap.work_completed);
            pb.set_message(snap.file_name.unwrap_or_default());
        }
        thread::sleep(POLL_INTERVAL);
    }

    if let Some(pb) = bar {
        pb.finish_and_clear();
    }
}
