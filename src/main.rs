//! Main entry point for the apkg-import CLI application.
//!
//! Each package is decoded on a blocking worker thread; this async layer only
//! supervises: it runs several packages at once and enforces `--timeout`.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use apkg_import::cli::Command;
use apkg_import::{Cli, ImportOptions, LocalFileReader, Package, ZipExtractor};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let result = runtime.block_on(run(cli));

    // Parses abandoned by --timeout keep running on their worker threads;
    // don't wait for them on exit.
    runtime.shutdown_background();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let options = cli.import_options();
    let timeout = cli.timeout();

    match &cli.command {
        Command::List { file, verbose } => list_files(file, *verbose, timeout).await,
        Command::Inspect { files, check } => {
            inspect(files, *check, options, timeout, cli.is_quiet()).await
        }
        Command::Dump { file, pretty } => dump(file, *pretty, options, timeout).await,
    }
}

/// Run a blocking import on a worker thread, racing it against `timeout`.
async fn supervised<T, F>(path: &Path, timeout: Option<Duration>, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> apkg_import::Result<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);

    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .with_context(|| format!("{}: timed out after {}s", path.display(), limit.as_secs()))?,
        None => task.await,
    };

    joined
        .context("import worker panicked")?
        .with_context(|| format!("{}", path.display()))
}

/// List archive entries.
///
/// The verbose table mirrors `unzip -v`: sizes, compression ratio and DOS
/// timestamps, followed by a totals line.
async fn list_files(file: &Path, verbose: bool, timeout: Option<Duration>) -> Result<()> {
    let path = file.to_path_buf();
    let entries = supervised(file, timeout, move || {
        ZipExtractor::new(LocalFileReader::new(&path)?).list_files()
    })
    .await?;

    if !verbose {
        for entry in &entries {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>7}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Method", "Date", "Time"
    );
    println!("{}", "-".repeat(79));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        let method = match entry.compression_method {
            apkg_import::zip::CompressionMethod::Stored => "Stored".to_string(),
            apkg_import::zip::CompressionMethod::Deflate => "Defl".to_string(),
            apkg_import::zip::CompressionMethod::Unknown(m) => format!("?{m}"),
        };

        println!(
            "{:>10}  {:>10}  {}  {:>7}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            method,
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
        }
    }

    println!("{}", "-".repeat(79));
    println!(
        "{:>10}  {:>10}  {}  {:>30}  {} entries",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        entries.len()
    );

    Ok(())
}

/// Decode every package concurrently and print one summary line each.
///
/// A failing package is reported and the rest still run; the command fails
/// at the end if any package did.
async fn inspect(
    files: &[PathBuf],
    check: bool,
    options: ImportOptions,
    timeout: Option<Duration>,
    quiet: bool,
) -> Result<()> {
    let handles: Vec<_> = files
        .iter()
        .cloned()
        .map(|path| {
            let options = options.clone();
            tokio::spawn(async move {
                let source = path.clone();
                let package = supervised(&path, timeout, move || {
                    apkg_import::parse_package_with(&source, &options)
                })
                .await;
                (path, package)
            })
        })
        .collect();

    let mut failures = 0usize;
    for handle in handles {
        let (path, package) = handle.await.context("inspect task panicked")?;
        match package {
            Ok(package) => print_summary(&path, &package, check, quiet),
            Err(e) => {
                failures += 1;
                eprintln!("error: {e:#}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} packages failed", files.len());
    }
    Ok(())
}

fn print_summary(path: &Path, package: &Package, check: bool, quiet: bool) {
    println!(
        "{}: {} decks, {} models, {} notes, {} cards, {} media files",
        path.display(),
        package.decks.len(),
        package.models.len(),
        package.notes.len(),
        package.cards.len(),
        package.media.len()
    );

    if !check {
        return;
    }

    let issues = package.integrity_issues();
    if issues.is_empty() {
        if !quiet {
            println!("  no integrity issues");
        }
        return;
    }
    for issue in &issues {
        println!("  {issue}");
    }
}

/// Print the decoded package as JSON on stdout.
async fn dump(
    file: &Path,
    pretty: bool,
    options: ImportOptions,
    timeout: Option<Duration>,
) -> Result<()> {
    let path = file.to_path_buf();
    let package = supervised(file, timeout, move || {
        apkg_import::parse_package_with(&path, &options)
    })
    .await?;

    let mut json = if pretty {
        serde_json::to_vec_pretty(&package)?
    } else {
        serde_json::to_vec(&package)?
    };
    json.push(b'\n');

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&json).await?;
    stdout.flush().await?;

    Ok(())
}

/// Space saved by compression, as the right-aligned percentage column.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}
