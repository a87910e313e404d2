//! CLI binary for edgequake-pdfsplit.
//!
//! A thin shim over the library crate: it maps CLI flags to `SplitConfig`,
//! drives a `SplitSession` and writes the downloaded archive to disk.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfsplit::pipeline::input::default_output_path;
use edgequake_pdfsplit::{
    inspect, write_archive, OperationState, OutputMode, ProgressCallback, SplitConfig,
    SplitInput, SplitProgressCallback, SplitSession,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the PDF loads, then a bar
/// with one log line per finished page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the page currently being processed.
    page_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Splitting");
        self.bar.reset_eta();
    }

    fn page_elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Remove the bar, e.g. when the run failed before `on_split_complete`.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl SplitProgressCallback for CliProgressCallback {
    fn on_split_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Splitting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        if let Ok(mut t) = self.page_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar
            .set_message(format!("Processing page {page_num} of {total_pages}…"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, bytes: usize) {
        let elapsed = self.page_elapsed_secs();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{bytes:>8} B")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed = self.page_elapsed_secs();

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.finish_and_clear();
    }

    fn on_split_complete(&self, _total_pages: usize, _archive_bytes: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One PDF per page → report.zip next to the input
  pdfsplit report.pdf

  # One JPEG per page at 2× scale
  pdfsplit --mode jpg scan.pdf -o pages.zip

  # Lossless PNG at 3×
  pdfsplit --mode png --scale 3 slides.pdf

  # Inspect PDF metadata only
  pdfsplit --inspect-only report.pdf

  # JSON summary of the archive
  pdfsplit --json report.pdf > summary.json

OUTPUT:
  The archive is named after the input (report.pdf → report.zip) and holds
  report_p1.pdf, report_p2.pdf, … in page order. A document with a single
  page is not split.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH    Path to libpdfium (file or directory), needed for jpg/png
  PDFSPLIT_*         Every flag can also be set as PDFSPLIT_<FLAG>
  RUST_LOG           Overrides the log filter
"#;

/// Split a multi-page PDF into one file per page, bundled as a zip.
#[derive(Parser, Debug)]
#[command(
    name = "pdfsplit",
    version,
    about = "Split a multi-page PDF into one PDF or image per page, bundled as a zip",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to split.
    input: PathBuf,

    /// What each page becomes: pdf, jpg or png.
    #[arg(short, long, env = "PDFSPLIT_MODE", value_enum, default_value = "pdf")]
    mode: ModeArg,

    /// Write the zip here instead of `{input}.zip` next to the input.
    #[arg(short, long, env = "PDFSPLIT_OUTPUT")]
    output: Option<PathBuf>,

    /// Render scale for jpg/png (0.25–8.0).
    #[arg(long, env = "PDFSPLIT_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// JPEG quality (1–100).
    #[arg(long, env = "PDFSPLIT_JPEG_QUALITY", default_value_t = 95,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Declared MIME type of the input, e.g. application/pdf.
    #[arg(long, env = "PDFSPLIT_CONTENT_TYPE")]
    content_type: Option<String>,

    /// PDF user password for encrypted documents (jpg/png only).
    #[arg(long, env = "PDFSPLIT_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium library or the directory containing it.
    #[arg(long, env = "PDFSPLIT_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Print a JSON summary (archive name, pages, stats) to stdout.
    #[arg(long, env = "PDFSPLIT_JSON")]
    json: bool,

    /// Print PDF metadata only, no splitting.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFSPLIT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSPLIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSPLIT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Pdf,
    Jpg,
    Png,
}

impl From<ModeArg> for OutputMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Pdf => OutputMode::Pdf,
            ModeArg::Jpg => OutputMode::Jpg,
            ModeArg::Png => OutputMode::Png,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level logs; errors always get through.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            println!("Encrypted:    {}", meta.is_encrypted);
            println!("Size:         {} bytes", meta.file_size);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new_dynamic);
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
    )?;

    let mut input = SplitInput::from_path(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    if let Some(ref ct) = cli.content_type {
        input = input.with_content_type(ct.clone());
    }

    // ── Run split ────────────────────────────────────────────────────────
    let session = SplitSession::new();
    let state = session.run(input, &config).await?;
    if let Some(cb) = &progress {
        cb.clear();
    }

    let output = match (&state, session.output()) {
        (OperationState::Success { .. }, Some(output)) => output,
        _ => {
            eprintln!("{} {}", red("✘"), red(&state.message()));
            std::process::exit(1);
        }
    };

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));
    write_archive(&output.archive, &output_path)
        .await
        .context("Failed to write archive")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        eprintln!("{} {}", green("✔"), state.message());
        eprintln!(
            "   {} entries  {} bytes  {}ms  →  {}",
            output.pages.len(),
            dim(&output.stats.archive_bytes.to_string()),
            output.stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `SplitConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SplitConfig> {
    let mut builder = SplitConfig::builder()
        .mode(cli.mode.into())
        .scale(cli.scale)
        .jpeg_quality(cli.jpeg_quality);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
