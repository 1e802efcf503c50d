//! CLI binary for transcript-renamer.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RenameConfig`, wires up the chosen backend, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use transcript_renamer::{
    ensure_models, fetch_endpoint_mapping, load_workbook_mapping, pdfium_available, run, scramble,
    BatchReport, DocumentStore, DriveStore, LocalStore, NameMapping, OcrsRecognizer, Outcome,
    RenameConfig, RenameProgressCallback, TranscriptExtractor,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn magenta(s: &str) -> String {
    format!("\x1b[35m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and one log line
/// per document. Processing is sequential, so at most one document is in
/// flight at a time.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Wall-clock start of the document currently in flight.
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_run_start` (called after discovery).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Listing documents…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Renaming");
        self.bar.reset_eta();
    }

    fn elapsed_label(&self) -> String {
        let elapsed_ms = self
            .started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0))
    }
}

impl RenameProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total: usize) {
        // Switch from spinner-only style to the full bar now that discovery
        // has counted the documents.
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total} documents…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, filename: &str) {
        *self.started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(filename.to_string());
    }

    fn on_document_complete(
        &self,
        _index: usize,
        _total: usize,
        filename: &str,
        outcome: &Outcome,
    ) {
        let timing = self.elapsed_label();
        let line = match outcome {
            Outcome::Renamed { new_name } => format!(
                "  {} {}  →  {}  {}",
                green("✓"),
                filename,
                bold(new_name),
                timing
            ),
            Outcome::NoIdentifier => format!(
                "  {} {}  {}  {}",
                red("✗"),
                filename,
                red("no student ID found"),
                timing
            ),
            Outcome::NoNameMatch { identifier } => format!(
                "  {} {}  {}  {}",
                yellow("⚠"),
                filename,
                yellow(&format!("no roster entry for ID {identifier}")),
                timing
            ),
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total: usize, renamed: usize) {
        self.bar.finish_and_clear();
        let unresolved = total.saturating_sub(renamed);

        if unresolved == 0 {
            eprintln!(
                "{} {} documents renamed",
                green("✔"),
                bold(&renamed.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents renamed  ({} unresolved)",
                if renamed == 0 { red("✘") } else { cyan("⚠") },
                bold(&renamed.to_string()),
                total,
                yellow(&unresolved.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Local folder + .xlsx roster (the defaults)
  trename --folder ./transcripts --workbook students.xlsx

  # Everything configured via .env — just run it
  trename

  # Google Drive folder + HTTP roster endpoint
  trename --mode online \
      --folder-id 1AbCdEfGhIjKlMnOpQrStUvWxYz \
      --mapping-url https://sheets.example.edu/api/students \
      --drive-token "$(gcloud auth print-access-token)"

  # Anonymise a folder for sharing: 1.pdf, 2.pdf, … (no OCR, no roster)
  trename --scramble

  # Machine-readable run report on stdout
  trename --json > report.json

ENVIRONMENT VARIABLES:
  TRENAME_MODE          "local" or "online"
  TRENAME_FOLDER        Local folder with the transcript PDFs
  TRENAME_WORKBOOK      Roster workbook (.xlsx)
  TRENAME_SHEET         Worksheet holding the roster
  TRENAME_ID_COLUMN     Roster column with the 7-digit student ID
  TRENAME_NAME_COLUMN   Roster column with the student's full name
  TRENAME_FOLDER_ID     Google Drive folder ID (online mode)
  TRENAME_MAPPING_URL   HTTP endpoint returning the roster as a JSON array
  TRENAME_DRIVE_TOKEN   OAuth2 access token for the Drive API
  TRENAME_MODEL_DIR     Directory holding the OCR models
  TRENAME_PDFIUM_PATH   Directory containing the pdfium shared library

  A `.env` file in the working directory is loaded first, so all of the
  above can live there.

SETUP:
  1. pdfium:       download a release from bblanchon/pdfium-binaries and
                   place the shared library next to the binary, or point
                   TRENAME_PDFIUM_PATH at its directory.
  2. OCR models:   downloaded automatically on first run (~12 MB) into
                   ~/.local/share/trename/models/. No account needed.
  3. Drive token:  gcloud auth print-access-token
                   (needs the https://www.googleapis.com/auth/drive scope
                   and write access to the target folder).
"#;

/// Rename scanned transcript PDFs after the student they belong to.
#[derive(Parser, Debug)]
#[command(
    name = "trename",
    version,
    about = "Rename scanned transcript PDFs after the student they belong to",
    long_about = "Rename scanned academic-transcript PDFs to {id}_Bảng điểm_{full name}.pdf. \
The 7-digit student ID is read straight off each scan with on-device OCR and resolved to the \
student's name through a roster (.xlsx workbook or HTTP JSON endpoint). Works on a local \
folder or a Google Drive folder.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Where the documents live: local folder or Google Drive.
    #[arg(short, long, env = "TRENAME_MODE", value_enum, default_value = "local")]
    mode: Mode,

    /// Local folder containing the transcript PDFs (local mode).
    #[arg(long, env = "TRENAME_FOLDER", default_value = "./transcripts")]
    folder: PathBuf,

    /// Student roster workbook (local mode).
    #[arg(long, env = "TRENAME_WORKBOOK", default_value = "students.xlsx")]
    workbook: PathBuf,

    /// Worksheet holding the roster.
    #[arg(long, env = "TRENAME_SHEET", default_value = "Sheet1")]
    sheet: String,

    /// Roster column with the 7-digit student ID.
    #[arg(long, env = "TRENAME_ID_COLUMN", default_value = "student_id")]
    id_column: String,

    /// Roster column with the student's full name.
    #[arg(long, env = "TRENAME_NAME_COLUMN", default_value = "full_name")]
    name_column: String,

    /// Google Drive folder ID (online mode).
    #[arg(long, env = "TRENAME_FOLDER_ID")]
    folder_id: Option<String>,

    /// HTTP endpoint returning the roster as a JSON array (online mode).
    #[arg(long, env = "TRENAME_MAPPING_URL")]
    mapping_url: Option<String>,

    /// OAuth2 access token for the Drive API (online mode).
    #[arg(long, env = "TRENAME_DRIVE_TOKEN", hide_env_values = true)]
    drive_token: Option<String>,

    /// Directory holding the OCR models (auto-downloaded when missing).
    #[arg(long, env = "TRENAME_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// HTTP timeout in seconds (Drive API and roster endpoint).
    #[arg(long, env = "TRENAME_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Anonymise instead: rename documents to 1.pdf, 2.pdf, … (no OCR).
    #[arg(long, env = "TRENAME_SCRAMBLE")]
    scramble: bool,

    /// Output the run report as JSON on stdout.
    #[arg(long, env = "TRENAME_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "TRENAME_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TRENAME_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TRENAME_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Folder on this machine, roster from an .xlsx workbook.
    Local,
    /// Google Drive folder, roster from an HTTP endpoint.
    Online,
}

impl Mode {
    fn name(self) -> &'static str {
        match self {
            Mode::Local => "local",
            Mode::Online => "online",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first, so clap's env-backed flags see its values.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    if !cli.quiet {
        eprintln!("Running in {} mode", bold(&magenta(cli.mode.name())));
    }

    // ── Build the document store ─────────────────────────────────────────
    let store: Box<dyn DocumentStore> = match cli.mode {
        Mode::Local => Box::new(LocalStore::new(&cli.folder)),
        Mode::Online => {
            let folder_id = cli
                .folder_id
                .clone()
                .context("--folder-id (or TRENAME_FOLDER_ID) is required in online mode")?;
            let token = cli
                .drive_token
                .clone()
                .context("--drive-token (or TRENAME_DRIVE_TOKEN) is required in online mode")?;
            Box::new(
                DriveStore::new(folder_id, token, cli.timeout)
                    .context("Failed to build the Drive client")?,
            )
        }
    };

    // ── Scramble mode: no OCR, no roster ─────────────────────────────────
    if cli.scramble {
        let config = build_config(&cli, show_progress)?;
        let report = scramble(store.as_ref(), &config)
            .await
            .context("Scramble failed")?;
        emit_report(&cli, show_progress, &report)?;
        return Ok(());
    }

    // ── OCR engine ───────────────────────────────────────────────────────
    // Probe pdfium before anything slow: a missing shared library should
    // fail here with setup instructions, not as per-document OCR misses.
    pdfium_available().context("PDF rendering engine unavailable")?;

    let model_spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("OCR models");
        bar.set_message("checking…");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });
    let models = ensure_models(cli.model_dir.as_deref())
        .await
        .context("Failed to prepare the OCR models")?;
    let recognizer =
        Arc::new(OcrsRecognizer::load(&models).context("Failed to initialise the OCR engine")?);
    if let Some(bar) = model_spinner {
        bar.finish_and_clear();
    }

    // ── Roster ───────────────────────────────────────────────────────────
    let mapping = load_mapping(&cli).await?;
    if !cli.quiet {
        eprintln!("Roster loaded: {} students", bold(&mapping.len().to_string()));
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let config = build_config(&cli, show_progress)?;
    let extractor = TranscriptExtractor::new(recognizer, &config);
    let report = run(store.as_ref(), &extractor, &mapping, &config)
        .await
        .context("Run failed")?;

    emit_report(&cli, show_progress, &report)?;
    Ok(())
}

/// Map CLI args to `RenameConfig`.
fn build_config(cli: &Cli, show_progress: bool) -> Result<RenameConfig> {
    let mut builder = RenameConfig::builder().http_timeout_secs(cli.timeout);

    if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        builder = builder.progress_callback(cb as Arc<dyn RenameProgressCallback>);
    }

    builder.build().context("Invalid configuration")
}

/// Load the roster from the mode-appropriate source.
async fn load_mapping(cli: &Cli) -> Result<NameMapping> {
    match cli.mode {
        Mode::Local => load_workbook_mapping(&cli.workbook, &cli.sheet, &cli.id_column, &cli.name_column)
            .with_context(|| format!("Failed to load the roster from {:?}", cli.workbook)),
        Mode::Online => {
            let url = cli
                .mapping_url
                .clone()
                .context("--mapping-url (or TRENAME_MAPPING_URL) is required in online mode")?;
            fetch_endpoint_mapping(&url, &cli.id_column, &cli.name_column, cli.timeout)
                .await
                .context("Failed to fetch the roster")
        }
    }
}

/// Print the end-of-run report: JSON on stdout when requested, plus a
/// human-readable summary on stderr.
fn emit_report(cli: &Cli, show_progress: bool, report: &BatchReport) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialise the report")?
        );
    }

    if cli.quiet {
        return Ok(());
    }

    // The progress callback already printed the final tick; only print the
    // totals line when the bar was disabled.
    if !show_progress {
        let line = format!(
            "{}/{} renamed in {}ms",
            report.renamed, report.total, report.total_duration_ms
        );
        if report.is_clean() {
            eprintln!("{}", green(&line));
        } else {
            eprintln!("{line}");
        }
    }

    // Per-failure detail, mirroring what operators act on: rescan the scans
    // with no readable ID, fix the roster for unmatched IDs.
    for filename in report.no_identifier_files() {
        eprintln!("  {}", red(&format!("no student ID found in {filename}")));
    }
    for (identifier, filename) in report.unmatched_identifiers() {
        eprintln!(
            "  {}",
            yellow(&format!("no roster entry for ID {identifier} ({filename})"))
        );
    }

    if show_progress {
        eprintln!(
            "{}",
            dim(&format!(
                "Total time: {:.1}s",
                report.total_duration_ms as f64 / 1000.0
            ))
        );
    }

    Ok(())
}
