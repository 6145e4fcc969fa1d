//! CLI binary for pdf2mcq.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2mcq::{
    classify, extract_from_file, extract_to_file, ExtractionConfig, ExtractionProgressCallback,
    ProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

/// Terminal progress callback: a live bar for the page loop, plus
/// per-page log lines. The direct path reports as a single unit.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Running question total across units, for the skipped-page log line.
    questions: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Classifying");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            questions: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_classified(&self, total_pages: usize, is_text_based: bool) {
        self.bar.println(format!(
            "{} {} pages, {}",
            cyan("◆"),
            bold(&total_pages.to_string()),
            if is_text_based {
                "text layer detected"
            } else {
                "image-based (OCR)"
            }
        ));
        if !is_text_based {
            self.activate_bar(total_pages);
        }
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        // The image path may start after a failed direct path; make sure
        // the bar is active either way.
        if self.bar.length().unwrap_or(0) != total_pages as u64 {
            self.activate_bar(total_pages);
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_unit_complete(&self, page_num: usize, _total_pages: usize, questions: usize) {
        let so_far = self.questions.fetch_add(questions, Ordering::SeqCst) + questions;
        if page_num == 0 {
            // Whole-document (direct path) unit.
            self.bar.println(format!(
                "  {} document structured  {}",
                green("✓"),
                dim(&format!("{questions} questions")),
            ));
        } else {
            self.bar.println(format!(
                "  {} page {:>3}  {}",
                green("✓"),
                page_num,
                dim(&format!("{questions} questions, {so_far} total")),
            ));
            self.bar.inc(1);
        }
    }

    fn on_page_skipped(&self, page_num: usize, _total_pages: usize) {
        self.bar.println(format!(
            "  {} page {:>3}  {}",
            dim("·"),
            page_num,
            dim("too little text, skipped"),
        ));
        self.bar.inc(1);
    }

    fn on_complete(&self, total_questions: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} questions extracted",
            green("✔"),
            bold(&total_questions.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract questions to stdout as JSON
  pdf2mcq exam.pdf

  # Write to a file, include run statistics
  pdf2mcq exam.pdf -o questions.json --stats

  # Scanned answer key, slower endpoint
  pdf2mcq scan.pdf --api-timeout 180 --delay-ms 3000

  # Just classify (no API key needed)
  pdf2mcq --classify-only exam.pdf

ENVIRONMENT VARIABLES:
  DEEPSEEK_API_KEY    Structuring-service API key
  PDF2MCQ_BASE_URL    Override the completion endpoint base URL
  PDF2MCQ_MODEL       Override the model id (default: deepseek-chat)
  PDFIUM_LIB_PATH     Path to an existing libpdfium copy

SETUP:
  1. Install pdfium (shared library) and tesseract with `eng` data.
  2. Set the API key:  export DEEPSEEK_API_KEY=sk-...
  3. Extract:          pdf2mcq exam.pdf -o questions.json
"#;

/// Extract multiple-choice questions from PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2mcq",
    version,
    about = "Extract multiple-choice questions from PDF documents (text or scanned)",
    long_about = "Extract multiple-choice questions from PDF documents. Text-layer PDFs are \
read directly; scanned PDFs are rasterised and OCR'd page by page. Detected answer markers \
(✓, *, ✅, (correct), [x]) guide a DeepSeek-style structuring service that returns the \
question records as JSON.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to process.
    input: PathBuf,

    /// Write the JSON output to this file instead of stdout.
    #[arg(short, long, env = "PDF2MCQ_OUTPUT")]
    output: Option<PathBuf>,

    /// Structuring-service API key.
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Completion endpoint base URL.
    #[arg(long, env = "PDF2MCQ_BASE_URL", default_value = "https://api.deepseek.com")]
    base_url: String,

    /// Model identifier.
    #[arg(long, env = "PDF2MCQ_MODEL", default_value = "deepseek-chat")]
    model: String,

    /// Page rasterisation scale factor (1.0–4.0).
    #[arg(long, env = "PDF2MCQ_SCALE", default_value_t = 2.5)]
    scale: f32,

    /// OCR language code.
    #[arg(long, env = "PDF2MCQ_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Delay between page-level service calls, in milliseconds.
    #[arg(long, env = "PDF2MCQ_DELAY_MS", default_value_t = 2000)]
    delay_ms: u64,

    /// Per-service-call timeout in seconds.
    #[arg(long, env = "PDF2MCQ_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Retries per structuring call on transient failure.
    #[arg(long, env = "PDF2MCQ_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Include run statistics in the JSON output.
    #[arg(long, env = "PDF2MCQ_STATS")]
    stats: bool,

    /// Print the classification verdict only, no extraction.
    #[arg(long)]
    classify_only: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2MCQ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MCQ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the JSON result.
    #[arg(short, long, env = "PDF2MCQ_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides the feedback that matters.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.classify_only;
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

    // ── Classify-only mode (no API key needed) ───────────────────────────
    if cli.classify_only {
        let bytes = tokio::fs::read(&cli.input)
            .await
            .with_context(|| format!("Failed to read {}", cli.input.display()))?;
        let info = classify(&bytes).await;
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialise verdict")?
        );
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder()
        .base_url(&cli.base_url)
        .model(&cli.model)
        .render_scale(cli.scale)
        .ocr_language(&cli.ocr_lang)
        .inter_page_delay_ms(cli.delay_ms)
        .api_timeout_secs(cli.api_timeout)
        .max_retries(cli.max_retries);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run extraction ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let stats = extract_to_file(&cli.input, output_path, &config)
            .await
            .context("Extraction failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} direct + {} ocr questions  {}ms  →  {}",
                green("✔"),
                stats.direct_questions,
                stats.ocr_questions,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let output = extract_from_file(&cli.input, &config)
            .await
            .context("Extraction failed")?;

        let json = if cli.stats {
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        } else {
            serde_json::to_string_pretty(&output.questions)
                .context("Failed to serialise questions")?
        };

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();

        if !cli.quiet && !show_progress {
            eprintln!(
                "Extracted {} questions in {}ms ({} pages skipped)",
                output.count(),
                output.stats.total_duration_ms,
                output.stats.skipped_pages,
            );
        }
    }

    Ok(())
}
