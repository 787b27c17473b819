//! CLI binary for vocab2deck.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `DeckConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vocab2deck::pipeline::input::may_be_pdf;
use vocab2deck::{
    generate, write_deck, CefrLevel, DeckConfig, DeckError, DeckOutput, PipelineProgressCallback,
    PipelineStage, ProgressCallback,
};

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

/// Terminal progress callback: one percentage bar for the whole run plus a
/// log line per classification batch. Batches may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    batch_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            batch_errors: AtomicUsize::new(0),
        })
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: PipelineStage, progress: u8, message: String) {
        self.bar.set_prefix(stage.label());
        self.bar.set_position(progress as u64);
        self.bar.set_message(message);
    }

    fn on_batch_complete(&self, batch: usize, total: usize, resolved: usize) {
        self.bar.println(format!(
            "  {} Batch {:>3}/{:<3}  {}",
            green("✓"),
            batch,
            total,
            dim(&format!("{resolved:>4} words classified")),
        ));
    }

    fn on_batch_error(&self, batch: usize, total: usize, error: String) {
        self.batch_errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error
        };

        self.bar.println(format!(
            "  {} Batch {:>3}/{:<3}  {}",
            red("✗"),
            batch,
            total,
            red(&msg),
        ));
    }

    fn on_run_complete(&self, cards: usize) {
        self.bar.finish_and_clear();
        let failed = self.batch_errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} flashcards generated", green("✔"), bold(&cards.to_string()));
        } else {
            eprintln!(
                "{} {} flashcards generated  ({} classification batch(es) failed)",
                cyan("⚠"),
                bold(&cards.to_string()),
                red(&failed.to_string()),
            );
        }
    }

    fn on_run_failed(&self, _message: String) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Deck for B1 and above, printed to stdout
  vocab2deck episode01.srt

  # B2 and above, written to a file
  vocab2deck --level B2 movie.vtt -o movie_deck.csv

  # Exclude words you already know
  vocab2deck -x "gonna, wanna, yeah" series.srt -o deck.csv

  # PDF from a URL with a specific model
  vocab2deck --provider openai --model gpt-4.1-mini https://example.com/article.pdf

  # Full JSON output (cards, target words, warnings, stats)
  vocab2deck --json lecture.pdf > deck.json

IMPORTING INTO ANKI:
  File → Import, choose the CSV, set "Fields separated by: Semicolon",
  tick "Allow HTML in fields", and map Front/Back to your note type.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  GEMINI_API_KEY          Google Gemini API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory

SETUP:
  1. Set API key:     export OPENAI_API_KEY=sk-...
  2. Generate:        vocab2deck episode01.srt -o anki_deck.csv

  PDFium is downloaded automatically the first time a PDF is processed.
"#;

/// Turn subtitles and PDFs into CEFR-graded Anki flashcards.
#[derive(Parser, Debug)]
#[command(
    name = "vocab2deck",
    version,
    about = "Turn subtitles and PDFs into CEFR-graded Anki flashcards",
    long_about = "Extract vocabulary from an SRT/VTT subtitle file or a PDF (local file or URL), \
grade every word on the CEFR scale, keep the words at or above your level, and generate \
flashcards with definitions, phonetics, synonyms and the original sentence as an Anki CSV deck.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Subtitle (.srt, .vtt) or PDF file path, or HTTP/HTTPS URL.
    input: String,

    /// Write the CSV deck to this file instead of stdout.
    #[arg(short, long, env = "VOCAB2DECK_OUTPUT")]
    output: Option<PathBuf>,

    /// Lowest CEFR level to make cards for: A1, A2, B1, B2, C1, C2.
    #[arg(short, long, env = "VOCAB2DECK_LEVEL", default_value = "B1")]
    level: CefrLevel,

    /// Extra words to exclude, comma-separated.
    #[arg(short = 'x', long, env = "VOCAB2DECK_EXCLUDE")]
    exclude: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, gemini-2.5-flash).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Words per AI classification request (1–300).
    #[arg(long, env = "VOCAB2DECK_BATCH_SIZE", default_value_t = 300,
          value_parser = clap::value_parser!(u16).range(1..=300))]
    batch_size: u16,

    /// Number of concurrent LLM calls.
    #[arg(short, long, env = "VOCAB2DECK_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Words per flashcard-generation request.
    #[arg(long, env = "VOCAB2DECK_SYNTHESIS_BATCH_SIZE", default_value_t = 40)]
    synthesis_batch_size: usize,

    /// Skip words that appear in no sentence of the document.
    #[arg(long, env = "VOCAB2DECK_SKIP_MISSING_CONTEXT")]
    skip_missing_context: bool,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "VOCAB2DECK_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens per request.
    #[arg(long, env = "VOCAB2DECK_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Per-request LLM timeout in seconds.
    #[arg(long, env = "VOCAB2DECK_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "VOCAB2DECK_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output structured JSON (cards, targets, warnings, stats) instead of CSV.
    #[arg(long, env = "VOCAB2DECK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "VOCAB2DECK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "VOCAB2DECK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "VOCAB2DECK_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
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

    // ── Ensure PDFium engine is available ───────────────────────────────────
    if may_be_pdf(&cli.input) && !pdfium_auto::is_pdfium_cached() {
        prepare_pdfium(cli.quiet)?;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = match generate(&cli.input, &config).await {
        Ok(output) => output,
        Err(e) => return Err(report_failure(e, cli.quiet)),
    };

    if let Some(ref output_path) = cli.output {
        write_deck(output_path, &output.cards)
            .await
            .context("Failed to write deck")?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.output.is_none() {
        write_csv(&mut io::stdout().lock(), &output).context("Failed to write to stdout")?;
    }

    if !cli.quiet {
        print_summary(&cli, &output, show_progress);
    }

    Ok(())
}

/// Download PDFium on first use, with a byte-level progress bar unless quiet.
fn prepare_pdfium(quiet: bool) -> Result<()> {
    if quiet {
        // Quiet mode: download silently; errors still propagate.
        pdfium_auto::ensure_pdfium_library(None).context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.set_message("Connecting…");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Print the learner-facing message, keep the diagnostic chain for anyhow.
fn report_failure(e: DeckError, quiet: bool) -> anyhow::Error {
    if !quiet {
        eprintln!("{} {}", red("✘"), e.user_message());
    }
    anyhow::Error::new(e).context("Deck generation failed")
}

fn print_summary(cli: &Cli, output: &DeckOutput, show_progress: bool) {
    let stats = &output.stats;
    if !show_progress && !cli.json {
        eprintln!(
            "Generated {} flashcards from {} candidate words in {}ms",
            stats.cards, stats.candidate_words, stats.total_duration_ms
        );
        for warning in &output.warnings {
            eprintln!("  {} {}", cyan("⚠"), warning);
        }
    }
    if let Some(ref path) = cli.output {
        eprintln!(
            "{}  {} cards  →  {}",
            green("✔"),
            stats.cards,
            bold(&path.display().to_string()),
        );
    }
    if !cli.json {
        eprintln!(
            "   {} words from the word list  /  {} classified by AI  /  {} without context",
            dim(&stats.locally_classified.to_string()),
            dim(&stats.remotely_classified.to_string()),
            dim(&stats.words_without_context.to_string()),
        );
    }
}

/// Map CLI args to `DeckConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<DeckConfig> {
    let mut builder = DeckConfig::builder()
        .level(cli.level)
        .batch_size(cli.batch_size as usize)
        .concurrency(cli.concurrency)
        .synthesis_batch_size(cli.synthesis_batch_size)
        .skip_words_without_context(cli.skip_missing_context)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref exclude) = cli.exclude {
        builder = builder.exclude_words(exclude);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// The deck exactly as `export_csv` renders it: CRLF rows, no trailing break.
fn write_csv(out: &mut impl Write, output: &DeckOutput) -> io::Result<()> {
    out.write_all(output.to_csv().as_bytes())?;
    out.flush()
}
