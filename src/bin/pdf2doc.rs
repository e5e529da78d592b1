//! CLI binary for pdf2doc.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints the converted document as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_llm::ProviderFactory;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2doc::{
    convert, convert_to_file, inspect, ConversionConfig, ConversionProgressCallback, ConvertError,
    ProgressCallback, DEFAULT_API_BASE, DEFAULT_MODEL,
};
use pdf2doc::pipeline::input::validate_local;
use serde_json::{Map, Value};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

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

/// Terminal progress: a bar over all pages plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Rendering PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn truncate(error: &str) -> String {
        match error.char_indices().nth(80) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error.to_string(),
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_prefix("Analysing");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Analysing {total_pages} pages…"))
        ));
    }

    fn on_page_skipped(&self, page_num: usize, total: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            dim("·"),
            page_num,
            total,
            dim("blank, skipped")
        ));
        self.bar.inc(1);
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, markdown_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{markdown_len:>5} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_page_degraded(&self, page_num: usize, total: usize, error: &str) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&Self::truncate(error)),
        ));
        self.bar.inc(1);
    }

    fn on_summary_start(&self) {
        self.bar.set_prefix("Summarising");
        self.bar.set_message("document");
    }

    fn on_conversion_complete(&self, total_pages: usize, analyzed: usize, degraded: usize) {
        self.bar.finish_and_clear();
        let converted = analyzed.saturating_sub(degraded);
        if degraded == 0 {
            eprintln!(
                "{} {} of {} pages converted",
                green("✔"),
                bold(&converted.to_string()),
                total_pages
            );
        } else {
            eprintln!(
                "{} {}/{} pages converted  ({} degraded)",
                cyan("⚠"),
                bold(&converted.to_string()),
                analyzed,
                red(&degraded.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert and print the document as JSON
  pdf2doc paper.pdf

  # Write to a file, with extra metadata
  pdf2doc paper.pdf -o paper.json --meta source=arxiv --meta year=2017

  # Any OpenAI-compatible endpoint
  pdf2doc --api-base http://localhost:11434/v1 --model llava paper.pdf

  # Another provider through edgequake-llm
  pdf2doc --provider anthropic --model claude-sonnet-4-20250514 paper.pdf

  # Title, id and page count only (no API key needed)
  pdf2doc --inspect-only paper.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          API key for the OpenAI-compatible backend
  PDF2DOC_API_BASE        Base URL of the API
  PDF2DOC_MODEL           Model ID
  PDFIUM_LIB_DIR          Directory containing libpdfium
  RUST_LOG                Override log filter (e.g. pdf2doc=debug)
"#;

/// Convert a PDF into Markdown content plus metadata using a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2doc",
    version,
    about = "Convert a PDF into structured JSON (Markdown content + metadata) using a vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra metadata entry (repeatable); overrides generated keys.
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
    meta: Vec<(String, String)>,

    /// API key for the OpenAI-compatible backend.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "PDF2DOC_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Vision model ID.
    #[arg(long, env = "PDF2DOC_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Use an edgequake-llm provider (openai, anthropic, gemini, ollama, …)
    /// instead of the built-in HTTP client.
    #[arg(long)]
    provider: Option<String>,

    /// Skip the whole-document summary call.
    #[arg(long)]
    no_summary: bool,

    /// Rendering scale factor (0.5–4.0).
    #[arg(long, default_value_t = 2.0)]
    scale: f32,

    /// LLM temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.3)]
    temperature: f32,

    /// PDF user password for encrypted documents.
    #[arg(long)]
    password: Option<String>,

    /// Path to a text file containing a custom per-page instruction.
    #[arg(long)]
    system_prompt: Option<PathBuf>,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_DIR")]
    pdfium_dir: Option<PathBuf>,

    /// Print title, document id and page count only.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_meta(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only;
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

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress).await?;

    if cli.inspect_only {
        let info = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialise document info")?
        );
        return Ok(());
    }

    let metadata: Option<Map<String, Value>> = if cli.meta.is_empty() {
        None
    } else {
        Some(
            cli.meta
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    };

    if let Some(ref output_path) = cli.output {
        let stats = convert_to_file(&cli.input, output_path, metadata, &config)
            .await
            .context("Conversion failed")?;
        if !cli.quiet {
            eprintln!(
                "{}  {}/{} pages  {}ms  →  {}",
                if stats.degraded_pages == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                stats.analyzed_pages - stats.degraded_pages,
                stats.total_pages,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let document = convert(&cli.input, metadata, &config)
            .await
            .context("Conversion failed")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&document).context("Failed to serialise document")?
        );
        if !cli.quiet && !show_progress {
            eprintln!(
                "Converted {}/{} pages in {}ms",
                document.stats.analyzed_pages - document.stats.degraded_pages,
                document.stats.total_pages,
                document.stats.total_duration_ms
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
///
/// The input path is checked first so a bad path is reported before any
/// provider or credential problem.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    validate_local(&cli.input)?;

    let mut builder = ConversionConfig::builder()
        .api_base(&cli.api_base)
        .model(&cli.model)
        .render_scale(cli.scale)
        .temperature(cli.temperature)
        .summarize(!cli.no_summary);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref name) = cli.provider {
        let provider = ProviderFactory::create_llm_provider(name, &cli.model).map_err(|e| {
            ConvertError::ProviderNotConfigured {
                provider: name.clone(),
                hint: e.to_string(),
            }
        })?;
        builder = builder.provider(provider);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.page_prompt(prompt);
    }
    if let Some(ref dir) = cli.pdfium_dir {
        builder = builder.pdfium_lib_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
