//! CLI binary for edgequake-pdfocr.
//!
//! `serve` starts the web page; `run` drives one submission from the
//! terminal. Both map flags onto `WorkflowConfig` and share the library's
//! workflow.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdfocr::config::{DEFAULT_MODEL_ID, DEFAULT_OUTPUT_DIR};
use edgequake_pdfocr::web::{self, DEFAULT_BODY_LIMIT};
use edgequake_pdfocr::{
    ApiKey, DisplayModel, PageSelectionPolicy, Severity, StagingNaming, SubmissionRequest,
    SubmissionWorkflow, WorkflowConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the web page on http://127.0.0.1:8501
  pdfocr serve

  # OCR pages 1 and 3 of a local file
  GEMINI_API_KEY=... pdfocr run paper.pdf --pages 1,3

  # Reject malformed page selectors instead of ignoring bad tokens
  pdfocr --strict-pages run paper.pdf --pages 1,x

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Gemini API key (form field falls back to it)
  PDFOCR_OUTPUT_DIR       Staging directory (default ./output_webapp)
  PDFOCR_MODEL            Model id, provider/model (default gemini/gemini-2.0-flash)
  PDFIUM_LIB_PATH         Directory containing libpdfium
  RUST_LOG                Overrides the log filter
"#;

/// Upload a PDF, pick pages, and read them back with a vision model.
#[derive(Parser, Debug)]
#[command(
    name = "pdfocr",
    version,
    about = "PDF page OCR with Gemini and other vision models",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    shared: SharedArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the upload form.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "PDFOCR_ADDR", default_value = "127.0.0.1:8501")]
        addr: SocketAddr,

        /// Maximum upload size in bytes.
        #[arg(long, env = "PDFOCR_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
        body_limit: usize,
    },
    /// Run one submission and print the pages.
    Run {
        /// PDF file to upload.
        file: PathBuf,

        /// Comma-separated 1-indexed pages, e.g. 1,3,5. Blank means all.
        #[arg(long, default_value = "")]
        pages: String,

        /// Print the display model as JSON.
        #[arg(long)]
        json: bool,

        /// Disable the spinner.
        #[arg(long, env = "PDFOCR_NO_PROGRESS")]
        no_progress: bool,
    },
}

#[derive(Args, Debug)]
struct SharedArgs {
    /// Gemini API key.
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory uploads are staged into.
    #[arg(long, global = true, env = "PDFOCR_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Model id as provider/model.
    #[arg(long, global = true, env = "PDFOCR_MODEL", default_value = DEFAULT_MODEL_ID)]
    model: String,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, global = true, env = "PDFOCR_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Reject page selectors with non-numeric tokens.
    #[arg(long, global = true, env = "PDFOCR_STRICT_PAGES")]
    strict_pages: bool,

    /// Prefix staged file names with a random id.
    #[arg(long, global = true, env = "PDFOCR_UNIQUE_STAGING")]
    unique_staging: bool,

    /// Pass the previous page's text as context for the next page.
    #[arg(long, global = true, env = "PDFOCR_MAINTAIN_FORMAT")]
    maintain_format: bool,

    /// Longest edge of a rendered page, in pixels.
    #[arg(long, global = true, env = "PDFOCR_MAX_RENDERED_PIXELS", default_value_t = 2000)]
    max_rendered_pixels: u32,

    /// Model temperature (0.0–2.0).
    #[arg(long, global = true, env = "PDFOCR_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max output tokens per page.
    #[arg(long, global = true, env = "PDFOCR_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Per-page model call timeout in seconds.
    #[arg(long, global = true, env = "PDFOCR_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Directory containing libpdfium.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFOCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFOCR_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // The spinner covers progress in `run`; keep library logs quiet there.
    let spinner = matches!(cli.command, Command::Run { json, no_progress, .. } if !json && !no_progress);
    let filter = if cli.shared.verbose {
        "debug"
    } else if cli.shared.quiet || spinner {
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

    let config = build_config(&cli.shared).await?;
    let workflow = SubmissionWorkflow::with_vision_engine(config);
    workflow
        .prepare_output_dir()
        .await
        .with_context(|| format!("Failed to create {}", cli.shared.output_dir.display()))?;

    match cli.command {
        Command::Serve { addr, body_limit } => {
            if !cli.shared.quiet {
                eprintln!("{} http://{}", bold("Serving"), addr);
            }
            web::serve(addr, workflow, body_limit)
                .await
                .context("Web server stopped")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            file,
            pages,
            json,
            no_progress,
        } => run_once(&workflow, &cli.shared, file, &pages, json, no_progress).await,
    }
}

async fn run_once(
    workflow: &SubmissionWorkflow,
    shared: &SharedArgs,
    file: PathBuf,
    pages: &str,
    json: bool,
    no_progress: bool,
) -> Result<ExitCode> {
    let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    // The key is already the workflow's default; the request stays keyless.
    let request = SubmissionRequest::new()
        .file(file_name, bytes)
        .page_selector(pages);

    let bar = (!shared.quiet && !json && !no_progress).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Processing");
        bar.set_message(file.display().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let outcome = workflow.submit(request).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let display = outcome.display();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&display).context("Failed to serialise output")?
        );
    } else {
        print_display(&display, shared.quiet);
    }

    Ok(if outcome.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_display(display: &DisplayModel, quiet: bool) {
    match display {
        DisplayModel::Pages { summary, panels } => {
            if !quiet {
                eprintln!("{} {}", green("✔"), summary);
            }
            for panel in panels {
                println!("{}", bold(&format!("── {} ──", panel.label())));
                println!("{}\n", panel.content);
            }
        }
        DisplayModel::Notice(notice) => {
            let marker = match notice.severity {
                Severity::Warning => yellow("⚠"),
                Severity::Error => red("✘"),
            };
            eprintln!("{} {}", marker, notice.message);
            if let Some(ref diagnostic) = notice.diagnostic {
                eprintln!("{}", dim(diagnostic));
            }
        }
    }
}

/// Map shared CLI args to `WorkflowConfig`.
async fn build_config(args: &SharedArgs) -> Result<WorkflowConfig> {
    let mut builder = WorkflowConfig::builder()
        .output_dir(&args.output_dir)
        .model_id(&args.model)
        .default_api_key(args.api_key.clone().and_then(ApiKey::new))
        .page_selection(if args.strict_pages {
            PageSelectionPolicy::Strict
        } else {
            PageSelectionPolicy::Lenient
        })
        .staging(if args.unique_staging {
            StagingNaming::Unique
        } else {
            StagingNaming::Original
        })
        .maintain_format(args.maintain_format)
        .max_rendered_pixels(args.max_rendered_pixels)
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .api_timeout_secs(args.api_timeout);

    if let Some(ref path) = args.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref dir) = args.pdfium_lib_path {
        builder = builder.pdfium_lib_path(dir);
    }

    builder.build().context("Invalid configuration")
}
