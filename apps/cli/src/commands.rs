//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result, eyre};
use patchdown_markdown::{SemanticIndex, delta_schema};
use patchdown_shared::{
    Delta, EngineConfig, PatchdownError, init_config, load_config, load_config_from,
};
use serde_json::json;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// patchdown: edit HTML content through Markdown patches.
#[derive(Parser)]
#[command(
    name = "patchdown",
    version,
    about = "Render HTML content as Markdown and apply text-addressed patches to it.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.patchdown/patchdown.toml.
    #[arg(long, global = true, env = "PATCHDOWN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// What `apply` prints once the delta succeeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Markdown,
    Html,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the Markdown rendering of an HTML file.
    Markdown {
        /// HTML file to read.
        file: PathBuf,
    },

    /// Print the serialized body of an HTML file as the engine sees it.
    Html {
        /// HTML file to read.
        file: PathBuf,
    },

    /// List the indexed content blocks of an HTML file.
    Index {
        /// HTML file to read.
        file: PathBuf,

        /// Emit entries as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Apply a JSON delta payload to an HTML file and print the result.
    Apply {
        /// HTML file to patch.
        file: PathBuf,

        /// Path to the delta payload (JSON).
        #[arg(long)]
        delta: PathBuf,

        /// Output format for the patched content.
        #[arg(long, default_value = "markdown")]
        output: OutputFormat,
    },

    /// Print the JSON Schema of the delta payload.
    Schema,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "patchdown=info",
        1 => "patchdown=debug",
        _ => "patchdown=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout stays pipeable.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Markdown { file } => cmd_markdown(&file, config_path),
        Command::Html { file } => cmd_html(&file, config_path),
        Command::Index { file, json } => cmd_index(&file, json, config_path),
        Command::Apply {
            file,
            delta,
            output,
        } => cmd_apply(&file, &delta, output, config_path),
        Command::Schema => cmd_schema(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_markdown(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let index = open_index(file, config_path)?;
    print!("{}", index.to_markdown());
    eprintln!("content score: {:.3}", index.content_score());
    Ok(())
}

fn cmd_html(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let index = open_index(file, config_path)?;
    println!("{}", index.to_html());
    Ok(())
}

fn cmd_index(file: &Path, as_json: bool, config_path: Option<&Path>) -> Result<()> {
    let index = open_index(file, config_path)?;

    if as_json {
        let entries: Vec<_> = index
            .entries()
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                json!({
                    "position": position,
                    "kind": entry.kind,
                    "tag": entry.tag,
                    "text": entry.text,
                    "level": entry.level,
                    "component_type": entry.component_type,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (position, entry) in index.entries().iter().enumerate() {
        let kind = entry.kind.map(|k| k.as_str()).unwrap_or("-");
        println!(
            "{position:>4}  {kind:<11} {:<8} {}",
            entry.tag,
            truncate(&entry.text, 72)
        );
    }
    Ok(())
}

fn cmd_apply(
    file: &Path,
    delta_path: &Path,
    output: OutputFormat,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut index = open_index(file, config_path)?;

    let payload = std::fs::read_to_string(delta_path)
        .map_err(|e| eyre!("cannot read delta '{}': {e}", delta_path.display()))?;
    let delta = Delta::from_json(&payload).map_err(report)?;

    info!(
        placeholder_id = %delta.placeholder_id,
        language = %delta.language,
        operations = delta.operations.len(),
        "applying delta"
    );
    index.apply_delta(&delta).map_err(report)?;

    match output {
        OutputFormat::Markdown => print!("{}", index.to_markdown()),
        OutputFormat::Html => println!("{}", index.to_html()),
    }
    Ok(())
}

fn cmd_schema() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&delta_schema())?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_config(config_path: Option<&Path>) -> Result<EngineConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn open_index(file: &Path, config_path: Option<&Path>) -> Result<SemanticIndex> {
    let config = resolve_config(config_path)?;
    let html = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
    SemanticIndex::with_config(&html, config).map_err(report)
}

/// Print the structured payload of an engine error on stderr, then wrap it.
fn report(err: PatchdownError) -> Report {
    let payload = json!({
        "error": err.code(),
        "message": err.to_string(),
        "data": err.data(),
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => eprintln!("{text}"),
        Err(e) => eprintln!("could not serialize error payload: {e}"),
    }
    Report::new(err)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{head}…")
}
