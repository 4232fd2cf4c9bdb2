//! CLI entry point for `mailrender`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};

use mailrender::config::{self, Config};
use mailrender::export::writer;
use mailrender::model::message::MessageRecord;
use mailrender::parser::eml;

/// Render a raw email message into a directory of HTML and attachments.
///
/// The message is read from standard input unless --input is given.
#[derive(Parser)]
#[command(name = "mailrender", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output directory (replaced on every run unless `output.clean = false`)
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Read the message from FILE instead of standard input
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Print a JSON summary of the written files
    #[arg(long)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
        None => {
            let Some(dir) = cli.dir else {
                anyhow::bail!("missing required option --dir <DIR>");
            };
            cmd_render(cli.input.as_deref(), &dir, cli.json, &config)
        }
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_file = config::log_file_path(config).and_then(|path| {
        let dir = path.parent()?.to_path_buf();
        let name = path.file_name()?.to_os_string();
        std::fs::create_dir_all(&dir).ok()?;
        Some((dir, name))
    });

    if let Some((dir, name)) = log_file {
        let file_appender = tracing_appender::rolling::never(dir, name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailrender", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Decode one message and write it into `dir`.
fn cmd_render(input: Option<&Path>, dir: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let start = Instant::now();

    let record = match input {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("File not found: {}", path.display());
            }
            let raw = std::fs::read(path)
                .map_err(|e| mailrender::error::RenderError::io(path, e))?;
            eml::parse_message(&raw, &config.decoder)?
        }
        None => eml::read_message(std::io::stdin().lock(), &config.decoder)?,
    };

    let written = writer::write_output(&record, dir, &config.output)?;
    let elapsed = start.elapsed();

    if json {
        print_summary_json(&record, dir, &written, elapsed)?;
    } else {
        use humansize::{format_size, BINARY};
        tracing::info!(
            dir = %dir.display(),
            files = written.len(),
            payload = %format_size(record.payload_size(), BINARY),
            elapsed = ?elapsed,
            "Rendered message"
        );
    }

    Ok(())
}

/// Print a summary of the rendered message as JSON.
fn print_summary_json(
    record: &MessageRecord,
    dir: &Path,
    written: &[PathBuf],
    elapsed: std::time::Duration,
) -> anyhow::Result<()> {
    let attachments: Vec<serde_json::Value> = record
        .attachments
        .iter()
        .map(|a| {
            serde_json::json!({
                "filename": a.filename(),
                "size": a.size(),
            })
        })
        .collect();

    let summary = serde_json::json!({
        "dir": dir.to_string_lossy(),
        "date": record.date,
        "from": record.from,
        "to": record.to,
        "subject": record.subject,
        "has_text": record.text.is_some(),
        "has_html": record.html.is_some(),
        "attachments": attachments,
        "files": written.iter().map(|p| p.to_string_lossy()).collect::<Vec<_>>(),
        "payload_size": record.payload_size(),
        "elapsed_ms": elapsed.as_millis(),
    });

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
