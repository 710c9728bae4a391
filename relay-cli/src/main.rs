use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use relay_core::{MemoStyle, PipelineConfig, Report};
use relay_finance::tools::{self, ToolError};
use relay_finance::{map_report, report_from_attachment, TransactionBatch};
use relay_ingest::{Attachment, TextEncoding};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod source_dir;
mod state;

use source_dir::DirectorySource;

const DEFAULT_LOG_FILTER: &str = "relay=info,relay_core=info,relay_ingest=info,relay_finance=info";
const VERBOSE_LOG_FILTER: &str =
    "relay=debug,relay_core=debug,relay_ingest=debug,relay_finance=debug";

#[derive(Parser, Debug)]
#[command(
    name = "relay",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("RELAY_BUILD_SHA"), ")"),
    about = "Turn emailed expense exports into ledger transactions"
)]
struct Cli {
    /// Config file (default: ~/.relay/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding exported attachments (overrides [source].dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the most recent expense exports
    List {
        #[arg(long, default_value_t = tools::DEFAULT_LIST_LIMIT)]
        limit: usize,
    },

    /// Parse one export into a report with diagnostics
    Report {
        /// Export to read (default: most recent)
        #[arg(long)]
        message_id: Option<String>,
    },

    /// Convert one export into ledger transactions
    Transactions {
        /// Target ledger account id
        #[arg(long)]
        account_id: String,

        /// Export to read (default: most recent)
        #[arg(long)]
        message_id: Option<String>,

        /// category, merchant or detailed (overrides [transactions].memo_style)
        #[arg(long)]
        memo_style: Option<MemoStyle>,
    },

    /// Run the pipeline on a local export file
    Parse {
        file: PathBuf,

        /// Also convert to transactions for this account
        #[arg(long)]
        account_id: Option<String>,

        /// auto, utf8, utf16le, utf16be or latin1
        #[arg(long, default_value = "auto", value_parser = parse_encoding)]
        encoding: TextEncoding,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.relay/config.toml with defaults
    Init,

    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut cfg = config::load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.dir {
        cfg.source.dir = Some(dir);
    }

    match cli.command {
        Command::List { limit } => {
            let source = directory_source(&cfg)?;
            emit(tools::list_reports(&source, Some(limit)))?;
        }

        Command::Report { message_id } => {
            let source = directory_source(&cfg)?;
            emit(tools::get_report(&source, message_id.as_deref(), &cfg.pipeline()))?;
        }

        Command::Transactions {
            account_id,
            message_id,
            memo_style,
        } => {
            let source = directory_source(&cfg)?;
            let mut pipeline = cfg.pipeline();
            if let Some(style) = memo_style {
                pipeline.memo_style = style;
            }
            emit(tools::get_transactions(
                &source,
                &account_id,
                message_id.as_deref(),
                &pipeline,
            ))?;
        }

        Command::Parse {
            file,
            account_id,
            encoding,
        } => {
            parse_file(&file, account_id.as_deref(), encoding, &cfg.pipeline())?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => {
                let path = config::init_config()?;
                println!("{}", path.display());
            }
            ConfigCommand::Show => {
                let s = toml::to_string_pretty(&cfg).context("serialize config")?;
                println!("{}", s);
            }
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("RELAY_LOG").unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn directory_source(cfg: &config::Config) -> Result<DirectorySource> {
    let dir = cfg.export_dir()?;
    tracing::debug!(dir = %dir.display(), "using export directory");
    Ok(DirectorySource::new(dir, &cfg.source))
}

/// Print a tool result as JSON on stdout; failures print the error payload
/// and end the process with a non-zero status.
fn emit<T: Serialize>(result: relay_core::Result<T>) -> Result<()> {
    match result {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&ToolError::from(&e))?);
            bail!(e)
        }
    }
}

#[derive(Serialize)]
struct ParseOutput {
    report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    transactions: Option<TransactionBatch>,
}

fn parse_file(
    path: &Path,
    account_id: Option<&str>,
    encoding: TextEncoding,
    pipeline: &PipelineConfig,
) -> Result<()> {
    if !path.exists() {
        bail!("export not found: {}", path.display());
    }
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let received = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(|t| chrono::DateTime::<chrono::Local>::from(t).date_naive());
    let attachment = Attachment {
        source_id: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string()),
        name: path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        received,
        bytes,
    };

    let report = report_from_attachment(&attachment, encoding, pipeline)
        .with_context(|| format!("parsing {}", path.display()))?;

    let transactions = account_id
        .map(|id| map_report(&report, id, pipeline.memo_style, &pipeline.currencies));

    let out = ParseOutput {
        report,
        transactions,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn parse_encoding(s: &str) -> std::result::Result<TextEncoding, String> {
    match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
        "auto" => Ok(TextEncoding::Auto),
        "utf8" => Ok(TextEncoding::Utf8),
        "utf16le" => Ok(TextEncoding::Utf16Le),
        "utf16be" => Ok(TextEncoding::Utf16Be),
        "latin1" | "iso88591" => Ok(TextEncoding::Latin1),
        other => Err(format!("unknown encoding '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_encoding_aliases() {
        assert_eq!(parse_encoding("UTF-8"), Ok(TextEncoding::Utf8));
        assert_eq!(parse_encoding("utf_16le"), Ok(TextEncoding::Utf16Le));
        assert_eq!(parse_encoding("ISO-8859-1"), Ok(TextEncoding::Latin1));
        assert!(parse_encoding("ebcdic").is_err());
    }

    #[test]
    fn test_cli_parses_transactions_command() {
        let cli = Cli::try_parse_from([
            "relay",
            "transactions",
            "--account-id",
            "abc123",
            "--memo-style",
            "merchant",
        ])
        .unwrap();
        match cli.command {
            Command::Transactions {
                account_id,
                memo_style,
                message_id,
            } => {
                assert_eq!(account_id, "abc123");
                assert_eq!(memo_style, Some(MemoStyle::Merchant));
                assert!(message_id.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
