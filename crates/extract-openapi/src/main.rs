//! extract-openapi CLI.
//!
//! Keeps the selected paths and operations of an OpenAPI 3.x document and
//! only the component schemas they still reference.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use extract_openapi_lib::{extract, ExtractOptions};
use extract_openapi_spec::OutputFormat;
use extract_openapi_telemetry::{log_failed, LogFormat, LoggingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "extract-openapi",
    about = "Extract a subset of paths and operations from an OpenAPI document",
    version
)]
struct Cli {
    /// Source document: a file path or an http(s) URL (YAML or JSON).
    #[arg(short, long)]
    source: String,

    /// Paths to keep, as `path[=operation[,operation...]]`.
    ///
    /// Without `=...` every operation of the path is kept.
    #[arg(short, long, required = true, num_args = 1..)]
    paths: Vec<String>,

    /// Destination file (overwritten if it exists).
    #[arg(short, long)]
    dest_file: PathBuf,

    /// Destination format (yaml or json).
    #[arg(short = 'f', long, default_value = "yaml", value_parser = parse_output_format)]
    dest_format: OutputFormat,

    /// Timeout in seconds when downloading a remote source.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Log level or filter directive (RUST_LOG takes precedence).
    #[arg(long, env = "EXTRACT_OPENAPI_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(
        long,
        env = "EXTRACT_OPENAPI_LOG_FORMAT",
        default_value = "pretty",
        value_parser = parse_log_format
    )]
    log_format: LogFormat,

    /// Prune and report without writing the destination file.
    #[arg(long)]
    dry_run: bool,
}

fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(s).ok_or_else(|| format!("unknown format '{}' (expected yaml or json)", s))
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s)
        .ok_or_else(|| format!("unknown log format '{}' (expected json or pretty)", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = LoggingConfig::new()
        .with_log_level(&cli.log_level)
        .with_log_format(cli.log_format);
    if let Err(e) = extract_openapi_telemetry::init(&logging) {
        eprintln!("error: {}", e);
        return ExitCode::from(2);
    }

    let options = ExtractOptions {
        source: cli.source,
        paths: cli.paths,
        dest_file: cli.dest_file,
        dest_format: cli.dest_format,
        timeout: Duration::from_secs(cli.timeout_secs),
        dry_run: cli.dry_run,
    };

    match extract(&options) {
        Ok(report) => {
            let target = match &report.written {
                Some(path) => format!("to {}", path.display()),
                None => "(dry run, nothing written)".to_string(),
            };
            eprintln!(
                "extracted {} path(s), {} operation(s), {} tag(s), {} schema(s) {}",
                report.paths, report.operations, report.tags, report.schemas, target
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_failed!(error = %e, exit_code = e.exit_code());
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
