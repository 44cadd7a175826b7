//! The extraction pipeline: filter, load, parse, prune, write.

use std::path::PathBuf;
use std::time::Duration;

use extract_openapi_pruner::{prune, FilterError, PathFilter, PruneError, PruneSummary};
use extract_openapi_spec::{parse_document, write_document, OutputFormat, ParseError, WriteError};
use extract_openapi_telemetry::{
    log_completed, log_document_written, log_paths_selected, log_schemas_shaken,
    log_source_loaded,
};
use thiserror::Error;

use crate::source::{load_source, Source, SourceError, DEFAULT_TIMEOUT};

/// Errors from a whole extraction run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Prune(#[from] PruneError),

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] WriteError),

    #[error("failed to write '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// Process exit code: 3 for I/O failures, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Source(_) | RunError::Output { .. } | RunError::Parse(ParseError::Io(_)) => 3,
            _ => 1,
        }
    }
}

/// What to extract and where to put it.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Source document, file path or `http(s)` URL.
    pub source: String,
    /// Filter specs, `path[=op[,op...]]`.
    pub paths: Vec<String>,
    /// Destination file, overwritten if it exists.
    pub dest_file: PathBuf,
    pub dest_format: OutputFormat,
    /// Timeout for remote sources.
    pub timeout: Duration,
    /// Prune and report without writing.
    pub dry_run: bool,
}

impl ExtractOptions {
    pub fn new(source: impl Into<String>, dest_file: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            paths: Vec::new(),
            dest_file: dest_file.into(),
            dest_format: OutputFormat::default(),
            timeout: DEFAULT_TIMEOUT,
            dry_run: false,
        }
    }

    pub fn with_path(mut self, spec: impl Into<String>) -> Self {
        self.paths.push(spec.into());
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.dest_format = format;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct ExtractReport {
    pub summary: PruneSummary,
    /// Counts in the pruned document.
    pub paths: usize,
    pub operations: usize,
    pub tags: usize,
    pub schemas: usize,
    /// Serialized size of the pruned document in bytes.
    pub bytes: usize,
    /// Destination written, `None` on a dry run.
    pub written: Option<PathBuf>,
}

/// Run the whole extraction. Nothing is written unless every step succeeds.
pub fn extract(options: &ExtractOptions) -> Result<ExtractReport, RunError> {
    let filter = PathFilter::parse_specs(&options.paths)?;

    let source = Source::parse(&options.source);
    let text = load_source(&source, options.timeout)?;
    let mut document = parse_document(&text)?;
    log_source_loaded!(
        source = %source,
        openapi = %document.openapi,
        paths = document.paths.len(),
        schemas = document.components.schemas.len()
    );

    let summary = prune(&mut document, &filter)?;
    log_paths_selected!(
        paths_removed = summary.selection.paths_removed,
        operations_removed = summary.selection.operations_removed,
        tags_removed = summary.selection.tags_removed
    );
    log_schemas_shaken!(
        seeds = summary.shake.seeds,
        kept = summary.shake.schemas_kept,
        removed = summary.shake.schemas_removed,
        components_removed = summary.shake.components_removed
    );

    let output = write_document(&document, options.dest_format)?;

    let written = if options.dry_run {
        None
    } else {
        std::fs::write(&options.dest_file, &output).map_err(|source| RunError::Output {
            path: options.dest_file.clone(),
            source,
        })?;
        log_document_written!(dest = %options.dest_file.display(), bytes = output.len());
        Some(options.dest_file.clone())
    };

    let report = ExtractReport {
        summary,
        paths: document.paths.len(),
        operations: document.operation_count(),
        tags: document.tags.len(),
        schemas: document.components.schemas.len(),
        bytes: output.len(),
        written,
    };
    log_completed!(
        paths = report.paths,
        operations = report.operations,
        tags = report.tags,
        schemas = report.schemas,
        dry_run = options.dry_run
    );

    Ok(report)
}
