//! `creditmap analyze`: extract, infer, review, reconcile, report.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use creditmap_config::{AIConfigStatus, ResolvedAIConfig, Settings};
use creditmap_core::{ExtractedText, RawDocument, ReviewSession, SessionError};
use creditmap_infer::{EquivalenceClient, EquivalenceInference};
use creditmap_recon::{format_coverage, reconcile, NameColumnStrategy};

use crate::exit_codes::{EXIT_AI_DISABLED, EXIT_AI_MISSING_KEY, EXIT_MATRIX_UNREADABLE};
use crate::render::{write_report, AnalyzeOutput};
use crate::review::run_review;
use crate::CliError;

pub(crate) struct AnalyzeArgs {
    pub transcript: PathBuf,
    pub matrix: PathBuf,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub accept_defaults: bool,
    pub json: bool,
}

pub(crate) fn cmd_analyze(args: AnalyzeArgs, settings: &Settings) -> Result<(), CliError> {
    for path in [&args.transcript, &args.matrix] {
        if !path.is_file() {
            return Err(CliError::args(format!("file not found: {}", path.display())));
        }
    }

    let config = ResolvedAIConfig::resolve(&settings.ai, args.api_key.as_deref())
        .with_model(args.model.as_deref());
    match config.status {
        AIConfigStatus::Disabled => {
            return Err(CliError {
                code: EXIT_AI_DISABLED,
                message: "AI is disabled (ai.provider = \"none\")".to_string(),
                hint: Some(format!("set ai.provider to \"gemini\" in {}", Settings::config_path_display())),
            });
        }
        AIConfigStatus::MissingKey => {
            return Err(CliError {
                code: EXIT_AI_MISSING_KEY,
                message: config.blocking_reason.clone().unwrap_or_else(|| "API key missing".to_string()),
                hint: Some("pass --api-key or set the variable shown by 'creditmap ai doctor'".to_string()),
            });
        }
        AIConfigStatus::Ready => {}
    }
    log::debug!("resolved AI config: {:?}", config);

    let client = EquivalenceClient::from_config(&config).map_err(CliError::infer)?;
    let strategy = NameColumnStrategy::from_parts(
        settings.matrix.name_column.as_deref(),
        &settings.matrix.name_column_hints,
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        // Keep stdout clean for the JSON document.
        let stderr = io::stderr();
        let mut review_out = stderr.lock();
        run_analysis(&client, client.model(), &args, &strategy, stdin.lock(), &mut review_out, &mut out)
    } else {
        let mut review_out = io::stdout();
        run_analysis(&client, client.model(), &args, &strategy, stdin.lock(), &mut review_out, &mut out)
    }
}

/// The pipeline behind `analyze`, with the service and terminal injected.
pub(crate) fn run_analysis<I, R, V, W>(
    inference: &I,
    model: &str,
    args: &AnalyzeArgs,
    strategy: &NameColumnStrategy,
    input: R,
    review_out: &mut V,
    out: &mut W,
) -> Result<(), CliError>
where
    I: EquivalenceInference + ?Sized,
    R: BufRead,
    V: Write,
    W: Write,
{
    let matrix_doc = read_document(&args.matrix)?;
    let matrix = creditmap_io::load_matrix(&matrix_doc).map_err(|e| CliError {
        code: EXIT_MATRIX_UNREADABLE,
        message: format!("cannot load curriculum matrix {}: {}", args.matrix.display(), e),
        hint: Some("the matrix must be an .xlsx or .xls workbook with a header row".to_string()),
    })?;

    let transcript = creditmap_io::extract(&read_document(&args.transcript)?);
    let matrix_text = creditmap_io::extract(&matrix_doc);
    warn_unusable("transcript", &args.transcript, &transcript);
    warn_unusable("matrix", &args.matrix, &matrix_text);

    let mut session = ReviewSession::new();
    eprintln!("Analyzing with {}...", model);
    run_inference(&mut session, inference, &transcript, &matrix_text)?;

    let confirmed = if args.accept_defaults {
        session.finalize().map_err(|e| CliError::eval(e.to_string()))?
    } else {
        run_review(&mut session, input, review_out)?
    };

    let report = reconcile(&confirmed, &matrix, strategy);

    let write_err = |e: io::Error| CliError::io(format!("cannot write output: {}", e));
    if args.json {
        let output = AnalyzeOutput {
            schema_version: 1,
            student_name: session.student_name(),
            model: Some(model),
            usage: session.usage(),
            headers: &matrix.headers,
            coverage: format_coverage(report.metrics.coverage_ratio),
            report: &report,
        };
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::eval(format!("cannot serialize report: {}", e)))?;
        writeln!(out, "{}", json).map_err(write_err)?;
    } else {
        write_report(out, &report, &matrix.headers, session.student_name()).map_err(write_err)?;
    }
    Ok(())
}

/// One inference run inside the session. A failed run is aborted, leaving
/// the session as it was before.
fn run_inference<I: EquivalenceInference + ?Sized>(
    session: &mut ReviewSession,
    inference: &I,
    transcript: &ExtractedText,
    matrix_text: &ExtractedText,
) -> Result<(), CliError> {
    let session_err = |e: SessionError| CliError::eval(format!("review session: {}", e));
    let ticket = session.begin_run().map_err(session_err)?;
    match creditmap_infer::analyze(inference, transcript, matrix_text) {
        Ok(analysis) => session.complete_run(ticket, analysis).map_err(session_err),
        Err(e) => {
            session.abort_run(ticket).map_err(session_err)?;
            Err(CliError::infer(e))
        }
    }
}

fn read_document(path: &Path) -> Result<RawDocument, CliError> {
    RawDocument::from_path(path).map_err(|e| CliError::io(format!("cannot read {}: {}", path.display(), e)))
}

fn warn_unusable(label: &str, path: &Path, text: &ExtractedText) {
    if text.is_failure() {
        eprintln!("warning: {} {}: {}", label, path.display(), text.as_str());
    } else if !text.is_usable() {
        eprintln!("warning: {} {}: no text could be extracted", label, path.display());
    }
}
