// creditmap CLI - credit-transfer analysis from the terminal

mod analyze;
mod exit_codes;
mod render;
mod review;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use creditmap_config::{AIConfigStatus, AIDiagnostics, ResolvedAIConfig, Settings};
use creditmap_core::EXTRACTION_ERROR_MARKER;
use creditmap_infer::{InferError, ServiceError};

use analyze::{cmd_analyze, AnalyzeArgs};
use exit_codes::{
    infer_exit_code, EXIT_AI_DISABLED, EXIT_AI_MISSING_KEY, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "creditmap")]
#[command(about = "Propose, review and reconcile course equivalences for credit transfer")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: the per-user creditmap settings.json)
    #[arg(long, global = true, env = "CREDITMAP_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug). CREDITMAP_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a transcript against a curriculum matrix
    #[command(after_help = "\
Examples:
  creditmap analyze historico.pdf matriz.xlsx
  creditmap analyze historico.pdf matriz.xlsx --accept-defaults --json > report.json
  creditmap analyze historico.pdf matriz.xlsx --model gemini-2.5-pro

Review commands (1-based entry numbers):
  a N   approve       r N   reject       t N   toggle
  l     list again    f     finalize     q     quit without a report

Exit codes:
  0   report produced
  2   missing input file or bad settings file
  10  AI disabled in settings
  11  API key missing
  13  empty response from the model
  14  malformed response from the model
  15  network or HTTP error
  16  model unavailable (HTTP 404)
  20  review ended without finalizing
  21  curriculum matrix is not a readable spreadsheet")]
    Analyze {
        /// Student transcript (.pdf, .xlsx, .txt)
        transcript: PathBuf,

        /// Curriculum matrix workbook (.xlsx, .xls, .ods)
        matrix: PathBuf,

        /// API key for this run (otherwise CREDITMAP_GEMINI_KEY)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,

        /// Model name (overrides ai.model)
        #[arg(long)]
        model: Option<String>,

        /// Skip the interactive review and keep the model's verdicts
        #[arg(long)]
        accept_defaults: bool,

        /// Print the report as JSON (review prompts go to stderr)
        #[arg(long)]
        json: bool,
    },

    /// Print the normalized text extracted from a document
    Extract {
        /// Document to read (.pdf, .xlsx, .txt)
        file: PathBuf,
    },

    /// AI configuration commands
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Show resolved AI configuration and why it is (not) ready
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nreconcile: creditmap-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:    ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("CREDITMAP_LOG", level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_settings(cli.config.as_ref()).and_then(|settings| match cli.command {
        Commands::Analyze {
            transcript,
            matrix,
            api_key,
            model,
            accept_defaults,
            json,
        } => cmd_analyze(
            AnalyzeArgs {
                transcript,
                matrix,
                api_key,
                model,
                accept_defaults,
                json,
            },
            &settings,
        ),
        Commands::Extract { file } => cmd_extract(file),
        Commands::Ai { command } => match command {
            AiCommands::Doctor { json } => cmd_ai_doctor(&settings, cli.config.as_ref(), json),
        },
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn eval(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from an inference failure with the matching exit code.
    pub fn infer(err: InferError) -> Self {
        let code = infer_exit_code(&err);
        let hint = match &err {
            InferError::Service(ServiceError::ModelUnavailable { .. }) => {
                Some("check the model name (--model or ai.model in settings)".to_string())
            }
            InferError::Service(ServiceError::Network(_)) => {
                Some("check your connection and ai.base_url".to_string())
            }
            InferError::MalformedResponse(_) | InferError::EmptyResponse => {
                Some("the model did not return usable JSON; try again or pick another model".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Settings::load_from(path).map_err(|e| {
            CliError::args(e.to_string()).with_hint("fix the file or omit --config to use the default settings")
        }),
        None => Ok(Settings::load()),
    }
}

fn cmd_extract(file: PathBuf) -> Result<(), CliError> {
    if !file.is_file() {
        return Err(CliError::args(format!("file not found: {}", file.display())));
    }
    let text = creditmap_io::extract_path(&file);
    if text.is_failure() {
        let message = text.as_str().trim_start_matches(EXTRACTION_ERROR_MARKER).to_string();
        return Err(CliError::eval(format!("{}: {}", file.display(), message)));
    }
    if !text.is_usable() {
        eprintln!("warning: no text extracted from {}", file.display());
        return Ok(());
    }
    println!("{}", text);
    Ok(())
}

fn cmd_ai_doctor(settings: &Settings, settings_path: Option<&PathBuf>, json: bool) -> Result<(), CliError> {
    let config = ResolvedAIConfig::resolve(&settings.ai, None);
    let mut diag = AIDiagnostics::from_resolved(&config);
    if let Some(path) = settings_path {
        diag.settings_path = path.display().to_string();
    }

    if json {
        let out = serde_json::to_string_pretty(&diag)
            .map_err(|e| CliError::eval(format!("cannot serialize diagnostics: {}", e)))?;
        println!("{}", out);
    } else {
        print!("{}", diag);
        match config.status {
            AIConfigStatus::Disabled => {
                println!();
                println!("AI is disabled. To enable:");
                println!("  Set ai.provider to \"gemini\" in {}", diag.settings_path);
            }
            AIConfigStatus::MissingKey => {
                println!();
                println!("Fix: set {} or pass --api-key to analyze", diag.key_env_var);
            }
            AIConfigStatus::Ready => {}
        }
    }

    // Determine exit code based on status
    match config.status {
        AIConfigStatus::Disabled => Err(CliError {
            code: EXIT_AI_DISABLED,
            message: "AI is disabled".to_string(),
            hint: None,
        }),
        AIConfigStatus::MissingKey => Err(CliError {
            code: EXIT_AI_MISSING_KEY,
            message: format!(
                "AI misconfigured: {}",
                config.blocking_reason.as_deref().unwrap_or("unknown")
            ),
            hint: None,
        }),
        AIConfigStatus::Ready => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbose_counts() {
        let cli = Cli::try_parse_from(["creditmap", "-vv", "extract", "a.txt"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn analyze_flags() {
        let cli = Cli::try_parse_from([
            "creditmap",
            "analyze",
            "h.pdf",
            "m.xlsx",
            "--api-key",
            "k",
            "--accept-defaults",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { api_key, accept_defaults, json, model, .. } => {
                assert_eq!(api_key.as_deref(), Some("k"));
                assert!(accept_defaults && json);
                assert!(model.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn analyze_needs_both_files() {
        assert!(Cli::try_parse_from(["creditmap", "analyze", "h.pdf"]).is_err());
    }

    #[test]
    fn infer_errors_carry_exit_codes_and_hints() {
        let err = CliError::infer(InferError::Service(ServiceError::ModelUnavailable {
            model: "x".into(),
            message: "not found".into(),
        }));
        assert_eq!(err.code, exit_codes::EXIT_AI_MODEL_UNAVAILABLE);
        assert!(err.hint.is_some());

        let err = CliError::infer(InferError::NotConfigured("no key".into()));
        assert_eq!(err.code, EXIT_AI_MISSING_KEY);
        assert!(err.hint.is_none());
    }
}
