//! Line-driven review of proposed equivalences.
//!
//! Commands (indices are 1-based, as printed in the table):
//!
//! | Command | Effect                         |
//! |---------|--------------------------------|
//! | `a N`   | approve entry N                |
//! | `r N`   | reject entry N                 |
//! | `t N`   | toggle entry N                 |
//! | `l`     | list the table again           |
//! | `f`     | finalize and continue          |
//! | `q`     | quit without a report          |

use std::io::{BufRead, Write};

use creditmap_core::{ConfirmedEquivalenceSet, ReviewSession, SessionError};

use crate::exit_codes::{EXIT_ERROR, EXIT_REVIEW_ABORTED};
use crate::render::write_review_table;
use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReviewCommand {
    Approve(usize),
    Reject(usize),
    Toggle(usize),
    List,
    Finalize,
    Quit,
    Help,
}

/// Parse one input line. Indices are converted to 0-based.
pub(crate) fn parse_command(line: &str) -> Result<ReviewCommand, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().ok_or_else(|| "empty command".to_string())?;
    let arg = parts.next();
    if parts.next().is_some() {
        return Err(format!("too many arguments in '{}'", line.trim()));
    }

    let index = |arg: Option<&str>| -> Result<usize, String> {
        let raw = arg.ok_or_else(|| format!("'{}' needs an entry number", verb))?;
        match raw.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("'{}' is not an entry number", raw)),
        }
    };

    let command = match verb.to_lowercase().as_str() {
        "a" | "approve" => ReviewCommand::Approve(index(arg)?),
        "r" | "reject" => ReviewCommand::Reject(index(arg)?),
        "t" | "toggle" => ReviewCommand::Toggle(index(arg)?),
        "l" | "list" => ReviewCommand::List,
        "f" | "finalize" => ReviewCommand::Finalize,
        "q" | "quit" => ReviewCommand::Quit,
        "h" | "help" | "?" => ReviewCommand::Help,
        other => return Err(format!("unknown command '{}'", other)),
    };

    if arg.is_some()
        && matches!(
            command,
            ReviewCommand::List | ReviewCommand::Finalize | ReviewCommand::Quit | ReviewCommand::Help
        )
    {
        return Err(format!("'{}' takes no arguments", verb));
    }
    Ok(command)
}

const HELP: &str = "commands: a N (approve), r N (reject), t N (toggle), l (list), f (finalize), q (quit)";

/// Drive the review until the user finalizes or quits.
///
/// Ending the input without `f` counts as quitting.
pub(crate) fn run_review<R: BufRead, W: Write>(
    session: &mut ReviewSession,
    input: R,
    out: &mut W,
) -> Result<ConfirmedEquivalenceSet, CliError> {
    write_review_table(out, session.reviews()).map_err(write_err)?;
    writeln!(out, "{}", HELP).map_err(write_err)?;
    prompt(out)?;

    for line in input.lines() {
        let line = line.map_err(|e| CliError::io(format!("cannot read review input: {}", e)))?;
        if line.trim().is_empty() {
            prompt(out)?;
            continue;
        }

        match parse_command(&line) {
            Ok(ReviewCommand::Finalize) => {
                return session.finalize().map_err(session_err);
            }
            Ok(ReviewCommand::Quit) => return Err(aborted()),
            Ok(ReviewCommand::List) => {
                write_review_table(out, session.reviews()).map_err(write_err)?;
            }
            Ok(ReviewCommand::Help) => {
                writeln!(out, "{}", HELP).map_err(write_err)?;
            }
            Ok(cmd @ (ReviewCommand::Approve(i) | ReviewCommand::Reject(i) | ReviewCommand::Toggle(i))) => {
                let value = match cmd {
                    ReviewCommand::Approve(_) => true,
                    ReviewCommand::Reject(_) => false,
                    _ => session.reviews().get(i).map(|r| !r.approved()).unwrap_or(true),
                };
                match session.toggle_approval(i, value) {
                    Ok(()) => {
                        let review = &session.reviews()[i];
                        writeln!(
                            out,
                            "{}. {} -> {}: {}",
                            i + 1,
                            review.proposal().source_course_name,
                            review.proposal().target_course_name,
                            if review.approved() { "approved" } else { "rejected" }
                        )
                        .map_err(write_err)?;
                    }
                    Err(SessionError::IndexOutOfRange { len, .. }) => {
                        writeln!(out, "no entry {}; entries are numbered 1 to {}", i + 1, len)
                            .map_err(write_err)?;
                    }
                    Err(e) => return Err(session_err(e)),
                }
            }
            Err(msg) => {
                writeln!(out, "{}", msg).map_err(write_err)?;
                writeln!(out, "{}", HELP).map_err(write_err)?;
            }
        }
        prompt(out)?;
    }

    log::debug!("review input ended before finalize");
    Err(aborted())
}

fn prompt<W: Write>(out: &mut W) -> Result<(), CliError> {
    write!(out, "review> ").map_err(write_err)?;
    out.flush().map_err(write_err)
}

fn aborted() -> CliError {
    CliError {
        code: EXIT_REVIEW_ABORTED,
        message: "review ended without finalizing; no report produced".to_string(),
        hint: Some("use 'f' to finalize, or --accept-defaults to skip the review".to_string()),
    }
}

fn write_err(e: std::io::Error) -> CliError {
    CliError::io(format!("cannot write output: {}", e))
}

fn session_err(e: SessionError) -> CliError {
    CliError {
        code: EXIT_ERROR,
        message: format!("review session: {}", e),
        hint: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditmap_core::{Analysis, EquivalenceProposal, Verdict};

    fn proposal(target: &str, verdict: Verdict) -> EquivalenceProposal {
        EquivalenceProposal {
            source_course_name: format!("{target} (origem)"),
            target_course_name: target.into(),
            similarity_score: 0.8,
            verdict,
            rationale: "ementa".into(),
        }
    }

    fn session() -> ReviewSession {
        let mut session = ReviewSession::new();
        let ticket = session.begin_run().unwrap();
        session
            .complete_run(
                ticket,
                Analysis {
                    student_name: Some("Ana".into()),
                    proposals: vec![
                        proposal("Cálculo I", Verdict::Granted),
                        proposal("Física I", Verdict::Denied),
                    ],
                    usage: None,
                },
            )
            .unwrap();
        session
    }

    fn run(session: &mut ReviewSession, input: &str) -> (Result<ConfirmedEquivalenceSet, CliError>, String) {
        let mut out = Vec::new();
        let result = run_review(session, input.as_bytes(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parse_commands() {
        assert_eq!(parse_command("a 1"), Ok(ReviewCommand::Approve(0)));
        assert_eq!(parse_command("  R 3 "), Ok(ReviewCommand::Reject(2)));
        assert_eq!(parse_command("toggle 2"), Ok(ReviewCommand::Toggle(1)));
        assert_eq!(parse_command("l"), Ok(ReviewCommand::List));
        assert_eq!(parse_command("f"), Ok(ReviewCommand::Finalize));
        assert_eq!(parse_command("q"), Ok(ReviewCommand::Quit));
        assert!(parse_command("a").is_err());
        assert!(parse_command("a 0").is_err());
        assert!(parse_command("a x").is_err());
        assert!(parse_command("f 1").is_err());
        assert!(parse_command("zap").is_err());
    }

    #[test]
    fn finalize_keeps_default_approvals() {
        let mut s = session();
        let (result, out) = run(&mut s, "f\n");
        let confirmed = result.unwrap();
        let approved: Vec<bool> = confirmed.entries().iter().map(|r| r.approved()).collect();
        assert_eq!(approved, vec![true, false]);
        assert!(out.contains("Cálculo I"));
    }

    #[test]
    fn edits_apply_before_finalize() {
        let mut s = session();
        let (result, out) = run(&mut s, "r 1\nt 2\nl\nf\n");
        let confirmed = result.unwrap();
        let approved: Vec<bool> = confirmed.entries().iter().map(|r| r.approved()).collect();
        assert_eq!(approved, vec![false, true]);
        assert!(out.contains("1. Cálculo I (origem) -> Cálculo I: rejected"));
        assert!(out.contains("2. Física I (origem) -> Física I: approved"));
    }

    #[test]
    fn out_of_range_index_is_reported_and_loop_continues() {
        let mut s = session();
        let (result, out) = run(&mut s, "a 9\nf\n");
        assert!(result.is_ok());
        assert!(out.contains("no entry 9; entries are numbered 1 to 2"));
    }

    #[test]
    fn bad_input_prints_help() {
        let mut s = session();
        let (result, out) = run(&mut s, "what\nf\n");
        assert!(result.is_ok());
        assert!(out.contains("unknown command 'what'"));
    }

    #[test]
    fn quit_aborts() {
        let mut s = session();
        let (result, _) = run(&mut s, "a 2\nq\n");
        assert_eq!(result.unwrap_err().code, EXIT_REVIEW_ABORTED);
        assert!(s.confirmed().is_none());
    }

    #[test]
    fn end_of_input_aborts() {
        let mut s = session();
        let (result, _) = run(&mut s, "a 2\n");
        assert_eq!(result.unwrap_err().code, EXIT_REVIEW_ABORTED);
    }
}
