// Model output parsing and schema validation
//
// The model is asked for JSON but is not trusted to produce it: the text is
// parsed leniently (markdown fences tolerated) and then checked field by field.

use creditmap_core::{EquivalenceProposal, Verdict};
use serde_json::{Map, Value};

use crate::error::InferError;

pub const FIELD_STUDENT_NAME: &str = "nome_aluno";
pub const FIELD_ANALYSIS: &str = "analise";
pub const FIELD_SOURCE: &str = "Disciplina_Origem";
pub const FIELD_TARGET: &str = "Disciplina_Destino";
pub const FIELD_SIMILARITY: &str = "Similaridade";
pub const FIELD_VERDICT: &str = "Veredito";
pub const FIELD_RATIONALE: &str = "Justificativa";

/// Validated model output, before usage metadata is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnalysis {
    pub student_name: Option<String>,
    pub proposals: Vec<EquivalenceProposal>,
}

/// Parse JSON directly; if that fails, drop every "```json" / "```" marker,
/// trim and try once more.
pub fn parse_json(text: &str) -> Result<Value, InferError> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(first) => {
            let cleaned = strip_fences(text);
            serde_json::from_str::<Value>(&cleaned).map_err(|second| {
                log::debug!("direct JSON parse failed: {first}; fence-stripped parse failed: {second}");
                InferError::malformed(format!("response is not valid JSON: {}", second))
            })
        }
    }
}

pub fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse and validate the model's text.
pub fn parse_analysis(text: &str) -> Result<ParsedAnalysis, InferError> {
    let value = parse_json(text)?;
    let root = value
        .as_object()
        .ok_or_else(|| InferError::malformed("top-level JSON value is not an object"))?;

    let student_name = match root.get(FIELD_STUDENT_NAME) {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.trim().to_string()).filter(|n| !n.is_empty()),
        Some(other) => {
            return Err(InferError::malformed(format!(
                "'{}' must be a string, got {}",
                FIELD_STUDENT_NAME,
                type_name(other)
            )))
        }
    };

    let entries = match root.get(FIELD_ANALYSIS) {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(InferError::malformed(format!(
                "'{}' must be an array, got {}",
                FIELD_ANALYSIS,
                type_name(other)
            )))
        }
        None => return Err(InferError::malformed(format!("missing '{}'", FIELD_ANALYSIS))),
    };

    let proposals = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(i, entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedAnalysis {
        student_name,
        proposals,
    })
}

fn parse_entry(index: usize, entry: &Value) -> Result<EquivalenceProposal, InferError> {
    let obj = entry.as_object().ok_or_else(|| {
        InferError::malformed(format!("{}[{}] is not an object", FIELD_ANALYSIS, index))
    })?;

    let source_course_name = string_field(obj, index, FIELD_SOURCE)?;
    let target_course_name = string_field(obj, index, FIELD_TARGET)?;
    let rationale = string_field(obj, index, FIELD_RATIONALE)?;

    let similarity_score = match obj.get(FIELD_SIMILARITY) {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            InferError::malformed(format!(
                "{}[{}].{} is not representable as a float",
                FIELD_ANALYSIS, index, FIELD_SIMILARITY
            ))
        })?,
        Some(other) => return Err(wrong_type(index, FIELD_SIMILARITY, "a number", other)),
        None => return Err(missing(index, FIELD_SIMILARITY)),
    };
    if !similarity_score.is_finite() || !(0.0..=1.0).contains(&similarity_score) {
        return Err(InferError::malformed(format!(
            "{}[{}].{} must be between 0 and 1, got {}",
            FIELD_ANALYSIS, index, FIELD_SIMILARITY, similarity_score
        )));
    }

    let verdict_text = string_field(obj, index, FIELD_VERDICT)?;
    let verdict = Verdict::from_wire(&verdict_text).ok_or_else(|| {
        InferError::malformed(format!(
            "{}[{}].{} must be \"{}\" or \"{}\", got \"{}\"",
            FIELD_ANALYSIS,
            index,
            FIELD_VERDICT,
            Verdict::Granted.wire_value(),
            Verdict::Denied.wire_value(),
            verdict_text
        ))
    })?;

    Ok(EquivalenceProposal {
        source_course_name,
        target_course_name,
        similarity_score,
        verdict,
        rationale,
    })
}

fn string_field(obj: &Map<String, Value>, index: usize, field: &str) -> Result<String, InferError> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(wrong_type(index, field, "a string", other)),
        None => Err(missing(index, field)),
    }
}

fn missing(index: usize, field: &str) -> InferError {
    InferError::malformed(format!("{}[{}] is missing '{}'", FIELD_ANALYSIS, index, field))
}

fn wrong_type(index: usize, field: &str, expected: &str, got: &Value) -> InferError {
    InferError::malformed(format!(
        "{}[{}].{} must be {}, got {}",
        FIELD_ANALYSIS,
        index,
        field,
        expected,
        type_name(got)
    ))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
