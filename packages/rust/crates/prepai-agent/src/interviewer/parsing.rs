//! Structured-output parsing for generator and evaluator replies.
//!
//! The reply must be one JSON object, optionally wrapped in a Markdown code fence.
//! Anything else is `GenerationError::Malformed`.

use serde_json::{Map, Value};

use prepai_types::{AccuracyLevel, Question, RESUME_SCORE_MAX, ResumeScore, Review, SCORE_MAX};

use super::GenerationError;

const DEFAULT_FORMAT: &str = "text";

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string line (```json).
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, GenerationError> {
    let body = strip_code_fence(raw);
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(GenerationError::Malformed(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(error) => Err(GenerationError::Malformed(format!("invalid JSON: {error}"))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn required_text(map: &Map<String, Value>, field: &str) -> Result<String, GenerationError> {
    map.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GenerationError::Malformed(format!("missing text field `{field}`")))
}

/// Format fields are free-form; non-string examples (arrays, numbers) are kept as JSON text.
fn format_text(map: &Map<String, Value>, field: &str) -> String {
    match map.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Null) | None => DEFAULT_FORMAT.to_string(),
        Some(Value::String(_)) => DEFAULT_FORMAT.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Parse a generator reply into a `Question`.
pub fn parse_question(raw: &str) -> Result<Question, GenerationError> {
    let map = parse_object(raw)?;
    let question = Question {
        title: required_text(&map, "title")?,
        description: required_text(&map, "description")?,
        input_format: format_text(&map, "input_format"),
        output_format: format_text(&map, "output_format"),
    };
    Ok(question)
}

fn score(map: &Map<String, Value>, field: &str) -> Result<Option<u8>, GenerationError> {
    bounded_score(map, field, SCORE_MAX)
}

/// Integer, float (rounded) or numeric string within `0..=max`.
fn bounded_score(
    map: &Map<String, Value>,
    field: &str,
    max: u8,
) -> Result<Option<u8>, GenerationError> {
    let raw = match map.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    let value = raw
        .filter(|v| v.is_finite())
        .ok_or_else(|| GenerationError::Malformed(format!("`{field}` is not a number")))?;
    let rounded = value.round();
    if !(0.0..=f64::from(max)).contains(&rounded) {
        return Err(GenerationError::Malformed(format!(
            "`{field}` out of range: {value}"
        )));
    }
    // In range 0..=max after the check above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = rounded as u8;
    Ok(Some(score))
}

/// Parse an evaluator reply into a `Review`.
pub fn parse_review(raw: &str) -> Result<Review, GenerationError> {
    let map = parse_object(raw)?;
    let review = Review {
        technical_accuracy: map
            .get("technical_accuracy")
            .and_then(Value::as_str)
            .and_then(AccuracyLevel::parse),
        clarity_score: score(&map, "clarity_score")?,
        confidence_score: score(&map, "confidence_score")?,
        feedback: required_text(&map, "feedback")?,
    };
    if !review.is_well_formed() {
        return Err(GenerationError::Malformed(
            "review carries no usable score".to_string(),
        ));
    }
    Ok(review)
}

/// A list of strings, or one string taken as a single tip. Blank entries are dropped.
fn tip_list(map: &Map<String, Value>, field: &str) -> Result<Vec<String>, GenerationError> {
    let items: Vec<&Value> = match map.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(value @ Value::String(_)) => vec![value],
        Some(other) => {
            return Err(GenerationError::Malformed(format!(
                "`{field}` must be a list of strings, got {}",
                json_type_name(other)
            )));
        }
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(Ok(text.trim().to_string())),
            other => Some(Err(GenerationError::Malformed(format!(
                "`{field}` entry is a {}, not a string",
                json_type_name(other)
            )))),
        })
        .collect()
}

/// Parse a scorer reply into a `ResumeScore`.
pub fn parse_resume_score(raw: &str) -> Result<ResumeScore, GenerationError> {
    let map = parse_object(raw)?;
    let score = bounded_score(&map, "score", RESUME_SCORE_MAX)?
        .ok_or_else(|| GenerationError::Malformed("missing `score`".to_string()))?;
    Ok(ResumeScore {
        score,
        improvement_tips: tip_list(&map, "improvement_tips")?,
        summary: required_text(&map, "summary")?,
    })
}
