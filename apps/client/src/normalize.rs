//! Response normalization: validates the decoded analysis payload and
//! repairs it before anything downstream renders it.
//!
//! Two fixed substitute payloads exist: the fallback placeholder (the
//! server answered 2xx but the body failed shape validation) and the
//! error placeholder (the request itself failed). Shape failures are
//! never surfaced as errors; the whole payload is replaced, never
//! patched field by field.

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use crate::models::analysis::AnalysisResult;

/// Message shown when the server gave no usable error string.
pub const GENERIC_UPLOAD_ERROR: &str = "Upload failed. Please try again.";

const STRING_ARRAY_FIELDS: [&str; 3] = ["strengths", "weaknesses", "missingSkills"];

/// What a required field was expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    StringArray,
    Text,
    Number,
}

/// A single structural defect in a raw analysis payload. The first
/// defect found invalidates the whole payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeIssue {
    pub field: &'static str,
    pub expected: Expected,
}

/// Checks the five required fields: the three feedback lists are
/// arrays of strings, `summary` is a string, `jobFitScore` is a
/// number. Returns the first violation.
pub fn check_shape(raw: &Value) -> Result<(), ShapeIssue> {
    for field in STRING_ARRAY_FIELDS {
        if !raw.get(field).map(is_string_array).unwrap_or(false) {
            return Err(ShapeIssue {
                field,
                expected: Expected::StringArray,
            });
        }
    }

    if !raw.get("summary").map(Value::is_string).unwrap_or(false) {
        return Err(ShapeIssue {
            field: "summary",
            expected: Expected::Text,
        });
    }

    if !raw.get("jobFitScore").map(Value::is_number).unwrap_or(false) {
        return Err(ShapeIssue {
            field: "jobFitScore",
            expected: Expected::Number,
        });
    }

    Ok(())
}

fn is_string_array(value: &Value) -> bool {
    value
        .as_array()
        .map(|items| items.iter().all(Value::is_string))
        .unwrap_or(false)
}

/// Normalizes a decoded response body into a renderable result.
///
/// An absent body or any shape violation yields the fallback
/// placeholder; a well-shaped body passes through unchanged.
pub fn normalize(raw: Option<&Value>) -> AnalysisResult {
    let Some(raw) = raw else {
        warn!("analysis response body missing; substituting fallback payload");
        return fallback_result(None);
    };

    if let Err(issue) = check_shape(raw) {
        warn!(
            field = issue.field,
            expected = ?issue.expected,
            "analysis response failed shape validation; substituting fallback payload"
        );
        return fallback_result(Some(raw));
    }

    match serde_json::from_value::<AnalysisResult>(raw.clone()) {
        Ok(result) => result,
        Err(err) => {
            // Required fields checked out, so this is a mistyped
            // optional field (e.g. a non-boolean `cached`).
            warn!(error = %err, "analysis response failed to decode; substituting fallback payload");
            fallback_result(Some(raw))
        }
    }
}

/// The substitute shown when the payload cannot be trusted.
/// `processingTime` and `cached` pass through from the raw body when
/// present; everything else is fixed.
pub fn fallback_result(raw: Option<&Value>) -> AnalysisResult {
    let processing_time = raw
        .and_then(|r| r.get("processingTime"))
        .and_then(Value::as_f64)
        .unwrap_or_else(now_millis);
    let cached = raw
        .and_then(|r| r.get("cached"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    AnalysisResult {
        strengths: vec![
            "Resume analysis in progress".to_string(),
            "Processing your resume content".to_string(),
        ],
        weaknesses: vec![
            "Initial analysis".to_string(),
            "Please try again if results seem incomplete".to_string(),
        ],
        missing_skills: vec![
            "Skills will be analyzed".to_string(),
            "Technical skills".to_string(),
            "Soft skills".to_string(),
        ],
        summary: "We're analyzing your resume. Please check back for detailed feedback."
            .to_string(),
        job_fit_score: 50.0,
        processing_time: Some(processing_time),
        cached: Some(cached),
        error: None,
    }
}

/// The substitute carried by a rejected upload. `server_message` is
/// the server-reported error string when one was available.
pub fn error_result(server_message: Option<String>) -> AnalysisResult {
    AnalysisResult {
        strengths: vec![
            "Error processing request".to_string(),
            "Please try again".to_string(),
        ],
        weaknesses: vec![
            "Connection issue".to_string(),
            "Check your internet connection".to_string(),
        ],
        missing_skills: vec![
            "Skills could not be analyzed".to_string(),
            "AI processing failed".to_string(),
        ],
        summary: "An error occurred while analyzing your resume. Please try uploading again."
            .to_string(),
        job_fit_score: 0.0,
        processing_time: Some(0.0),
        cached: Some(false),
        error: Some(server_message.unwrap_or_else(|| GENERIC_UPLOAD_ERROR.to_string())),
    }
}

fn now_millis() -> f64 {
    Utc::now().timestamp_millis() as f64
}
