use serde::{Deserialize, Serialize};

/// The analysis payload produced by the remote service.
///
/// Field names on the wire are camelCase. The three feedback lists and
/// the score are required by the normalizer; everything else is
/// best-effort metadata the server may omit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub missing_skills: Vec<String>,
    pub summary: String,
    /// 0-100 estimate of resume-to-role alignment, computed server-side.
    pub job_fit_score: f64,
    /// Milliseconds the server spent producing the analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    /// Whether the server served a memoized result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    /// Present only on failure payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Human-readable reading of the job fit score, same bands the
    /// result view shows next to the score dial.
    pub fn score_interpretation(&self) -> &'static str {
        let score = self.job_fit_score;
        if score >= 90.0 {
            "Exceptional! Your resume stands out from the competition."
        } else if score >= 80.0 {
            "Excellent! Your resume is well-aligned with market standards."
        } else if score >= 70.0 {
            "Good! Your resume has strong elements with minor improvements needed."
        } else if score >= 60.0 {
            "Fair. Your resume has some good points but needs improvement."
        } else if score >= 40.0 {
            "Needs Improvement. Several areas require attention."
        } else {
            "Poor. Significant improvements needed to be competitive."
        }
    }
}
