use chrono::NaiveDateTime;
use serde::Serialize;
use tabled::Tabled;

use crate::likert::LikertScale;

/// One survey response after header normalization and temporal derivation.
///
/// Every field that can be blank in the source export is an `Option`; a
/// trimmed-empty cell and an absent column both become `None`, so consumers
/// never have to distinguish "empty answer" from "no answer".
#[derive(Debug, Clone)]
pub struct SurveyRecord {
    pub department: Option<String>,
    pub timestamp: NaiveDateTime,
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    /// Overall satisfaction category, one of the five ordinal labels.
    pub overall_satisfaction: Option<String>,
    pub health_status: Option<String>,
    /// Per-question ordinal answers q1..q10, category text or free-typed.
    pub questions: [Option<String>; 10],
    pub will_return: Option<String>,
    pub will_recommend: Option<String>,
    pub has_dissatisfaction: Option<String>,
    pub dissatisfaction_detail: Option<String>,
    pub expectation: Option<String>,
}

impl SurveyRecord {
    /// Answer for question `idx` (0-based), if any.
    pub fn question(&self, idx: usize) -> Option<&str> {
        self.questions.get(idx).and_then(|q| q.as_deref())
    }

    /// Overall satisfaction score 1-5, mapped through the fixed category
    /// table only. An unrecognized category stays `None`, never a default.
    pub fn satisfaction_score(&self, scale: &LikertScale) -> Option<u8> {
        self.overall_satisfaction
            .as_deref()
            .and_then(|c| scale.score(c))
    }
}

/// Counters describing one ingestion pass.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub dropped_no_timestamp: usize,
    pub read_errors: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OverviewRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DepartmentCountRow {
    #[serde(rename = "Department")]
    #[tabled(rename = "Department")]
    pub department: String,
    #[serde(rename = "Responses")]
    #[tabled(rename = "Responses")]
    pub responses: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct QuestionScoreRow {
    #[serde(rename = "Question")]
    #[tabled(rename = "Question")]
    pub question: String,
    #[serde(rename = "N")]
    #[tabled(rename = "N")]
    pub responses: usize,
    #[serde(rename = "Mean")]
    #[tabled(rename = "Mean")]
    pub mean: String,
    #[serde(rename = "Score1")]
    #[tabled(rename = "Score1")]
    pub s1: String,
    #[serde(rename = "Score2")]
    #[tabled(rename = "Score2")]
    pub s2: String,
    #[serde(rename = "Score3")]
    #[tabled(rename = "Score3")]
    pub s3: String,
    #[serde(rename = "Score4")]
    #[tabled(rename = "Score4")]
    pub s4: String,
    #[serde(rename = "Score5")]
    #[tabled(rename = "Score5")]
    pub s5: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FreeTextRow {
    #[serde(rename = "Topic")]
    #[tabled(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Department")]
    #[tabled(rename = "Department")]
    pub department: String,
    #[serde(rename = "Detail")]
    #[tabled(rename = "Detail")]
    pub detail: String,
}

/// One free-text answer paired with the responder's department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeTextEntry {
    pub department: Option<String>,
    pub text: String,
}

/// Overview metrics for one filtered view, exported as `summary.json`.
///
/// `None` means "no data for this selection" and serializes as `null`;
/// it is never collapsed to zero.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub department: String,
    pub period: String,
    pub total_responses: usize,
    pub avg_satisfaction: Option<f64>,
    pub pct_will_return: Option<f64>,
    pub pct_will_recommend: Option<f64>,
    pub pct_dissatisfied: Option<f64>,
    pub most_common_health_status: Option<String>,
}
