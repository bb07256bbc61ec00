// Aggregate metrics over a filtered view.
//
// Every function here is a pure function of the view it receives and
// returns an explicit "no data" value (`None` or an empty list) instead of
// 0/NaN when the view has nothing to aggregate.
use crate::likert::LikertScale;
use crate::types::{
    DashboardSummary, DepartmentCountRow, FreeTextEntry, QuestionScoreRow, SurveyRecord,
};
use crate::util::{average, format_number, round1};
use std::collections::HashMap;

/// Affirmative answer for the will-return / will-recommend questions.
pub const YES: &str = "ใช่";
/// Affirmative answer for the has-dissatisfaction question.
pub const HAS_ISSUE: &str = "มี";
/// "Nothing to report" marker used in free-text answers.
pub const NONE_SENTINEL: &str = "ไม่มี";

/// Display titles for q1..q10, in question order.
pub const QUESTION_TITLES: [&str; 10] = [
    "1. ความสะดวกในการติดต่อและเข้ารับบริการ",
    "2. การรับฟังและเปิดโอกาสให้ซักถาม",
    "3. ความชัดเจนของข้อมูลขั้นตอนบริการ",
    "4. การดูแลอย่างเท่าเทียมและให้เกียรติ",
    "5. ความสะอาดและสิ่งอำนวยความสะดวก",
    "6. การตอบสนองเมื่อต้องการความช่วยเหลือ",
    "7. ความชัดเจนของข้อมูลค่าใช้จ่าย",
    "8. การได้รับข้อมูลการรักษาและอาการแทรกซ้อน",
    "9. การมีส่วนร่วมในการวางแผนการรักษา",
    "10. ความชัดเจนของข้อมูลด้านยา",
];

/// Counts and percentages per score bucket 1..=5. Buckets with no
/// observations stay zero; percentages are over the defined values only.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDistribution {
    pub counts: [usize; 5],
    pub percentages: [f64; 5],
    /// Number of values that Likert-normalized successfully.
    pub total: usize,
}

/// Mean of the Likert-normalized values of `field`, ignoring undefined
/// values. `None` when the view holds no defined value.
pub fn mean_score<'a, F>(view: &'a [SurveyRecord], scale: &LikertScale, field: F) -> Option<f64>
where
    F: Fn(&'a SurveyRecord) -> Option<&'a str>,
{
    let scores: Vec<f64> = view
        .iter()
        .filter_map(|r| field(r))
        .filter_map(|v| scale.normalize(v))
        .map(f64::from)
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(average(&scores))
    }
}

/// Share (0-100) of non-missing values of `field` that equal one of
/// `positives`. The denominator excludes missing values only; a present
/// non-positive answer still counts against the percentage.
pub fn percentage_positive<'a, F>(
    view: &'a [SurveyRecord],
    field: F,
    positives: &[&str],
) -> Option<f64>
where
    F: Fn(&'a SurveyRecord) -> Option<&'a str>,
{
    let mut present = 0usize;
    let mut positive = 0usize;
    for r in view {
        if let Some(v) = field(r) {
            present += 1;
            if positives.contains(&v) {
                positive += 1;
            }
        }
    }
    if present == 0 {
        None
    } else {
        Some(positive as f64 / present as f64 * 100.0)
    }
}

/// Most frequent non-missing value of `field`. Ties break on the
/// lexicographically smallest value so the result does not depend on map
/// iteration order.
pub fn mode<'a, F>(view: &'a [SurveyRecord], field: F) -> Option<String>
where
    F: Fn(&'a SurveyRecord) -> Option<&'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in view {
        if let Some(v) = field(r) {
            *counts.entry(v).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(v, _)| v.to_string())
}

/// Score distribution of `field` over the view, or `None` when no value
/// normalizes.
pub fn distribution<'a, F>(
    view: &'a [SurveyRecord],
    scale: &LikertScale,
    field: F,
) -> Option<ScoreDistribution>
where
    F: Fn(&'a SurveyRecord) -> Option<&'a str>,
{
    let mut counts = [0usize; 5];
    for r in view {
        if let Some(score) = field(r).and_then(|v| scale.normalize(v)) {
            counts[(score - 1) as usize] += 1;
        }
    }
    let total: usize = counts.iter().sum();
    if total == 0 {
        return None;
    }
    let mut percentages = [0.0f64; 5];
    for (i, c) in counts.iter().enumerate() {
        percentages[i] = round1(*c as f64 / total as f64 * 100.0);
    }
    Some(ScoreDistribution {
        counts,
        percentages,
        total,
    })
}

/// Non-missing, non-blank, non-sentinel free-text answers with the
/// responder's department.
pub fn free_text_entries<'a, F>(
    view: &'a [SurveyRecord],
    field: F,
    sentinels: &[&str],
) -> Vec<FreeTextEntry>
where
    F: Fn(&'a SurveyRecord) -> Option<&'a str>,
{
    view.iter()
        .filter_map(|r| {
            let text = field(r)?.trim();
            if text.is_empty() || sentinels.contains(&text) {
                return None;
            }
            Some(FreeTextEntry {
                department: r.department.clone(),
                text: text.to_string(),
            })
        })
        .collect()
}

/// Response counts per department, most active first; department name
/// breaks count ties.
pub fn department_counts(view: &[SurveyRecord]) -> Vec<DepartmentCountRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in view {
        if let Some(d) = r.department.as_deref() {
            *counts.entry(d).or_insert(0) += 1;
        }
    }
    let mut rows: Vec<DepartmentCountRow> = counts
        .into_iter()
        .map(|(department, responses)| DepartmentCountRow {
            department: department.to_string(),
            responses,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.responses
            .cmp(&a.responses)
            .then_with(|| a.department.cmp(&b.department))
    });
    rows
}

/// One table row per satisfaction question: defined-answer count, mean and
/// the per-score breakdown.
pub fn question_score_rows(view: &[SurveyRecord], scale: &LikertScale) -> Vec<QuestionScoreRow> {
    QUESTION_TITLES
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let mean = mean_score(view, scale, |r| r.question(i));
            let mean_text = mean
                .map(|m| format_number(m, 2))
                .unwrap_or_else(|| "N/A".to_string());
            match distribution(view, scale, |r| r.question(i)) {
                Some(d) => {
                    let cell = |b: usize| format!("{} ({:.1}%)", d.counts[b], d.percentages[b]);
                    QuestionScoreRow {
                        question: title.to_string(),
                        responses: d.total,
                        mean: mean_text,
                        s1: cell(0),
                        s2: cell(1),
                        s3: cell(2),
                        s4: cell(3),
                        s5: cell(4),
                    }
                }
                None => QuestionScoreRow {
                    question: title.to_string(),
                    responses: 0,
                    mean: mean_text,
                    s1: "-".to_string(),
                    s2: "-".to_string(),
                    s3: "-".to_string(),
                    s4: "-".to_string(),
                    s5: "-".to_string(),
                },
            }
        })
        .collect()
}

/// Assemble the overview metrics for one filtered view.
pub fn build_summary(
    view: &[SurveyRecord],
    scale: &LikertScale,
    department_label: &str,
    period_label: &str,
) -> DashboardSummary {
    let satisfaction_scores: Vec<f64> = view
        .iter()
        .filter_map(|r| r.satisfaction_score(scale))
        .map(f64::from)
        .collect();
    let avg_satisfaction = if satisfaction_scores.is_empty() {
        None
    } else {
        Some(average(&satisfaction_scores))
    };

    DashboardSummary {
        department: department_label.to_string(),
        period: period_label.to_string(),
        total_responses: view.len(),
        avg_satisfaction,
        pct_will_return: percentage_positive(view, |r| r.will_return.as_deref(), &[YES]),
        pct_will_recommend: percentage_positive(view, |r| r.will_recommend.as_deref(), &[YES]),
        pct_dissatisfied: percentage_positive(
            view,
            |r| r.has_dissatisfaction.as_deref(),
            &[HAS_ISSUE],
        ),
        most_common_health_status: mode(view, |r| r.health_status.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::parse_timestamp_safe;
    use chrono::Datelike;

    fn rec() -> SurveyRecord {
        let ts = parse_timestamp_safe(Some("10/06/2024 12:00:00")).unwrap();
        SurveyRecord {
            department: Some("อายุรกรรม".to_string()),
            timestamp: ts,
            year: ts.year(),
            quarter: 2,
            month: 6,
            overall_satisfaction: None,
            health_status: None,
            questions: Default::default(),
            will_return: None,
            will_recommend: None,
            has_dissatisfaction: None,
            dissatisfaction_detail: None,
            expectation: None,
        }
    }

    fn with_q1(value: Option<&str>) -> SurveyRecord {
        let mut r = rec();
        r.questions[0] = value.map(str::to_string);
        r
    }

    #[test]
    fn mean_ignores_undefined_values() {
        let scale = LikertScale::default();
        let view: Vec<SurveyRecord> = [Some("มากที่สุด"), Some("มาก"), None, Some("ปานกลาง")]
            .into_iter()
            .map(with_q1)
            .collect();
        let mean = mean_score(&view, &scale, |r| r.question(0)).unwrap();
        assert!((mean - 4.0).abs() < 1e-9);
    }

    #[test]
    fn mean_of_empty_or_all_undefined_is_none() {
        let scale = LikertScale::default();
        assert_eq!(mean_score(&[], &scale, |r| r.question(0)), None);
        let view = vec![with_q1(None), with_q1(Some("xyz"))];
        assert_eq!(mean_score(&view, &scale, |r| r.question(0)), None);
    }

    #[test]
    fn percentage_excludes_missing_from_denominator_only() {
        let mut a = rec();
        a.will_return = Some(YES.to_string());
        let mut b = rec();
        b.will_return = Some("ไม่ใช่".to_string());
        let mut c = rec();
        c.will_return = Some(YES.to_string());
        let d = rec(); // missing answer
        let view = vec![a, b, c, d];

        let pct = percentage_positive(&view, |r| r.will_return.as_deref(), &[YES]).unwrap();
        // 2 of 3 present answers, not 2 of 4 rows.
        assert!((pct - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn percentage_of_all_missing_is_none() {
        let view = vec![rec(), rec()];
        assert_eq!(
            percentage_positive(&view, |r| r.will_return.as_deref(), &[YES]),
            None
        );
    }

    #[test]
    fn mode_breaks_ties_lexicographically() {
        let mut a = rec();
        a.health_status = Some("ดี".to_string());
        let mut b = rec();
        b.health_status = Some("แย่".to_string());
        let view = vec![a.clone(), b.clone(), a.clone(), b.clone()];
        // Both appear twice; the smaller string wins deterministically.
        assert_eq!(mode(&view, |r| r.health_status.as_deref()), Some("ดี".to_string()));

        let view = vec![a, b.clone(), b];
        assert_eq!(mode(&view, |r| r.health_status.as_deref()), Some("แย่".to_string()));
    }

    #[test]
    fn mode_of_no_values_is_none() {
        assert_eq!(mode(&[rec()], |r| r.health_status.as_deref()), None);
    }

    #[test]
    fn distribution_zero_fills_buckets_and_uses_defined_denominator() {
        let scale = LikertScale::default();
        let view: Vec<SurveyRecord> = [
            Some("น้อยมาก"),
            Some("น้อยมาก"),
            Some("ปานกลาง"),
            Some("มากที่สุด"),
            Some("มากที่สุด"),
            Some("มากที่สุด"),
            None,
            Some("xyz"),
        ]
        .into_iter()
        .map(with_q1)
        .collect();

        let d = distribution(&view, &scale, |r| r.question(0)).unwrap();
        assert_eq!(d.counts, [2, 0, 1, 0, 3]);
        assert_eq!(d.total, 6);
        assert_eq!(d.percentages[0], 33.3);
        assert_eq!(d.percentages[1], 0.0);
        assert_eq!(d.percentages[2], 16.7);
        assert_eq!(d.percentages[4], 50.0);
    }

    #[test]
    fn distribution_of_nothing_is_none() {
        let scale = LikertScale::default();
        assert_eq!(distribution(&[], &scale, |r| r.question(0)), None);
        let view = vec![with_q1(None)];
        assert_eq!(distribution(&view, &scale, |r| r.question(0)), None);
    }

    #[test]
    fn free_text_skips_blank_and_sentinel_answers() {
        let mut a = rec();
        a.dissatisfaction_detail = Some("รอนานมาก".to_string());
        let mut b = rec();
        b.dissatisfaction_detail = Some(NONE_SENTINEL.to_string());
        let c = rec();
        let view = vec![a, b, c];

        let entries = free_text_entries(
            &view,
            |r| r.dissatisfaction_detail.as_deref(),
            &[NONE_SENTINEL],
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "รอนานมาก");
        assert_eq!(entries[0].department.as_deref(), Some("อายุรกรรม"));
    }

    #[test]
    fn department_counts_sort_by_count_then_name() {
        let mut a = rec();
        a.department = Some("ก".to_string());
        let mut b = rec();
        b.department = Some("ข".to_string());
        let view = vec![a.clone(), a, b.clone(), b.clone(), b];

        let rows = department_counts(&view);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].department, "ข");
        assert_eq!(rows[0].responses, 3);
        assert_eq!(rows[1].department, "ก");
        assert_eq!(rows[1].responses, 2);
    }

    #[test]
    fn empty_view_yields_no_data_everywhere() {
        let scale = LikertScale::default();
        let view: Vec<SurveyRecord> = Vec::new();
        let summary = build_summary(&view, &scale, "ALL", "all");
        assert_eq!(summary.total_responses, 0);
        assert_eq!(summary.avg_satisfaction, None);
        assert_eq!(summary.pct_will_return, None);
        assert_eq!(summary.pct_will_recommend, None);
        assert_eq!(summary.pct_dissatisfied, None);
        assert_eq!(summary.most_common_health_status, None);

        for row in question_score_rows(&view, &scale) {
            assert_eq!(row.responses, 0);
            assert_eq!(row.mean, "N/A");
        }
        assert!(free_text_entries(&view, |r| r.expectation.as_deref(), &[]).is_empty());
        assert!(department_counts(&view).is_empty());
    }

    #[test]
    fn summary_uses_exact_category_map_for_overall_score() {
        let scale = LikertScale::default();
        let mut a = rec();
        a.overall_satisfaction = Some("มากที่สุด".to_string());
        let mut b = rec();
        b.overall_satisfaction = Some("มาก".to_string());
        let mut c = rec();
        // Unrecognized category stays out of the average entirely.
        c.overall_satisfaction = Some("เฉยๆ".to_string());
        let view = vec![a, b, c];

        let summary = build_summary(&view, &scale, "ALL", "all");
        assert!((summary.avg_satisfaction.unwrap() - 4.5).abs() < 1e-9);
    }
}
