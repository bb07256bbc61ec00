use crate::types::SurveyRecord;
use std::collections::BTreeSet;

/// Sentinel department value meaning "no department filter".
pub const DEPARTMENT_ALL: &str = "ALL";

/// Thai month abbreviations, used when listing months for selection.
pub const MONTH_LABELS: [&str; 12] = [
    "ม.ค.", "ก.พ.", "มี.ค.", "เม.ย.", "พ.ค.", "มิ.ย.", "ก.ค.", "ส.ค.", "ก.ย.", "ต.ค.",
    "พ.ย.", "ธ.ค.",
];

pub fn month_label(month: u32) -> &'static str {
    (month as usize)
        .checked_sub(1)
        .and_then(|i| MONTH_LABELS.get(i))
        .copied()
        .unwrap_or("?")
}

/// Temporal predicate of a selection. Quarter and month carry their year,
/// so a quarter/month filter without a year cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    All,
    Year(i32),
    Quarter { year: i32, quarter: u32 },
    Month { year: i32, month: u32 },
}

impl TimeFilter {
    pub fn matches(&self, r: &SurveyRecord) -> bool {
        match *self {
            TimeFilter::All => true,
            TimeFilter::Year(year) => r.year == year,
            TimeFilter::Quarter { year, quarter } => r.year == year && r.quarter == quarter,
            TimeFilter::Month { year, month } => r.year == year && r.month == month,
        }
    }

    pub fn label(&self) -> String {
        match *self {
            TimeFilter::All => "all".to_string(),
            TimeFilter::Year(year) => year.to_string(),
            TimeFilter::Quarter { year, quarter } => format!("{} Q{}", year, quarter),
            TimeFilter::Month { year, month } => format!("{} {}", year, month_label(month)),
        }
    }
}

/// One user selection: optional department equality plus a time predicate,
/// combined with AND semantics.
#[derive(Debug, Clone)]
pub struct Selection {
    pub department: Option<String>,
    pub time: TimeFilter,
}

impl Selection {
    pub fn new(department: &str, time: TimeFilter) -> Self {
        let department = if department == DEPARTMENT_ALL {
            None
        } else {
            Some(department.to_string())
        };
        Self { department, time }
    }

    pub fn matches(&self, r: &SurveyRecord) -> bool {
        let department_ok = match &self.department {
            None => true,
            Some(d) => r.department.as_deref() == Some(d.as_str()),
        };
        department_ok && self.time.matches(r)
    }

    /// Filtered view of the canonical dataset. The dataset itself is never
    /// mutated; an empty result is a valid outcome.
    pub fn apply(&self, data: &[SurveyRecord]) -> Vec<SurveyRecord> {
        data.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    pub fn department_label(&self) -> &str {
        self.department.as_deref().unwrap_or(DEPARTMENT_ALL)
    }
}

/// Distinct departments, sorted.
pub fn departments(data: &[SurveyRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = data.iter().filter_map(|r| r.department.as_deref()).collect();
    set.into_iter().map(str::to_string).collect()
}

/// Observed years, newest first.
pub fn years(data: &[SurveyRecord]) -> Vec<i32> {
    let set: BTreeSet<i32> = data.iter().map(|r| r.year).collect();
    set.into_iter().rev().collect()
}

/// Quarters observed within a year, ascending. The selection UI only offers
/// quarters that actually contain data.
pub fn quarters_in_year(data: &[SurveyRecord], year: i32) -> Vec<u32> {
    let set: BTreeSet<u32> = data
        .iter()
        .filter(|r| r.year == year)
        .map(|r| r.quarter)
        .collect();
    set.into_iter().collect()
}

/// Months observed within a year, ascending.
pub fn months_in_year(data: &[SurveyRecord], year: i32) -> Vec<u32> {
    let set: BTreeSet<u32> = data
        .iter()
        .filter(|r| r.year == year)
        .map(|r| r.month)
        .collect();
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{parse_timestamp_safe, quarter_of_month};
    use chrono::Datelike;

    fn rec(department: Option<&str>, timestamp: &str) -> SurveyRecord {
        let ts = parse_timestamp_safe(Some(timestamp)).unwrap();
        SurveyRecord {
            department: department.map(str::to_string),
            timestamp: ts,
            year: ts.year(),
            quarter: quarter_of_month(ts.month()),
            month: ts.month(),
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

    fn sample() -> Vec<SurveyRecord> {
        vec![
            rec(Some("อายุรกรรม"), "10/01/2024"),
            rec(Some("อายุรกรรม"), "15/05/2024"),
            rec(Some("ศัลยกรรม"), "20/05/2024"),
            rec(Some("ศัลยกรรม"), "01/02/2023"),
            rec(None, "03/03/2024"),
        ]
    }

    #[test]
    fn department_and_time_predicates_are_conjunctive() {
        let data = sample();
        let sel = Selection::new("อายุรกรรม", TimeFilter::Year(2024));
        let view = sel.apply(&data);
        assert_eq!(view.len(), 2);
        assert!(view.iter().all(|r| r.year == 2024));
    }

    #[test]
    fn filter_order_commutes() {
        let data = sample();
        let dept_only = Selection::new("ศัลยกรรม", TimeFilter::All);
        let year_only = Selection::new(DEPARTMENT_ALL, TimeFilter::Year(2023));

        let a = year_only.apply(&dept_only.apply(&data));
        let combined = Selection::new("ศัลยกรรม", TimeFilter::Year(2023));
        let b = combined.apply(&data);
        assert_eq!(a.len(), b.len());
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn all_sentinel_matches_everything() {
        let data = sample();
        let sel = Selection::new(DEPARTMENT_ALL, TimeFilter::All);
        assert_eq!(sel.apply(&data).len(), data.len());
        assert_eq!(sel.department_label(), DEPARTMENT_ALL);
    }

    #[test]
    fn quarter_and_month_require_matching_year() {
        let data = sample();
        let q2_2024 = Selection::new(
            DEPARTMENT_ALL,
            TimeFilter::Quarter { year: 2024, quarter: 2 },
        );
        assert_eq!(q2_2024.apply(&data).len(), 2);

        let feb_2023 = Selection::new(DEPARTMENT_ALL, TimeFilter::Month { year: 2023, month: 2 });
        assert_eq!(feb_2023.apply(&data).len(), 1);

        let feb_2024 = Selection::new(DEPARTMENT_ALL, TimeFilter::Month { year: 2024, month: 2 });
        assert!(feb_2024.apply(&data).is_empty());
    }

    #[test]
    fn empty_view_is_a_valid_outcome() {
        let data = sample();
        let sel = Selection::new("ไม่มีหน่วยงานนี้", TimeFilter::All);
        assert!(sel.apply(&data).is_empty());
    }

    #[test]
    fn observed_value_enumerations() {
        let data = sample();
        assert_eq!(departments(&data), vec!["ศัลยกรรม", "อายุรกรรม"]);
        assert_eq!(years(&data), vec![2024, 2023]);
        assert_eq!(quarters_in_year(&data, 2024), vec![1, 2]);
        assert_eq!(months_in_year(&data, 2024), vec![1, 3, 5]);
        assert_eq!(months_in_year(&data, 2023), vec![2]);
    }

    #[test]
    fn month_labels_are_thai_abbreviations() {
        assert_eq!(month_label(1), "ม.ค.");
        assert_eq!(month_label(12), "ธ.ค.");
        assert_eq!(month_label(0), "?");
    }
}
