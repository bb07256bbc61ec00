// Ordinal response normalization.
//
// Survey answers arrive as clean category labels, free-typed digits, or
// labels buried inside longer annotations. Everything funnels through
// `LikertScale::normalize`, which either yields a score in 1..=5 or `None`.
use std::collections::HashMap;

/// The five ordinal categories, ascending. Display code must keep this
/// order.
pub const CATEGORY_ORDER: [&str; 5] = ["น้อยมาก", "น้อย", "ปานกลาง", "มาก", "มากที่สุด"];

/// Fixed five-point ordinal scale with fallback matching for dirty cells.
#[derive(Debug, Clone)]
pub struct LikertScale {
    scores: HashMap<String, u8>,
    /// Labels longest-first for the substring fallback: "น้อยมาก" and
    /// "มากที่สุด" must win over their substrings "น้อย"/"มาก".
    by_length: Vec<(String, u8)>,
}

impl Default for LikertScale {
    fn default() -> Self {
        Self::new()
    }
}

impl LikertScale {
    pub fn new() -> Self {
        let mut scores = HashMap::new();
        for (i, label) in CATEGORY_ORDER.iter().enumerate() {
            scores.insert((*label).to_string(), (i + 1) as u8);
        }
        let mut by_length: Vec<(String, u8)> =
            scores.iter().map(|(k, v)| (k.clone(), *v)).collect();
        by_length.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.cmp(&b.0))
        });
        Self { scores, by_length }
    }

    /// Exact lookup of a category label, tolerating surrounding whitespace.
    pub fn score(&self, label: &str) -> Option<u8> {
        self.scores.get(label.trim()).copied()
    }

    /// Convert one cell to a score in 1..=5, or `None`.
    ///
    /// Precedence: exact label match, then the first digit character in
    /// 1..=5, then label-as-substring. Exact match must win so that a value
    /// which is itself a clean label is never re-interpreted through the
    /// fuzzier rules.
    pub fn normalize(&self, value: &str) -> Option<u8> {
        let v = value.trim();
        if v.is_empty() {
            return None;
        }
        if let Some(score) = self.scores.get(v) {
            return Some(*score);
        }
        for c in v.chars() {
            if let Some(d) = c.to_digit(10) {
                if (1..=5).contains(&d) {
                    return Some(d as u8);
                }
            }
        }
        for (label, score) in &self.by_length {
            if v.contains(label.as_str()) {
                return Some(*score);
            }
        }
        None
    }
}
