use crate::columns::{self, ColumnMap};
use crate::types::{LoadReport, SurveyRecord};
use crate::util::{parse_timestamp_safe, quarter_of_month};
use anyhow::{Context, Result};
use chrono::Datelike;
use csv::ReaderBuilder;
use log::{debug, warn};
use std::collections::HashMap;

/// Parse raw survey CSV text into canonical records.
///
/// The header row is resolved through the column map once; rows are then
/// read positionally. Rows without a parseable timestamp are dropped and
/// counted, per-field problems just leave the field `None`.
pub fn load_records(
    csv_text: &str,
    columns: &ColumnMap,
) -> Result<(Vec<SurveyRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers = rdr.headers().context("reading CSV header row")?.clone();
    // Canonical name -> column index. First occurrence wins if a source
    // file repeats a header.
    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, header) in headers.iter().enumerate() {
        index.entry(columns.canonical(header)).or_insert(i);
    }
    debug!("resolved {} columns from header row", index.len());

    let mut report = LoadReport::default();
    let mut records: Vec<SurveyRecord> = Vec::new();

    for (line, row) in rdr.records().enumerate() {
        report.total_rows += 1;
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                // +2: 1-indexed plus the header row.
                warn!("skipping line {}: {}", line + 2, e);
                report.read_errors += 1;
                continue;
            }
        };

        let field = |name: &str| -> Option<String> {
            index
                .get(name)
                .and_then(|&i| row.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let timestamp = match parse_timestamp_safe(field(columns::TIMESTAMP).as_deref()) {
            Some(ts) => ts,
            None => {
                debug!("dropping line {}: no parseable timestamp", line + 2);
                report.dropped_no_timestamp += 1;
                continue;
            }
        };
        let month = timestamp.month();

        let questions: [Option<String>; 10] =
            std::array::from_fn(|i| field(columns::QUESTIONS[i]));

        records.push(SurveyRecord {
            department: field(columns::DEPARTMENT),
            timestamp,
            year: timestamp.year(),
            quarter: quarter_of_month(month),
            month,
            overall_satisfaction: field(columns::OVERALL_SATISFACTION),
            health_status: field(columns::HEALTH_STATUS),
            questions,
            will_return: field(columns::WILL_RETURN),
            will_recommend: field(columns::WILL_RECOMMEND),
            has_dissatisfaction: field(columns::HAS_DISSATISFACTION),
            dissatisfaction_detail: field(columns::DISSATISFACTION_DETAIL),
            expectation: field(columns::EXPECTATION),
        });
    }

    report.loaded_rows = records.len();
    Ok((records, report))
}
