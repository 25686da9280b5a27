use chrono::NaiveDate;
use outlay_core::{DateFilter, Record};
use outlay_import::ImportError;
use thiserror::Error;

use crate::aggregate::ReportData;
use crate::rules::Ruleset;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("unknown record: line {line}: {record}")]
    UnknownRecord { line: u64, record: String },
}

/// Drives one report: filters records, classifies them against the ruleset
/// and accumulates totals. Classification is strict: an outgoing record in
/// range that no rule matches aborts the whole report, so gaps in the
/// ruleset surface instead of silently skewing sums.
pub struct Report<'a> {
    ruleset: &'a Ruleset,
    filter: DateFilter,
    data: ReportData,
}

impl<'a> Report<'a> {
    pub fn new(ruleset: &'a Ruleset) -> Report<'a> {
        Report {
            ruleset,
            filter: DateFilter::default(),
            data: ReportData::default(),
        }
    }

    pub fn with_from_date(mut self, from: NaiveDate) -> Self {
        self.filter.from = Some(from);
        self
    }

    pub fn with_to_date(mut self, to: NaiveDate) -> Self {
        self.filter.to = Some(to);
        self
    }

    /// Consumes a record stream. Incoming payments and records outside the
    /// date filter are ignored; everything else must classify.
    pub fn scan<I>(&mut self, records: I) -> Result<(), ReportError>
    where
        I: IntoIterator<Item = Result<Record, ImportError>>,
    {
        let mut skipped: u64 = 0;
        for record in records {
            let record = record?;
            if !record.is_outgoing() || !record.in_range(self.filter) {
                skipped += 1;
                continue;
            }
            let Some((section, key)) = self.ruleset.find_section(&record) else {
                return Err(ReportError::UnknownRecord {
                    line: record.line(),
                    record: format!("{record:?}"),
                });
            };
            self.data.add(section, &key, &record);
        }
        self.data.finish();
        tracing::debug!(counted = self.data.count(), skipped, "scan finished");
        Ok(())
    }

    pub fn data(&self) -> &ReportData {
        &self.data
    }

    pub fn into_data(self) -> ReportData {
        self.data
    }
}
