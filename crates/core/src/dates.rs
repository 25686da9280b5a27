use chrono::{Datelike, NaiveDate};

/// Optional inclusive `[from, to]` filter. An unset bound never rejects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateFilter {
    pub fn contains(self, date: NaiveDate) -> bool {
        if self.from.is_some_and(|d| date < d) {
            return false;
        }
        if self.to.is_some_and(|d| date > d) {
            return false;
        }
        true
    }
}

/// Min/max over all observed dates, widened one record at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateSpan {
    begin: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateSpan {
    pub fn observe(&mut self, date: NaiveDate) {
        if self.begin.map_or(true, |d| date < d) {
            self.begin = Some(date);
        }
        if self.end.map_or(true, |d| date > d) {
            self.end = Some(date);
        }
    }

    pub fn begin(self) -> Option<NaiveDate> {
        self.begin
    }

    pub fn end(self) -> Option<NaiveDate> {
        self.end
    }

    /// Inclusive count of calendar months spanned by begin and end, days
    /// ignored: 2024-01-15 to 2024-03-02 spans 3 months. Zero for an empty
    /// span. The month difference borrows a year when negative, so the
    /// intermediate never goes below zero.
    pub fn months_between(self) -> u32 {
        let (Some(begin), Some(end)) = (self.begin, self.end) else {
            return 0;
        };

        let mut years = end.year() - begin.year();
        let mut months = end.month() as i32 - begin.month() as i32;
        if months < 0 {
            months += 12;
            years -= 1;
        }

        (years * 12 + months + 1) as u32
    }
}
