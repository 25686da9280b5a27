use std::collections::HashMap;

use chrono::NaiveDate;
use outlay_core::{DateSpan, Money, Record};

use crate::rules::Section;

/// Accumulated totals for one classification key within a section.
#[derive(Debug, Clone)]
pub struct ItemTotals {
    name: String,
    money: Money,
    count: u64,
    months: u32,
    skip_from_sum: bool,
}

impl ItemTotals {
    fn new(name: &str, skip_from_sum: bool) -> ItemTotals {
        ItemTotals {
            name: name.to_string(),
            money: Money::zero(),
            count: 0,
            months: 0,
            skip_from_sum,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn money(&self) -> Money {
        self.money
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn per_month(&self) -> Option<Money> {
        per_month(self.skip_from_sum, self.count, self.months, self.money)
    }
}

/// Accumulated totals for one section, with per-key breakdown.
#[derive(Debug, Clone)]
pub struct SectionTotals {
    name: String,
    order: i32,
    skip_from_sum: bool,
    skip_per_month: bool,
    money: Money,
    count: u64,
    months: u32,
    items: HashMap<String, ItemTotals>,
}

impl SectionTotals {
    fn new(section: &Section) -> SectionTotals {
        SectionTotals {
            name: section.name.clone(),
            order: section.order,
            skip_from_sum: section.skip_from_sum,
            skip_per_month: section.skip_per_month,
            money: Money::zero(),
            count: 0,
            months: 0,
            items: HashMap::new(),
        }
    }

    fn add(&mut self, key: &str, money: Money) {
        self.count += 1;
        self.money += money;
        let item = self
            .items
            .entry(key.to_string())
            .or_insert_with(|| ItemTotals::new(key, self.skip_from_sum));
        item.count += 1;
        item.money += money;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn money(&self) -> Money {
        self.money
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn skip_per_month(&self) -> bool {
        self.skip_per_month
    }

    pub fn per_month(&self) -> Option<Money> {
        per_month(self.skip_from_sum, self.count, self.months, self.money)
    }

    /// Items ordered by total descending.
    pub fn sorted_items(&self) -> Vec<&ItemTotals> {
        let mut items: Vec<_> = self.items.values().collect();
        items.sort_by(|a, b| b.money.cmp(&a.money));
        items
    }
}

/// The report aggregate: grand totals, the observed date span, and one
/// [`SectionTotals`] per matched section. Sections marked skip-from-sum
/// still widen the span and keep their own totals; they only stay out of
/// the grand total.
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    span: DateSpan,
    months: u32,
    money: Money,
    count: u64,
    sections: HashMap<String, SectionTotals>,
}

impl ReportData {
    pub(crate) fn add(&mut self, section: &Section, key: &str, rec: &Record) {
        self.span.observe(rec.date());

        let money = rec.money();
        if !section.skip_from_sum {
            self.count += 1;
            self.money += money;
        }

        self.sections
            .entry(section.name.clone())
            .or_insert_with(|| SectionTotals::new(section))
            .add(key, money);
    }

    /// Freezes the span into a month count and stamps it into every node,
    /// so per-month averages need no back-reference to the report.
    pub(crate) fn finish(&mut self) {
        self.months = self.span.months_between();
        for section in self.sections.values_mut() {
            section.months = self.months;
            for item in section.items.values_mut() {
                item.months = self.months;
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn money(&self) -> Money {
        self.money
    }

    pub fn months_between(&self) -> u32 {
        self.months
    }

    pub fn begin(&self) -> Option<NaiveDate> {
        self.span.begin()
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.span.end()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn per_month(&self) -> Option<Money> {
        per_month(false, self.count, self.months, self.money)
    }

    /// Sections ordered by configured order, ties broken by total
    /// descending.
    pub fn sorted_sections(&self) -> Vec<&SectionTotals> {
        let mut sections: Vec<_> = self.sections.values().collect();
        sections.sort_by(|a, b| a.order.cmp(&b.order).then(b.money.cmp(&a.money)));
        sections
    }

    pub fn section(&self, name: &str) -> Option<&SectionTotals> {
        self.sections.get(name)
    }
}

/// The average only exists for recurring spending: at least two payments
/// over at least two months, and never for skip-from-sum sections.
fn per_month(skip_from_sum: bool, count: u64, months: u32, money: Money) -> Option<Money> {
    if skip_from_sum || count < 2 || months < 2 {
        return None;
    }
    Some(money.per_month(months))
}
