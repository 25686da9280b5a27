use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::dates::DateFilter;
use crate::money::Money;

/// Column names of the Fio banka statement export.
pub const COL_DATE: &str = "Datum";
pub const COL_AMOUNT: &str = "Objem";
pub const COL_ACCOUNT: &str = "Protiúčet";
pub const COL_BANK_CODE: &str = "Kód banky";
pub const COL_NOTE: &str = "Poznámka";
pub const COL_RECIPIENT_MESSAGE: &str = "Zpráva pro příjemce";
pub const COL_TYPE: &str = "Typ";
pub const COL_VS: &str = "VS";

const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("line {line}: malformed date {value:?}, expected DD.MM.YYYY")]
    MalformedDate { line: u64, value: String },
    #[error("line {line}: malformed amount {value:?}")]
    MalformedAmount { line: u64, value: String },
}

/// One statement row, normalized and validated. Immutable after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    date: NaiveDate,
    amount: Decimal,
    account_id: String,
    note: String,
    vs: String,
    line: u64,
}

impl Record {
    /// Builds a record from a column-name to raw-value mapping plus the
    /// source line number. Missing columns read as empty strings; only the
    /// date and amount columns can fail.
    pub fn from_fields(fields: &HashMap<&str, &str>, line: u64) -> Result<Record, RecordError> {
        let get = |name: &str| fields.get(name).copied().unwrap_or_default();

        let raw_date = get(COL_DATE);
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|_| {
            RecordError::MalformedDate {
                line,
                value: raw_date.to_string(),
            }
        })?;

        // Fio exports use a decimal comma.
        let raw_amount = get(COL_AMOUNT);
        let amount = raw_amount
            .replace(',', ".")
            .parse::<Decimal>()
            .map_err(|_| RecordError::MalformedAmount {
                line,
                value: raw_amount.to_string(),
            })?;

        let account_id = derive_account_id(get(COL_ACCOUNT), get(COL_BANK_CODE));
        let note = derive_note(
            &account_id,
            get(COL_NOTE),
            get(COL_RECIPIENT_MESSAGE),
            get(COL_TYPE),
        );

        Ok(Record {
            date,
            amount,
            account_id,
            note,
            vs: get(COL_VS).to_string(),
            line,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Signed amount as exported; negative for outgoing payments.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Absolute magnitude of the amount.
    pub fn money(&self) -> Money {
        Money::from_decimal(self.amount)
    }

    pub fn is_outgoing(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Counterparty as `"<account>/<bankCode>"`, or just the account number
    /// when the bank code is missing. May be empty.
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    /// Variable symbol (payment reference code). May be empty.
    pub fn vs(&self) -> &str {
        &self.vs
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn in_range(&self, filter: DateFilter) -> bool {
        filter.contains(self.date)
    }
}

fn derive_account_id(account: &str, bank_code: &str) -> String {
    if !account.is_empty() && !bank_code.is_empty() {
        format!("{account}/{bank_code}")
    } else {
        account.to_string()
    }
}

/// Picks the most descriptive free-text field for rule matching. A note
/// accompanying a known counterparty wins; otherwise the first non-empty of
/// account id, recipient message, note and transaction type.
fn derive_note(account_id: &str, note: &str, recipient_message: &str, tx_type: &str) -> String {
    if !account_id.is_empty() && !note.is_empty() {
        return note.to_string();
    }
    if recipient_message.is_empty() && !note.is_empty() {
        return note.to_string();
    }
    [account_id, recipient_message, note, tx_type]
        .into_iter()
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(pairs: &[(&'a str, &'a str)]) -> HashMap<&'a str, &'a str> {
        pairs.iter().copied().collect()
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        Record::from_fields(&fields(pairs), 2).unwrap()
    }

    #[test]
    fn parses_date_and_comma_amount() {
        let rec = record(&[(COL_DATE, "15.01.2024"), (COL_AMOUNT, "100,50")]);
        assert_eq!(rec.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(rec.money().to_string(), "100.50");
        assert!(!rec.is_outgoing());
    }

    #[test]
    fn negative_amount_is_outgoing_with_positive_magnitude() {
        let rec = record(&[(COL_DATE, "01.02.2024"), (COL_AMOUNT, "-1234,56")]);
        assert!(rec.is_outgoing());
        assert_eq!(rec.amount().to_string(), "-1234.56");
        assert_eq!(rec.money().to_string(), "1234.56");
    }

    #[test]
    fn malformed_date_carries_line_number() {
        let err = Record::from_fields(
            &fields(&[(COL_DATE, "2024-01-15"), (COL_AMOUNT, "1")]),
            7,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RecordError::MalformedDate {
                line: 7,
                value: "2024-01-15".to_string()
            }
        );
    }

    #[test]
    fn malformed_amount_carries_line_number() {
        let err = Record::from_fields(
            &fields(&[(COL_DATE, "15.01.2024"), (COL_AMOUNT, "abc")]),
            9,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RecordError::MalformedAmount {
                line: 9,
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn account_id_joins_account_and_bank_code() {
        let rec = record(&[
            (COL_DATE, "15.01.2024"),
            (COL_AMOUNT, "-1"),
            (COL_ACCOUNT, "123456789"),
            (COL_BANK_CODE, "0800"),
        ]);
        assert_eq!(rec.account_id(), "123456789/0800");
    }

    #[test]
    fn account_id_without_bank_code() {
        let rec = record(&[
            (COL_DATE, "15.01.2024"),
            (COL_AMOUNT, "-1"),
            (COL_ACCOUNT, "123456789"),
        ]);
        assert_eq!(rec.account_id(), "123456789");
    }

    #[test]
    fn note_prefers_note_with_known_counterparty() {
        let rec = record(&[
            (COL_DATE, "15.01.2024"),
            (COL_AMOUNT, "-1"),
            (COL_ACCOUNT, "123"),
            (COL_BANK_CODE, "0800"),
            (COL_NOTE, "groceries"),
            (COL_RECIPIENT_MESSAGE, "msg"),
        ]);
        assert_eq!(rec.note(), "groceries");
    }

    #[test]
    fn note_used_when_recipient_message_empty() {
        let rec = record(&[
            (COL_DATE, "15.01.2024"),
            (COL_AMOUNT, "-1"),
            (COL_NOTE, "card payment"),
        ]);
        assert_eq!(rec.note(), "card payment");
    }

    #[test]
    fn note_falls_back_in_priority_order() {
        // Recipient message set, note empty: account id wins over it.
        let rec = record(&[
            (COL_DATE, "15.01.2024"),
            (COL_AMOUNT, "-1"),
            (COL_ACCOUNT, "123"),
            (COL_RECIPIENT_MESSAGE, "for rent"),
        ]);
        assert_eq!(rec.note(), "123");

        let rec = record(&[
            (COL_DATE, "15.01.2024"),
            (COL_AMOUNT, "-1"),
            (COL_RECIPIENT_MESSAGE, "for rent"),
        ]);
        assert_eq!(rec.note(), "for rent");

        let rec = record(&[
            (COL_DATE, "15.01.2024"),
            (COL_AMOUNT, "-1"),
            (COL_TYPE, "Platba kartou"),
        ]);
        assert_eq!(rec.note(), "Platba kartou");
    }

    #[test]
    fn note_defaults_to_empty() {
        let rec = record(&[(COL_DATE, "15.01.2024"), (COL_AMOUNT, "-1")]);
        assert_eq!(rec.note(), "");
    }

    #[test]
    fn in_range_uses_filter() {
        let rec = record(&[(COL_DATE, "15.01.2024"), (COL_AMOUNT, "-1")]);
        let filter = DateFilter {
            from: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            to: Some(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
        };
        assert!(rec.in_range(filter));
        assert!(rec.in_range(DateFilter::default()));
        let after = DateFilter {
            from: Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            to: None,
        };
        assert!(!rec.in_range(after));
    }
}
