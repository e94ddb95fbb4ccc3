//! ISO-8601 week identifiers.

use chrono::{Datelike, NaiveDate};

/// ISO week id for a date, formatted `YYYY-Www` (e.g. `2023-W01`).
///
/// Week 1 is the week containing the year's first Thursday and weeks run
/// Monday–Sunday, so the first days of January can belong to the final week
/// of the prior year (and late-December days to week 1 of the next). The
/// year component is therefore the ISO week-year, not the calendar year.
pub fn week_key(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
