//! Average several years of history into a calendar of typical days, then lay
//! that calendar onto a target month.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use jiff::civil::Date;
use log::warn;
use rust_decimal::Decimal;

use super::reshape::{
    check_wide_header, format_slot_values, parse_field, parse_slot_values, unpivot_all,
    wide_header, DayProfile, ReshapeError,
};
use crate::interval::month::Month;
use crate::interval::slot::SLOTS_PER_DAY;
use crate::timeseries::timeseries::TimeSeries;

pub const KEY_COLUMNS: [&str; 3] = ["Month", "Day", "Years"];

/// The average profile of one calendar day over the history.
#[derive(Clone, Debug, PartialEq)]
pub struct CalendarProfile {
    pub month: i8,
    pub day: i8,
    /// Number of history days that went into the average.
    pub years: usize,
    pub values: Vec<Option<Decimal>>,
}

fn mean(xs: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    let (sum, n) = xs.fold((Decimal::ZERO, 0u32), |(s, n), x| (s + x, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / Decimal::from(n))
    }
}

/// Group the history by (month, day) and average each slot over the
/// non-missing values.  Output is sorted by (month, day).
pub fn average_by_calendar_day(history: &[DayProfile]) -> Vec<CalendarProfile> {
    let mut groups: BTreeMap<(i8, i8), Vec<&DayProfile>> = BTreeMap::new();
    for profile in history {
        groups
            .entry((profile.date.month(), profile.date.day()))
            .or_default()
            .push(profile);
    }

    groups
        .into_iter()
        .map(|((month, day), days)| CalendarProfile {
            month,
            day,
            years: days.len(),
            values: (0..SLOTS_PER_DAY)
                .map(|i| mean(days.iter().filter_map(|d| d.values.get(i).copied().flatten())))
                .collect(),
        })
        .collect()
}

/// Lay the calendar days of `month` onto its year.  A calendar day that
/// doesn't exist in the target year (29 Feb) is skipped.
pub fn project(
    calendar: &[CalendarProfile],
    month: &Month,
) -> Result<TimeSeries<Decimal>, ReshapeError> {
    let mut days = Vec::new();
    for row in calendar.iter().filter(|r| r.month == month.month()) {
        match Date::new(month.year(), row.month, row.day) {
            Ok(date) => days.push(DayProfile {
                date,
                values: row.values.clone(),
            }),
            Err(_) => warn!(
                "Skipping projected day {:02}-{:02}, it doesn't exist in {}",
                row.month,
                row.day,
                month.year()
            ),
        }
    }
    unpivot_all(&days)
}

pub fn write_csv<W: Write>(wtr: W, calendar: &[CalendarProfile]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(wtr);
    wtr.write_record(wide_header(&KEY_COLUMNS))?;
    for row in calendar {
        let mut record = vec![
            row.month.to_string(),
            row.day.to_string(),
            row.years.to_string(),
        ];
        record.extend(format_slot_values(&row.values));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_csv<R: Read>(rdr: R) -> Result<Vec<CalendarProfile>, ReshapeError> {
    let mut rdr = csv::Reader::from_reader(rdr);
    check_wide_header(rdr.headers()?, &KEY_COLUMNS)?;
    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record?;
        out.push(CalendarProfile {
            month: parse_field(&record, 0, "Month")?,
            day: parse_field(&record, 1, "Day")?,
            years: parse_field(&record, 2, "Years")?,
            values: parse_slot_values(&record, KEY_COLUMNS.len())?,
        });
    }
    Ok(out)
}
