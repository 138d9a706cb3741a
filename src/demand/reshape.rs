//! Conversions between wide day tables (one row per day, one column per
//! half-hour slot) and long period-beginning time series.

use std::collections::BTreeMap;
use std::str::FromStr;

use csv::StringRecord;
use itertools::Itertools;
use jiff::civil::{Date, DateTime};
use log::warn;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::aemo::price_and_demand_archive::Row;
use crate::interval::month::Month;
use crate::interval::slot::{to_period_beginning, PeriodLabel, Slot, SLOTS_PER_DAY, SLOT_MINUTES};
use crate::timeseries::timeseries::{Observation, OrderError, TimeSeries};

#[derive(Error, Debug)]
pub enum ReshapeError {
    #[error("expected columns {expected} followed by {SLOTS_PER_DAY} slot columns, got {got:?}")]
    Header { expected: String, got: Vec<String> },
    #[error("line {line}: invalid {column} value '{value}'")]
    Value {
        line: u64,
        column: String,
        value: String,
    },
    #[error("day {0} appears more than once")]
    DuplicateDay(Date),
    #[error("interval of {0} minutes does not divide a {SLOT_MINUTES} minute slot")]
    Interval(i64),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Order(#[from] OrderError),
}

/// One day of half-hourly values, indexed by 0-based slot.
#[derive(Clone, Debug, PartialEq)]
pub struct DayProfile {
    pub date: Date,
    pub values: Vec<Option<Decimal>>,
}

impl DayProfile {
    pub fn empty(date: Date) -> DayProfile {
        DayProfile {
            date,
            values: vec![None; SLOTS_PER_DAY],
        }
    }
}

/// Spread one day into observations at the beginning of each slot.
/// Missing slots are left out.
pub fn unpivot(profile: &DayProfile) -> Vec<Observation<Decimal>> {
    Slot::all()
        .filter_map(|slot| {
            profile
                .values
                .get(slot.index())
                .copied()
                .flatten()
                .map(|value| Observation {
                    start: slot.start_on(profile.date),
                    value,
                })
        })
        .collect()
}

pub fn unpivot_all(profiles: &[DayProfile]) -> Result<TimeSeries<Decimal>, ReshapeError> {
    let mut sorted: Vec<&DayProfile> = profiles.iter().collect();
    sorted.sort_by_key(|p| p.date);
    if let Some((a, _)) = sorted.iter().tuple_windows().find(|(a, b)| a.date == b.date) {
        return Err(ReshapeError::DuplicateDay(a.date));
    }
    let mut ts = TimeSeries::new();
    for profile in sorted {
        for obs in unpivot(profile) {
            ts.push(obs)?;
        }
    }
    Ok(ts)
}

/// Inverse of [`unpivot_all`].  Days without any observation are not emitted.
pub fn pivot(series: &TimeSeries<Decimal>) -> Vec<DayProfile> {
    let mut out = Vec::new();
    for (date, group) in &series.iter().chunk_by(|e| e.start.date()) {
        let mut profile = DayProfile::empty(date);
        for obs in group {
            profile.values[Slot::containing(obs.start).index()] = Some(obs.value);
        }
        out.push(profile);
    }
    out
}

/// Build the period-beginning series of the actuals inside `month`.
///
/// AEMO labels each row with the end of its dispatch interval.  The interval
/// length is the smallest gap between consecutive settlement dates, 30 minutes
/// for the historical files and 5 minutes since five-minute settlement.
/// Intervals shorter than a slot are averaged into their slot.
pub fn actual_series(rows: &[Row], month: &Month) -> Result<TimeSeries<Decimal>, ReshapeError> {
    let mut ends: Vec<(DateTime, Decimal)> = rows
        .iter()
        .map(|r| (r.settlement_date, r.total_demand))
        .collect();
    ends.sort_by_key(|e| e.0);
    let n = ends.len();
    ends.dedup_by_key(|e| e.0);
    if ends.len() < n {
        warn!(
            "Dropped {} rows with a duplicated settlement date",
            n - ends.len()
        );
    }

    let interval = interval_minutes(&ends);
    if interval <= 0 || SLOT_MINUTES % interval != 0 {
        return Err(ReshapeError::Interval(interval));
    }

    let mut slots: BTreeMap<DateTime, Vec<Decimal>> = BTreeMap::new();
    for (end, value) in ends {
        let begin = to_period_beginning(end, PeriodLabel::Ending, interval);
        if !month.contains(begin) {
            continue;
        }
        let start = Slot::containing(begin).start_on(begin.date());
        slots.entry(start).or_default().push(value);
    }

    let mut ts = TimeSeries::new();
    for (start, values) in slots {
        let n = Decimal::from(values.len());
        let value = values.into_iter().sum::<Decimal>() / n;
        ts.push(Observation { start, value })?;
    }
    Ok(ts)
}

fn interval_minutes(ends: &[(DateTime, Decimal)]) -> i64 {
    ends.iter()
        .tuple_windows()
        .map(|(a, b)| a.0.duration_until(b.0).as_secs() / 60)
        .filter(|m| *m > 0)
        .min()
        .unwrap_or(SLOT_MINUTES)
}

/// Header of a wide table: the key columns followed by the 1-based period numbers.
pub fn wide_header(keys: &[&str]) -> Vec<String> {
    keys.iter()
        .map(|k| k.to_string())
        .chain(Slot::all().map(|s| s.period_number().to_string()))
        .collect()
}

/// Check that a header starts with `keys` (case-insensitive) and has exactly
/// one column per slot after them.
pub fn check_wide_header(headers: &StringRecord, keys: &[&str]) -> Result<(), ReshapeError> {
    let ok = headers.len() == keys.len() + SLOTS_PER_DAY
        && keys
            .iter()
            .zip(headers.iter())
            .all(|(k, h)| k.eq_ignore_ascii_case(h.trim()));
    if ok {
        Ok(())
    } else {
        Err(ReshapeError::Header {
            expected: keys.join(","),
            got: headers.iter().map(|h| h.to_string()).collect(),
        })
    }
}

pub fn parse_field<T: FromStr>(
    record: &StringRecord,
    index: usize,
    column: &str,
) -> Result<T, ReshapeError> {
    let value = record.get(index).unwrap_or("").trim();
    value.parse().map_err(|_| ReshapeError::Value {
        line: record.position().map(|p| p.line()).unwrap_or(0),
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Read the slot cells that follow the first `offset` key columns.  Empty
/// cells are missing values.
pub fn parse_slot_values(
    record: &StringRecord,
    offset: usize,
) -> Result<Vec<Option<Decimal>>, ReshapeError> {
    Slot::all()
        .map(|slot| {
            let cell = record.get(offset + slot.index()).unwrap_or("").trim();
            if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
                Ok(None)
            } else {
                parse_field(record, offset + slot.index(), &slot.period_number().to_string())
                    .map(Some)
            }
        })
        .collect()
}

pub fn format_slot_values(values: &[Option<Decimal>]) -> Vec<String> {
    Slot::all()
        .map(|slot| match values.get(slot.index()).copied().flatten() {
            Some(v) => v.round_dp(3).normalize().to_string(),
            None => String::new(),
        })
        .collect()
}
