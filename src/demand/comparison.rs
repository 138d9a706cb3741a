use std::error::Error;
use std::path::Path;

use itertools::Itertools;
use jiff::civil::{Date, DateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::interval::month::Month;
use crate::timeseries::timeseries::TimeSeries;

/// Energy in MWh of one half-hour at 1 MW.
const HOURS_PER_SLOT: Decimal = dec!(0.5);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub period_beginning: DateTime,
    pub projected: Decimal,
    pub actual: Decimal,
    /// actual - projected
    pub delta: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub month: Month,
    pub rows: Vec<ComparisonRow>,
    pub unmatched_projected: usize,
    pub unmatched_actual: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Extreme {
    pub period_beginning: DateTime,
    #[serde(with = "rust_decimal::serde::float")]
    pub mw: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub month: String,
    pub intervals: usize,
    pub unmatched_projected: usize,
    pub unmatched_actual: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub actual_mwh: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub projected_mwh: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delta_mwh: Decimal,
    /// Delta energy relative to the projection, in percent.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub percent_change: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub mean_delta_mw: Decimal,
    pub min_delta: Extreme,
    pub max_delta: Extreme,
    pub peak_actual: Extreme,
    pub peak_projected: Extreme,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyEnergy {
    pub date: Date,
    pub intervals: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub projected_mwh: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub actual_mwh: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delta_mwh: Decimal,
}

/// Join the projection and the actuals on the period beginning.
pub fn compare(
    month: Month,
    projected: &TimeSeries<Decimal>,
    actual: &TimeSeries<Decimal>,
) -> Comparison {
    let join = projected.inner_join(actual);
    let rows = join
        .matched
        .into_iter()
        .map(|(period_beginning, projected, actual)| {
            let projected = projected.round_dp(3).normalize();
            ComparisonRow {
                period_beginning,
                projected,
                actual,
                delta: actual - projected,
            }
        })
        .collect();
    Comparison {
        month,
        rows,
        unmatched_projected: join.left_only,
        unmatched_actual: join.right_only,
    }
}

fn extreme<F>(rows: &[ComparisonRow], value: F, largest: bool) -> Option<Extreme>
where
    F: Fn(&ComparisonRow) -> Decimal,
{
    let row = if largest {
        rows.iter().max_by_key(|r| value(r))
    } else {
        rows.iter().min_by_key(|r| value(r))
    }?;
    Some(Extreme {
        period_beginning: row.period_beginning,
        mw: value(row),
    })
}

impl Comparison {
    /// Return `None` if no interval matched.
    pub fn summary(&self) -> Option<Summary> {
        if self.rows.is_empty() {
            return None;
        }
        let actual_mwh: Decimal = self.rows.iter().map(|r| r.actual).sum::<Decimal>() * HOURS_PER_SLOT;
        let projected_mwh: Decimal =
            self.rows.iter().map(|r| r.projected).sum::<Decimal>() * HOURS_PER_SLOT;
        let delta_mwh = actual_mwh - projected_mwh;
        let percent_change = if projected_mwh.is_zero() {
            None
        } else {
            Some((dec!(100) * delta_mwh / projected_mwh).round_dp(2))
        };
        let total_delta: Decimal = self.rows.iter().map(|r| r.delta).sum();
        Some(Summary {
            month: self.month.to_string(),
            intervals: self.rows.len(),
            unmatched_projected: self.unmatched_projected,
            unmatched_actual: self.unmatched_actual,
            actual_mwh: actual_mwh.round_dp(1),
            projected_mwh: projected_mwh.round_dp(1),
            delta_mwh: delta_mwh.round_dp(1),
            percent_change,
            mean_delta_mw: (total_delta / Decimal::from(self.rows.len())).round_dp(2),
            min_delta: extreme(&self.rows, |r| r.delta, false)?,
            max_delta: extreme(&self.rows, |r| r.delta, true)?,
            peak_actual: extreme(&self.rows, |r| r.actual, true)?,
            peak_projected: extreme(&self.rows, |r| r.projected, true)?,
        })
    }

    /// Energy per day, for the days with at least one matched interval.
    pub fn daily(&self) -> Vec<DailyEnergy> {
        self.rows
            .iter()
            .chunk_by(|r| r.period_beginning.date())
            .into_iter()
            .map(|(date, group)| {
                let rows: Vec<&ComparisonRow> = group.collect();
                let projected: Decimal = rows.iter().map(|r| r.projected).sum();
                let actual: Decimal = rows.iter().map(|r| r.actual).sum();
                DailyEnergy {
                    date,
                    intervals: rows.len(),
                    projected_mwh: (projected * HOURS_PER_SLOT).round_dp(1),
                    actual_mwh: (actual * HOURS_PER_SLOT).round_dp(1),
                    delta_mwh: ((actual - projected) * HOURS_PER_SLOT).round_dp(1),
                }
            })
            .collect()
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let mut wtr = csv::Writer::from_path(path)?;
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
