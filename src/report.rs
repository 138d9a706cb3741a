use std::error::Error;
use std::fs::File;
use std::path::Path;

use rust_decimal::Decimal;
use tabled::{builder::Builder, settings::Style};

use crate::demand::comparison::{DailyEnergy, Extreme, Summary};

fn format_mw(value: Decimal) -> String {
    value.round_dp(1).to_string()
}

fn format_extreme(extreme: &Extreme) -> String {
    format!(
        "{} MW at {}",
        format_mw(extreme.mw),
        extreme.period_beginning.strftime("%Y-%m-%d %H:%M")
    )
}

/// Make an ASCII table from the summary
pub fn summary_table(summary: &Summary) -> tabled::Table {
    let mut builder = Builder::new();
    builder.push_record(vec!["Month".to_string(), summary.month.clone()]);
    builder.push_record(vec![
        "Matched intervals".to_string(),
        summary.intervals.to_string(),
    ]);
    builder.push_record(vec![
        "Unmatched projected / actual".to_string(),
        format!(
            "{} / {}",
            summary.unmatched_projected, summary.unmatched_actual
        ),
    ]);
    builder.push_record(vec![
        "Actual energy, MWh".to_string(),
        format_mw(summary.actual_mwh),
    ]);
    builder.push_record(vec![
        "Projected energy, MWh".to_string(),
        format_mw(summary.projected_mwh),
    ]);
    builder.push_record(vec![
        "Delta energy, MWh".to_string(),
        format_mw(summary.delta_mwh),
    ]);
    builder.push_record(vec![
        "Change vs projection".to_string(),
        match summary.percent_change {
            Some(p) => format!("{}%", p),
            None => "n/a".to_string(),
        },
    ]);
    builder.push_record(vec![
        "Mean delta, MW".to_string(),
        format_mw(summary.mean_delta_mw),
    ]);
    builder.push_record(vec![
        "Largest drop".to_string(),
        format_extreme(&summary.min_delta),
    ]);
    builder.push_record(vec![
        "Largest rise".to_string(),
        format_extreme(&summary.max_delta),
    ]);
    builder.push_record(vec![
        "Peak actual".to_string(),
        format_extreme(&summary.peak_actual),
    ]);
    builder.push_record(vec![
        "Peak projected".to_string(),
        format_extreme(&summary.peak_projected),
    ]);
    let mut table = builder.build();
    table.with(Style::sharp());
    table
}

pub fn daily_table(data: &[DailyEnergy]) -> tabled::Table {
    let mut builder = Builder::new();
    builder.push_record(vec![
        "Date",
        "Intervals",
        "Projected, MWh",
        "Actual, MWh",
        "Delta, MWh",
    ]);
    for day in data {
        builder.push_record(vec![
            day.date.to_string(),
            day.intervals.to_string(),
            format_mw(day.projected_mwh),
            format_mw(day.actual_mwh),
            format_mw(day.delta_mwh),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::empty());
    table
}

pub fn write_json<P: AsRef<Path>>(path: P, summary: &Summary) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rust_decimal_macros::dec;

    use super::*;

    fn extreme(mw: Decimal) -> Extreme {
        Extreme {
            period_beginning: date(2020, 4, 7).at(18, 30, 0, 0),
            mw,
        }
    }

    fn summary() -> Summary {
        Summary {
            month: "2020-04".to_string(),
            intervals: 1440,
            unmatched_projected: 0,
            unmatched_actual: 0,
            actual_mwh: dec!(4012345.5),
            projected_mwh: dec!(4100000),
            delta_mwh: dec!(-87654.5),
            percent_change: Some(dec!(-2.14)),
            mean_delta_mw: dec!(-121.74),
            min_delta: extreme(dec!(-812.3)),
            max_delta: extreme(dec!(240.25)),
            peak_actual: extreme(dec!(7420)),
            peak_projected: extreme(dec!(7650.1)),
        }
    }

    #[test]
    fn summary_table_test() {
        let table = summary_table(&summary()).to_string();
        assert!(table.contains("Delta energy, MWh"));
        assert!(table.contains("-87654.5"));
        assert!(table.contains("-2.14%"));
        assert!(table.contains("-812.3 MW at 2020-04-07 18:30"));
    }

    #[test]
    fn daily_table_test() {
        let table = daily_table(&[DailyEnergy {
            date: date(2020, 4, 1),
            intervals: 48,
            projected_mwh: dec!(130000),
            actual_mwh: dec!(128000.25),
            delta_mwh: dec!(-1999.75),
        }])
        .to_string();
        assert!(table.contains("2020-04-01"));
        assert!(table.contains("-1999.8"));
    }

    #[test]
    fn write_json_test() -> Result<(), Box<dyn Error>> {
        let path = std::env::temp_dir().join("nem_demand_summary_test.json");
        write_json(&path, &summary())?;
        let value: serde_json::Value = serde_json::from_reader(File::open(&path)?)?;
        assert_eq!(value["intervals"], 1440);
        assert_eq!(value["peak_actual"]["mw"], serde_json::json!(7420.0));
        Ok(())
    }
}
