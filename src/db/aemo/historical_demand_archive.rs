// Historical demand kept as one wide csv per year: one row per day, one column
// per 30 minute trading period (1-based period numbers, period ending).

use std::error::Error;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use jiff::civil::Date;
use log::{info, warn};

use super::price_and_demand_archive::{region_prefix, AemoPriceAndDemandArchive};
use crate::demand::reshape::{
    actual_series, check_wide_header, format_slot_values, parse_field, parse_slot_values, pivot,
    wide_header, DayProfile, ReshapeError,
};
use crate::interval::month::Month;
use crate::timeseries::timeseries::TimeSeries;

pub const KEY_COLUMNS: [&str; 3] = ["Year", "Month", "Day"];

#[derive(Clone, Debug)]
pub struct AemoHistoricalDemandArchive {
    pub base_dir: String,
    pub region: String,
}

impl AemoHistoricalDemandArchive {
    /// Return the csv filename for the year.  Does not check if the file exists.
    pub fn filename(&self, year: i16) -> String {
        format!(
            "{}/{}_demand_{}.csv",
            self.base_dir,
            region_prefix(&self.region),
            year
        )
    }

    pub fn read_file(&self, year: i16) -> Result<Vec<DayProfile>, Box<dyn Error>> {
        let file = File::open(self.filename(year))?;
        Ok(Self::read_csv(file)?)
    }

    /// Rows for days that don't exist in the calendar (e.g. 29 Feb of a
    /// non-leap year) are skipped.
    pub fn read_csv<R: Read>(rdr: R) -> Result<Vec<DayProfile>, ReshapeError> {
        let mut rdr = csv::Reader::from_reader(rdr);
        check_wide_header(rdr.headers()?, &KEY_COLUMNS)?;

        let mut out = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let year: i16 = parse_field(&record, 0, "Year")?;
            let month: i8 = parse_field(&record, 1, "Month")?;
            let day: i8 = parse_field(&record, 2, "Day")?;
            let date = match Date::new(year, month, day) {
                Ok(date) => date,
                Err(e) => {
                    warn!("Skipping {}-{:02}-{:02}: {}", year, month, day, e);
                    continue;
                }
            };
            out.push(DayProfile {
                date,
                values: parse_slot_values(&record, KEY_COLUMNS.len())?,
            });
        }
        Ok(out)
    }

    pub fn write_csv<W: Write>(wtr: W, rows: &[DayProfile]) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(wtr);
        wtr.write_record(wide_header(&KEY_COLUMNS))?;
        for row in rows {
            let mut record = vec![
                row.date.year().to_string(),
                row.date.month().to_string(),
                row.date.day().to_string(),
            ];
            record.extend(format_slot_values(&row.values));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Make the year file from the twelve monthly price and demand files.
    pub fn make_year_file(
        &self,
        year: i16,
        monthly: &AemoPriceAndDemandArchive,
        use_cached: bool,
    ) -> Result<(), Box<dyn Error>> {
        info!("Making {} demand file for year {} ...", self.region, year);
        let months = Month::new(year, 1)?
            .up_to(Month::new(year, 12)?)
            .ok_or("empty year")?;
        monthly.download_months(&months, use_cached)?;

        let mut ts = TimeSeries::new();
        for month in &months {
            let rows = monthly.read_file(month)?;
            for obs in actual_series(&rows, month)? {
                ts.push(obs)?;
            }
        }
        let days = pivot(&ts);
        let path = self.filename(year);
        if let Some(dir) = Path::new(&path).parent() {
            fs::create_dir_all(dir)?;
        }
        Self::write_csv(File::create(&path)?, &days)?;
        info!("  wrote {} days to {}", days.len(), path);
        Ok(())
    }

    /// Make the year files that don't exist yet.
    pub fn ensure_years(
        &self,
        years: &[i16],
        monthly: &AemoPriceAndDemandArchive,
        use_cached: bool,
    ) -> Result<(), Box<dyn Error>> {
        for year in years {
            if Path::new(&self.filename(*year)).exists() {
                continue;
            }
            self.make_year_file(*year, monthly, use_cached)?;
        }
        Ok(())
    }
}
