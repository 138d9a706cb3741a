// Monthly 30-minute price and demand files published by AEMO for each NEM region.
// https://aemo.com.au/energy-systems/electricity/national-electricity-market-nem/data-nem/aggregated-data

use std::error::Error;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use jiff::civil::DateTime;
use log::{error, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use super::lib_aemo::{
    check_columns, cookied_client, discard_file, download_file, is_fresh, nem_now,
    PRICE_AND_DEMAND_URL,
};
use crate::interval::month::Month;

#[derive(Clone, Debug)]
pub struct AemoPriceAndDemandArchive {
    pub base_dir: String,
    pub region: String,
    pub max_cache_age: Duration,
}

/// One row of the file.  The settlement date is NEM time (UTC+10) and marks
/// the END of the dispatch interval.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Row {
    #[serde(rename = "REGION")]
    pub region: String,
    #[serde(rename = "SETTLEMENTDATE", deserialize_with = "deserialize_settlement_date")]
    pub settlement_date: DateTime,
    #[serde(rename = "TOTALDEMAND")]
    pub total_demand: Decimal,
    #[serde(rename = "RRP")]
    pub rrp: Decimal,
    #[serde(rename = "PERIODTYPE", default)]
    pub period_type: String,
}

pub fn parse_settlement_date(s: &str) -> Result<DateTime, jiff::Error> {
    let s = s.trim();
    DateTime::strptime("%Y/%m/%d %H:%M:%S", s).or_else(|_| DateTime::strptime("%Y/%m/%d %H:%M", s))
}

fn deserialize_settlement_date<'de, D>(deserializer: D) -> Result<DateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_settlement_date(&s).map_err(serde::de::Error::custom)
}

/// `QLD1` -> `QLD`
pub fn region_prefix(region: &str) -> &str {
    region.trim_end_matches(|c: char| c.is_ascii_digit())
}

impl AemoPriceAndDemandArchive {
    /// Return the csv filename for the month.  Does not check if the file exists.
    pub fn filename(&self, month: &Month) -> String {
        format!(
            "{}/{}_demand_{}.csv",
            self.base_dir,
            region_prefix(&self.region),
            month.strftime("%Y%m")
        )
    }

    pub fn url(&self, month: &Month) -> String {
        format!(
            "{}/PRICE_AND_DEMAND_{}_{}.csv",
            PRICE_AND_DEMAND_URL,
            month.strftime("%Y%m"),
            self.region
        )
    }

    /// A closed month doesn't change anymore, so any copy of it is good.  The
    /// current month is only reused while younger than `max_cache_age`.
    pub fn is_cached(&self, month: &Month) -> bool {
        let path = PathBuf::from(self.filename(month));
        if month.end() <= nem_now() {
            return path.exists();
        }
        is_fresh(&path, self.max_cache_age)
    }

    /// Download the file for one month, unless a usable copy is cached.
    pub fn download_file(&self, month: &Month, use_cached: bool) -> Result<PathBuf, Box<dyn Error>> {
        let mut paths = self.download_months(&[*month], use_cached)?;
        paths.pop().ok_or_else(|| format!("No file for month {}", month).into())
    }

    /// Download several months sharing one cookied session.  A download that
    /// doesn't look like a price and demand file is removed.
    pub fn download_months(
        &self,
        months: &[Month],
        use_cached: bool,
    ) -> Result<Vec<PathBuf>, Box<dyn Error>> {
        let paths: Vec<PathBuf> = months.iter().map(|m| PathBuf::from(self.filename(m))).collect();
        let stale: Vec<(&Month, &PathBuf)> = months
            .iter()
            .zip(paths.iter())
            .filter(|(month, _)| !(use_cached && self.is_cached(month)))
            .collect();
        if stale.len() < months.len() {
            info!("...will use cached version for {} months.", months.len() - stale.len());
        }
        if stale.is_empty() {
            return Ok(paths);
        }

        let client = cookied_client()?;
        for (month, path) in stale {
            info!("Downloading {} price and demand for {} ...", self.region, month);
            download_file(&client, &self.url(month), path)?;
            if let Err(e) = check_columns(path, &["TOTALDEMAND"]) {
                error!("{}", e);
                discard_file(path);
                return Err(e.into());
            }
            info!("  downloaded {}, file format test OK.", path.display());
        }
        Ok(paths)
    }

    pub fn read_file(&self, month: &Month) -> Result<Vec<Row>, Box<dyn Error>> {
        let file = fs::File::open(self.filename(month))?;
        Ok(Self::read_csv(file)?)
    }

    pub fn read_csv<R: Read>(rdr: R) -> Result<Vec<Row>, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);
        rdr.deserialize().collect()
    }
}

#[cfg(test)]
mod tests {

    use jiff::civil::date;
    use rust_decimal_macros::dec;
    use std::error::Error;

    use crate::interval::month::month;

    use super::*;

    fn archive() -> AemoPriceAndDemandArchive {
        AemoPriceAndDemandArchive {
            base_dir: "data".to_string(),
            region: "QLD1".to_string(),
            max_cache_age: Duration::from_secs(60),
        }
    }

    #[test]
    fn names() {
        let archive = archive();
        assert_eq!(archive.filename(&month(2020, 4)), "data/QLD_demand_202004.csv");
        assert_eq!(
            archive.url(&month(2020, 4)),
            "https://aemo.com.au/aemo/data/nem/priceanddemand/PRICE_AND_DEMAND_202004_QLD1.csv"
        );
    }

    #[test]
    fn read_csv() -> Result<(), Box<dyn Error>> {
        let data = r#"REGION,SETTLEMENTDATE,TOTALDEMAND,RRP,PERIODTYPE
QLD1,2020/04/01 00:30:00,5432.12,25.3,TRADE
QLD1,2020/04/01 01:00:00,5301.8,-12.5,TRADE
"#;
        let rows = AemoPriceAndDemandArchive::read_csv(data.as_bytes())?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].settlement_date, date(2020, 4, 1).at(0, 30, 0, 0));
        assert_eq!(rows[0].total_demand, dec!(5432.12));
        assert_eq!(rows[1].rrp, dec!(-12.5));
        assert_eq!(rows[1].period_type, "TRADE");
        Ok(())
    }

    #[test]
    fn read_csv_bad_date() {
        let data = "REGION,SETTLEMENTDATE,TOTALDEMAND,RRP,PERIODTYPE\nQLD1,01-04-2020,5432.12,25.3,TRADE\n";
        assert!(AemoPriceAndDemandArchive::read_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn closed_months_reuse_any_copy() -> Result<(), Box<dyn Error>> {
        let base_dir = std::env::temp_dir().join("nem_demand_cached_months");
        let _ = fs::remove_dir_all(&base_dir);
        fs::create_dir_all(&base_dir)?;
        let archive = AemoPriceAndDemandArchive {
            base_dir: base_dir.to_string_lossy().to_string(),
            region: "QLD1".to_string(),
            max_cache_age: Duration::ZERO,
        };
        let closed = month(2019, 6);
        assert!(!archive.is_cached(&closed));
        fs::write(archive.filename(&closed), "REGION,SETTLEMENTDATE,TOTALDEMAND,RRP,PERIODTYPE\n")?;
        // too old for the cache age, but June 2019 is over
        assert!(archive.is_cached(&closed));

        let current = Month::containing(nem_now());
        assert!(!archive.is_cached(&current));
        let archive = AemoPriceAndDemandArchive {
            max_cache_age: Duration::from_secs(3600),
            ..archive
        };
        fs::write(archive.filename(&current), "REGION,SETTLEMENTDATE,TOTALDEMAND,RRP,PERIODTYPE\n")?;
        assert!(archive.is_cached(&current));

        // nothing to download, no network needed
        let paths = archive.download_months(&[closed, current], true)?;
        assert_eq!(paths.len(), 2);
        Ok(())
    }

    #[ignore]
    #[test]
    fn download_file() -> Result<(), Box<dyn Error>> {
        let archive = archive();
        let path = archive.download_file(&month(2020, 4), true)?;
        let rows = AemoPriceAndDemandArchive::read_csv(fs::File::open(path)?)?;
        assert_eq!(rows.len(), 30 * 48);
        Ok(())
    }
}
