use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use log::info;
use thiserror::Error;

use crate::db::aemo::price_and_demand_archive::region_prefix;
use crate::interval::month::Month;

#[derive(Error, Debug, PartialEq)]
#[error("Invalid value '{value}' for {name}")]
pub struct ConfigError {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Where downloads and snapshots live.
    pub data_dir: String,
    /// NEM region code, e.g. `QLD1`.
    pub region: String,
    /// A cached monthly download younger than this is reused.
    pub max_cache_age: Duration,
    /// Number of years of history before the target year.
    pub history_years: i16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: "data".to_string(),
            region: "QLD1".to_string(),
            max_cache_age: Duration::from_secs(60),
            history_years: 5,
        }
    }
}

/// Load `.env/{env}.env` into the process environment.  Variables already set
/// take precedence.  Return false if there is no such file.
pub fn load_env_file(env: &str) -> bool {
    let path = format!(".env/{}.env", env);
    match dotenvy::from_path(Path::new(&path)) {
        Ok(_) => true,
        Err(e) => {
            info!("Not loading {}: {}", path, e);
            false
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError {
            name: name.to_string(),
            value,
        }),
    }
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let default = Config::default();
        let history_years = parse_var(&lookup, "AEMO_HISTORY_YEARS", default.history_years)?;
        if history_years < 1 {
            return Err(ConfigError {
                name: "AEMO_HISTORY_YEARS".to_string(),
                value: history_years.to_string(),
            });
        }
        Ok(Config {
            data_dir: parse_var(&lookup, "AEMO_DATA_DIR", default.data_dir)?,
            region: parse_var(&lookup, "AEMO_REGION", default.region)?,
            max_cache_age: Duration::from_secs(parse_var(
                &lookup,
                "AEMO_CACHE_MAX_AGE_SECS",
                default.max_cache_age.as_secs(),
            )?),
            history_years,
        })
    }

    /// The history years used for a target month, oldest first.
    pub fn history_years_for(&self, month: &Month) -> Vec<i16> {
        (month.year().saturating_sub(self.history_years)..month.year()).collect()
    }

    /// Path of a snapshot file in the data directory, e.g.
    /// `data/QLD_comparison_202004.csv`.
    pub fn snapshot_path(&self, name: &str, month: &Month, extension: &str) -> String {
        format!(
            "{}/{}_{}_{}.{}",
            self.data_dir,
            region_prefix(&self.region),
            name,
            month.strftime("%Y%m"),
            extension
        )
    }

    /// Path of the averaged calendar projected onto `year`.
    pub fn projected_path(&self, year: i16) -> String {
        format!(
            "{}/{}_demand_{}_projected.csv",
            self.data_dir,
            region_prefix(&self.region),
            year
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::interval::month::month;

    #[test]
    fn defaults() -> Result<(), ConfigError> {
        let config = Config::from_lookup(|_| None)?;
        assert_eq!(config, Config::default());
        assert_eq!(config.history_years_for(&month(2020, 4)), vec![2015, 2016, 2017, 2018, 2019]);
        assert_eq!(config.projected_path(2020), "data/QLD_demand_2020_projected.csv");
        assert_eq!(
            config.snapshot_path("summary", &month(2020, 4), "json"),
            "data/QLD_summary_202004.json"
        );
        Ok(())
    }

    #[test]
    fn from_lookup() -> Result<(), ConfigError> {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("AEMO_DATA_DIR", "/tmp/aemo"),
            ("AEMO_CACHE_MAX_AGE_SECS", "3600"),
            ("AEMO_HISTORY_YEARS", "3"),
        ]);
        let config = Config::from_lookup(|name| vars.get(name).map(|v| v.to_string()))?;
        assert_eq!(config.data_dir, "/tmp/aemo");
        assert_eq!(config.region, "QLD1");
        assert_eq!(config.max_cache_age, Duration::from_secs(3600));
        assert_eq!(config.history_years, 3);
        Ok(())
    }

    #[test]
    fn invalid_value() {
        let err = Config::from_lookup(|name| {
            (name == "AEMO_HISTORY_YEARS").then(|| "five".to_string())
        })
        .unwrap_err();
        assert_eq!(err.name, "AEMO_HISTORY_YEARS");
        assert_eq!(err.value, "five");
    }

    #[test]
    fn history_years_must_be_positive() {
        for value in ["0", "-3", "-32768"] {
            let err = Config::from_lookup(|name| {
                (name == "AEMO_HISTORY_YEARS").then(|| value.to_string())
            })
            .unwrap_err();
            assert_eq!(err.name, "AEMO_HISTORY_YEARS");
            assert_eq!(err.value, value);
        }
    }

    #[test]
    fn history_years_for_extreme_values() {
        let config = Config {
            history_years: i16::MIN,
            ..Config::default()
        };
        assert!(config.history_years_for(&month(2020, 4)).is_empty());
        let config = Config {
            history_years: i16::MAX,
            ..Config::default()
        };
        let years = config.history_years_for(&month(2020, 4));
        assert_eq!(years.first(), Some(&-30747));
        assert_eq!(years.last(), Some(&2019));
    }
}
