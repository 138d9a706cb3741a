use std::fmt;
use std::fmt::Formatter;
use std::str::FromStr;

use jiff::civil::{Date, DateTime};
use jiff::ToSpan;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("{0}")]
pub struct ParseError(pub String);

/// A calendar month in civil (market) time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    start: Date,
}

/// Create a month.
///
/// # Panics
///
/// If `month` is not in `1..=12` or `year` is out of range.
pub fn month(year: i16, month: i8) -> Month {
    match Month::new(year, month) {
        Ok(m) => m,
        Err(e) => panic!("invalid month {}-{}: {}", year, month, e),
    }
}

impl Month {
    pub fn new(year: i16, month: i8) -> Result<Month, jiff::Error> {
        Ok(Month {
            start: Date::new(year, month, 1)?,
        })
    }

    /// Return the month that contains this datetime.
    pub fn containing(dt: DateTime) -> Month {
        Month {
            start: dt.date().first_of_month(),
        }
    }

    pub fn year(&self) -> i16 {
        self.start.year()
    }

    pub fn month(&self) -> i8 {
        self.start.month()
    }

    pub fn start_date(&self) -> Date {
        self.start
    }

    /// Last day of the month.
    pub fn end_date(&self) -> Date {
        self.start.last_of_month()
    }

    pub fn start(&self) -> DateTime {
        self.start.at(0, 0, 0, 0)
    }

    /// Exclusive end, i.e. midnight at the start of the next month.
    pub fn end(&self) -> DateTime {
        self.next().start()
    }

    pub fn next(&self) -> Month {
        Month {
            start: self.start.saturating_add(1.month()),
        }
    }

    pub fn previous(&self) -> Month {
        Month {
            start: self.start.saturating_sub(1.month()),
        }
    }

    pub fn days(&self) -> Vec<Date> {
        let end = self.end_date();
        self.start
            .series(1.day())
            .take_while(|day| *day <= end)
            .collect()
    }

    /// All months from this one up to and including `other`.
    /// Return `None` if `other` is before this month.
    pub fn up_to(&self, other: Month) -> Option<Vec<Month>> {
        if other < *self {
            return None;
        }
        let mut out = vec![*self];
        let mut current = *self;
        while current < other {
            current = current.next();
            out.push(current);
        }
        Some(out)
    }

    pub fn contains(&self, dt: DateTime) -> bool {
        dt >= self.start() && dt < self.end()
    }

    pub fn strftime(&self, format: &str) -> String {
        self.start.strftime(format).to_string()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.strftime("%Y-%m"))
    }
}

/// Parse a month from `yyyy-mm`, e.g. `2020-04`.
impl FromStr for Month {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| ParseError(format!("Failed parsing {} as a month", s)))?;
        let year: i16 = year
            .parse()
            .map_err(|_| ParseError(format!("Invalid year in {}", s)))?;
        let month: i8 = month
            .parse()
            .map_err(|_| ParseError(format!("Invalid month in {}", s)))?;
        if !(1..=12).contains(&month) {
            return Err(ParseError(format!("Month of year {} > 12", month)));
        }
        Month::new(year, month).map_err(|e| ParseError(e.to_string()))
    }
}
