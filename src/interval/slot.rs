//! Half-hourly trading periods of a market day.
//!
//! Two numbering conventions meet here.  Wide day tables number their columns
//! with 1-based *period numbers*, where period `k` is the half hour ending at
//! `k * 30` minutes after midnight.  Timestamped data is keyed by the period
//! beginning, which maps to a 0-based *slot index*.  Period `k` and slot
//! `k - 1` are the same half hour.

use jiff::civil::{Date, DateTime};
use jiff::ToSpan;

pub const SLOTS_PER_DAY: usize = 48;
pub const SLOT_MINUTES: i64 = 30;

/// A 0-based half-hour slot of a day, in `0..48`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(u8);

/// How a timestamp labels the period it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodLabel {
    Beginning,
    Ending,
}

impl Slot {
    pub fn new(index: usize) -> Option<Slot> {
        if index < SLOTS_PER_DAY {
            Some(Slot(index as u8))
        } else {
            None
        }
    }

    /// Convert a 1-based period number into a slot.
    pub fn from_period_number(number: usize) -> Option<Slot> {
        number.checked_sub(1).and_then(Slot::new)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn period_number(&self) -> usize {
        self.0 as usize + 1
    }

    /// The slot a period-beginning timestamp falls in.
    pub fn containing(dt: DateTime) -> Slot {
        let minutes = dt.hour() as i64 * 60 + dt.minute() as i64;
        Slot((minutes / SLOT_MINUTES) as u8)
    }

    pub fn start_on(&self, date: Date) -> DateTime {
        let minutes = self.0 as i64 * SLOT_MINUTES;
        date.at((minutes / 60) as i8, (minutes % 60) as i8, 0, 0)
    }

    /// The last slot of a day ends at midnight of the following day.
    pub fn end_on(&self, date: Date) -> DateTime {
        self.start_on(date).saturating_add(SLOT_MINUTES.minutes())
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOTS_PER_DAY as u8).map(Slot)
    }
}

/// Relabel a timestamp as the beginning of its period.  `interval_minutes`
/// is the length of the period the timestamp labels.
pub fn to_period_beginning(dt: DateTime, label: PeriodLabel, interval_minutes: i64) -> DateTime {
    match label {
        PeriodLabel::Beginning => dt,
        PeriodLabel::Ending => dt.saturating_sub(interval_minutes.minutes()),
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn period_numbers_are_one_based() {
        assert_eq!(Slot::from_period_number(0), None);
        assert_eq!(Slot::from_period_number(1), Slot::new(0));
        assert_eq!(Slot::from_period_number(48), Slot::new(47));
        assert_eq!(Slot::from_period_number(49), None);
        assert_eq!(Slot::new(47).unwrap().period_number(), 48);
    }

    #[test]
    fn slot_times() {
        let day = date(2020, 4, 30);
        let first = Slot::new(0).unwrap();
        assert_eq!(first.start_on(day), day.at(0, 0, 0, 0));
        assert_eq!(first.end_on(day), day.at(0, 30, 0, 0));
        let last = Slot::new(47).unwrap();
        assert_eq!(last.start_on(day), day.at(23, 30, 0, 0));
        assert_eq!(last.end_on(day), date(2020, 5, 1).at(0, 0, 0, 0));
        assert_eq!(Slot::containing(day.at(13, 45, 0, 0)), Slot::new(27).unwrap());
        assert_eq!(Slot::all().count(), SLOTS_PER_DAY);
    }

    #[test]
    fn period_ending_rolls_back_over_midnight() {
        let end = date(2020, 5, 1).at(0, 0, 0, 0);
        let begin = to_period_beginning(end, PeriodLabel::Ending, SLOT_MINUTES);
        assert_eq!(begin, date(2020, 4, 30).at(23, 30, 0, 0));
        assert_eq!(Slot::containing(begin).period_number(), 48);
        assert_eq!(to_period_beginning(end, PeriodLabel::Beginning, SLOT_MINUTES), end);
        // five minute dispatch intervals
        let begin = to_period_beginning(end, PeriodLabel::Ending, 5);
        assert_eq!(begin, date(2020, 4, 30).at(23, 55, 0, 0));
        assert_eq!(Slot::containing(begin).period_number(), 48);
    }
}
