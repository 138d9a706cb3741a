use std::cmp::Ordering;
use std::slice::Iter;

use jiff::civil::DateTime;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct Observation<K: Clone> {
    pub start: DateTime,
    pub value: K,
}

#[derive(Error, Debug, PartialEq)]
#[error("observation at {pushed} is not after the last observation at {last}")]
pub struct OrderError {
    pub last: DateTime,
    pub pushed: DateTime,
}

/// Observations in strictly increasing order of their start.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries<K: Clone>(Vec<Observation<K>>);

/// Result of joining two series on their timestamps.
#[derive(Debug, PartialEq)]
pub struct Join<K, L> {
    pub matched: Vec<(DateTime, K, L)>,
    pub left_only: usize,
    pub right_only: usize,
}

impl<K: Clone> TimeSeries<K> {
    pub fn new() -> TimeSeries<K> {
        TimeSeries(Vec::new())
    }

    /// You can only push at the end of a timeseries.
    pub fn push(&mut self, value: Observation<K>) -> Result<(), OrderError> {
        if let Some(last) = self.last() {
            if value.start <= last.start {
                return Err(OrderError {
                    last: last.start,
                    pushed: value.start,
                });
            }
        }
        self.0.push(value);
        Ok(())
    }

    /// Sort the observations and build a series.  Fails on duplicate timestamps.
    pub fn from_unsorted(mut xs: Vec<Observation<K>>) -> Result<TimeSeries<K>, OrderError> {
        xs.sort_by_key(|e| e.start);
        let mut ts = TimeSeries::new();
        for x in xs {
            ts.push(x)?;
        }
        Ok(ts)
    }

    pub fn first(&self) -> Option<&Observation<K>> {
        self.0.first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Observation<K>> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&Observation<K>> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn values(&self) -> Vec<K> {
        self.0.iter().map(|e| e.value.clone()).collect()
    }

    /// Pair up the observations with the same start.  Both series are sorted,
    /// so a single merge pass is enough.
    pub fn inner_join<L: Clone>(&self, other: &TimeSeries<L>) -> Join<K, L> {
        let mut matched = Vec::new();
        let (mut left_only, mut right_only) = (0, 0);
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            let (x, y) = (&self.0[i], &other.0[j]);
            match x.start.cmp(&y.start) {
                Ordering::Less => {
                    left_only += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    right_only += 1;
                    j += 1;
                }
                Ordering::Equal => {
                    matched.push((x.start, x.value.clone(), y.value.clone()));
                    i += 1;
                    j += 1;
                }
            }
        }
        left_only += self.0.len() - i;
        right_only += other.0.len() - j;
        Join {
            matched,
            left_only,
            right_only,
        }
    }
}

impl<K: Clone> Default for TimeSeries<K> {
    fn default() -> Self {
        TimeSeries::new()
    }
}

impl<K: Clone> IntoIterator for TimeSeries<K> {
    type Item = Observation<K>;
    type IntoIter = std::vec::IntoIter<Observation<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn obs(hour: i8, value: i32) -> Observation<i32> {
        Observation {
            start: date(2022, 1, 1).at(hour, 0, 0, 0),
            value,
        }
    }

    #[test]
    fn test_timeseries() {
        let mut ts: TimeSeries<i32> = TimeSeries::new();
        assert_eq!(ts.len(), 0);
        ts.push(obs(0, 1)).unwrap();
        ts.push(obs(1, 2)).unwrap();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.values(), vec![1, 2]);
        assert_eq!(ts.first().unwrap().value, 1);
    }

    #[test]
    fn test_push_out_of_order() {
        let mut ts: TimeSeries<i32> = TimeSeries::new();
        ts.push(obs(5, 1)).unwrap();
        let err = ts.push(obs(0, 1)).unwrap_err();
        assert_eq!(err.pushed, date(2022, 1, 1).at(0, 0, 0, 0));
        // duplicates are rejected too
        assert!(ts.push(obs(5, 2)).is_err());
        assert_eq!(ts.len(), 1);
    }

    #[test]
    fn test_from_unsorted() {
        let ts = TimeSeries::from_unsorted(vec![obs(2, 3), obs(0, 1), obs(1, 2)]).unwrap();
        assert_eq!(ts.values(), vec![1, 2, 3]);
        assert!(TimeSeries::from_unsorted(vec![obs(2, 3), obs(2, 1)]).is_err());
    }

    #[test]
    fn test_inner_join() {
        let x = TimeSeries::from_unsorted(vec![obs(0, 1), obs(1, 2), obs(2, 3), obs(5, 4)]).unwrap();
        let y = TimeSeries::from_unsorted(vec![obs(1, 20), obs(2, 30), obs(3, 40)]).unwrap();
        let join = x.inner_join(&y);
        assert_eq!(
            join.matched,
            vec![
                (date(2022, 1, 1).at(1, 0, 0, 0), 2, 20),
                (date(2022, 1, 1).at(2, 0, 0, 0), 3, 30),
            ]
        );
        assert_eq!(join.left_only, 2);
        assert_eq!(join.right_only, 1);
    }
}
