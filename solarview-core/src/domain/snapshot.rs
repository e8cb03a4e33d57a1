//! YearSnapshot: the cached state for one calendar year.

use super::day::DayRecord;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Date key format used throughout the cache.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a date as a cache key.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a cache key back into a date.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_FORMAT).ok()
}

/// Everything known about one year of production.
///
/// Invariant: every key in `days` is a date inside `year`. Records are only
/// created through [`YearSnapshot::day_mut`], which refuses other years.
/// `complete` is terminal: once a complete snapshot is persisted the sync
/// engine never queries the portal for that year again.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSnapshot {
    pub year: i32,
    pub complete: bool,
    /// Annual production in kWh as reported by the portal.
    pub year_production: f64,
    pub days: BTreeMap<String, DayRecord>,
    pub plant_id: String,
    pub plant_name: String,
}

impl YearSnapshot {
    /// Fresh snapshot used when no cache file exists.
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            complete: false,
            year_production: 0.0,
            days: BTreeMap::new(),
            plant_id: String::new(),
            plant_name: String::new(),
        }
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date.year() == self.year
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.get(&date_key(date))
    }

    /// Record for `date`, created empty if absent. `None` when the date lies
    /// outside this snapshot's year.
    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DayRecord> {
        if !self.contains_date(date) {
            return None;
        }
        let key = date_key(date);
        Some(
            self.days
                .entry(key.clone())
                .or_insert_with(|| DayRecord::new(key)),
        )
    }

    /// Latest date not after `not_after` whose record holds intraday samples.
    ///
    /// Records with only a daily total come from the month merge and were
    /// never fetched day by day, so they do not count.
    pub fn latest_sampled_date(&self, not_after: NaiveDate) -> Option<NaiveDate> {
        self.days
            .iter()
            .rev()
            .filter(|(_, rec)| !rec.is_energy_only())
            .filter_map(|(k, _)| parse_date_key(k))
            .find(|d| *d <= not_after)
    }

    /// Days with a parseable key, in date order.
    pub fn dated_days(&self) -> impl Iterator<Item = (NaiveDate, &DayRecord)> {
        self.days
            .iter()
            .filter_map(|(k, rec)| parse_date_key(k).map(|d| (d, rec)))
    }

    /// Keys that violate the year invariant (unparseable or another year).
    pub fn foreign_keys(&self) -> Vec<&str> {
        self.days
            .keys()
            .filter(|k| !parse_date_key(k).is_some_and(|d| self.contains_date(d)))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_mut_creates_record_in_year() {
        let mut snap = YearSnapshot::empty(2023);
        let rec = snap.day_mut(date(2023, 3, 10)).unwrap();
        rec.energy_kwh = 4.0;

        assert_eq!(snap.days.len(), 1);
        assert_eq!(snap.days["2023-03-10"].energy_kwh, 4.0);
        assert_eq!(snap.days["2023-03-10"].date, "2023-03-10");
    }

    #[test]
    fn day_mut_refuses_other_year() {
        let mut snap = YearSnapshot::empty(2023);
        assert!(snap.day_mut(date(2024, 1, 1)).is_none());
        assert!(snap.days.is_empty());
    }

    fn sampled(snap: &mut YearSnapshot, d: NaiveDate) {
        snap.day_mut(d)
            .unwrap()
            .merge_samples([("12:00".to_string(), 900.0)]);
    }

    #[test]
    fn latest_sampled_date_skips_future_keys() {
        let mut snap = YearSnapshot::empty(2023);
        sampled(&mut snap, date(2023, 3, 10));
        sampled(&mut snap, date(2023, 3, 31));

        assert_eq!(snap.latest_sampled_date(date(2023, 3, 15)), Some(date(2023, 3, 10)));
        assert_eq!(snap.latest_sampled_date(date(2023, 12, 31)), Some(date(2023, 3, 31)));
        assert_eq!(snap.latest_sampled_date(date(2023, 1, 1)), None);
    }

    #[test]
    fn latest_sampled_date_ignores_total_only_records() {
        let mut snap = YearSnapshot::empty(2026);
        sampled(&mut snap, date(2026, 3, 10));
        for d in 11..=31 {
            snap.day_mut(date(2026, 3, d)).unwrap().energy_kwh = 5.0;
        }

        assert_eq!(snap.latest_sampled_date(date(2026, 3, 15)), Some(date(2026, 3, 10)));
    }

    #[test]
    fn foreign_keys_detected() {
        let mut snap = YearSnapshot::empty(2023);
        snap.day_mut(date(2023, 5, 1));
        snap.days
            .insert("2022-12-31".into(), DayRecord::new("2022-12-31"));
        snap.days.insert("garbage".into(), DayRecord::new("garbage"));

        let mut keys = snap.foreign_keys();
        keys.sort_unstable();
        assert_eq!(keys, vec!["2022-12-31", "garbage"]);
    }
}
