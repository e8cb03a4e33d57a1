//! DayRecord: one calendar day of production data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Production data for a single date.
///
/// `energy_kwh` comes from the month endpoint, `samples` from the day endpoint.
/// A record with a total but no samples is normal: the day detail was never
/// fetched, or the month merge created the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Date key, `YYYY-MM-DD`.
    pub date: String,
    /// Energy produced that day in kWh.
    pub energy_kwh: f64,
    /// Instantaneous power in watts keyed by time of day (`HH:MM` or `HH:MM:SS`).
    pub samples: BTreeMap<String, f64>,
}

/// One intraday power reading borrowed from a [`DayRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSample<'a> {
    pub time: &'a str,
    pub watts: f64,
}

impl PowerSample<'_> {
    /// Minutes since midnight, seconds included as a fraction.
    pub fn minutes(&self) -> Option<f64> {
        time_of_day_minutes(self.time)
    }
}

impl DayRecord {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            energy_kwh: 0.0,
            samples: BTreeMap::new(),
        }
    }

    /// Merge fetched samples into this day. Later values win on key collision,
    /// so applying the same fetch twice is a no-op the second time.
    pub fn merge_samples<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        for (time, watts) in samples {
            self.samples.insert(time, watts);
        }
    }

    /// True when only the daily total is known.
    pub fn is_energy_only(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples ordered by time of day.
    pub fn samples(&self) -> impl Iterator<Item = PowerSample<'_>> {
        let mut samples: Vec<PowerSample<'_>> = self
            .samples
            .iter()
            .map(|(time, watts)| PowerSample {
                time: time.as_str(),
                watts: *watts,
            })
            .collect();
        // Keys like "9:05" would sort after "10:00" lexically.
        samples.sort_by(|a, b| {
            let ka = a.minutes().unwrap_or(f64::MAX);
            let kb = b.minutes().unwrap_or(f64::MAX);
            ka.total_cmp(&kb).then_with(|| a.time.cmp(b.time))
        });
        samples.into_iter()
    }
}

/// Convert `HH:MM` or `HH:MM:SS` into minutes since midnight.
pub fn time_of_day_minutes(time: &str) -> Option<f64> {
    let mut parts = time.trim().split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: f64 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0.0,
    };
    if parts.next().is_some() {
        return None;
    }
    let whole = hours.checked_mul(60)?.checked_add(minutes)?;
    Some(f64::from(whole) + seconds / 60.0)
}
