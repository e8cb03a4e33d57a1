//! Sync engine: brings one year's cached snapshot up to date.
//!
//! Pipeline per call: load cache → compute missing range → fetch (day series,
//! then month totals) on a working copy → decide completeness → persist →
//! list available years. Every remote failure is caught here and reported
//! through [`SyncOutcome`]; the last-known-good snapshot is always returned.

use super::cache::YearCache;
use super::progress::{percent, CancelToken, SyncProgress};
use super::provider::{EnergyOverview, PortalError, SolarPortal};
use super::timespan::Timespan;
use crate::clock::{Clock, SystemClock};
use crate::config::Credentials;
use crate::domain::YearSnapshot;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Deref, DerefMut};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why a sync did not bring fresh data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Portal(#[from] PortalError),

    #[error("sync cancelled")]
    Cancelled,
}

/// Coarse failure category for the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    Connection,
    Api,
    Cancelled,
}

impl SyncError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::Portal(PortalError::Auth(_)) => FailureKind::Auth,
            SyncError::Portal(PortalError::Connection(_)) => FailureKind::Connection,
            SyncError::Portal(PortalError::Api(_)) => FailureKind::Api,
            SyncError::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Optional collaborators for one sync call.
#[derive(Default, Clone, Copy)]
pub struct SyncOptions<'a> {
    pub progress: Option<&'a dyn SyncProgress>,
    pub cancel: Option<&'a CancelToken>,
}

impl<'a> SyncOptions<'a> {
    pub fn with_progress(mut self, progress: &'a dyn SyncProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn report(&self, percent: u8) {
        if let Some(progress) = self.progress {
            progress.on_progress(percent);
        }
    }

    fn check_cancelled(&self) -> Result<(), SyncError> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(SyncError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Result of one sync call.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// Fresh snapshot on success, the last-known-good one otherwise.
    pub snapshot: YearSnapshot,
    /// Local years plus the years the server reported, sorted.
    pub available_years: Vec<i32>,
    pub failure: Option<SyncError>,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Inclusive date range still missing from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchRange {
    /// Range for `snapshot` as of `today`.
    ///
    /// The end is Dec 31, or today for the current year. The range starts the
    /// day after the latest sampled date not after the end, or on Jan 1.
    pub fn compute(snapshot: &YearSnapshot, today: NaiveDate) -> Option<Self> {
        let year = snapshot.year;
        let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let dec31 = NaiveDate::from_ymd_opt(year, 12, 31)?;
        let end = dec31.min(today);
        let start = match snapshot.latest_sampled_date(end) {
            Some(latest) => latest.succ_opt().unwrap_or(latest),
            None => jan1,
        };
        Some(Self { start, end })
    }

    /// Every date in the range, in order. Empty when start > end.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct (year, month) pairs touched by the range, in order.
    pub fn months(&self) -> Vec<(i32, u32)> {
        let mut months: Vec<(i32, u32)> = Vec::new();
        for d in self.days() {
            let ym = (d.year(), d.month());
            if months.last() != Some(&ym) {
                months.push(ym);
            }
        }
        months
    }

    /// Year the completeness rule is judged on. An empty range counts as
    /// starting at its end.
    fn reference_year(&self) -> i32 {
        self.start.min(self.end).year()
    }
}

/// Logged-in portal. Logs out when dropped, whatever the fetch outcome.
struct SessionGuard<'a, P: SolarPortal> {
    portal: &'a mut P,
}

impl<'a, P: SolarPortal> SessionGuard<'a, P> {
    fn open(portal: &'a mut P, credentials: &Credentials) -> Result<Self, PortalError> {
        portal.login(credentials)?;
        debug!(portal = portal.name(), "session opened");
        Ok(Self { portal })
    }
}

impl<P: SolarPortal> Deref for SessionGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        &*self.portal
    }
}

impl<P: SolarPortal> DerefMut for SessionGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut *self.portal
    }
}

impl<P: SolarPortal> Drop for SessionGuard<'_, P> {
    fn drop(&mut self) {
        self.portal.logout();
        debug!("session closed");
    }
}

/// Coordinates the portal and the year cache.
pub struct SyncEngine<P: SolarPortal, C: Clock = SystemClock> {
    portal: P,
    cache: YearCache,
    credentials: Credentials,
    clock: C,
    server_years: BTreeSet<i32>,
}

impl<P: SolarPortal> SyncEngine<P, SystemClock> {
    pub fn new(portal: P, cache: YearCache, credentials: Credentials) -> Self {
        Self::with_clock(portal, cache, credentials, SystemClock)
    }
}

impl<P: SolarPortal, C: Clock> SyncEngine<P, C> {
    pub fn with_clock(portal: P, cache: YearCache, credentials: Credentials, clock: C) -> Self {
        Self {
            portal,
            cache,
            credentials,
            clock,
            server_years: BTreeSet::new(),
        }
    }

    pub fn portal(&self) -> &P {
        &self.portal
    }

    pub fn cache(&self) -> &YearCache {
        &self.cache
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Local cache years plus the server years learned by the last sync.
    pub fn list_available_years(&self) -> Vec<i32> {
        let mut years = self.cache.list_local_years();
        years.extend(self.server_years.iter().copied());
        years.into_iter().collect()
    }

    /// Bring `year` up to date.
    pub fn sync_year(&mut self, year: i32, options: &SyncOptions<'_>) -> SyncOutcome {
        self.server_years.clear();

        let cached = match self.cache.load(year) {
            Ok(found) => found,
            Err(e) => {
                warn!(year, error = %e, "cache unreadable, refetching the whole year");
                None
            }
        };

        if let Some(snapshot) = cached.as_ref().filter(|s| s.complete) {
            info!(year, days = snapshot.days.len(), "year complete in cache, no fetch");
            options.report(100);
            return SyncOutcome {
                snapshot: snapshot.clone(),
                available_years: self.list_available_years(),
                failure: None,
            };
        }

        let snapshot = cached.unwrap_or_else(|| YearSnapshot::empty(year));
        let today = self.clock.today();
        let Some(range) = FetchRange::compute(&snapshot, today) else {
            error!(year, "year out of calendar range");
            return SyncOutcome {
                snapshot,
                available_years: self.list_available_years(),
                failure: Some(SyncError::Portal(PortalError::Api(format!(
                    "year {year} out of range"
                )))),
            };
        };
        info!(year, start = %range.start, end = %range.end, days = range.len(), "syncing");

        let mut working = snapshot.clone();
        match self.fetch_into(&mut working, range, options) {
            Ok(server_years) => {
                self.server_years = server_years;
                working.complete = range.reference_year() < today.year();
                match self.cache.save(&working) {
                    Ok(path) => {
                        info!(year, complete = working.complete, path = %path.display(), "year synced")
                    }
                    Err(e) => error!(year, error = %e, "failed to save year cache"),
                }
                SyncOutcome {
                    snapshot: working,
                    available_years: self.list_available_years(),
                    failure: None,
                }
            }
            Err(e) => {
                error!(year, error = %e, "sync failed, keeping cached data");
                SyncOutcome {
                    snapshot,
                    available_years: self.list_available_years(),
                    failure: Some(e),
                }
            }
        }
    }

    /// Fetch `range` into `working`. Returns the years with production on
    /// the server.
    fn fetch_into(
        &mut self,
        working: &mut YearSnapshot,
        range: FetchRange,
        options: &SyncOptions<'_>,
    ) -> Result<BTreeSet<i32>, SyncError> {
        let mut session = SessionGuard::open(&mut self.portal, &self.credentials)?;

        let plant = session
            .plant_list()?
            .into_iter()
            .next()
            .ok_or_else(|| PortalError::Api("account has no plants".into()))?;
        debug!(plant_id = %plant.id, "using first plant");
        working.plant_id = plant.id.clone();
        if !plant.name.is_empty() {
            working.plant_name = plant.name.clone();
        }

        let totals: BTreeMap<i32, f64> = session
            .plant_detail(&plant.id, Timespan::Total, range.end)?
            .total_by_year()
            .into_iter()
            .filter(|(_, kwh)| *kwh > 0.0)
            .collect();
        working.year_production = totals.get(&working.year).copied().unwrap_or(0.0);

        let total_days = range.len();
        for (done, date) in range.days().enumerate() {
            options.check_cancelled()?;
            let series = session.plant_detail(&plant.id, Timespan::Day, date)?;
            if let Some(name) = series.plant_name() {
                if name != working.plant_name {
                    working.plant_name = name.to_string();
                }
            }
            let samples = series.day_samples();
            debug!(%date, samples = samples.len(), "day fetched");
            if let Some(record) = working.day_mut(date) {
                record.merge_samples(samples);
            }
            options.report(percent(done + 1, total_days));
        }

        for (year, month) in range.months() {
            options.check_cancelled()?;
            let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
                continue;
            };
            let series = session.plant_detail(&plant.id, Timespan::Month, first)?;
            for (day, kwh) in series.month_totals() {
                match NaiveDate::from_ymd_opt(year, month, day) {
                    Some(date) => {
                        if let Some(record) = working.day_mut(date) {
                            record.energy_kwh = kwh;
                        }
                    }
                    None => warn!(year, month, day, "portal sent a day outside the month"),
                }
            }
        }

        Ok(totals.into_keys().collect())
    }

    /// Current power and today's energy, in a session of its own.
    pub fn current_energy(&mut self) -> Result<EnergyOverview, PortalError> {
        let mut session = SessionGuard::open(&mut self.portal, &self.credentials)?;
        session.user_center_energy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DayRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn past_year_without_cache_covers_whole_year() {
        let range = FetchRange::compute(&YearSnapshot::empty(2023), date(2026, 10, 17)).unwrap();
        assert_eq!(range.start, date(2023, 1, 1));
        assert_eq!(range.end, date(2023, 12, 31));
        assert_eq!(range.len(), 365);
        assert_eq!(range.months().len(), 12);
    }

    #[test]
    fn current_year_ends_today() {
        let range = FetchRange::compute(&YearSnapshot::empty(2026), date(2026, 2, 3)).unwrap();
        assert_eq!(range.end, date(2026, 2, 3));
        assert_eq!(range.months(), vec![(2026, 1), (2026, 2)]);
    }

    fn sampled(snap: &mut YearSnapshot, d: NaiveDate) {
        snap.day_mut(d)
            .unwrap()
            .merge_samples([("12:00".to_string(), 900.0)]);
    }

    #[test]
    fn resumes_after_latest_sample_ignoring_future_keys() {
        let mut snap = YearSnapshot::empty(2026);
        for d in [date(2026, 3, 9), date(2026, 3, 10), date(2026, 3, 28)] {
            sampled(&mut snap, d);
        }
        let range = FetchRange::compute(&snap, date(2026, 3, 15)).unwrap();
        assert_eq!(range.start, date(2026, 3, 11));
        assert_eq!(range.end, date(2026, 3, 15));
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn fully_cached_range_is_empty_but_judged_on_its_end() {
        let mut snap = YearSnapshot::empty(2025);
        let mut last = DayRecord::new("2025-12-31");
        last.merge_samples([("12:00".to_string(), 900.0)]);
        snap.days.insert("2025-12-31".into(), last);
        let range = FetchRange::compute(&snap, date(2026, 1, 2)).unwrap();
        assert!(range.is_empty());
        assert_eq!(range.days().count(), 0);
        assert!(range.months().is_empty());
        assert_eq!(range.reference_year(), 2025);
    }

    #[test]
    fn month_totals_do_not_move_the_resume_point() {
        let mut snap = YearSnapshot::empty(2026);
        sampled(&mut snap, date(2026, 3, 10));
        for d in 1..=31 {
            snap.day_mut(date(2026, 3, d)).unwrap().energy_kwh = 4.0;
        }
        let range = FetchRange::compute(&snap, date(2026, 3, 15)).unwrap();
        assert_eq!(range.start, date(2026, 3, 11));
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn future_year_has_empty_range() {
        let range = FetchRange::compute(&YearSnapshot::empty(2027), date(2026, 10, 17)).unwrap();
        assert!(range.is_empty());
        assert_eq!(range.reference_year(), 2026);
    }

    #[test]
    fn failure_kinds() {
        assert_eq!(
            SyncError::from(PortalError::Auth("x".into())).kind(),
            FailureKind::Auth
        );
        assert_eq!(
            SyncError::from(PortalError::Connection("x".into())).kind(),
            FailureKind::Connection
        );
        assert_eq!(SyncError::Cancelled.kind(), FailureKind::Cancelled);
    }
}
