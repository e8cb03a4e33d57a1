//! Property tests for sync and cache invariants.
//!
//! Uses proptest to verify:
//! 1. Password digest: MD5 hex with even-index '0' → 'c', nothing else touched
//! 2. Merge idempotence: merging the same samples twice equals merging once
//! 3. Cache round-trip: save then load reproduces the snapshot
//! 4. Color monotonicity: more power never maps to a lower bucket
//! 5. File pattern: every year names a file that parses back to it
//! 6. Fetch range: resume starts the day after the latest sampled date

use chrono::{Datelike, NaiveDate};
use md5::{Digest, Md5};
use proptest::prelude::*;
use solarview_core::data::{hash_password, FetchRange, FilePattern, YearCache};
use solarview_core::domain::{DayRecord, YearSnapshot};
use solarview_core::render::ColorTable;
use std::collections::BTreeMap;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_watts() -> impl Strategy<Value = f64> {
    (0u32..1_000_000).prop_map(|w| f64::from(w) / 100.0)
}

fn arb_time() -> impl Strategy<Value = String> {
    (0u32..24, 0u32..12).prop_map(|(h, m)| format!("{h:02}:{:02}", m * 5))
}

fn arb_samples() -> impl Strategy<Value = BTreeMap<String, f64>> {
    prop::collection::btree_map(arb_time(), arb_watts(), 0..40)
}

fn arb_snapshot() -> impl Strategy<Value = YearSnapshot> {
    (
        2015i32..2030,
        any::<bool>(),
        0u32..1_000_000,
        prop::collection::vec((0u32..365, 0u32..5000, arb_samples()), 0..20),
    )
        .prop_map(|(year, complete, production, days)| {
            let mut snap = YearSnapshot::empty(year);
            snap.complete = complete;
            snap.year_production = f64::from(production) / 10.0;
            snap.plant_id = "4711".into();
            snap.plant_name = "Garage Roof".into();
            let jan1 = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
            for (offset, energy, samples) in days {
                let date = jan1 + chrono::Days::new(u64::from(offset));
                let record = snap.day_mut(date).unwrap();
                record.energy_kwh = f64::from(energy) / 100.0;
                record.merge_samples(samples);
            }
            snap
        })
}

// ── 1. Password digest ───────────────────────────────────────────────

proptest! {
    #[test]
    fn digest_differs_from_md5_only_at_even_zeros(password in ".{0,40}") {
        let md5_hex = hex::encode(Md5::digest(password.as_bytes()));
        let hashed = hash_password(&password);

        prop_assert_eq!(hashed.len(), 32);
        for (i, (h, m)) in hashed.chars().zip(md5_hex.chars()).enumerate() {
            if i % 2 == 0 && m == '0' {
                prop_assert_eq!(h, 'c');
            } else {
                prop_assert_eq!(h, m);
            }
        }
    }
}

// ── 2. Merge idempotence ─────────────────────────────────────────────

proptest! {
    #[test]
    fn merging_twice_equals_merging_once(first in arb_samples(), second in arb_samples()) {
        let mut once = DayRecord::new("2024-06-01");
        once.merge_samples(first.clone());
        once.merge_samples(second.clone());

        let mut twice = once.clone();
        twice.merge_samples(second.clone());
        prop_assert_eq!(&twice, &once);

        // Later samples win on key collisions.
        for (time, watts) in &second {
            prop_assert_eq!(once.samples.get(time), Some(watts));
        }
    }
}

// ── 3. Cache round-trip ──────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cache_roundtrip(snap in arb_snapshot()) {
        let dir = tempfile::tempdir().unwrap();
        let cache = YearCache::new(dir.path(), FilePattern::parse("pv_????.br").unwrap());

        cache.save(&snap).unwrap();
        let loaded = cache.load(snap.year).unwrap().unwrap();
        prop_assert_eq!(&loaded, &snap);

        cache.save(&loaded).unwrap();
        prop_assert_eq!(cache.load(snap.year).unwrap().unwrap(), snap);
    }
}

// ── 4. Color monotonicity ────────────────────────────────────────────

proptest! {
    #[test]
    fn more_power_never_lowers_the_bucket(a in arb_watts(), b in arb_watts()) {
        let table = ColorTable::default();
        let bucket_of = |w: f64| {
            let color = table.color_for(w);
            table.buckets().iter().position(|b| b.color == color).unwrap()
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(bucket_of(lo) <= bucket_of(hi));
    }
}

// ── 5. File pattern ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn file_names_parse_back(year in 0i32..10_000) {
        let pattern = FilePattern::parse("solarviewdata_????.json.br").unwrap();
        let name = pattern.file_name(year);
        prop_assert_eq!(name.len(), "solarviewdata_2024.json.br".len());
        prop_assert_eq!(pattern.year_of(&name), Some(year));
    }
}

// ── 6. Fetch range ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn resume_starts_after_latest_cached_day(cached in 1u32..200, today in 200u32..366) {
        let mut snap = YearSnapshot::empty(2023);
        let jan1 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        for offset in 0..cached {
            snap.day_mut(jan1 + chrono::Days::new(u64::from(offset)))
                .unwrap()
                .merge_samples([("12:00".to_string(), 500.0)]);
        }
        // A month-merge record past the last sampled day.
        snap.day_mut(jan1 + chrono::Days::new(u64::from(cached)))
            .unwrap()
            .energy_kwh = 3.0;
        let today = jan1 + chrono::Days::new(u64::from(today - 1));
        let range = FetchRange::compute(&snap, today).unwrap();

        prop_assert_eq!(range.start.ordinal(), cached + 1);
        prop_assert_eq!(range.days().count(), range.len());
        prop_assert!(range.days().all(|d| snap.day(d).map_or(true, |r| r.is_energy_only())));
    }
}
