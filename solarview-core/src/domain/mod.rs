//! Domain types: plants, day records and per-year snapshots.

pub mod day;
pub mod plant;
pub mod snapshot;

pub use day::{time_of_day_minutes, DayRecord, PowerSample};
pub use plant::Plant;
pub use snapshot::{date_key, parse_date_key, YearSnapshot, DATE_FORMAT};
