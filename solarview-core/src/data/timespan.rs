//! Query granularity for the plant detail endpoint.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Granularity selector. Each variant has its own wire code and date format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timespan {
    /// Power samples at the inverter's native resolution (5 minutes).
    Day,
    /// Energy per day of the month.
    Month,
    /// Energy per month of the year.
    Year,
    /// Energy per year over the plant's lifetime. The date is ignored.
    Total,
}

impl Timespan {
    /// Value of the `type` query parameter.
    pub fn code(self) -> u8 {
        match self {
            Timespan::Day => 1,
            Timespan::Month => 2,
            Timespan::Year => 3,
            Timespan::Total => 4,
        }
    }

    /// Value of the `date` query parameter.
    pub fn format_date(self, date: NaiveDate) -> String {
        match self {
            Timespan::Day => date.format("%Y-%m-%d").to_string(),
            Timespan::Month => date.format("%Y-%m").to_string(),
            Timespan::Year => date.format("%Y").to_string(),
            Timespan::Total => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_per_granularity() {
        let d = NaiveDate::from_ymd_opt(2020, 3, 7).unwrap();
        assert_eq!(Timespan::Day.format_date(d), "2020-03-07");
        assert_eq!(Timespan::Month.format_date(d), "2020-03");
        assert_eq!(Timespan::Year.format_date(d), "2020");
        assert_eq!(Timespan::Total.format_date(d), "");
    }

    #[test]
    fn wire_codes() {
        let codes: Vec<u8> = [Timespan::Day, Timespan::Month, Timespan::Year, Timespan::Total]
            .iter()
            .map(|t| t.code())
            .collect();
        assert_eq!(codes, vec![1, 2, 3, 4]);
    }
}
