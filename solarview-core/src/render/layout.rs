//! Geometry of the year heatmap.

use super::palette::{ColorTable, Rgb};
use chrono::{Datelike, NaiveDate};

/// Minutes since midnight at the heatmap baseline (05:00).
pub const BASELINE_MINUTES: f64 = 5.0 * 60.0;
/// Each sample covers five minutes.
pub const SAMPLE_MINUTES: f64 = 5.0;
/// First and last hour with a grid line.
pub const GRID_HOURS: std::ops::RangeInclusive<u32> = 5..=22;
/// kWh grid lines, every 5 kWh from 0 to 25.
pub const KWH_GRID_STEP: usize = 5;
pub const KWH_GRID_MAX: u32 = 25;

/// Pixel geometry and colors. Everything else is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub height: u32,
    pub top_margin: u32,
    pub bottom_margin: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    /// Width of one day column's drawn stroke.
    pub line_width: u32,
    pub pixels_per_kwh: f64,
    pub pixels_per_hour: f64,
    pub colors: ColorTable,
    pub background: Rgb,
    pub energy_bar: Rgb,
    pub month_line: Rgb,
    pub grid_line: Rgb,
    pub axis_text: Rgb,
    pub text: Rgb,
    pub label_size: u32,
    pub title_size: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            height: 800,
            top_margin: 50,
            bottom_margin: 50,
            left_margin: 50,
            right_margin: 50,
            line_width: 2,
            pixels_per_kwh: 6.0,
            pixels_per_hour: 30.0,
            colors: ColorTable::default(),
            background: Rgb::WHITE,
            energy_bar: Rgb(0, 0, 128),
            month_line: Rgb::BLACK,
            grid_line: Rgb(196, 196, 196),
            axis_text: Rgb(128, 128, 128),
            text: Rgb::BLACK,
            label_size: 10,
            title_size: 18,
        }
    }
}

impl Layout {
    pub fn pixels_per_day(&self) -> u32 {
        self.line_width.saturating_add(1)
    }

    /// Room for 365 day columns plus the side margins.
    pub fn width(&self) -> u32 {
        self.pixels_per_day()
            .saturating_mul(365)
            .saturating_add(self.left_margin)
            .saturating_add(self.right_margin)
    }

    /// Right edge of the plot area.
    pub fn plot_right(&self) -> f64 {
        f64::from(self.width().saturating_sub(self.right_margin))
    }

    /// Bottom of the plot area; energy bars grow up from here.
    pub fn floor_y(&self) -> f64 {
        f64::from(self.height.saturating_sub(self.bottom_margin))
    }

    /// y of 05:00, leaving 35 kWh of bar height below it.
    pub fn baseline_y(&self) -> f64 {
        self.floor_y() - 35.0 * self.pixels_per_kwh
    }

    /// Left edge of the column for `day_offset` days after Jan 1.
    pub fn offset_x(&self, day_offset: i64) -> f64 {
        f64::from(self.left_margin) + day_offset as f64 * f64::from(self.pixels_per_day())
    }

    /// Left edge of the column for `date` within `year`.
    pub fn day_x(&self, year: i32, date: NaiveDate) -> f64 {
        let jan1 = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(date);
        self.offset_x((date - jan1).num_days())
    }

    /// y of a time of day given in minutes since midnight.
    pub fn time_y(&self, minutes: f64) -> f64 {
        self.baseline_y() - (minutes - BASELINE_MINUTES) / 60.0 * self.pixels_per_hour
    }

    /// Height of one sample's segment.
    pub fn sample_height(&self) -> f64 {
        SAMPLE_MINUTES / 60.0 * self.pixels_per_hour
    }

    pub fn kwh_height(&self, kwh: f64) -> f64 {
        kwh * self.pixels_per_kwh
    }

    /// Top-left of the legend's first swatch row; later rows stack upward.
    pub fn legend_origin(&self) -> (f64, f64) {
        (
            self.plot_right() - 140.0,
            self.floor_y() - 220.0,
        )
    }
}

/// Days between Jan 1 of `year` and the first of `month` (13 = next Jan 1).
pub fn month_start_offset(year: i32, month: u32) -> i64 {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1);
    let first = if month > 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month, 1)
    };
    match (jan1, first) {
        (Some(jan1), Some(first)) => (first - jan1).num_days(),
        _ => 0,
    }
}

/// Offset of `date` within its own year.
pub fn day_of_year_offset(date: NaiveDate) -> i64 {
    i64::from(date.ordinal0())
}
