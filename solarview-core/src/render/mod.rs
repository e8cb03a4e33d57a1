//! Year heatmap renderer.
//!
//! A pure projection from a [`YearSnapshot`] to an RGB8 pixel buffer plus the
//! text labels that go on it. Draw order: grid, energy bars, heatmap, legend,
//! title. No I/O; the same snapshot and layout always give the same image.

pub mod canvas;
pub mod layout;
pub mod palette;

pub use canvas::{Anchor, Canvas, TextLabel};
pub use layout::Layout;
pub use palette::{ColorBucket, ColorTable, Rgb};

use crate::domain::YearSnapshot;
use chrono::{Datelike, Month};
use layout::{day_of_year_offset, month_start_offset, GRID_HOURS, KWH_GRID_MAX, KWH_GRID_STEP};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("color buckets must be strictly increasing ({previous} then {next})")]
    UnorderedBuckets { previous: f64, next: f64 },

    #[error("color table has no buckets")]
    EmptyColorTable,
}

/// Rendered heatmap: pixels plus labels for the caller to rasterize.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB8, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
    pub labels: Vec<TextLabel>,
}

impl RenderedImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]))
    }
}

/// Render `snapshot` with `layout`.
pub fn render(snapshot: &YearSnapshot, layout: &Layout) -> RenderedImage {
    let mut canvas = Canvas::new(layout.width(), layout.height, layout.background);
    let mut labels = Vec::new();

    draw_grid(&mut canvas, &mut labels, snapshot.year, layout);
    draw_energy_bars(&mut canvas, snapshot, layout);
    draw_heatmap(&mut canvas, snapshot, layout);
    draw_legend(&mut canvas, &mut labels, layout);
    draw_title(&mut labels, snapshot, layout);

    RenderedImage {
        width: canvas.width(),
        height: canvas.height(),
        pixels: canvas.into_pixels(),
        labels,
    }
}

fn label(text: impl Into<String>, x: f64, y: f64, size: u32, color: Rgb, anchor: Anchor) -> TextLabel {
    TextLabel {
        text: text.into(),
        x: x.round() as i32,
        y: y.round() as i32,
        size,
        color,
        anchor,
    }
}

fn draw_grid(canvas: &mut Canvas, labels: &mut Vec<TextLabel>, year: i32, layout: &Layout) {
    let ppd = f64::from(layout.pixels_per_day());
    let top = f64::from(layout.top_margin) - 20.0;
    let floor = layout.floor_y();
    let x_min = f64::from(layout.left_margin);
    let x_max = layout.plot_right();

    // Month boundaries sit between columns; month 13 closes the year.
    for month in 1..=13u32 {
        let x = layout.offset_x(month_start_offset(year, month)) - ppd / 2.0;
        canvas.vline(x, top, floor, layout.month_line);
        if month > 12 {
            continue;
        }
        if let Ok(name) = Month::try_from(month as u8) {
            labels.push(label(
                name.name(),
                x + 15.0 * ppd,
                floor + 10.0,
                layout.label_size,
                layout.text,
                Anchor::Center,
            ));
        }
    }

    for hour in GRID_HOURS {
        let y = layout.time_y(f64::from(hour) * 60.0);
        canvas.hline(y, x_min, x_max, layout.grid_line);
        labels.push(label(
            format!("{hour}:00"),
            x_min - 2.0,
            y,
            layout.label_size,
            layout.axis_text,
            Anchor::Right,
        ));
    }

    for kwh in (0..=KWH_GRID_MAX).step_by(KWH_GRID_STEP) {
        let y = floor - layout.kwh_height(f64::from(kwh));
        canvas.hline(y, x_min, x_max, layout.grid_line);
        labels.push(label(
            kwh.to_string(),
            x_min - 10.0,
            y,
            layout.label_size,
            layout.axis_text,
            Anchor::Center,
        ));
    }
    labels.push(label(
        "kWh",
        x_min - 10.0,
        floor + 10.0 - layout.kwh_height(30.0),
        layout.label_size,
        layout.axis_text,
        Anchor::Center,
    ));
}

fn draw_energy_bars(canvas: &mut Canvas, snapshot: &YearSnapshot, layout: &Layout) {
    let lw = f64::from(layout.line_width);
    let floor = layout.floor_y();
    for (date, day) in snapshot.dated_days() {
        if date.year() != snapshot.year || day.energy_kwh <= 0.0 {
            continue;
        }
        let x = layout.offset_x(day_of_year_offset(date));
        canvas.fill_rect(x, floor - layout.kwh_height(day.energy_kwh), x + lw, floor, layout.energy_bar);
    }
}

fn draw_heatmap(canvas: &mut Canvas, snapshot: &YearSnapshot, layout: &Layout) {
    let lw = f64::from(layout.line_width);
    let segment = layout.sample_height();
    for (date, day) in snapshot.dated_days() {
        if date.year() != snapshot.year {
            continue;
        }
        let x = layout.offset_x(day_of_year_offset(date));
        for sample in day.samples() {
            let Some(minutes) = sample.minutes() else {
                continue;
            };
            let y = layout.time_y(minutes);
            canvas.fill_rect(x, y - segment, x + lw, y, layout.colors.color_for(sample.watts));
        }
    }
}

fn draw_legend(canvas: &mut Canvas, labels: &mut Vec<TextLabel>, layout: &Layout) {
    let (x, y) = layout.legend_origin();
    for (row, (color, text)) in layout.colors.legend().into_iter().enumerate() {
        let row_y = y - row as f64 * 10.0;
        canvas.fill_rect(x, row_y - 4.0, x + 40.0, row_y + 4.0, color);
        labels.push(label(text, x + 45.0, row_y, layout.label_size, layout.text, Anchor::Left));
    }
}

fn draw_title(labels: &mut Vec<TextLabel>, snapshot: &YearSnapshot, layout: &Layout) {
    let y = f64::from(layout.top_margin) - 10.0;
    let left = f64::from(layout.left_margin);
    let right = layout.plot_right();

    labels.push(label(
        format!("{:4}", snapshot.year),
        left,
        y,
        layout.title_size,
        layout.text,
        Anchor::Left,
    ));
    let plant = format!("{} {}", snapshot.plant_id, snapshot.plant_name);
    labels.push(label(
        plant.trim(),
        f64::from(layout.width()) / 2.0,
        y,
        layout.label_size,
        layout.text,
        Anchor::Center,
    ));
    labels.push(label(
        format!("{:.0} kWh", snapshot.year_production),
        right,
        y,
        layout.title_size,
        layout.text,
        Anchor::Right,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn column_has(image: &RenderedImage, x: u32, color: Rgb) -> bool {
        (0..image.height).any(|y| image.pixel(x, y) == Some(color))
    }

    #[test]
    fn energy_only_day_draws_just_the_bar() {
        let layout = Layout::default();
        let mut snap = YearSnapshot::empty(2024);
        snap.day_mut(date(2024, 6, 10)).unwrap().energy_kwh = 10.0;

        let image = render(&snap, &layout);
        let x = layout.offset_x(day_of_year_offset(date(2024, 6, 10))) as u32;

        // Bar reaches 60 px above the floor, nothing from the heatmap palette.
        assert_eq!(image.pixel(x, 749), Some(layout.energy_bar));
        assert_eq!(image.pixel(x, 690), Some(layout.energy_bar));
        assert_eq!(image.pixel(x, 689), Some(layout.background));
        for bucket in layout.colors.buckets() {
            assert!(!column_has(&image, x, bucket.color));
        }
    }

    #[test]
    fn samples_land_at_their_time_and_color() {
        let layout = Layout::default();
        let mut snap = YearSnapshot::empty(2024);
        snap.day_mut(date(2024, 1, 1))
            .unwrap()
            .merge_samples([("12:00".to_string(), 2500.0)]);

        let image = render(&snap, &layout);
        // 12:00 → y = 540 - 210 = 330; the segment covers 327.5..330.
        let orange = Rgb(0xFF, 0xA5, 0x00);
        assert_eq!(image.pixel(50, 329), Some(orange));
        assert_eq!(image.pixel(51, 328), Some(orange));
        assert_eq!(image.pixel(52, 329), Some(layout.background));
        assert!(!column_has(&image, 50, layout.energy_bar));
    }

    #[test]
    fn oversized_margins_render_without_panicking() {
        let layout = Layout {
            height: 40,
            top_margin: 90,
            bottom_margin: 100,
            right_margin: 5000,
            ..Layout::default()
        };
        let mut snap = YearSnapshot::empty(2024);
        let day = snap.day_mut(date(2024, 6, 10)).unwrap();
        day.energy_kwh = 12.0;
        day.merge_samples([("12:00".to_string(), 2500.0)]);

        let image = render(&snap, &layout);
        assert_eq!(image.height, 40);
        assert_eq!(image.width, layout.width());
        assert_eq!(image.pixels.len(), (image.width * image.height * 3) as usize);
    }

    #[test]
    fn rendering_is_deterministic() {
        let layout = Layout::default();
        let mut snap = YearSnapshot::empty(2023);
        snap.plant_id = "42".into();
        snap.plant_name = "Roof".into();
        snap.year_production = 3210.4;
        let day = snap.day_mut(date(2023, 7, 1)).unwrap();
        day.energy_kwh = 20.0;
        day.merge_samples([("06:00".to_string(), 300.0), ("13:05:30".to_string(), 4100.0)]);

        let a = render(&snap, &layout);
        let b = render(&snap, &layout);
        assert_eq!(a, b);
        assert_eq!(a.width, layout.width());
        assert_eq!(a.pixels.len(), (a.width * a.height * 3) as usize);
    }

    #[test]
    fn labels_cover_axes_legend_and_title() {
        let mut snap = YearSnapshot::empty(2023);
        snap.plant_id = "42".into();
        snap.plant_name = "Roof".into();
        snap.year_production = 3210.4;

        let image = render(&snap, &Layout::default());
        let texts: Vec<&str> = image.labels.iter().map(|l| l.text.as_str()).collect();
        for expected in ["January", "December", "5:00", "22:00", "25", "> 4000 W", "2023", "42 Roof", "3210 kWh"] {
            assert!(texts.contains(&expected), "missing label {expected}");
        }
        assert!(!texts.contains(&"23:00"));
    }

    #[test]
    fn legend_rows_stack_upward() {
        let layout = Layout::default();
        let image = render(&YearSnapshot::empty(2023), &layout);
        let (x, y) = layout.legend_origin();
        let first = layout.colors.buckets()[0].color;
        let second = layout.colors.buckets()[1].color;
        assert_eq!(image.pixel(x as u32 + 1, y as u32), Some(first));
        assert_eq!(image.pixel(x as u32 + 1, y as u32 - 10), Some(second));
    }
}
