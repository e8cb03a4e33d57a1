//! Power → color buckets and their legend.

use super::RenderError;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
}

/// One bucket: every power up to and including `upper_watts` gets `color`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBucket {
    pub upper_watts: f64,
    pub color: Rgb,
}

/// Ordered bucket table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable {
    buckets: Vec<ColorBucket>,
}

impl ColorTable {
    /// Bounds must be strictly increasing.
    pub fn new(buckets: Vec<ColorBucket>) -> Result<Self, RenderError> {
        if buckets.is_empty() {
            return Err(RenderError::EmptyColorTable);
        }
        if let Some(pair) = buckets
            .windows(2)
            .find(|w| !(w[0].upper_watts < w[1].upper_watts))
        {
            return Err(RenderError::UnorderedBuckets {
                previous: pair[0].upper_watts,
                next: pair[1].upper_watts,
            });
        }
        Ok(Self { buckets })
    }

    pub fn buckets(&self) -> &[ColorBucket] {
        &self.buckets
    }

    /// Color of the first bucket whose bound is at least `watts`. Values
    /// above every bound (or NaN) take the last color.
    pub fn color_for(&self, watts: f64) -> Rgb {
        self.buckets
            .iter()
            .find(|b| watts <= b.upper_watts)
            .or(self.buckets.last())
            .map_or(Rgb::BLACK, |b| b.color)
    }

    /// One `(color, text)` row per bucket: `"0 W"`, `"lo - hi W"`, `"> lo W"`.
    pub fn legend(&self) -> Vec<(Rgb, String)> {
        let mut lower: Option<f64> = None;
        self.buckets
            .iter()
            .map(|b| {
                let text = match lower {
                    None => format!("{} W", b.upper_watts),
                    Some(lo) if b.upper_watts.is_infinite() => format!("> {lo} W"),
                    Some(lo) => format!("{lo} - {} W", b.upper_watts),
                };
                lower = Some(b.upper_watts);
                (b.color, text)
            })
            .collect()
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        let bucket = |upper_watts, color| ColorBucket { upper_watts, color };
        Self {
            buckets: vec![
                bucket(0.0, Rgb(0xC0, 0xC0, 0xC0)),
                bucket(500.0, Rgb(0x87, 0xCE, 0xFA)),
                bucket(1000.0, Rgb(0x00, 0xFF, 0x00)),
                bucket(2000.0, Rgb(0xFF, 0xFF, 0x00)),
                bucket(3000.0, Rgb(0xFF, 0xA5, 0x00)),
                bucket(4000.0, Rgb(0xFF, 0x00, 0x00)),
                bucket(f64::INFINITY, Rgb(0xB0, 0x00, 0x00)),
            ],
        }
    }
}
