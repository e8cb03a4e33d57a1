//! RGB8 pixel buffer and positioned text.

use super::palette::Rgb;

/// Horizontal placement of a label relative to its x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Left,
    Center,
    Right,
}

/// Text to be rasterized by the caller. `y` is the vertical center.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub size: u32,
    pub color: Rgb,
    pub anchor: Anchor,
}

/// Row-major RGB8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 3);
        for _ in 0..count {
            pixels.extend_from_slice(&[background.0, background.1, background.2]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Color at (x, y), `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]))
    }

    /// Fill the half-open rectangle between two corners, rounded to whole
    /// pixels and clipped to the canvas.
    pub fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb) {
        let (left, right) = self.clip(x0.min(x1), x0.max(x1), self.width);
        let (top, bottom) = self.clip(y0.min(y1), y0.max(y1), self.height);
        for y in top..bottom {
            let row = y * self.width as usize;
            for x in left..right {
                let i = (row + x) * 3;
                self.pixels[i] = color.0;
                self.pixels[i + 1] = color.1;
                self.pixels[i + 2] = color.2;
            }
        }
    }

    /// One-pixel vertical line at column `x` from `y0` to `y1`.
    pub fn vline(&mut self, x: f64, y0: f64, y1: f64, color: Rgb) {
        let x = x.floor();
        self.fill_rect(x, y0, x + 1.0, y1, color);
    }

    /// One-pixel horizontal line at row `y` from `x0` to `x1`.
    pub fn hline(&mut self, y: f64, x0: f64, x1: f64, color: Rgb) {
        let y = y.floor();
        self.fill_rect(x0, y, x1, y + 1.0, color);
    }

    fn clip(&self, lo: f64, hi: f64, limit: u32) -> (usize, usize) {
        let clamp = |v: f64| v.round().clamp(0.0, f64::from(limit)) as usize;
        if lo.is_nan() || hi.is_nan() {
            return (0, 0);
        }
        (clamp(lo), clamp(hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb(255, 0, 0);

    #[test]
    fn fill_rect_rounds_and_clips() {
        let mut canvas = Canvas::new(10, 10, Rgb::WHITE);
        canvas.fill_rect(-5.0, 7.6, 2.0, 20.0, RED);
        assert_eq!(canvas.pixel(0, 8), Some(RED));
        assert_eq!(canvas.pixel(1, 9), Some(RED));
        assert_eq!(canvas.pixel(2, 9), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(0, 7), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(0, 10), None);
    }

    #[test]
    fn lines_are_one_pixel() {
        let mut canvas = Canvas::new(5, 5, Rgb::WHITE);
        canvas.vline(2.5, 0.0, 5.0, RED);
        canvas.hline(4.0, 0.0, 1.0, Rgb::BLACK);
        assert_eq!(canvas.pixel(2, 0), Some(RED));
        assert_eq!(canvas.pixel(3, 0), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(0, 4), Some(Rgb::BLACK));
        assert_eq!(canvas.pixel(1, 4), Some(Rgb::WHITE));
    }
}
