//! PNG export of a rendered heatmap via plotters' bitmap backend.

use anyhow::{anyhow, Context, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use solarview_core::render::{Anchor, RenderedImage};
use std::path::{Path, PathBuf};

const FONT_FAMILY: &str = "solarview";

/// Output path with `.png` appended when the name has no extension.
pub fn with_png_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("png")
    }
}

/// Default file name for `year`.
pub fn default_output(year: i32) -> PathBuf {
    PathBuf::from(format!("solarview_{year}.png"))
}

/// Make the TrueType font at `path` available for labels.
pub fn load_font(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("read font {}", path.display()))?;
    // plotters keeps registered fonts for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| anyhow!("{} is not a usable TrueType font", path.display()))
}

/// Write `image` to `path`. Labels are drawn only when `with_text` is set.
pub fn write_png(image: &RenderedImage, path: &Path, with_text: bool) -> Result<()> {
    let root = BitMapBackend::new(path, (image.width, image.height)).into_drawing_area();

    for (i, px) in image.pixels.chunks_exact(3).enumerate() {
        let x = (i % image.width as usize) as i32;
        let y = (i / image.width as usize) as i32;
        root.draw_pixel((x, y), &RGBColor(px[0], px[1], px[2]))
            .map_err(|e| anyhow!("draw pixel: {e:?}"))?;
    }

    if with_text {
        for label in &image.labels {
            let h = match label.anchor {
                Anchor::Left => HPos::Left,
                Anchor::Center => HPos::Center,
                Anchor::Right => HPos::Right,
            };
            let color = RGBColor(label.color.0, label.color.1, label.color.2);
            let style = (FONT_FAMILY, f64::from(label.size))
                .into_font()
                .color(&color)
                .pos(Pos::new(h, VPos::Center));
            root.draw(&Text::new(label.text.as_str(), (label.x, label.y), style))
                .map_err(|e| anyhow!("draw label '{}': {e:?}", label.text))?;
        }
    }

    root.present()
        .map_err(|e| anyhow!("write {}: {e:?}", path.display()))?;
    Ok(())
}
