//! Raster rendering of chart specs to PNG.
//!
//! Dark background, dashed low-alpha grid, solid axes. Text is not drawn;
//! series are identified by legend swatches in the top-right corner.

use chrono::NaiveDate;
use image::{ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::info;

use super::{colors, ChartColor, ChartError, ImageArtifact, LineSpec, ScatterSpec};

/// Canvas settings shared by line and scatter rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PngStyle {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub grid_lines: u32,
    pub grid_alpha: f64,
    pub line_thickness: u32,
    pub marker_radius: u32,
}

impl Default for PngStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            margin: 48,
            grid_lines: 5,
            grid_alpha: 0.3,
            line_thickness: 3,
            marker_radius: 4,
        }
    }
}

const DASH_ON: u32 = 6;
const DASH_OFF: u32 = 4;
const SWATCH: u32 = 12;

fn rgb(color: ChartColor) -> Rgb<u8> {
    Rgb([color.r, color.g, color.b])
}

/// Pixel-space rectangle the data is mapped into.
#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
}

impl PlotArea {
    fn new(style: &PngStyle) -> Result<Self, ChartError> {
        let m = style.margin;
        let min_side = m.saturating_mul(2).saturating_add(1);
        if style.width <= min_side || style.height <= min_side {
            return Err(ChartError::Encode(format!(
                "{}x{} canvas leaves no room inside a {m}px margin",
                style.width, style.height
            )));
        }
        Ok(Self {
            left: m,
            top: m,
            right: style.width - m - 1,
            bottom: style.height - m - 1,
        })
    }

    /// Map a value in `[lo, hi]` to a column.
    fn x(&self, v: f64, (lo, hi): (f64, f64)) -> i64 {
        let t = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
        self.left as i64 + (t * (self.right - self.left) as f64).round() as i64
    }

    /// Map a value in `[lo, hi]` to a row (larger values higher up).
    fn y(&self, v: f64, (lo, hi): (f64, f64)) -> i64 {
        let t = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
        self.bottom as i64 - (t * (self.bottom - self.top) as f64).round() as i64
    }
}

// ── Drawing primitives ──────────────────────────────────────────────

fn fill_rect(img: &mut RgbImage, x: i64, y: i64, w: u32, h: u32, color: Rgb<u8>) {
    for dy in 0..h as i64 {
        for dx in 0..w as i64 {
            put(img, x + dx, y + dy, color);
        }
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn blend(base: Rgb<u8>, over: Rgb<u8>, alpha: f64) -> Rgb<u8> {
    let t = alpha.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| ((1.0 - t) * a as f64 + t * b as f64).round() as u8;
    Rgb([
        mix(base.0[0], over.0[0]),
        mix(base.0[1], over.0[1]),
        mix(base.0[2], over.0[2]),
    ])
}

fn blend_pixel(img: &mut RgbImage, x: u32, y: u32, over: Rgb<u8>, alpha: f64) {
    if x < img.width() && y < img.height() {
        let base = *img.get_pixel(x, y);
        img.put_pixel(x, y, blend(base, over, alpha));
    }
}

fn dashed_horizontal(img: &mut RgbImage, y: u32, x1: u32, x2: u32, color: Rgb<u8>, alpha: f64) {
    for x in x1..=x2 {
        if (x - x1) % (DASH_ON + DASH_OFF) < DASH_ON {
            blend_pixel(img, x, y, color, alpha);
        }
    }
}

fn dashed_vertical(img: &mut RgbImage, x: u32, y1: u32, y2: u32, color: Rgb<u8>, alpha: f64) {
    for y in y1..=y2 {
        if (y - y1) % (DASH_ON + DASH_OFF) < DASH_ON {
            blend_pixel(img, x, y, color, alpha);
        }
    }
}

/// Bresenham segment stamped with a square brush of `thickness` pixels.
fn thick_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), thickness: u32, color: Rgb<u8>) {
    let t = thickness.max(1);
    let offset = (t / 2) as i64;
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        fill_rect(img, x0 - offset, y0 - offset, t, t, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn disc(img: &mut RgbImage, cx: i64, cy: i64, radius: u32, color: Rgb<u8>) {
    let r = radius as i64;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

// ── Canvas ──────────────────────────────────────────────────────────

fn canvas(style: &PngStyle, area: &PlotArea) -> RgbImage {
    let mut img = RgbImage::from_pixel(style.width, style.height, rgb(colors::BACKGROUND));
    let fg = rgb(colors::FOREGROUND);

    let n = style.grid_lines.max(1);
    for i in 0..=n {
        let y = area.top + (area.bottom - area.top) * i / n;
        dashed_horizontal(&mut img, y, area.left, area.right, fg, style.grid_alpha);
        let x = area.left + (area.right - area.left) * i / n;
        dashed_vertical(&mut img, x, area.top, area.bottom, fg, style.grid_alpha);
    }

    for x in area.left..=area.right {
        img.put_pixel(x, area.bottom, fg);
    }
    for y in area.top..=area.bottom {
        img.put_pixel(area.left, y, fg);
    }
    img
}

fn legend(img: &mut RgbImage, area: &PlotArea, entries: &[ChartColor]) {
    let mut y = area.top as i64 + 6;
    for color in entries {
        let x = area.right as i64 - 6 - SWATCH as i64;
        fill_rect(img, x - 1, y - 1, SWATCH + 2, SWATCH + 2, rgb(colors::FOREGROUND));
        fill_rect(img, x, y, SWATCH, SWATCH, rgb(*color));
        y += SWATCH as i64 + 6;
    }
}

fn encode(img: &RgbImage, file_name: &str) -> Result<ImageArtifact, ChartError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ChartError::Encode(e.to_string()))?;
    let bytes = buf.into_inner();
    info!(file = file_name, bytes = bytes.len(), "encoded chart png");
    Ok(ImageArtifact::png(file_name, bytes))
}

// ── Public renderers ────────────────────────────────────────────────

/// Render the close-price line chart.
pub fn render_line_png(
    spec: &LineSpec,
    style: &PngStyle,
    file_name: &str,
) -> Result<ImageArtifact, ChartError> {
    let (first, last) = spec
        .x_bounds()
        .ok_or_else(|| ChartError::NoData(format!("'{}' has no points", spec.title)))?;
    let y_range = spec
        .y_bounds()
        .ok_or_else(|| ChartError::NoData(format!("'{}' has no points", spec.title)))?;
    let area = PlotArea::new(style)?;
    let mut img = canvas(style, &area);

    let day = |date: NaiveDate| (date - first).num_days() as f64;
    let x_range = (0.0, day(last));
    let color = rgb(spec.color);

    let pixels: Vec<(i64, i64)> = spec
        .points
        .iter()
        .map(|(date, v)| (area.x(day(*date), x_range), area.y(*v, y_range)))
        .collect();
    match pixels.as_slice() {
        [only] => disc(&mut img, only.0, only.1, style.line_thickness.max(2), color),
        _ => {
            for pair in pixels.windows(2) {
                thick_line(&mut img, pair[0], pair[1], style.line_thickness, color);
            }
        }
    }

    legend(&mut img, &area, &[spec.color]);
    encode(&img, file_name)
}

/// Render the grouped scatter chart.
pub fn render_scatter_png(
    spec: &ScatterSpec,
    style: &PngStyle,
    file_name: &str,
) -> Result<ImageArtifact, ChartError> {
    let x_range = spec
        .x_bounds()
        .ok_or_else(|| ChartError::NoData(format!("'{}' has no points", spec.title)))?;
    let y_range = spec
        .y_bounds()
        .ok_or_else(|| ChartError::NoData(format!("'{}' has no points", spec.title)))?;
    let area = PlotArea::new(style)?;
    let mut img = canvas(style, &area);

    for group in &spec.groups {
        let color = rgb(group.color);
        for (x, y) in &group.points {
            disc(
                &mut img,
                area.x(*x, x_range),
                area.y(*y, y_range),
                style.marker_radius,
                color,
            );
        }
    }

    let swatches: Vec<ChartColor> = spec.groups.iter().map(|g| g.color).collect();
    legend(&mut img, &area, &swatches);
    encode(&img, file_name)
}
