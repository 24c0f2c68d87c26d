//! PNG rasterizer for line charts.
//!
//! Draws grid, axes and series lines only; no text. The PNG is kept on the
//! canvas as a snapshot for document exports.

use super::chart::{AxisRange, LineChartConfig, Series};
use super::Canvas;
use crate::error::RenderError;
use crate::ports::ChartRenderer;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::io::Cursor;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([229, 231, 235]);
const AXIS: Rgb<u8> = Rgb([107, 114, 128]);
const FALLBACK_LINE: Rgb<u8> = Rgb([66, 133, 244]);
const GRID_LINES: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct RasterChartRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for RasterChartRenderer {
    fn default() -> Self {
        Self {
            width: 960,
            height: 480,
        }
    }
}

struct PlotArea {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

impl PlotArea {
    fn x_at(&self, index: usize, count: usize) -> i64 {
        if count <= 1 {
            return (self.left + self.right) / 2;
        }
        let span = (self.right - self.left) as f64;
        self.left + (span * index as f64 / (count - 1) as f64).round() as i64
    }

    fn y_at(&self, value: f64, range: AxisRange) -> i64 {
        let span = range.max - range.min;
        let ratio = if span > 0.0 {
            ((value - range.min) / span).clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.bottom - (((self.bottom - self.top) as f64) * ratio).round() as i64
    }
}

/// Parse `#rrggbb`; anything else falls back to the default line colour.
fn parse_hex(color: &str) -> Rgb<u8> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return FALLBACK_LINE;
    }
    match u32::from_str_radix(hex, 16) {
        Ok(v) => Rgb([(v >> 16) as u8, (v >> 8) as u8, v as u8]),
        Err(_) => FALLBACK_LINE,
    }
}

/// Parse `rgba(r, g, b, a)` and blend it over the white background.
fn parse_rgba(color: &str) -> Option<Rgb<u8>> {
    let inner = color.trim().strip_prefix("rgba(")?.strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let [r, g, b, a] = parts.as_slice() else {
        return None;
    };
    let alpha = a.parse::<f64>().ok()?.clamp(0.0, 1.0);
    let blend = |c: &str| -> Option<u8> {
        let c = c.parse::<u8>().ok()? as f64;
        Some((c * alpha + 255.0 * (1.0 - alpha)).round() as u8)
    };
    Some(Rgb([blend(r)?, blend(g)?, blend(b)?]))
}

/// Point fill: the series background, or its line colour when that is unusable.
fn fill_color(series: &Series, line: Rgb<u8>) -> Rgb<u8> {
    parse_rgba(&series.background_color).unwrap_or(line)
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn line(img: &mut RgbImage, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb<u8>, thick: i64) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);
    loop {
        for ox in 0..thick {
            for oy in 0..thick {
                put(img, x + ox, y + oy, color);
            }
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn fitted_range(series: &Series) -> AxisRange {
    let values = series.points.iter().flatten().copied();
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() {
        return AxisRange { min: 0.0, max: 1.0 };
    }
    if max > min {
        AxisRange { min, max }
    } else {
        AxisRange {
            min: min - 1.0,
            max: max + 1.0,
        }
    }
}

impl RasterChartRenderer {
    pub fn rasterize(&self, config: &LineChartConfig) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let right_margin = if config.secondary_axis.is_some() { 60 } else { 24 };
        let area = PlotArea {
            left: 60,
            top: 24,
            right: self.width as i64 - right_margin,
            bottom: self.height as i64 - 40,
        };

        let secondary = config.secondary_axis.as_ref().filter(|a| a.display);
        for i in 0..=GRID_LINES {
            let y = area.top + (area.bottom - area.top) * i as i64 / GRID_LINES as i64;
            if config.primary_axis.grid_on_chart_area {
                line(&mut img, (area.left, y), (area.right, y), GRID, 1);
            }
            if let Some(axis) = secondary {
                let (from, to) = if axis.grid_on_chart_area {
                    (area.left, area.right + 5)
                } else {
                    (area.right, area.right + 5)
                };
                line(&mut img, (from, y), (to, y), GRID, 1);
            }
        }
        if config.primary_axis.display {
            line(&mut img, (area.left, area.top), (area.left, area.bottom), AXIS, 1);
        }
        line(&mut img, (area.left, area.bottom), (area.right, area.bottom), AXIS, 1);
        if secondary.is_some() {
            line(&mut img, (area.right, area.top), (area.right, area.bottom), AXIS, 1);
        }

        let count = config.point_count();
        for series in &config.series {
            let range = config
                .axis_for(series)
                .range
                .unwrap_or_else(|| fitted_range(series));
            let color = parse_hex(&series.border_color);
            let fill = fill_color(series, color);
            let mut previous: Option<(i64, i64)> = None;
            for (i, value) in series.points.iter().enumerate() {
                let Some(v) = value else {
                    previous = None;
                    continue;
                };
                let point = (area.x_at(i, count), area.y_at(*v, range));
                if let Some(prev) = previous {
                    line(&mut img, prev, point, color, 2);
                }
                line(&mut img, (point.0 - 3, point.1 - 3), (point.0 - 3, point.1 - 3), color, 7);
                line(&mut img, (point.0 - 2, point.1 - 2), (point.0 - 2, point.1 - 2), fill, 5);
                previous = Some(point);
            }
        }
        img
    }

    pub fn encode_png(&self, config: &LineChartConfig) -> Result<Vec<u8>, RenderError> {
        let img = DynamicImage::ImageRgb8(self.rasterize(config));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png)?;
        Ok(out.into_inner())
    }
}

impl ChartRenderer for RasterChartRenderer {
    fn draw(&self, canvas: &mut Canvas, config: LineChartConfig) -> Result<(), RenderError> {
        let png = self.encode_png(&config)?;
        tracing::debug!(canvas = canvas.id, bytes = png.len(), "chart rasterized");
        canvas.snapshot_png = Some(png);
        canvas.chart = Some(config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChartSpec, Dataset};
    use crate::render::chart::build_line_chart;

    fn config() -> LineChartConfig {
        build_line_chart(&ChartSpec {
            labels: vec!["Q1 23".into(), "Q2 23".into(), "Q3 23".into()],
            datasets: vec![
                Dataset {
                    label: "LLP".into(),
                    data: vec![Some(10.0), None, Some(30.0)],
                    border_color: Some("#ff0000".into()),
                    ..Default::default()
                },
                Dataset {
                    label: "IFO".into(),
                    data: vec![Some(88.0), Some(90.0), Some(87.0)],
                    ..Default::default()
                },
            ],
        })
    }

    #[test]
    fn hex_colors_parse_with_fallback() {
        assert_eq!(parse_hex("#34A853"), Rgb([0x34, 0xa8, 0x53]));
        assert_eq!(parse_hex("rgba(1,2,3,0.2)"), FALLBACK_LINE);
        assert_eq!(parse_hex("#+12345"), FALLBACK_LINE);
    }

    #[test]
    fn non_ascii_colour_falls_back_instead_of_panicking() {
        assert_eq!(parse_hex("#aééa"), FALLBACK_LINE);

        let config = build_line_chart(&ChartSpec {
            labels: vec!["Q1 23".into(), "Q2 23".into()],
            datasets: vec![Dataset {
                label: "LLP".into(),
                data: vec![Some(1.0), Some(2.0)],
                border_color: Some("#aééa".into()),
                ..Default::default()
            }],
        });
        assert_eq!(config.series[0].border_color, "#aééa");
        let renderer = RasterChartRenderer {
            width: 80,
            height: 60,
        };
        let mut canvas = Canvas::new(1);
        renderer.draw(&mut canvas, config).unwrap();
        assert!(canvas.snapshot_png.is_some());
    }

    #[test]
    fn translucent_backgrounds_blend_over_white() {
        assert_eq!(parse_rgba("rgba(52, 168, 83, 0.2)"), Some(Rgb([214, 238, 221])));
        assert_eq!(parse_rgba("rgba(0,0,0,1)"), Some(Rgb([0, 0, 0])));
        assert_eq!(parse_rgba("#34A853"), None);
        assert_eq!(parse_rgba("rgba(1,2,3)"), None);
    }

    #[test]
    fn point_markers_use_the_series_background() {
        let renderer = RasterChartRenderer {
            width: 200,
            height: 100,
        };
        let img = renderer.rasterize(&config());
        assert!(img.pixels().any(|p| *p == Rgb([214, 238, 221])));
    }

    #[test]
    fn secondary_grid_stays_off_the_plot_area() {
        let renderer = RasterChartRenderer {
            width: 200,
            height: 100,
        };
        let mut cfg = config();
        cfg.series.clear();
        cfg.primary_axis.grid_on_chart_area = false;
        let img = renderer.rasterize(&cfg);
        // Middle of the plot, on the first interior grid row.
        let y = 24 + (100 - 40 - 24) / GRID_LINES as i64;
        assert_eq!(*img.get_pixel(100, y as u32), BACKGROUND);
        // Tick just right of the secondary axis.
        assert_eq!(*img.get_pixel(200 - 60 + 3, y as u32), GRID);
    }

    #[test]
    fn series_pixels_are_painted() {
        let renderer = RasterChartRenderer {
            width: 200,
            height: 100,
        };
        let img = renderer.rasterize(&config());
        assert!(img.pixels().any(|p| *p == Rgb([255, 0, 0])));
        assert!(img.pixels().any(|p| *p == Rgb([0x34, 0xa8, 0x53])));
    }

    #[test]
    fn draw_stores_png_snapshot() {
        let renderer = RasterChartRenderer {
            width: 120,
            height: 80,
        };
        let mut canvas = Canvas::new(7);
        renderer.draw(&mut canvas, config()).unwrap();
        let png = canvas.snapshot_png.unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert!(canvas.chart.is_some());
    }
}
