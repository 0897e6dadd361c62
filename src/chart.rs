//! Shared multi-series line chart.
//!
//! One series per (hue, style) pair: the hue value picks marker shape and color,
//! the style value picks the line dash. The legend lists the hue values under the
//! hue column's title, then, if the style column differs, the style values under
//! its own title.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::Command;

use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::schema::{Column, Row, Value};

const CHART_SIZE: (u32, u32) = (960, 720);
const MARKER_RADIUS: i32 = 5;
const LEGEND_LEN: i32 = 24;
const IMAGE_EXTENSION: &str = "svg";

/// seaborn's "bright" palette.
const PALETTE: [RGBColor; 10] = [
    RGBColor(0x02, 0x3e, 0xff),
    RGBColor(0xff, 0x7c, 0x00),
    RGBColor(0x1a, 0xc9, 0x38),
    RGBColor(0xe8, 0x00, 0x0b),
    RGBColor(0x8b, 0x2b, 0xe2),
    RGBColor(0x9f, 0x48, 0x00),
    RGBColor(0xf1, 0x4c, 0xc1),
    RGBColor(0xa3, 0xa3, 0xa3),
    RGBColor(0xff, 0xc4, 0x00),
    RGBColor(0x00, 0xd7, 0xff),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    Diamond,
}

const MARKERS: [Marker; 3] = [Marker::Circle, Marker::Square, Marker::Diamond];

impl Marker {
    pub fn for_index(i: usize) -> Self {
        MARKERS[i % MARKERS.len()]
    }

    /// Outline in pixels relative to the data point.
    fn outline(&self, r: i32) -> Vec<(i32, i32)> {
        match self {
            Marker::Circle => (0..16)
                .map(|i| {
                    let a = f64::from(i) * std::f64::consts::PI / 8.0;
                    let r = f64::from(r);
                    ((r * a.cos()).round() as i32, (r * a.sin()).round() as i32)
                })
                .collect(),
            Marker::Square => vec![(-r, -r), (r, -r), (r, r), (-r, r)],
            Marker::Diamond => {
                let r = r + 1;
                vec![(0, -r), (r, 0), (0, r), (-r, 0)]
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dash {
    Solid,
    Dashed,
}

const DASHES: [Dash; 2] = [Dash::Solid, Dash::Dashed];

impl Dash {
    pub fn for_index(i: usize) -> Self {
        DASHES[i % DASHES.len()]
    }

    /// Two segments covering `0..LEGEND_LEN`; contiguous when solid.
    fn legend_segments(&self) -> [Vec<(i32, i32)>; 2] {
        let half = LEGEND_LEN / 2;
        match self {
            Dash::Solid => [vec![(0, 0), (half, 0)], vec![(half, 0), (LEGEND_LEN, 0)]],
            Dash::Dashed => [
                vec![(0, 0), (half - 3, 0)],
                vec![(half + 3, 0), (LEGEND_LEN, 0)],
            ],
        }
    }
}

pub fn color_for_index(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

/// What to plot: `y` against `x`, split by `hue` and `style`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartSpec {
    pub x: Column,
    pub y: Column,
    pub hue: Column,
    pub style: Column,
    /// File stem of the saved figure.
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    /// Index into [`ChartData::hue_values`].
    pub hue: usize,
    /// Index into [`ChartData::style_values`].
    pub style: usize,
    pub points: Vec<(f64, f64)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartData {
    /// Distinct x values, ascending. These become the x-axis ticks.
    pub x_values: Vec<f64>,
    /// Distinct hue values in order of first appearance.
    pub hue_values: Vec<Value>,
    pub style_values: Vec<Value>,
    pub series: Vec<Series>,
}

fn numeric<R: Row>(row: &R, column: Column) -> Result<f64> {
    match row.value(column) {
        Some(v) => v
            .as_f64()
            .ok_or_else(|| Error::plot(format!("column {column} is not numeric ({v})"))),
        None => Err(Error::plot(format!("column {column} has no value"))),
    }
}

fn category<R: Row>(row: &R, column: Column) -> Result<Value> {
    row.value(column)
        .ok_or_else(|| Error::plot(format!("column {column} has no value")))
}

fn distinct(values: impl Iterator<Item = Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// Split `rows` into series. Pairs without rows produce no series.
///
/// Rows whose x or y is not finite (a metric that was `null` in every trial)
/// are dropped.
pub fn collect<R: Row>(rows: &[R], spec: &ChartSpec) -> Result<ChartData> {
    let mut cells = Vec::with_capacity(rows.len());
    for row in rows {
        let (x, y) = (numeric(row, spec.x)?, numeric(row, spec.y)?);
        if !(x.is_finite() && y.is_finite()) {
            debug!("{}: dropping point ({x}, {y})", spec.name);
            continue;
        }
        cells.push((x, y, category(row, spec.hue)?, category(row, spec.style)?));
    }

    let hue_values = distinct(cells.iter().map(|c| c.2.clone()));
    let style_values = distinct(cells.iter().map(|c| c.3.clone()));

    let mut x_values: Vec<f64> = cells.iter().map(|c| c.0).collect();
    x_values.sort_by(f64::total_cmp);
    x_values.dedup();

    let mut series = Vec::new();
    for (hi, hue) in hue_values.iter().enumerate() {
        for (si, style) in style_values.iter().enumerate() {
            let mut points: Vec<(f64, f64)> = cells
                .iter()
                .filter(|c| &c.2 == hue && &c.3 == style)
                .map(|c| (c.0, c.1))
                .collect();
            if points.is_empty() {
                continue;
            }
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            series.push(Series {
                hue: hi,
                style: si,
                points,
            });
        }
    }

    Ok(ChartData {
        x_values,
        hue_values,
        style_values,
        series,
    })
}

pub fn chart_path(out_dir: &Path, name: &str) -> PathBuf {
    out_dir.join(format!("{name}.{IMAGE_EXTENSION}"))
}

struct Titles {
    x: &'static str,
    y: &'static str,
    hue: &'static str,
    /// `None` when style and hue are the same column.
    style: Option<&'static str>,
}

/// Linear f64 axis whose bold ticks sit exactly on the given values.
struct TickedAxis {
    inner: RangedCoordf64,
    ticks: Vec<f64>,
}

impl TickedAxis {
    fn new(range: Range<f64>, ticks: Vec<f64>) -> Self {
        Self {
            inner: range.into(),
            ticks,
        }
    }
}

impl Ranged for TickedAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if hint.weight().allow_light_points() {
            Vec::new()
        } else {
            self.ticks.clone()
        }
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

fn padded(lo: f64, hi: f64, frac: f64, min_pad: f64) -> (f64, f64) {
    let pad = ((hi - lo) * frac).max(min_pad);
    (lo - pad, hi + pad)
}

fn draw(path: &Path, titles: &Titles, data: &ChartData) -> Result<(), Box<dyn std::error::Error>> {
    let x_lo = data.x_values.first().copied().unwrap_or(0.0);
    let x_hi = data.x_values.last().copied().unwrap_or(1.0);
    let (x_lo, x_hi) = padded(x_lo, x_hi, 0.05, 0.5);

    let ys = data.series.iter().flat_map(|s| s.points.iter().map(|p| p.1));
    let (y_lo, y_hi) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    let (y_lo, y_hi) = padded(y_lo, y_hi, 0.05, (y_hi.abs() * 0.05).max(1e-3));

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(72)
        .build_cartesian_2d(TickedAxis::new(x_lo..x_hi, data.x_values.clone()), y_lo..y_hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(data.x_values.len())
        .x_label_formatter(&|v| v.to_string())
        .bold_line_style(BLACK.mix(0.25))
        .light_line_style(&WHITE)
        .x_desc(titles.x)
        .y_desc(titles.y)
        .draw()?;

    for s in &data.series {
        let color = color_for_index(s.hue);
        let line = color.stroke_width(2);
        match Dash::for_index(s.style) {
            Dash::Solid => {
                chart.draw_series(LineSeries::new(s.points.clone(), line))?;
            }
            Dash::Dashed => {
                chart.draw_series(DashedLineSeries::new(s.points.clone(), 8, 5, line))?;
            }
        }
        let outline = Marker::for_index(s.hue).outline(MARKER_RADIUS);
        chart.draw_series(
            s.points
                .iter()
                .map(|&p| EmptyElement::at(p) + Polygon::new(outline.clone(), color.filled())),
        )?;
    }

    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
        .label(titles.hue)
        .legend(|(x, y)| EmptyElement::at((x, y)));
    for (i, value) in data.hue_values.iter().enumerate() {
        let color = color_for_index(i);
        let outline: Vec<(i32, i32)> = Marker::for_index(i)
            .outline(MARKER_RADIUS)
            .into_iter()
            .map(|(dx, dy)| (dx + LEGEND_LEN / 2, dy))
            .collect();
        chart
            .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
            .label(value.to_string())
            .legend(move |(x, y)| {
                EmptyElement::at((x, y))
                    + PathElement::new(vec![(0, 0), (LEGEND_LEN, 0)], color.stroke_width(2))
                    + Polygon::new(outline.clone(), color.filled())
            });
    }

    if let Some(style_title) = titles.style {
        chart
            .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
            .label(style_title)
            .legend(|(x, y)| EmptyElement::at((x, y)));
        let color = color_for_index(0);
        for (i, value) in data.style_values.iter().enumerate() {
            let [a, b] = Dash::for_index(i).legend_segments();
            chart
                .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
                .label(value.to_string())
                .legend(move |(x, y)| {
                    EmptyElement::at((x, y))
                        + PathElement::new(a.clone(), color.stroke_width(2))
                        + PathElement::new(b.clone(), color.stroke_width(2))
                });
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .border_style(BLACK.mix(0.4))
        .background_style(WHITE.mix(0.8))
        .draw()?;
    root.present()?;
    Ok(())
}

/// Render `spec` over `rows` into `<out_dir>/<name>.svg`.
///
/// Returns `Ok(None)` without writing anything when no row can be plotted.
pub fn render_line_chart<R: Row>(
    rows: &[R],
    spec: &ChartSpec,
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    let titles = Titles {
        x: spec.x.title()?,
        y: spec.y.title()?,
        hue: spec.hue.title()?,
        style: if spec.style != spec.hue {
            Some(spec.style.title()?)
        } else {
            None
        },
    };

    let data = collect(rows, spec)?;
    if data.series.is_empty() {
        warn!("{}: no rows to plot, skipping", spec.name);
        return Ok(None);
    }
    debug!(
        "{}: {} series over x={:?}",
        spec.name,
        data.series.len(),
        data.x_values
    );

    fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;
    let path = chart_path(out_dir, &spec.name);
    draw(&path, &titles, &data).map_err(Error::plot)?;
    info!("saved figure to {}", path.display());
    Ok(Some(path))
}

/// Hand a saved figure to the platform opener and wait for the opener to exit.
/// Most openers return as soon as the viewer has been launched.
pub fn show(path: &Path) -> Result<()> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    let status = Command::new(opener)
        .arg(path)
        .status()
        .map_err(|e| Error::io(path, e))?;
    if !status.success() {
        warn!("{opener} exited with {status} for {}", path.display());
    }
    Ok(())
}
