//! Figure composition: a pseudocolour mesh on a map, with coastlines,
//! graticule, colorbar and title.
//!
//! The map area ("axes") is drawn on its own transparent layer in pixel
//! coordinates and then laid over a white canvas that carries the frame,
//! labels, colorbar and title.

use super::colormap::{format_tick, Colormap, ColormapName, Normalize};
use super::projection::{wrap_longitude, MapExtent, MapProjection};
use super::text::TextRenderer;
use crate::io::coastline::{CoastlineResolution, Coastlines};
use crate::types::{GeoGrid, MaskedField, ZooError, ZooResult};
use image::{imageops, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_polygon_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use ndarray::{Array2, Zip};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const GRID_COLOR: Rgba<u8> = Rgba([40, 40, 40, 255]);
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

const TITLE_SIZE: f32 = 18.0;
const TITLE_LINE_HEIGHT: i32 = 22;
const LABEL_SIZE: f32 = 13.0;

const MARGIN_TOP: i32 = 10;
const MARGIN_LEFT: i32 = 56;
const MARGIN_RIGHT: i32 = 12;
const MARGIN_BOTTOM: i32 = 36;
const COLORBAR_GAP: i32 = 24;
const COLORBAR_WIDTH: i32 = 18;
const COLORBAR_LABELS: i32 = 64;
const COLORBAR_TICKS: usize = 6;

/// Graticule dots: pixels on, pixels off
const DOTS: (f64, f64) = (1.0, 3.0);

/// Evenly spaced graticule lines, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Graticule {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
    /// Label the lines along the left (parallels) or bottom (meridians) edge
    #[serde(default)]
    pub label: bool,
}

impl Graticule {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self {
            start,
            stop,
            step,
            label: false,
        }
    }

    pub fn labelled(mut self) -> Self {
        self.label = true;
        self
    }

    /// Line positions from `start` (included) towards `stop` (excluded)
    pub fn values(&self) -> Vec<f64> {
        if !self.start.is_finite() || !self.stop.is_finite() || !self.step.is_finite() {
            return Vec::new();
        }
        if self.step == 0.0 {
            return Vec::new();
        }
        let count = ((self.stop - self.start) / self.step).ceil();
        if count <= 0.0 {
            return Vec::new();
        }
        (0..count as usize)
            .map(|k| self.start + k as f64 * self.step)
            .collect()
    }
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

/// How one field is put on a map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSpec {
    pub projection: MapProjection,
    #[serde(default)]
    pub coastline: CoastlineResolution,
    pub parallels: Graticule,
    pub meridians: Graticule,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub colormap: ColormapName,
}

impl RenderSpec {
    pub fn new(
        projection: MapProjection,
        coastline: CoastlineResolution,
        parallels: Graticule,
        meridians: Graticule,
    ) -> Self {
        Self {
            projection,
            coastline,
            parallels,
            meridians,
            width: default_width(),
            height: default_height(),
            colormap: ColormapName::default(),
        }
    }
}

/// Everything drawn on one figure besides its [`RenderSpec`]
pub struct FigureInputs<'a> {
    pub field: &'a MaskedField,
    pub grid: &'a GeoGrid,
    pub title: &'a str,
    pub coastlines: Option<&'a Coastlines>,
    pub text: Option<&'a TextRenderer>,
}

/// Pixel placement of the map area and colorbar on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub axes_x: i32,
    pub axes_y: i32,
    pub axes_width: u32,
    pub axes_height: u32,
    pub colorbar_x: i32,
}

impl Layout {
    /// Fit the map extent, keeping its aspect ratio, below a title of
    /// `title_lines` lines and left of the colorbar
    pub fn compute(spec: &RenderSpec, title_lines: usize) -> ZooResult<Self> {
        let extent = spec.projection.extent();
        if !(extent.width() > 0.0 && extent.height() > 0.0) {
            return Err(ZooError::Render(format!(
                "Map extent {:?} is empty",
                extent
            )));
        }

        let top = MARGIN_TOP + TITLE_LINE_HEIGHT * title_lines as i32 + 8;
        let available_width = spec.width as i32
            - MARGIN_LEFT
            - MARGIN_RIGHT
            - COLORBAR_GAP
            - COLORBAR_WIDTH
            - COLORBAR_LABELS;
        let available_height = spec.height as i32 - top - MARGIN_BOTTOM;
        if available_width < 16 || available_height < 16 {
            return Err(ZooError::Render(format!(
                "Figure size {}x{} leaves no room for the map",
                spec.width, spec.height
            )));
        }

        let aspect = extent.width() / extent.height();
        let (width, height) = if available_width as f64 / available_height as f64 > aspect {
            ((available_height as f64 * aspect).round() as i32, available_height)
        } else {
            (available_width, (available_width as f64 / aspect).round() as i32)
        };
        let (width, height) = (width.max(1), height.max(1));

        let axes_x = MARGIN_LEFT + (available_width - width) / 2;
        let axes_y = top + (available_height - height) / 2;
        Ok(Self {
            axes_x,
            axes_y,
            axes_width: width as u32,
            axes_height: height as u32,
            colorbar_x: axes_x + width + COLORBAR_GAP,
        })
    }
}

/// Map coordinates to axes pixels
struct Plot {
    projection: MapProjection,
    extent: MapExtent,
    width: f64,
    height: f64,
}

impl Plot {
    fn new(projection: MapProjection, layout: &Layout) -> Self {
        Self {
            projection,
            extent: projection.extent(),
            width: layout.axes_width as f64,
            height: layout.axes_height as f64,
        }
    }

    fn to_pixel(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let (x, y) = self.projection.forward(lon, lat)?;
        let px = (x - self.extent.x_min) / self.extent.width() * self.width;
        let py = (self.extent.y_max - y) / self.extent.height() * self.height;
        (px.is_finite() && py.is_finite()).then_some((px, py))
    }

    /// Spans more than half the axes; such shapes wrap around the map seam
    fn wraps(&self, xs: &[f64], ys: &[f64]) -> bool {
        span(xs) > self.width / 2.0 || span(ys) > self.height / 2.0
    }

    /// Every point lies beyond the same edge
    fn outside(&self, xs: &[f64], ys: &[f64]) -> bool {
        xs.iter().all(|&x| x < 0.0)
            || xs.iter().all(|&x| x > self.width)
            || ys.iter().all(|&y| y < 0.0)
            || ys.iter().all(|&y| y > self.height)
    }
}

fn span(values: &[f64]) -> f64 {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    hi - lo
}

/// Render one field into an RGBA figure
pub fn render_figure(spec: &RenderSpec, inputs: &FigureInputs<'_>) -> ZooResult<RgbaImage> {
    inputs.grid.ensure_shape(inputs.field.dim())?;

    let layout = Layout::compute(spec, inputs.title.lines().count())?;
    let plot = Plot::new(spec.projection, &layout);
    let colormap = Colormap::named(spec.colormap);
    let norm = match Normalize::from_field(inputs.field) {
        Some(norm) => norm,
        None => {
            log::warn!("Every sample is masked, drawing an empty map");
            Normalize::new(0.0, 1.0)
        }
    };
    log::info!(
        "Rendering {}x{} figure, colour range [{}, {}]",
        spec.width,
        spec.height,
        norm.vmin,
        norm.vmax
    );

    let mut axes = RgbaImage::from_pixel(layout.axes_width, layout.axes_height, TRANSPARENT);
    let cells = draw_mesh(&mut axes, &plot, inputs.field, inputs.grid, &colormap, &norm);
    log::debug!("Drew {} mesh cells", cells);

    if let Some(coastlines) = inputs.coastlines {
        draw_coastlines(&mut axes, &plot, coastlines);
    }
    let parallel_labels = draw_parallels(&mut axes, &plot, &spec.parallels);
    let meridian_labels = draw_meridians(&mut axes, &plot, &spec.meridians);

    let mut figure = RgbaImage::from_pixel(spec.width, spec.height, WHITE);
    imageops::overlay(&mut figure, &axes, layout.axes_x as i64, layout.axes_y as i64);
    draw_hollow_rect_mut(
        &mut figure,
        Rect::at(layout.axes_x - 1, layout.axes_y - 1)
            .of_size(layout.axes_width + 2, layout.axes_height + 2),
        BLACK,
    );
    draw_colorbar(&mut figure, &layout, &colormap, &norm, inputs.text);

    if let Some(text) = inputs.text {
        let half = (LABEL_SIZE / 2.0) as i32;
        for (lat, y) in parallel_labels {
            text.draw_right(
                &mut figure,
                &format_latitude(lat),
                layout.axes_x - 6,
                layout.axes_y + y.round() as i32 - half,
                LABEL_SIZE,
                BLACK,
            );
        }
        for (lon, x) in meridian_labels {
            text.draw_centered(
                &mut figure,
                &format_longitude(lon),
                layout.axes_x + x.round() as i32,
                layout.axes_y + layout.axes_height as i32 + 6,
                LABEL_SIZE,
                BLACK,
            );
        }
        for (k, line) in inputs.title.lines().enumerate() {
            text.draw_centered(
                &mut figure,
                line,
                spec.width as i32 / 2,
                MARGIN_TOP + k as i32 * TITLE_LINE_HEIGHT,
                TITLE_SIZE,
                BLACK,
            );
        }
    } else if !inputs.title.is_empty() {
        log::debug!("No font, title omitted: {}", inputs.title);
    }

    Ok(figure)
}

/// Fill one quadrilateral per cell; returns the number of cells drawn
fn draw_mesh(
    axes: &mut RgbaImage,
    plot: &Plot,
    field: &MaskedField,
    grid: &GeoGrid,
    colormap: &Colormap,
    norm: &Normalize,
) -> usize {
    let (rows, cols) = field.dim();
    if rows < 2 || cols < 2 {
        log::warn!("Field {}x{} is too small for a mesh", rows, cols);
        return 0;
    }

    let mut corners: Array2<Option<(f64, f64)>> = Array2::from_elem((rows, cols), None);
    let zip = Zip::from(&mut corners)
        .and(&grid.longitude)
        .and(&grid.latitude);
    #[cfg(feature = "parallel")]
    zip.par_for_each(|corner, &lon, &lat| *corner = plot.to_pixel(lon, lat));
    #[cfg(not(feature = "parallel"))]
    zip.for_each(|corner, &lon, &lat| *corner = plot.to_pixel(lon, lat));

    let mut drawn = 0;
    for i in 0..rows - 1 {
        for j in 0..cols - 1 {
            let Some(value) = field.get(i, j) else {
                continue;
            };
            let quad = [
                corners[[i, j]],
                corners[[i + 1, j]],
                corners[[i + 1, j + 1]],
                corners[[i, j + 1]],
            ];
            let Some(quad) = collect_corners(quad) else {
                continue;
            };

            let xs = quad.map(|p| p.0);
            let ys = quad.map(|p| p.1);
            if plot.wraps(&xs, &ys) || plot.outside(&xs, &ys) {
                continue;
            }

            fill_quad(axes, &quad, colormap.sample(norm.fraction(value)));
            drawn += 1;
        }
    }
    drawn
}

fn collect_corners(quad: [Option<(f64, f64)>; 4]) -> Option<[(f64, f64); 4]> {
    Some([quad[0]?, quad[1]?, quad[2]?, quad[3]?])
}

fn fill_quad(image: &mut RgbaImage, quad: &[(f64, f64); 4], color: Rgba<u8>) {
    let mut points: Vec<Point<i32>> = Vec::with_capacity(4);
    for &(x, y) in quad {
        let point = Point::new(x.round() as i32, y.round() as i32);
        if points.last() != Some(&point) {
            points.push(point);
        }
    }
    // A closed outline must not repeat its first point
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    match points.as_slice() {
        [] => {}
        [p] => put_pixel(image, p.x, p.y, color),
        [a, b] => draw_line_segment_mut(
            image,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            color,
        ),
        _ => draw_polygon_mut(image, &points, color),
    }
}

fn put_pixel(image: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}

/// Draw a projected path, breaking it at unprojectable points and seams.
/// `dash` is (on, off) in pixels for dotted lines.
fn draw_path(
    image: &mut RgbaImage,
    plot: &Plot,
    path: &[Option<(f64, f64)>],
    color: Rgba<u8>,
    dash: Option<(f64, f64)>,
) {
    let mut travelled = 0.0;
    for pair in path.windows(2) {
        let (Some(a), Some(b)) = (pair[0], pair[1]) else {
            continue;
        };
        let xs = [a.0, b.0];
        let ys = [a.1, b.1];
        if plot.wraps(&xs, &ys) || plot.outside(&xs, &ys) {
            continue;
        }
        match dash {
            None => draw_line_segment_mut(
                image,
                (a.0 as f32, a.1 as f32),
                (b.0 as f32, b.1 as f32),
                color,
            ),
            Some(pattern) => draw_dashed(image, a, b, color, pattern, &mut travelled),
        }
    }
}

fn draw_dashed(
    image: &mut RgbaImage,
    a: (f64, f64),
    b: (f64, f64),
    color: Rgba<u8>,
    (on, off): (f64, f64),
    travelled: &mut f64,
) {
    let length = (b.0 - a.0).hypot(b.1 - a.1);
    if length == 0.0 {
        return;
    }
    let steps = length.ceil() as usize;
    for k in 0..=steps {
        let t = k as f64 / steps as f64;
        if (*travelled + t * length).rem_euclid(on + off) < on {
            let x = a.0 + t * (b.0 - a.0);
            let y = a.1 + t * (b.1 - a.1);
            put_pixel(image, x.round() as i32, y.round() as i32, color);
        }
    }
    *travelled += length;
}

fn draw_coastlines(axes: &mut RgbaImage, plot: &Plot, coastlines: &Coastlines) {
    let project = |line: &Vec<(f64, f64)>| -> Vec<Option<(f64, f64)>> {
        line.iter()
            .map(|&(lon, lat)| plot.to_pixel(lon, lat))
            .collect()
    };

    #[cfg(feature = "parallel")]
    let paths: Vec<_> = coastlines.lines().par_iter().map(project).collect();
    #[cfg(not(feature = "parallel"))]
    let paths: Vec<_> = coastlines.lines().iter().map(project).collect();

    for path in &paths {
        draw_path(axes, plot, path, BLACK, None);
    }
}

fn sample(start: f64, stop: f64, count: usize) -> impl Iterator<Item = f64> {
    let step = (stop - start) / (count - 1) as f64;
    (0..count).map(move |k| start + k as f64 * step)
}

/// Draw parallels; returns (latitude, y) where labelled lines meet the left edge
fn draw_parallels(axes: &mut RgbaImage, plot: &Plot, graticule: &Graticule) -> Vec<(f64, f64)> {
    let (west, east) = plot.projection.longitude_span();
    let mut labels = Vec::new();

    for lat in graticule.values() {
        let path: Vec<_> = sample(west, east, 721)
            .map(|lon| plot.to_pixel(lon, lat))
            .collect();
        draw_path(axes, plot, &path, GRID_COLOR, Some(DOTS));

        if graticule.label {
            if let Some(y) = crossing(&path, |p| p.0, |p| p.1, 0.0, plot.height) {
                labels.push((lat, y));
            }
        }
    }
    labels
}

/// Draw meridians; returns (longitude, x) where labelled lines meet the bottom edge
fn draw_meridians(axes: &mut RgbaImage, plot: &Plot, graticule: &Graticule) -> Vec<(f64, f64)> {
    let (south, north) = plot.projection.latitude_span();
    let mut labels = Vec::new();

    for lon in graticule.values() {
        let path: Vec<_> = sample(south, north, 361)
            .map(|lat| plot.to_pixel(lon, lat))
            .collect();
        draw_path(axes, plot, &path, GRID_COLOR, Some(DOTS));

        if graticule.label {
            let bottom = plot.height;
            if let Some(x) = crossing(&path, |p| p.1 - bottom, |p| p.0, 0.0, plot.width) {
                labels.push((lon, x));
            }
        }
    }
    labels
}

/// First point where `across` changes sign along the path, reported as the
/// interpolated `along` coordinate if it falls inside [lo, hi]
fn crossing<A, B>(path: &[Option<(f64, f64)>], across: A, along: B, lo: f64, hi: f64) -> Option<f64>
where
    A: Fn((f64, f64)) -> f64,
    B: Fn((f64, f64)) -> f64,
{
    path.windows(2).find_map(|pair| {
        let (a, b) = (pair[0]?, pair[1]?);
        let (da, db) = (across(a), across(b));
        if da * db > 0.0 || da == db {
            return None;
        }
        let t = da / (da - db);
        let position = along(a) + t * (along(b) - along(a));
        (position >= lo && position <= hi).then_some(position)
    })
}

fn draw_colorbar(
    figure: &mut RgbaImage,
    layout: &Layout,
    colormap: &Colormap,
    norm: &Normalize,
    text: Option<&TextRenderer>,
) {
    let x = layout.colorbar_x;
    let top = layout.axes_y;
    let height = layout.axes_height;

    for row in 0..height {
        let t = if height > 1 {
            1.0 - row as f64 / (height - 1) as f64
        } else {
            0.5
        };
        draw_filled_rect_mut(
            figure,
            Rect::at(x, top + row as i32).of_size(COLORBAR_WIDTH as u32, 1),
            colormap.sample(t),
        );
    }
    draw_hollow_rect_mut(
        figure,
        Rect::at(x - 1, top - 1).of_size(COLORBAR_WIDTH as u32 + 2, height + 2),
        BLACK,
    );

    let ticks = norm.ticks(COLORBAR_TICKS);
    let step = match ticks.as_slice() {
        [first, second, ..] => second - first,
        _ => norm.vmax - norm.vmin,
    };
    let right = (x + COLORBAR_WIDTH) as f32;
    for value in ticks {
        let y = top + ((1.0 - norm.fraction(value)) * (height.saturating_sub(1)) as f64).round() as i32;
        draw_line_segment_mut(figure, (right, y as f32), (right + 4.0, y as f32), BLACK);
        if let Some(text) = text {
            text.draw(
                figure,
                &format_tick(value, step),
                x + COLORBAR_WIDTH + 7,
                y - (LABEL_SIZE / 2.0) as i32,
                LABEL_SIZE,
                BLACK,
            );
        }
    }
}

fn format_degrees(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Graticule label for a latitude, e.g. `5°N`
pub fn format_latitude(lat: f64) -> String {
    let degrees = format_degrees(lat.abs());
    if lat > 0.0 {
        format!("{}°N", degrees)
    } else if lat < 0.0 {
        format!("{}°S", degrees)
    } else {
        "0°".to_string()
    }
}

/// Graticule label for a longitude, e.g. `80°W`
pub fn format_longitude(lon: f64) -> String {
    let lon = wrap_longitude(lon, -180.0);
    let degrees = format_degrees(lon.abs());
    if lon == -180.0 {
        "180°".to_string()
    } else if lon > 0.0 {
        format!("{}°E", degrees)
    } else if lon < 0.0 {
        format!("{}°W", degrees)
    } else {
        "0°".to_string()
    }
}

/// Write a figure as PNG, creating the parent directory if needed
pub fn save_png(image: &RgbaImage, path: &Path) -> ZooResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    image.save_with_format(path, ImageFormat::Png)?;
    log::info!("Saved {}", path.display());
    Ok(())
}
