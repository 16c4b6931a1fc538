//! Drawable building blocks: data-space lines, pixel-space lines and point
//! symbols. Each draws to either back end through a [`Target`].

use std::f64::consts::{PI, TAU};
use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use tracing::trace;

use crate::api::{CanvasRenderingContext2D, FillRule};
use crate::context::{ElementStyle, RenderContext, Target, VectorSink};
use crate::curve::{CanvasSink, Curve, PathSink, SvgPathData};
use crate::error::Result;
use crate::geometry::{format_number, is_finite_point, radians_to_degrees};
use crate::queue::RenderQueue;
use crate::viewbox::Point;

/// Default symbol size; the drawn area is `size * 8` square pixels.
pub const DEFAULT_SYMBOL_SIZE: f64 = 5.0;

pub trait Primitive {
    fn draw_raster(&self, ctx: &RenderContext, queue: &mut RenderQueue) -> Result<()>;

    fn draw_vector(&self, ctx: &RenderContext, sink: &mut dyn VectorSink) -> Result<()>;

    fn draw(&self, ctx: &RenderContext, target: &mut Target<'_>) -> Result<()> {
        match target {
            Target::Raster(queue) => self.draw_raster(ctx, queue),
            Target::Vector(sink) => self.draw_vector(ctx, &mut **sink),
            Target::Inert => Ok(()),
        }
    }
}

/// Stroke dash pattern. Deserializes from `"solid"`, `"dashed"`, `"dotted"`
/// or an explicit segment list.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "DashRepr")]
pub enum Dash {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Custom(Vec<f64>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DashRepr {
    Named(DashName),
    Segments(Vec<f64>),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum DashName {
    Solid,
    Dashed,
    Dotted,
}

impl From<DashRepr> for Dash {
    fn from(repr: DashRepr) -> Self {
        match repr {
            DashRepr::Named(DashName::Solid) => Dash::Solid,
            DashRepr::Named(DashName::Dashed) => Dash::Dashed,
            DashRepr::Named(DashName::Dotted) => Dash::Dotted,
            DashRepr::Segments(segments) => Dash::Custom(segments),
        }
    }
}

impl Dash {
    /// Segment lengths, or `None` for a solid line.
    pub fn segments(&self) -> Option<Vec<f64>> {
        match self {
            Dash::Solid => None,
            Dash::Dashed => Some(vec![5.0, 5.0]),
            Dash::Dotted => Some(vec![1.0, 1.0]),
            Dash::Custom(segments) if segments.is_empty() => None,
            Dash::Custom(segments) => Some(segments.clone()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LineStyle {
    pub stroke: Option<String>,
    pub fill: Option<String>,
    pub stroke_width: f64,
    pub curve: Curve,
    pub dash: Dash,
    pub opacity: f64,
    pub pointer_events: bool,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            stroke: Some("#000".to_string()),
            fill: None,
            stroke_width: 1.0,
            curve: Curve::Linear,
            dash: Dash::Solid,
            opacity: 1.0,
            pointer_events: true,
        }
    }
}

impl LineStyle {
    fn element_style(&self) -> ElementStyle {
        ElementStyle {
            stroke: self.stroke.clone(),
            fill: self.fill.clone(),
            stroke_width: self.stroke_width,
            dash: self.dash.segments(),
            opacity: self.opacity,
            pointer_events: self.pointer_events,
        }
    }
}

fn paint_path(surface: &mut dyn CanvasRenderingContext2D, style: &LineStyle) -> Result<()> {
    surface.set_global_alpha(style.opacity)?;
    if let Some(stroke) = &style.stroke {
        if style.stroke_width > 0.0 {
            surface.set_stroke_style(stroke)?;
            surface.set_line_width(style.stroke_width)?;
            surface.set_line_dash(&style.dash.segments().unwrap_or_default())?;
            surface.stroke()?;
        }
    }
    if let Some(fill) = &style.fill {
        surface.set_fill_style(fill)?;
        surface.fill(FillRule::NonZero)?;
    }
    Ok(())
}

/// A polyline already in pixel coordinates.
#[derive(Clone, Debug)]
pub struct PxLine {
    pub path: Vec<Point>,
    pub style: LineStyle,
}

impl PxLine {
    pub fn new(path: Vec<Point>) -> Self {
        Self {
            path,
            style: LineStyle::default(),
        }
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    fn drawable(&self) -> bool {
        if self.path.iter().all(is_finite_point) {
            true
        } else {
            trace!(points = self.path.len(), "skipping line with non-finite coordinates");
            false
        }
    }
}

impl Primitive for PxLine {
    fn draw_raster(&self, ctx: &RenderContext, queue: &mut RenderQueue) -> Result<()> {
        if self.path.is_empty() || !self.drawable() {
            return Ok(());
        }
        let path = self.path.clone();
        let style = self.style.clone();
        queue.push(ctx.clip().clone(), move |surface, _dpr| {
            surface.begin_path()?;
            style.curve.trace(&path, &mut CanvasSink(&mut *surface))?;
            paint_path(surface, &style)
        });
        Ok(())
    }

    fn draw_vector(&self, _ctx: &RenderContext, sink: &mut dyn VectorSink) -> Result<()> {
        if !self.drawable() {
            return Ok(());
        }
        match self.style.curve.to_svg_path(&self.path)? {
            Some(d) => sink.path(&d, &self.style.element_style()),
            None => Ok(()),
        }
    }
}

/// A polyline in data coordinates, scaled through the context on draw.
#[derive(Clone, Debug)]
pub struct Line {
    pub path: Vec<Point>,
    pub style: LineStyle,
}

impl Line {
    pub fn new(path: Vec<Point>) -> Self {
        Self {
            path,
            style: LineStyle::default(),
        }
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    fn to_px(&self, ctx: &RenderContext) -> PxLine {
        PxLine {
            path: self.path.iter().map(|p| ctx.scale(*p)).collect(),
            style: self.style.clone(),
        }
    }
}

impl Primitive for Line {
    fn draw_raster(&self, ctx: &RenderContext, queue: &mut RenderQueue) -> Result<()> {
        self.to_px(ctx).draw_raster(ctx, queue)
    }

    fn draw_vector(&self, ctx: &RenderContext, sink: &mut dyn VectorSink) -> Result<()> {
        self.to_px(ctx).draw_vector(ctx, sink)
    }
}

/// A pixel-space shape anchored at a data-space position, e.g. a marker
/// that keeps its size while the chart zooms.
#[derive(Clone, Debug)]
pub struct TranslatedLine {
    pub position: Point,
    pub path: Vec<Point>,
    pub style: LineStyle,
}

impl TranslatedLine {
    pub fn new(position: Point, path: Vec<Point>) -> Self {
        Self {
            position,
            path,
            style: LineStyle::default(),
        }
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    fn to_px(&self, ctx: &RenderContext) -> PxLine {
        let [ox, oy] = ctx.scale(self.position);
        PxLine {
            path: self.path.iter().map(|[x, y]| [x + ox, y + oy]).collect(),
            style: self.style.clone(),
        }
    }
}

impl Primitive for TranslatedLine {
    fn draw_raster(&self, ctx: &RenderContext, queue: &mut RenderQueue) -> Result<()> {
        self.to_px(ctx).draw_raster(ctx, queue)
    }

    fn draw_vector(&self, ctx: &RenderContext, sink: &mut dyn VectorSink) -> Result<()> {
        self.to_px(ctx).draw_vector(ctx, sink)
    }
}

/// Hook for symbol shapes not built in here. Traces an outline centred on
/// the origin that covers `area` square pixels.
pub trait SymbolGenerator: fmt::Debug {
    fn trace(&self, area: f64, sink: &mut dyn PathSink) -> Result<()>;
}

/// Symbol outlines, with the same geometry as the d3-shape symbol types.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolShape {
    #[default]
    Circle,
    Cross,
    Diamond,
    Square,
    Star,
    Triangle,
    Wye,
    /// Draws nothing.
    None,
    #[serde(skip)]
    Custom(Rc<dyn SymbolGenerator>),
}

const SQRT3: f64 = 1.732_050_807_568_877_2;
const TAN30: f64 = 0.577_350_269_189_625_8;
// area of a unit-radius star, inverted
const STAR_KA: f64 = 0.890_813_091_529_285_2;

impl SymbolShape {
    /// Traces the shape centred on the origin with the given area.
    fn trace(&self, area: f64, sink: &mut dyn ShapeSink) -> Result<bool> {
        match self {
            SymbolShape::Circle => sink.circle((area / PI).sqrt())?,
            SymbolShape::Cross => {
                let r = (area / 5.0).sqrt() / 2.0;
                polygon(
                    sink,
                    &[
                        [-3.0 * r, -r],
                        [-r, -r],
                        [-r, -3.0 * r],
                        [r, -3.0 * r],
                        [r, -r],
                        [3.0 * r, -r],
                        [3.0 * r, r],
                        [r, r],
                        [r, 3.0 * r],
                        [-r, 3.0 * r],
                        [-r, r],
                        [-3.0 * r, r],
                    ],
                )?
            }
            SymbolShape::Diamond => {
                let y = (area / (TAN30 * 2.0)).sqrt();
                let x = y * TAN30;
                polygon(sink, &[[0.0, -y], [x, 0.0], [0.0, y], [-x, 0.0]])?
            }
            SymbolShape::Square => {
                let h = area.sqrt() / 2.0;
                polygon(sink, &[[-h, -h], [h, -h], [h, h], [-h, h]])?
            }
            SymbolShape::Star => polygon(sink, &star_points(area))?,
            SymbolShape::Triangle => {
                let y = -(area / (SQRT3 * 3.0)).sqrt();
                polygon(sink, &[[0.0, y * 2.0], [-SQRT3 * y, -y], [SQRT3 * y, -y]])?
            }
            SymbolShape::Wye => polygon(sink, &wye_points(area))?,
            SymbolShape::None => return Ok(false),
            SymbolShape::Custom(generator) => generator.trace(area, sink.as_path_sink())?,
        }
        Ok(true)
    }
}

fn polygon(sink: &mut dyn ShapeSink, points: &[Point]) -> Result<()> {
    let Some((first, rest)) = points.split_first() else {
        return Ok(());
    };
    sink.move_to(first[0], first[1])?;
    for p in rest {
        sink.line_to(p[0], p[1])?;
    }
    sink.close_path()
}

fn star_points(area: f64) -> Vec<Point> {
    let kr = (PI / 10.0).sin() / (7.0 * PI / 10.0).sin();
    let kx = (TAU / 10.0).sin() * kr;
    let ky = -(TAU / 10.0).cos() * kr;
    let r = (area * STAR_KA).sqrt();
    let (x, y) = (kx * r, ky * r);

    let mut points = vec![[0.0, -r], [x, y]];
    for i in 1..5 {
        let a = TAU * i as f64 / 5.0;
        let (s, c) = a.sin_cos();
        points.push([s * r, -c * r]);
        points.push([c * x - s * y, s * x + c * y]);
    }
    points
}

fn wye_points(area: f64) -> Vec<Point> {
    let (c, s) = (-0.5, SQRT3 / 2.0);
    let k = 1.0 / 12f64.sqrt();
    let r = (area / ((k / 2.0 + 1.0) * 3.0)).sqrt();
    let (x0, y0) = (r / 2.0, r * k);
    let (x1, y1) = (x0, r * k + r);
    let (x2, y2) = (-x1, y1);
    vec![
        [x0, y0],
        [x1, y1],
        [x2, y2],
        [c * x0 - s * y0, s * x0 + c * y0],
        [c * x1 - s * y1, s * x1 + c * y1],
        [c * x2 - s * y2, s * x2 + c * y2],
        [c * x0 + s * y0, c * y0 - s * x0],
        [c * x1 + s * y1, c * y1 - s * x1],
        [c * x2 + s * y2, c * y2 - s * x2],
    ]
}

/// A [`PathSink`] that can also draw full circles.
trait ShapeSink: PathSink {
    fn circle(&mut self, r: f64) -> Result<()>;

    fn as_path_sink(&mut self) -> &mut dyn PathSink;
}

impl ShapeSink for SvgPathData {
    fn circle(&mut self, r: f64) -> Result<()> {
        self.move_to(r, 0.0)?;
        self.arc_to(r, true, true, -r, 0.0);
        self.arc_to(r, true, true, r, 0.0);
        Ok(())
    }

    fn as_path_sink(&mut self) -> &mut dyn PathSink {
        self
    }
}

impl<C: CanvasRenderingContext2D + ?Sized> ShapeSink for CanvasSink<'_, C> {
    fn circle(&mut self, r: f64) -> Result<()> {
        self.0.move_to(r, 0.0)?;
        self.0.arc(0.0, 0.0, r, 0.0, TAU, false)
    }

    fn as_path_sink(&mut self) -> &mut dyn PathSink {
        self
    }
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub point: Point,
    pub size: f64,
    pub shape: SymbolShape,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub fill: Option<String>,
    /// Radians.
    pub rotation: f64,
    pub opacity: f64,
    /// Pixel offset applied after scaling.
    pub px_offset: Point,
    /// Radius of an invisible hit target drawn under the symbol (vector only).
    pub quiet_render_radius: f64,
    pub pointer_events: bool,
}

impl Symbol {
    pub fn new(point: Point) -> Self {
        Self {
            point,
            size: DEFAULT_SYMBOL_SIZE,
            shape: SymbolShape::Circle,
            stroke: Some("#000".to_string()),
            stroke_width: 1.0,
            fill: None,
            rotation: 0.0,
            opacity: 1.0,
            px_offset: [0.0, 0.0],
            quiet_render_radius: 0.0,
            pointer_events: true,
        }
    }

    pub fn with_shape(mut self, shape: SymbolShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn area(&self) -> f64 {
        self.size * 8.0
    }

    /// Pixel position, or `None` when the symbol should not draw.
    fn px_position(&self, ctx: &RenderContext) -> Option<Point> {
        if matches!(self.shape, SymbolShape::None) {
            return None;
        }
        let [x, y] = ctx.scale(self.point);
        let position = [x + self.px_offset[0], y + self.px_offset[1]];
        if is_finite_point(&position) {
            Some(position)
        } else {
            trace!(?position, "skipping symbol with non-finite position");
            None
        }
    }

    fn line_style(&self) -> LineStyle {
        LineStyle {
            stroke: self.stroke.clone(),
            fill: self.fill.clone(),
            stroke_width: self.stroke_width,
            opacity: self.opacity,
            pointer_events: self.pointer_events,
            ..LineStyle::default()
        }
    }
}

impl Primitive for Symbol {
    fn draw_raster(&self, ctx: &RenderContext, queue: &mut RenderQueue) -> Result<()> {
        let Some([x, y]) = self.px_position(ctx) else {
            return Ok(());
        };
        let shape = self.shape.clone();
        let area = self.area();
        let rotation = self.rotation;
        let style = self.line_style();
        queue.push(ctx.clip().clone(), move |surface, dpr| {
            surface.set_transform(dpr, 0.0, 0.0, dpr, x * dpr, y * dpr)?;
            surface.rotate(rotation)?;
            surface.begin_path()?;
            shape.trace(area, &mut CanvasSink(&mut *surface))?;
            paint_path(surface, &style)
        });
        Ok(())
    }

    fn draw_vector(&self, ctx: &RenderContext, sink: &mut dyn VectorSink) -> Result<()> {
        let Some([x, y]) = self.px_position(ctx) else {
            return Ok(());
        };
        let mut data = SvgPathData::new();
        if !self.shape.trace(self.area(), &mut data)? {
            return Ok(());
        }
        let transform = format!(
            "translate({}, {}) rotate({})",
            format_number(x),
            format_number(y),
            format_number(radians_to_degrees(self.rotation))
        );
        sink.begin_group(Some(&transform), self.pointer_events)?;
        if self.quiet_render_radius > 0.0 {
            sink.circle(0.0, 0.0, self.quiet_render_radius, "transparent")?;
        }
        sink.path(data.as_str(), &self.line_style().element_style())?;
        sink.end_group()
    }
}
