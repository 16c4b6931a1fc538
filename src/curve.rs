//! Points-to-path interpolation. A curve traces a pixel-space polyline into
//! a [`PathSink`], which is either a raster surface (through [`CanvasSink`])
//! or an SVG path-data string ([`SvgPathData`]), so both back ends get the
//! same geometry from the same call.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::api::CanvasPaths;
use crate::error::Result;
use crate::geometry::format_number;
use crate::viewbox::Point;

pub trait PathSink {
    fn move_to(&mut self, x: f64, y: f64) -> Result<()>;
    fn line_to(&mut self, x: f64, y: f64) -> Result<()>;
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) -> Result<()>;
    fn close_path(&mut self) -> Result<()>;
}

/// Forwards path commands to a raster surface.
pub struct CanvasSink<'a, C: CanvasPaths + ?Sized>(pub &'a mut C);

impl<C: CanvasPaths + ?Sized> PathSink for CanvasSink<'_, C> {
    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.0.move_to(x, y)
    }

    fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.0.line_to(x, y)
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) -> Result<()> {
        self.0.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y)
    }

    fn close_path(&mut self) -> Result<()> {
        self.0.close_path()
    }
}

/// Accumulates an SVG `d` attribute, e.g. `M0,150L300,0`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SvgPathData {
    data: String,
}

impl SvgPathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn into_string(self) -> String {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends an elliptical arc with equal radii, e.g. `A5,5,0,1,1,-5,0`.
    pub fn arc_to(&mut self, radius: f64, large_arc: bool, sweep: bool, x: f64, y: f64) {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        self.push_command('A', &[radius, radius, 0.0, flag(large_arc), flag(sweep), x, y]);
    }

    fn push_command(&mut self, cmd: char, coords: &[f64]) {
        self.data.push(cmd);
        for (i, value) in coords.iter().enumerate() {
            if i > 0 {
                self.data.push(',');
            }
            self.data.push_str(&format_number(*value));
        }
    }
}

impl PathSink for SvgPathData {
    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.push_command('M', &[x, y]);
        Ok(())
    }

    fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.push_command('L', &[x, y]);
        Ok(())
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) -> Result<()> {
        self.push_command('C', &[cp1x, cp1y, cp2x, cp2y, x, y]);
        Ok(())
    }

    fn close_path(&mut self) -> Result<()> {
        self.data.push('Z');
        Ok(())
    }
}

/// Hook for interpolations not built in here (cardinal, natural, basis...).
pub trait CurveGenerator: fmt::Debug {
    /// Traces `points` into `sink`. Returns `false` when nothing was traced.
    fn trace(&self, points: &[Point], sink: &mut dyn PathSink) -> Result<bool>;
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Curve {
    #[default]
    Linear,
    /// Step halfway between consecutive points.
    StepMiddle,
    /// Vertical step at each point, then horizontal. Also accepts `"step"`.
    #[serde(alias = "step")]
    StepBefore,
    /// Horizontal step to each point, then vertical.
    StepAfter,
    #[serde(skip)]
    Custom(Rc<dyn CurveGenerator>),
}

impl Curve {
    pub fn trace(&self, points: &[Point], sink: &mut dyn PathSink) -> Result<bool> {
        match self {
            Curve::Linear => trace_linear(points, sink),
            Curve::StepMiddle => trace_step(points, 0.5, sink),
            Curve::StepBefore => trace_step(points, 0.0, sink),
            Curve::StepAfter => trace_step(points, 1.0, sink),
            Curve::Custom(generator) => generator.trace(points, sink),
        }
    }

    /// Path data for the vector back end, `None` when there is no path.
    pub fn to_svg_path(&self, points: &[Point]) -> Result<Option<String>> {
        let mut data = SvgPathData::new();
        if self.trace(points, &mut data)? && !data.is_empty() {
            Ok(Some(data.into_string()))
        } else {
            Ok(None)
        }
    }
}

fn trace_linear(points: &[Point], sink: &mut dyn PathSink) -> Result<bool> {
    let Some((first, rest)) = points.split_first() else {
        return Ok(false);
    };
    sink.move_to(first[0], first[1])?;
    for p in rest {
        sink.line_to(p[0], p[1])?;
    }
    if rest.is_empty() {
        sink.close_path()?;
    }
    Ok(true)
}

/// `t` places the vertical riser between consecutive x values: 0 puts it at
/// the previous point, 1 at the next.
fn trace_step(points: &[Point], t: f64, sink: &mut dyn PathSink) -> Result<bool> {
    let Some((first, rest)) = points.split_first() else {
        return Ok(false);
    };
    sink.move_to(first[0], first[1])?;
    let [mut prev_x, mut prev_y] = *first;
    for &[x, y] in rest {
        if t <= 0.0 {
            sink.line_to(prev_x, y)?;
            sink.line_to(x, y)?;
        } else {
            let riser = prev_x * (1.0 - t) + x * t;
            sink.line_to(riser, prev_y)?;
            sink.line_to(riser, y)?;
        }
        prev_x = x;
        prev_y = y;
    }
    if 0.0 < t && t < 1.0 && !rest.is_empty() {
        sink.line_to(prev_x, prev_y)?;
    }
    if rest.is_empty() {
        sink.close_path()?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg(curve: Curve, points: &[Point]) -> Option<String> {
        curve.to_svg_path(points).unwrap()
    }

    #[test]
    fn linear_path_data() {
        assert_eq!(
            svg(Curve::Linear, &[[0.0, 150.0], [300.0, 0.0]]).as_deref(),
            Some("M0,150L300,0")
        );
        assert_eq!(svg(Curve::Linear, &[[1.5, 2.0]]).as_deref(), Some("M1.5,2Z"));
        assert_eq!(svg(Curve::Linear, &[]), None);
    }

    #[test]
    fn step_variants() {
        let points = [[0.0, 0.0], [10.0, 10.0]];
        assert_eq!(
            svg(Curve::StepBefore, &points).as_deref(),
            Some("M0,0L0,10L10,10")
        );
        assert_eq!(
            svg(Curve::StepAfter, &points).as_deref(),
            Some("M0,0L10,0L10,10")
        );
        assert_eq!(
            svg(Curve::StepMiddle, &points).as_deref(),
            Some("M0,0L5,0L5,10L10,10")
        );
    }

    #[test]
    fn deserializes_curve_names() {
        let c: Curve = serde_json::from_str(r#""step""#).unwrap();
        assert!(matches!(c, Curve::StepBefore));
        let c: Curve = serde_json::from_str(r#""step-middle""#).unwrap();
        assert!(matches!(c, Curve::StepMiddle));
        let c: Curve = serde_json::from_str(r#""step-after""#).unwrap();
        assert!(matches!(c, Curve::StepAfter));
    }

    #[test]
    fn step_keyword_steps_before() {
        let c: Curve = serde_json::from_str(r#""step""#).unwrap();
        assert_eq!(
            svg(c, &[[0.0, 0.0], [10.0, 10.0]]).as_deref(),
            Some("M0,0L0,10L10,10")
        );
    }

    #[derive(Debug)]
    struct Reversed;

    impl CurveGenerator for Reversed {
        fn trace(&self, points: &[Point], sink: &mut dyn PathSink) -> Result<bool> {
            let reversed: Vec<Point> = points.iter().rev().copied().collect();
            Curve::Linear.trace(&reversed, sink)
        }
    }

    #[test]
    fn custom_generators_plug_in() {
        let curve = Curve::Custom(Rc::new(Reversed));
        assert_eq!(
            svg(curve, &[[0.0, 0.0], [1.0, 1.0]]).as_deref(),
            Some("M1,1L0,0")
        );
    }
}
