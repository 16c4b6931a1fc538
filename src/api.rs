//! The raster drawing surface, shaped after the HTML Canvas 2D context.
//! Only the calls the render queue, clip chain and primitives issue are
//! part of the contract; implement them for any immediate-mode back end.

use crate::error::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    /// The SVG `fill-rule` / `clip-rule` keyword.
    pub fn as_svg(&self) -> &'static str {
        match self {
            FillRule::NonZero => "nonzero",
            FillRule::EvenOdd => "evenodd",
        }
    }
}

pub trait CanvasState {
    /// Pushes transform, clip and style state. Mirrors save().
    fn save(&mut self) -> Result<()>;
    /// Pops the most recently saved state. Mirrors restore().
    fn restore(&mut self) -> Result<()>;

    /// Sets the alpha multiplier applied to all drawing. Mirrors globalAlpha.
    fn set_global_alpha(&mut self, value: f64) -> Result<()>;
    fn global_alpha(&self) -> Result<f64>;
}

pub trait CanvasTransforms {
    /// Multiplies the current transform by a scaling matrix. Mirrors scale().
    fn scale(&mut self, x: f64, y: f64) -> Result<()>;
    /// Rotates the current transform about the origin. Mirrors rotate().
    fn rotate(&mut self, radians: f64) -> Result<()>;
    /// Replaces the current transform. Mirrors setTransform().
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<()>;
    /// Resets the transform to identity. Mirrors resetTransform().
    fn reset_transform(&mut self) -> Result<()>;
}

pub trait CanvasStyles {
    fn set_line_width(&mut self, value: f64) -> Result<()>;
    fn line_width(&self) -> Result<f64>;

    /// Mirrors setLineDash(); an empty slice draws solid lines.
    fn set_line_dash(&mut self, segments: &[f64]) -> Result<()>;

    /// Sets a CSS color string used by fill(). Mirrors fillStyle.
    fn set_fill_style(&mut self, color: &str) -> Result<()>;
    /// Sets a CSS color string used by stroke(). Mirrors strokeStyle.
    fn set_stroke_style(&mut self, color: &str) -> Result<()>;
}

pub trait CanvasPaths {
    fn begin_path(&mut self) -> Result<()>;
    fn close_path(&mut self) -> Result<()>;
    fn move_to(&mut self, x: f64, y: f64) -> Result<()>;
    fn line_to(&mut self, x: f64, y: f64) -> Result<()>;
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) -> Result<()>;
    /// Adds a clockwise (or counter-clockwise) circular arc. Mirrors arc().
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, ccw: bool) -> Result<()>;
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()>;

    fn fill(&mut self, fill_rule: FillRule) -> Result<()>;
    fn stroke(&mut self) -> Result<()>;
    /// Intersects the clip region with the current path. Mirrors clip().
    fn clip(&mut self, fill_rule: FillRule) -> Result<()>;
}

pub trait CanvasRectangles {
    /// Clears the rectangle to full transparency. Mirrors clearRect().
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()>;
}

pub trait CanvasSnapshot {
    /// Current pixels as a `data:image/png;base64,...` URL, or an empty
    /// string when the surface has no pixels to export. Mirrors toDataURL().
    fn to_data_url(&self) -> Result<String>;
}

pub trait CanvasRenderingContext2D:
    CanvasState + CanvasTransforms + CanvasStyles + CanvasPaths + CanvasRectangles + CanvasSnapshot
{
}

impl<T> CanvasRenderingContext2D for T where
    T: CanvasState + CanvasTransforms + CanvasStyles + CanvasPaths + CanvasRectangles + CanvasSnapshot
{
}
