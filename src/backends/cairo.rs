//! Cairo backend implementing the raster surface traits behind the optional
//! `cairo` crate feature.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use cairo::{Context, FillRule as CairoFillRule, Format, ImageSurface, Operator};

use crate::api::*;
use crate::error::{AxialError, Result};

/// Canvas state cairo does not track itself; saved alongside `ctx.save()`.
#[derive(Clone, Debug)]
struct PaintState {
    fill_style: String,
    stroke_style: String,
    global_alpha: f64,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            fill_style: "#000000".into(),
            stroke_style: "#000000".into(),
            global_alpha: 1.0,
        }
    }
}

/// Adapter that translates surface calls into Cairo operations.
pub struct CairoCanvas {
    ctx: Context,
    state: PaintState,
    stack: Vec<PaintState>,
}

impl CairoCanvas {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            state: PaintState::default(),
            stack: Vec::new(),
        }
    }

    /// A canvas backed by a fresh ARGB image of the given device-pixel size.
    pub fn image(width: i32, height: i32) -> Result<Self> {
        let surface = ImageSurface::create(Format::ARgb32, width, height)?;
        let ctx = Context::new(&surface)?;
        Ok(Self::new(ctx))
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    fn apply_color(&self, color: &str) {
        let (r, g, b, a) = parse_color(color);
        self.ctx.set_source_rgba(r, g, b, a * self.state.global_alpha);
    }
}

impl CanvasState for CairoCanvas {
    fn save(&mut self) -> Result<()> {
        self.ctx.save()?;
        self.stack.push(self.state.clone());
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if let Some(state) = self.stack.pop() {
            self.ctx.restore()?;
            self.state = state;
        }
        Ok(())
    }

    fn set_global_alpha(&mut self, value: f64) -> Result<()> {
        self.state.global_alpha = value;
        Ok(())
    }

    fn global_alpha(&self) -> Result<f64> {
        Ok(self.state.global_alpha)
    }
}

impl CanvasTransforms for CairoCanvas {
    fn scale(&mut self, x: f64, y: f64) -> Result<()> {
        self.ctx.scale(x, y);
        Ok(())
    }

    fn rotate(&mut self, radians: f64) -> Result<()> {
        self.ctx.rotate(radians);
        Ok(())
    }

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<()> {
        let matrix = cairo::Matrix::new(a, b, c, d, e, f);
        self.ctx.set_matrix(matrix);
        Ok(())
    }

    fn reset_transform(&mut self) -> Result<()> {
        self.ctx.identity_matrix();
        Ok(())
    }
}

impl CanvasStyles for CairoCanvas {
    fn set_line_width(&mut self, value: f64) -> Result<()> {
        self.ctx.set_line_width(value);
        Ok(())
    }

    fn line_width(&self) -> Result<f64> {
        Ok(self.ctx.line_width())
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<()> {
        self.ctx.set_dash(segments, 0.0);
        Ok(())
    }

    fn set_fill_style(&mut self, color: &str) -> Result<()> {
        self.state.fill_style = color.to_string();
        Ok(())
    }

    fn set_stroke_style(&mut self, color: &str) -> Result<()> {
        self.state.stroke_style = color.to_string();
        Ok(())
    }
}

impl CanvasRectangles for CairoCanvas {
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        self.ctx.save()?;
        self.ctx.new_path();
        self.ctx.rectangle(x, y, w, h);
        self.ctx.set_operator(Operator::Clear);
        self.ctx.fill()?;
        self.ctx.restore()?;
        Ok(())
    }
}

// fill, stroke and clip keep the current path until the next begin_path,
// matching canvas semantics.
impl CanvasPaths for CairoCanvas {
    fn begin_path(&mut self) -> Result<()> {
        self.ctx.new_path();
        Ok(())
    }

    fn close_path(&mut self) -> Result<()> {
        self.ctx.close_path();
        Ok(())
    }

    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.ctx.move_to(x, y);
        Ok(())
    }

    fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.ctx.line_to(x, y);
        Ok(())
    }

    fn bezier_curve_to(
        &mut self,
        cp1x: f64,
        cp1y: f64,
        cp2x: f64,
        cp2y: f64,
        x: f64,
        y: f64,
    ) -> Result<()> {
        self.ctx.curve_to(cp1x, cp1y, cp2x, cp2y, x, y);
        Ok(())
    }

    fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        ccw: bool,
    ) -> Result<()> {
        if ccw {
            self.ctx.arc_negative(x, y, radius, start_angle, end_angle);
        } else {
            self.ctx.arc(x, y, radius, start_angle, end_angle);
        }
        Ok(())
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        self.ctx.rectangle(x, y, w, h);
        Ok(())
    }

    fn fill(&mut self, fill_rule: FillRule) -> Result<()> {
        self.ctx.set_fill_rule(map_fill_rule(fill_rule));
        self.apply_color(&self.state.fill_style);
        self.ctx.fill_preserve()?;
        Ok(())
    }

    fn stroke(&mut self) -> Result<()> {
        self.apply_color(&self.state.stroke_style);
        self.ctx.stroke_preserve()?;
        Ok(())
    }

    fn clip(&mut self, fill_rule: FillRule) -> Result<()> {
        self.ctx.set_fill_rule(map_fill_rule(fill_rule));
        self.ctx.clip_preserve();
        Ok(())
    }
}

impl CanvasSnapshot for CairoCanvas {
    fn to_data_url(&self) -> Result<String> {
        let target = self.ctx.target();
        target.flush();
        let image = ImageSurface::try_from(target).map_err(|_| {
            AxialError::Backend(Box::new(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "cairo target is not an image surface",
            )))
        })?;
        let mut png_bytes = Vec::new();
        image.write_to_png(&mut png_bytes)?;

        let encoded = BASE64_STANDARD.encode(png_bytes);
        Ok(format!("data:image/png;base64,{}", encoded))
    }
}

fn map_fill_rule(rule: FillRule) -> CairoFillRule {
    match rule {
        FillRule::NonZero => CairoFillRule::Winding,
        FillRule::EvenOdd => CairoFillRule::EvenOdd,
    }
}

/// `#rgb`, `#rrggbb`, `#rrggbbaa` and `transparent`; anything else is black.
fn parse_color(color: &str) -> (f64, f64, f64, f64) {
    let c = color.trim();
    if c == "transparent" {
        return (0.0, 0.0, 0.0, 0.0);
    }
    if let Some(hex) = c.strip_prefix('#').filter(|h| h.is_ascii()) {
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0) as f64 / 255.0;
        match hex.len() {
            3 => {
                let short = |i: usize| {
                    let digit = &hex[i..i + 1];
                    channel(&format!("{digit}{digit}"))
                };
                return (short(0), short(1), short(2), 1.0);
            }
            6 => return (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6]), 1.0),
            8 => {
                return (
                    channel(&hex[0..2]),
                    channel(&hex[2..4]),
                    channel(&hex[4..6]),
                    channel(&hex[6..8]),
                );
            }
            _ => {}
        }
    }

    // Fallback to opaque black if parsing fails.
    (0.0, 0.0, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("#000"), (0.0, 0.0, 0.0, 1.0));
        assert_eq!(parse_color("#ff0000"), (1.0, 0.0, 0.0, 1.0));
        assert_eq!(parse_color("#ffffff00"), (1.0, 1.0, 1.0, 0.0));
        assert_eq!(parse_color("transparent").3, 0.0);
        assert_eq!(parse_color("steelblue"), (0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn restore_brings_back_paint_state() {
        let mut canvas = CairoCanvas::image(10, 10).unwrap();
        canvas.save().unwrap();
        canvas.set_global_alpha(0.3).unwrap();
        canvas.set_line_width(4.0).unwrap();
        canvas.restore().unwrap();
        assert_eq!(canvas.global_alpha().unwrap(), 1.0);
        assert_eq!(canvas.line_width().unwrap(), 2.0);
    }

    #[test]
    fn exports_png_data_url() {
        let mut canvas = CairoCanvas::image(8, 8).unwrap();
        canvas.begin_path().unwrap();
        canvas.rect(0.0, 0.0, 4.0, 4.0).unwrap();
        canvas.set_fill_style("#f00").unwrap();
        canvas.fill(FillRule::NonZero).unwrap();
        let url = canvas.to_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert!(url.len() > "data:image/png;base64,".len());
    }
}
