use crate::api::*;
use crate::error::Result;
use crate::geometry::winding_number;
use crate::viewbox::Point;

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
const CURVE_SEGMENTS: usize = 16;
const ARC_SEGMENTS: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    BezierCurveTo {
        cp1x: f64,
        cp1y: f64,
        cp2x: f64,
        cp2y: f64,
        x: f64,
        y: f64,
    },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        ccw: bool,
    },
    Rect { x: f64, y: f64, w: f64, h: f64 },
    ClosePath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPath {
    pub commands: Vec<PathCommand>,
}

impl RecordedPath {
    pub fn new(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }

    /// Flattens the path into polygons in device space.
    pub fn flatten(&self, transform: [f64; 6]) -> Vec<Vec<Point>> {
        let mut polygons: Vec<Vec<Point>> = Vec::new();
        let mut current: Vec<Point> = Vec::new();
        let mut start: Option<Point> = None;
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo { x, y } => {
                    if current.len() > 1 {
                        polygons.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push([x, y]);
                    start = Some([x, y]);
                }
                PathCommand::LineTo { x, y } => current.push([x, y]),
                PathCommand::BezierCurveTo {
                    cp1x,
                    cp1y,
                    cp2x,
                    cp2y,
                    x,
                    y,
                } => {
                    let [x0, y0] = current.last().copied().unwrap_or([x, y]);
                    for i in 1..=CURVE_SEGMENTS {
                        let t = i as f64 / CURVE_SEGMENTS as f64;
                        let mt = 1.0 - t;
                        let a = mt * mt * mt;
                        let b = 3.0 * mt * mt * t;
                        let c = 3.0 * mt * t * t;
                        let d = t * t * t;
                        current.push([
                            a * x0 + b * cp1x + c * cp2x + d * x,
                            a * y0 + b * cp1y + c * cp2y + d * y,
                        ]);
                    }
                }
                PathCommand::Arc {
                    x,
                    y,
                    radius,
                    start_angle,
                    end_angle,
                    ccw,
                } => {
                    let mut sweep = end_angle - start_angle;
                    let full = std::f64::consts::TAU;
                    if !ccw && sweep < 0.0 {
                        sweep = (sweep % full) + full;
                    } else if ccw && sweep > 0.0 {
                        sweep = (sweep % full) - full;
                    }
                    if sweep.abs() > full {
                        sweep = full * sweep.signum();
                    }
                    for i in 0..=ARC_SEGMENTS {
                        let angle = start_angle + sweep * i as f64 / ARC_SEGMENTS as f64;
                        current.push([x + radius * angle.cos(), y + radius * angle.sin()]);
                    }
                }
                PathCommand::Rect { x, y, w, h } => {
                    if current.len() > 1 {
                        polygons.push(std::mem::take(&mut current));
                    }
                    polygons.push(vec![[x, y], [x + w, y], [x + w, y + h], [x, y + h]]);
                    current = vec![[x, y]];
                    start = Some([x, y]);
                }
                PathCommand::ClosePath => {
                    if current.len() > 1 {
                        polygons.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    if let Some(p) = start {
                        current.push(p);
                    }
                }
            }
        }
        if current.len() > 1 {
            polygons.push(current);
        }
        polygons
            .into_iter()
            .map(|poly| poly.into_iter().map(|p| apply_transform(transform, p)).collect())
            .collect()
    }
}

fn apply_transform(m: [f64; 6], [x, y]: Point) -> Point {
    let [a, b, c, d, e, f] = m;
    [a * x + c * y + e, b * x + d * y + f]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipState {
    pub path: RecordedPath,
    pub rule: FillRule,
    pub transform: [f64; 6],
}

impl ClipState {
    /// Whether a device-space point lies inside this clip region.
    pub fn contains(&self, point: Point) -> bool {
        let winding: i32 = self
            .path
            .flatten(self.transform)
            .iter()
            .map(|poly| winding_number(poly, point))
            .sum();
        match self.rule {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub global_alpha: f64,
    pub line_width: f64,
    pub line_dash: Vec<f64>,
    pub fill_style: String,
    pub stroke_style: String,
    pub transform: [f64; 6],
    /// Every clip in effect, outermost first; the visible region is their
    /// intersection.
    pub clips: Vec<ClipState>,
}

impl Snapshot {
    pub fn is_point_visible(&self, point: Point) -> bool {
        self.clips.iter().all(|clip| clip.contains(point))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillPath {
        path: RecordedPath,
        state: Snapshot,
        rule: FillRule,
    },
    StrokePath {
        path: RecordedPath,
        state: Snapshot,
    },
    Clip {
        path: RecordedPath,
        state: Snapshot,
        rule: FillRule,
    },
    ClearRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        state: Snapshot,
    },
}

#[derive(Clone, Debug)]
struct RecorderState {
    global_alpha: f64,
    line_width: f64,
    line_dash: Vec<f64>,
    fill_style: String,
    stroke_style: String,
    transform: [f64; 6],
    clips: Vec<ClipState>,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self {
            global_alpha: 1.0,
            line_width: 1.0,
            line_dash: Vec::new(),
            fill_style: "#000".to_string(),
            stroke_style: "#000".to_string(),
            transform: IDENTITY,
            clips: Vec::new(),
        }
    }
}

/// Records every drawing call with the state it was issued under. Used to
/// assert on raster output without a pixel back end.
pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
    state: RecorderState,
    stack: Vec<RecorderState>,
    current_path: Vec<PathCommand>,
    current_point: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            state: RecorderState::default(),
            stack: Vec::new(),
            current_path: Vec::new(),
            current_point: None,
            subpath_start: None,
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of unmatched save() calls.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            global_alpha: self.state.global_alpha,
            line_width: self.state.line_width,
            line_dash: self.state.line_dash.clone(),
            fill_style: self.state.fill_style.clone(),
            stroke_style: self.state.stroke_style.clone(),
            transform: self.state.transform,
            clips: self.state.clips.clone(),
        }
    }

    fn ensure_subpath(&mut self) -> Result<()> {
        if self.current_point.is_none() {
            self.move_to(0.0, 0.0)?;
        }
        Ok(())
    }

    fn set_current_point(&mut self, x: f64, y: f64) {
        self.current_point = Some((x, y));
    }

    fn multiply_transform(&mut self, m: [f64; 6]) {
        let [a, b, c, d, e, f] = self.state.transform;
        let [na, nb, nc, nd, ne, nf] = m;
        self.state.transform = [
            a * na + c * nb,
            b * na + d * nb,
            a * nc + c * nd,
            b * nc + d * nd,
            a * ne + c * nf + e,
            b * ne + d * nf + f,
        ];
    }

    fn push_path(&mut self, cmd: PathCommand) {
        self.current_path.push(cmd);
    }

    fn current(&self) -> RecordedPath {
        RecordedPath::new(self.current_path.clone())
    }

    fn record_op(&mut self, op: DrawOp) {
        self.ops.push(op);
    }
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasState for RecordingCanvas {
    fn save(&mut self) -> Result<()> {
        self.stack.push(self.state.clone());
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if let Some(state) = self.stack.pop() {
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

impl CanvasTransforms for RecordingCanvas {
    fn scale(&mut self, x: f64, y: f64) -> Result<()> {
        self.multiply_transform([x, 0.0, 0.0, y, 0.0, 0.0]);
        Ok(())
    }

    fn rotate(&mut self, radians: f64) -> Result<()> {
        let cos = radians.cos();
        let sin = radians.sin();
        self.multiply_transform([cos, sin, -sin, cos, 0.0, 0.0]);
        Ok(())
    }

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<()> {
        self.state.transform = [a, b, c, d, e, f];
        Ok(())
    }

    fn reset_transform(&mut self) -> Result<()> {
        self.state.transform = IDENTITY;
        Ok(())
    }
}

impl CanvasStyles for RecordingCanvas {
    fn set_line_width(&mut self, value: f64) -> Result<()> {
        self.state.line_width = value;
        Ok(())
    }

    fn line_width(&self) -> Result<f64> {
        Ok(self.state.line_width)
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<()> {
        self.state.line_dash = segments.to_vec();
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

impl CanvasRectangles for RecordingCanvas {
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        let op = DrawOp::ClearRect {
            x,
            y,
            w,
            h,
            state: self.snapshot(),
        };
        self.record_op(op);
        Ok(())
    }
}

impl CanvasPaths for RecordingCanvas {
    fn begin_path(&mut self) -> Result<()> {
        self.current_path.clear();
        self.current_point = None;
        self.subpath_start = None;
        Ok(())
    }

    fn close_path(&mut self) -> Result<()> {
        self.push_path(PathCommand::ClosePath);
        if let Some((x, y)) = self.subpath_start {
            self.set_current_point(x, y);
        }
        Ok(())
    }

    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.push_path(PathCommand::MoveTo { x, y });
        self.subpath_start = Some((x, y));
        self.set_current_point(x, y);
        Ok(())
    }

    fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        if self.current_point.is_none() {
            self.move_to(x, y)?;
        }
        self.push_path(PathCommand::LineTo { x, y });
        self.set_current_point(x, y);
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
        self.ensure_subpath()?;
        self.push_path(PathCommand::BezierCurveTo {
            cp1x,
            cp1y,
            cp2x,
            cp2y,
            x,
            y,
        });
        self.set_current_point(x, y);
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
        if self.subpath_start.is_none() {
            self.subpath_start = Some((x + radius * start_angle.cos(), y + radius * start_angle.sin()));
        }
        self.push_path(PathCommand::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            ccw,
        });
        self.set_current_point(x + radius * end_angle.cos(), y + radius * end_angle.sin());
        Ok(())
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        self.push_path(PathCommand::Rect { x, y, w, h });
        self.subpath_start = Some((x, y));
        self.set_current_point(x, y);
        Ok(())
    }

    // fill, stroke and clip leave the current path in place, as on a canvas.
    fn fill(&mut self, fill_rule: FillRule) -> Result<()> {
        if self.current_path.is_empty() {
            return Ok(());
        }
        let op = DrawOp::FillPath {
            path: self.current(),
            state: self.snapshot(),
            rule: fill_rule,
        };
        self.record_op(op);
        Ok(())
    }

    fn stroke(&mut self) -> Result<()> {
        if self.current_path.is_empty() {
            return Ok(());
        }
        let op = DrawOp::StrokePath {
            path: self.current(),
            state: self.snapshot(),
        };
        self.record_op(op);
        Ok(())
    }

    fn clip(&mut self, fill_rule: FillRule) -> Result<()> {
        let path = self.current();
        self.state.clips.push(ClipState {
            path: path.clone(),
            rule: fill_rule,
            transform: self.state.transform,
        });
        let op = DrawOp::Clip {
            path,
            state: self.snapshot(),
            rule: fill_rule,
        };
        self.record_op(op);
        Ok(())
    }
}

impl CanvasSnapshot for RecordingCanvas {
    /// A recording has no pixels to export.
    fn to_data_url(&self) -> Result<String> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_clip_and_fill_path() {
        let mut c = RecordingCanvas::new();
        c.begin_path().unwrap();
        c.move_to(0.0, 0.0).unwrap();
        c.line_to(10.0, 0.0).unwrap();
        c.line_to(10.0, 10.0).unwrap();
        c.clip(FillRule::EvenOdd).unwrap();

        c.begin_path().unwrap();
        c.rect(1.0, 1.0, 2.0, 2.0).unwrap();
        c.set_fill_style("#f00").unwrap();
        c.fill(FillRule::NonZero).unwrap();

        let ops = c.ops();
        assert_eq!(ops.len(), 2);

        match &ops[0] {
            DrawOp::Clip { path, rule, state } => {
                assert_eq!(*rule, FillRule::EvenOdd);
                assert_eq!(path.commands.len(), 3);
                assert_eq!(state.clips.len(), 1);
            }
            _ => panic!("unexpected op"),
        }

        match &ops[1] {
            DrawOp::FillPath { path, state, rule } => {
                assert_eq!(path.commands.len(), 1);
                assert_eq!(*rule, FillRule::NonZero);
                assert_eq!(state.fill_style, "#f00");
                assert!(state.is_point_visible([9.0, 1.0]));
                assert!(!state.is_point_visible([1.0, 9.0]));
            }
            _ => panic!("unexpected op"),
        }
    }

    #[test]
    fn records_transforms() {
        let mut c = RecordingCanvas::new();
        c.set_transform(1.0, 0.0, 0.0, 1.0, 5.0, 6.0).unwrap();
        c.scale(2.0, 3.0).unwrap();
        c.begin_path().unwrap();
        c.move_to(0.0, 0.0).unwrap();
        c.line_to(1.0, 1.0).unwrap();
        c.stroke().unwrap();

        match &c.ops()[0] {
            DrawOp::StrokePath { state, .. } => {
                assert_eq!(state.transform, [2.0, 0.0, 0.0, 3.0, 5.0, 6.0]);
            }
            _ => panic!("unexpected op"),
        }
    }

    #[test]
    fn restore_drops_clips_and_styles() {
        let mut c = RecordingCanvas::new();
        c.save().unwrap();
        c.set_global_alpha(0.5).unwrap();
        c.begin_path().unwrap();
        c.rect(0.0, 0.0, 5.0, 5.0).unwrap();
        c.clip(FillRule::NonZero).unwrap();
        assert_eq!(c.save_depth(), 1);
        c.restore().unwrap();

        let state = c.snapshot();
        assert_eq!(state.global_alpha, 1.0);
        assert!(state.clips.is_empty());
        assert_eq!(c.save_depth(), 0);
    }

    #[test]
    fn empty_clip_hides_everything() {
        let mut c = RecordingCanvas::new();
        c.begin_path().unwrap();
        c.clip(FillRule::NonZero).unwrap();
        assert!(!c.snapshot().is_point_visible([0.0, 0.0]));
    }

    #[test]
    fn flattens_scaled_rect_and_arc() {
        let path = RecordedPath::new(vec![PathCommand::Rect {
            x: 1.0,
            y: 1.0,
            w: 2.0,
            h: 2.0,
        }]);
        let polys = path.flatten([2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        assert_eq!(polys, vec![vec![[2.0, 2.0], [6.0, 2.0], [6.0, 6.0], [2.0, 6.0]]]);

        let circle = ClipState {
            path: RecordedPath::new(vec![PathCommand::Arc {
                x: 0.0,
                y: 0.0,
                radius: 10.0,
                start_angle: 0.0,
                end_angle: std::f64::consts::TAU,
                ccw: false,
            }]),
            rule: FillRule::NonZero,
            transform: IDENTITY,
        };
        assert!(circle.contains([3.0, 4.0]));
        assert!(!circle.contains([8.0, 8.0]));
    }

    #[test]
    fn exports_no_pixels() {
        assert_eq!(RecordingCanvas::new().to_data_url().unwrap(), "");
    }
}
