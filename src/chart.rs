//! The chart: owns configuration, the measured pixel box and the raster
//! target, and drives one render pass at a time.

use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::CanvasRenderingContext2D;
use crate::context::{ContextKey, RenderContext, Target};
use crate::error::{AxialError, Result};
use crate::queue::RasterTarget;
use crate::resize::{Debouncer, HeightSpec, pixel_box};
use crate::scale::{Gutter, Origin};
use crate::viewbox::{Viewbox, ViewboxInput, create_viewbox};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    #[default]
    Vector,
    Raster,
}

fn default_ss_width() -> f64 {
    300.0
}

fn default_height() -> f64 {
    150.0
}

fn default_resize_debounce_ms() -> u64 {
    100
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub view: ViewboxInput,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default)]
    pub gutter: Gutter,
    /// Width used before the container has been measured.
    #[serde(default = "default_ss_width")]
    pub ss_width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub mode: RenderMode,
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u64,
}

impl ChartConfig {
    pub fn new(view: impl Into<ViewboxInput>) -> Self {
        Self {
            view: view.into(),
            origin: Origin::default(),
            gutter: Gutter::default(),
            ss_width: default_ss_width(),
            height: default_height(),
            mode: RenderMode::default(),
            resize_debounce_ms: default_resize_debounce_ms(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_gutter(mut self, gutter: impl Into<Gutter>) -> Self {
        self.gutter = gutter.into();
        self
    }
}

/// The data-space view: fixed, or recomputed from the pixel width (e.g. to
/// keep a fixed data-units-per-pixel ratio).
#[derive(Clone)]
pub enum ViewSpec {
    Fixed(Viewbox),
    FromWidth(Rc<dyn Fn(f64) -> Viewbox>),
}

impl ViewSpec {
    pub fn resolve(&self, width: f64) -> Viewbox {
        match self {
            ViewSpec::Fixed(view) => *view,
            ViewSpec::FromWidth(f) => f(width),
        }
    }
}

impl fmt::Debug for ViewSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewSpec::Fixed(view) => f.debug_tuple("Fixed").field(view).finish(),
            ViewSpec::FromWidth(_) => f.write_str("FromWidth(..)"),
        }
    }
}

/// What a render pass produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// The complete SVG document.
    Vector(String),
    /// `flushed` is false when no surface was attached and the pass was dropped.
    Raster { flushed: bool },
    /// A render error was caught by [`Chart::render_guarded`].
    Fallback { message: String },
}

/// A chart drawing to raster surfaces of type `S` (only used in raster mode).
pub struct Chart<S: CanvasRenderingContext2D> {
    origin: Origin,
    gutter: Gutter,
    mode: RenderMode,
    view: ViewSpec,
    height: HeightSpec,
    px_box: Viewbox,
    context: Rc<RenderContext>,
    raster: RasterTarget<S>,
    resize: Debouncer<f64>,
}

impl<S: CanvasRenderingContext2D> Chart<S> {
    pub fn new(config: ChartConfig) -> Result<Self> {
        let view = create_viewbox(config.view)?;
        let height = HeightSpec::Fixed(config.height);
        let px_box = pixel_box(config.ss_width, &height);
        let context = RenderContext::new(view, px_box, config.gutter, config.origin);
        Ok(Self {
            origin: config.origin,
            gutter: config.gutter,
            mode: config.mode,
            view: ViewSpec::Fixed(view),
            height,
            px_box,
            context: Rc::new(context),
            raster: RasterTarget::new(),
            resize: Debouncer::new(Duration::from_millis(config.resize_debounce_ms)),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(ChartConfig::from_json(json)?)
    }

    pub fn with_height(mut self, height: HeightSpec) -> Self {
        self.height = height;
        self.set_width(self.px_box.width());
        self
    }

    pub fn with_view_fn<F>(mut self, view: F) -> Self
    where
        F: Fn(f64) -> Viewbox + 'static,
    {
        self.view = ViewSpec::FromWidth(Rc::new(view));
        self.refresh_context();
        self
    }

    pub fn set_view(&mut self, view: impl Into<ViewboxInput>) -> Result<()> {
        self.view = ViewSpec::Fixed(create_viewbox(view)?);
        self.refresh_context();
        Ok(())
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn px_box(&self) -> &Viewbox {
        &self.px_box
    }

    pub fn data_box(&self) -> &Viewbox {
        self.context.data_box()
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Applies a measured container width immediately.
    pub fn set_width(&mut self, width: f64) {
        self.px_box = pixel_box(width, &self.height);
        self.refresh_context();
    }

    /// Reports a measured container width through the resize debounce.
    /// `dpr` is re-sampled whenever a width is applied. Returns whether the
    /// pixel box changed now.
    pub fn resize(&mut self, width: f64, dpr: f64, now: Instant) -> bool {
        match self.resize.submit(width, now) {
            Some(width) => self.apply_resize(width, dpr),
            None => false,
        }
    }

    /// Applies the trailing width of a settled resize burst, if any.
    pub fn poll_resize(&mut self, dpr: f64, now: Instant) -> bool {
        match self.resize.poll(now) {
            Some(width) => self.apply_resize(width, dpr),
            None => false,
        }
    }

    fn apply_resize(&mut self, width: f64, dpr: f64) -> bool {
        self.raster.set_dpr(dpr);
        let before = self.px_box.hash();
        self.set_width(width);
        self.px_box.hash() != before
    }

    fn refresh_context(&mut self) {
        let data_box = self.view.resolve(self.px_box.width());
        let key = ContextKey::new(&data_box, &self.px_box, self.gutter, self.origin);
        if self.context.key() != key {
            debug!(data = %data_box, px = %self.px_box, "rebuilding render context");
            self.context = Rc::new(RenderContext::new(data_box, self.px_box, self.gutter, self.origin));
        }
    }

    /// Raster surface ready.
    pub fn attach_surface(&mut self, surface: S, dpr: f64) {
        self.raster.attach(surface, dpr);
    }

    /// Raster surface torn down.
    pub fn detach_surface(&mut self) -> Option<S> {
        self.raster.detach()
    }

    pub fn surface(&self) -> Option<&S> {
        self.raster.surface()
    }

    pub fn dpr(&self) -> f64 {
        self.raster.dpr()
    }

    /// Current raster image, or an empty string without a surface.
    pub fn snapshot(&self) -> Result<String> {
        self.raster.snapshot()
    }

    /// Runs one render pass. `draw` declares every primitive for the frame.
    pub fn render<F>(&mut self, draw: F) -> Result<Frame>
    where
        F: FnOnce(&RenderContext, &mut Target<'_>) -> Result<()>,
    {
        let ctx = Rc::clone(&self.context);
        match self.mode {
            RenderMode::Vector => self.render_vector(&ctx, draw),
            RenderMode::Raster => {
                let queue = self.raster.begin_pass();
                draw(&ctx, &mut Target::Raster(queue))?;
                let flushed = self.raster.commit(&self.px_box)?;
                Ok(Frame::Raster { flushed })
            }
        }
    }

    #[cfg(feature = "svg")]
    fn render_vector<F>(&self, ctx: &RenderContext, draw: F) -> Result<Frame>
    where
        F: FnOnce(&RenderContext, &mut Target<'_>) -> Result<()>,
    {
        use crate::backends::svg::SvgDocument;

        let mut doc = SvgDocument::new(Vec::new(), self.px_box.width(), self.px_box.height())?;
        draw(ctx, &mut Target::Vector(&mut doc))?;
        let bytes = doc.finish()?;
        let svg = String::from_utf8(bytes).map_err(|err| AxialError::Backend(Box::new(err)))?;
        Ok(Frame::Vector(svg))
    }

    #[cfg(not(feature = "svg"))]
    fn render_vector<F>(&self, ctx: &RenderContext, draw: F) -> Result<Frame>
    where
        F: FnOnce(&RenderContext, &mut Target<'_>) -> Result<()>,
    {
        draw(ctx, &mut Target::Inert)?;
        Ok(Frame::Vector(String::new()))
    }

    /// Like [`render`](Chart::render), but a failing pass is logged and
    /// replaced by a fallback frame instead of propagating.
    pub fn render_guarded<F>(&mut self, draw: F) -> Frame
    where
        F: FnOnce(&RenderContext, &mut Target<'_>) -> Result<()>,
    {
        match self.render(draw) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "chart render failed, showing fallback");
                Frame::Fallback {
                    message: err.to_string(),
                }
            }
        }
    }
}

#[cfg(all(test, feature = "svg"))]
mod tests {
    use super::*;
    use crate::backends::recording::{DrawOp, RecordingCanvas};
    use crate::clip::Clip;
    use crate::primitives::{Line, Primitive};

    type TestChart = Chart<RecordingCanvas>;

    fn line_pass(ctx: &RenderContext, target: &mut Target<'_>) -> Result<()> {
        Line::new(vec![[0.0, 0.0], [10.0, 10.0]]).draw(ctx, target)
    }

    fn clipped_pass(ctx: &RenderContext, target: &mut Target<'_>) -> Result<()> {
        Clip::new(vec![[0.0, 0.0], [5.0, 0.0], [5.0, 5.0]]).render(ctx, target, line_pass)
    }

    #[test]
    fn config_defaults_and_json() {
        let config = ChartConfig::from_json(r#"{"view": [0, 0, 10, 10]}"#).unwrap();
        assert_eq!(config.ss_width, 300.0);
        assert_eq!(config.height, 150.0);
        assert_eq!(config.origin, Origin::BottomLeft);
        assert_eq!(config.gutter, Gutter::default());
        assert_eq!(config.mode, RenderMode::Vector);
        assert_eq!(config.resize_debounce_ms, 100);

        let config = ChartConfig::from_json(
            r#"{"view": "0,0,5,5", "origin": "top-left", "gutter": [1, 2, 3, 4],
                "ssWidth": 640, "mode": "raster"}"#,
        )
        .unwrap();
        assert_eq!(config.origin, Origin::TopLeft);
        assert_eq!(config.gutter, Gutter::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(config.ss_width, 640.0);
        assert_eq!(config.mode, RenderMode::Raster);

        let err = ChartConfig::from_json(r#"{"origin": "top-left"}"#).unwrap_err();
        assert!(matches!(err, AxialError::Config { .. }));
    }

    #[test]
    fn invalid_view_fails_construction() {
        let err = TestChart::new(ChartConfig::new("0,0,10")).err().unwrap();
        assert!(matches!(err, AxialError::InvalidInput { .. }));
    }

    #[test]
    fn vector_pass_returns_document() {
        let mut chart = TestChart::new(ChartConfig::new([0.0, 0.0, 10.0, 10.0])).unwrap();
        match chart.render(line_pass).unwrap() {
            Frame::Vector(svg) => {
                assert!(svg.contains("viewBox=\"0 0 300 150\""));
                assert!(svg.contains("d=\"M0,150L300,0\""));
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn vector_clip_ids_restart_each_pass() {
        let mut chart = TestChart::new(ChartConfig::new([0.0, 0.0, 10.0, 10.0])).unwrap();
        let first = chart.render(clipped_pass).unwrap();
        let second = chart.render(clipped_pass).unwrap();
        assert_eq!(first, second);
        match first {
            Frame::Vector(svg) => assert!(svg.contains("url(#clip0)")),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn raster_pass_without_surface_is_dropped() {
        let config = ChartConfig::new([0.0, 0.0, 10.0, 10.0]).with_mode(RenderMode::Raster);
        let mut chart = TestChart::new(config).unwrap();
        assert_eq!(chart.render(line_pass).unwrap(), Frame::Raster { flushed: false });
        assert_eq!(chart.snapshot().unwrap(), "");
    }

    #[test]
    fn raster_pass_flushes_once_with_dpr() {
        let config = ChartConfig::new([0.0, 0.0, 10.0, 10.0]).with_mode(RenderMode::Raster);
        let mut chart = TestChart::new(config).unwrap();
        chart.attach_surface(RecordingCanvas::new(), 2.0);

        assert_eq!(chart.render(line_pass).unwrap(), Frame::Raster { flushed: true });
        let canvas = chart.surface().unwrap();
        let strokes: Vec<_> = canvas
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::StrokePath { state, .. } => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].transform, [2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        assert_eq!(chart.snapshot().unwrap(), "");

        let canvas = chart.detach_surface().unwrap();
        assert!(!canvas.ops().is_empty());
        assert_eq!(chart.render(line_pass).unwrap(), Frame::Raster { flushed: false });
    }

    #[test]
    fn context_is_reused_until_inputs_change() {
        let mut chart = TestChart::new(ChartConfig::new([0.0, 0.0, 10.0, 10.0])).unwrap();
        let before = Rc::clone(&chart.context);
        chart.set_width(300.0);
        assert!(Rc::ptr_eq(&before, &chart.context));

        chart.set_width(600.0);
        assert!(!Rc::ptr_eq(&before, &chart.context));
        assert_eq!(chart.px_box().hash(), "0,0,600,150");
        assert_eq!(chart.context().scale([10.0, 10.0]), [600.0, 0.0]);
    }

    #[test]
    fn view_and_height_follow_width() {
        let mut chart = TestChart::new(ChartConfig::new([0.0, 0.0, 1.0, 1.0]))
            .unwrap()
            .with_height(HeightSpec::from_width(|w| w / 2.0))
            .with_view_fn(|w| Viewbox::new(0.0, 0.0, w / 100.0, 1.0));
        assert_eq!(chart.px_box().hash(), "0,0,300,150");
        assert_eq!(chart.data_box().hash(), "0,0,3,1");

        chart.set_width(500.0);
        assert_eq!(chart.px_box().hash(), "0,0,500,250");
        assert_eq!(chart.data_box().hash(), "0,0,5,1");
    }

    #[test]
    fn resize_is_debounced_and_resamples_dpr() {
        let t0 = Instant::now();
        let mut chart = TestChart::new(ChartConfig::new([0.0, 0.0, 10.0, 10.0])).unwrap();
        assert!(chart.resize(400.0, 2.0, t0));
        assert_eq!(chart.dpr(), 2.0);
        assert!(!chart.resize(450.0, 3.0, t0 + Duration::from_millis(10)));
        assert_eq!(chart.px_box().width(), 400.0);
        assert!(chart.poll_resize(3.0, t0 + Duration::from_millis(200)));
        assert_eq!(chart.px_box().width(), 450.0);
        assert_eq!(chart.dpr(), 3.0);
    }

    #[test]
    fn guarded_render_falls_back() {
        let mut chart = TestChart::new(ChartConfig::new([0.0, 0.0, 10.0, 10.0])).unwrap();
        let frame = chart.render_guarded(|_, _| Err(AxialError::invalid_input("bad series")));
        match frame {
            Frame::Fallback { message } => assert!(message.contains("bad series")),
            other => panic!("unexpected frame {other:?}"),
        }
    }
}
