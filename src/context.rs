//! The per-pass render context and the two-way render target.

use crate::api::FillRule;
use crate::clip::ClipChain;
use crate::error::Result;
use crate::queue::RenderQueue;
use crate::scale::{Gutter, Origin, Scale};
use crate::viewbox::{Point, Viewbox};

/// Immutable state every primitive draws against. Threaded explicitly
/// through draw calls; nested regions derive a new context instead of
/// mutating this one.
#[derive(Clone, Debug)]
pub struct RenderContext {
    data_box: Viewbox,
    px_box: Viewbox,
    gutter: Gutter,
    origin: Origin,
    scale: Scale,
    clip: ClipChain,
}

/// Identifies the inputs a [`RenderContext`] was built from, so a chart
/// can reuse the previous context when nothing changed.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextKey {
    data_hash: String,
    px_hash: String,
    gutter: Gutter,
    origin: Origin,
}

impl ContextKey {
    pub fn new(data_box: &Viewbox, px_box: &Viewbox, gutter: Gutter, origin: Origin) -> Self {
        Self {
            data_hash: data_box.hash(),
            px_hash: px_box.hash(),
            gutter,
            origin,
        }
    }
}

impl RenderContext {
    pub fn new(data_box: Viewbox, px_box: Viewbox, gutter: Gutter, origin: Origin) -> Self {
        Self {
            data_box,
            px_box,
            gutter,
            origin,
            scale: Scale::new(&data_box, &px_box, gutter, origin),
            clip: ClipChain::root(),
        }
    }

    pub fn data_box(&self) -> &Viewbox {
        &self.data_box
    }

    pub fn px_box(&self) -> &Viewbox {
        &self.px_box
    }

    pub fn gutter(&self) -> Gutter {
        self.gutter
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn scale(&self, point: Point) -> Point {
        self.scale.scale(point)
    }

    pub fn reverse_scale(&self, point: Point) -> Point {
        self.scale.reverse_scale(point)
    }

    pub fn scale_pair(&self) -> &Scale {
        &self.scale
    }

    /// The innermost enclosing clip; the root chain clips nothing.
    pub fn clip(&self) -> &ClipChain {
        &self.clip
    }

    pub fn key(&self) -> ContextKey {
        ContextKey::new(&self.data_box, &self.px_box, self.gutter, self.origin)
    }

    pub fn with_clip(&self, clip: ClipChain) -> RenderContext {
        RenderContext {
            clip,
            ..self.clone()
        }
    }
}

/// The baseline used before a chart establishes a real context: unit boxes
/// at the origin, identity scale, no clip.
impl Default for RenderContext {
    fn default() -> Self {
        Self {
            data_box: Viewbox::default(),
            px_box: Viewbox::default(),
            gutter: Gutter::default(),
            origin: Origin::default(),
            scale: Scale::identity(),
            clip: ClipChain::root(),
        }
    }
}

/// Presentation attributes of a vector element, already resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementStyle {
    pub stroke: Option<String>,
    pub fill: Option<String>,
    pub stroke_width: f64,
    pub dash: Option<Vec<f64>>,
    pub opacity: f64,
    pub pointer_events: bool,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            stroke: Some("#000".to_string()),
            fill: None,
            stroke_width: 1.0,
            dash: None,
            opacity: 1.0,
            pointer_events: true,
        }
    }
}

/// Retained-mode output: elements are emitted as they are declared.
pub trait VectorSink {
    fn path(&mut self, d: &str, style: &ElementStyle) -> Result<()>;

    fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) -> Result<()>;

    /// Writes a clip-path definition for `d` and opens a group that
    /// references it. Returns the clip-path id. Close with [`end_group`].
    ///
    /// [`end_group`]: VectorSink::end_group
    fn begin_clip(&mut self, d: &str, rule: FillRule) -> Result<String>;

    fn begin_group(&mut self, transform: Option<&str>, pointer_events: bool) -> Result<()>;

    fn end_group(&mut self) -> Result<()>;
}

/// Where a render pass sends its output.
pub enum Target<'a> {
    /// Immediate mode: primitives enqueue draw closures for the flush.
    Raster(&'a mut RenderQueue),
    /// Retained mode: primitives emit elements directly.
    Vector(&'a mut dyn VectorSink),
    /// Accepts everything and draws nothing.
    Inert,
}

impl<'a> Target<'a> {
    /// The raster queue, or `None` in vector mode (emit vector output instead).
    pub fn queue(&mut self) -> Option<&mut RenderQueue> {
        match self {
            Target::Raster(queue) => Some(&mut **queue),
            _ => None,
        }
    }

    pub fn vector(&mut self) -> Option<&mut (dyn VectorSink + 'a)> {
        match self {
            Target::Vector(sink) => Some(&mut **sink),
            _ => None,
        }
    }

    pub fn is_raster(&self) -> bool {
        matches!(self, Target::Raster(_))
    }
}
