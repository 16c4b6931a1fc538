//! Core of a declarative charting runtime: data-space viewboxes, scales,
//! a clip-aware raster render queue and an SVG vector back end, plus
//! pointer and resize plumbing. Widgets describe primitives against a
//! [`RenderContext`]; the [`Chart`] decides whether they become SVG elements
//! or queued canvas draw calls.

pub mod api;
pub mod chart;
pub mod clip;
pub mod context;
pub mod curve;
pub mod error;
pub mod geometry;
pub mod pointer;
pub mod primitives;
pub mod queue;
pub mod resize;
pub mod scale;
pub mod viewbox;

pub mod backends {
    #[cfg(feature = "cairo")]
    pub mod cairo;
    pub mod recording;
    #[cfg(feature = "svg")]
    pub mod svg;
}

pub use api::{CanvasRenderingContext2D, FillRule};
pub use chart::{Chart, ChartConfig, Frame, RenderMode, ViewSpec};
pub use clip::{Clip, ClipChain};
pub use context::{ContextKey, ElementStyle, RenderContext, Target, VectorSink};
pub use curve::{Curve, CurveGenerator, PathSink};
pub use error::{AxialError, Result};
pub use pointer::{ChartEvent, EventHandlers, EventOutcome, GestureTracker, PointerEvent, PointerKind};
pub use primitives::{
    Dash, Line, LineStyle, Primitive, PxLine, Symbol, SymbolGenerator, SymbolShape, TranslatedLine,
};
pub use queue::{RasterTarget, RenderQueue};
pub use resize::{Debouncer, HeightSpec, ResizeObserver};
pub use scale::{Gutter, Origin, Scale};
pub use viewbox::{Point, Viewbox, ViewboxInput, create_viewbox};
