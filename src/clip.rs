//! Nested clipping regions.
//!
//! A [`ClipChain`] is a persistent linked list of clip nodes. Each node
//! holds a pixel-space outline traced by a [`Curve`] and a link to the
//! enclosing node. The effective region at any point is the intersection of
//! every outline from the root down. Raster draws re-apply the whole chain
//! before drawing; vector output nests one clip group per node instead.

use std::rc::Rc;

use crate::api::{CanvasRenderingContext2D, FillRule};
use crate::context::{RenderContext, Target};
use crate::curve::{CanvasSink, Curve, PathSink};
use crate::error::Result;
use crate::geometry::winding_number;
use crate::viewbox::Point;

#[derive(Debug)]
struct ClipNode {
    parent: ClipChain,
    path: Vec<Point>,
    curve: Curve,
}

#[derive(Clone, Debug, Default)]
pub struct ClipChain(Option<Rc<ClipNode>>);

impl ClipChain {
    /// The chain outside every clip. Applying it is a no-op.
    pub fn root() -> Self {
        ClipChain(None)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    /// Number of nodes between this one and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = &self.0;
        while let Some(n) = node {
            depth += 1;
            node = &n.parent.0;
        }
        depth
    }

    /// A child of this chain clipped to the pixel-space `path`. An empty
    /// path makes the node transparent.
    pub fn push(&self, path: Vec<Point>, curve: Curve) -> ClipChain {
        ClipChain(Some(Rc::new(ClipNode {
            parent: self.clone(),
            path,
            curve,
        })))
    }

    /// Intersects the surface's clip with every node, outermost first.
    pub fn apply(&self, surface: &mut dyn CanvasRenderingContext2D) -> Result<()> {
        let Some(node) = &self.0 else {
            return Ok(());
        };
        node.parent.apply(surface)?;
        if node.path.is_empty() {
            return Ok(());
        }
        surface.begin_path()?;
        node.curve.trace(&node.path, &mut CanvasSink(&mut *surface))?;
        surface.clip(FillRule::NonZero)
    }

    /// Whether a pixel-space point survives every clip in the chain.
    pub fn contains(&self, point: Point) -> bool {
        let mut node = &self.0;
        while let Some(n) = node {
            if !n.path.is_empty() {
                let mut outline = Outline::default();
                let inside = match n.curve.trace(&n.path, &mut outline) {
                    Ok(_) => {
                        let winding: i32 = outline
                            .finish()
                            .iter()
                            .map(|poly| winding_number(poly, point))
                            .sum();
                        winding != 0
                    }
                    Err(_) => false,
                };
                if !inside {
                    return false;
                }
            }
            node = &n.parent.0;
        }
        true
    }
}

/// Collects traced subpaths as polygons for hit-testing.
#[derive(Default)]
struct Outline {
    done: Vec<Vec<Point>>,
    current: Vec<Point>,
}

impl Outline {
    fn finish(mut self) -> Vec<Vec<Point>> {
        if self.current.len() > 1 {
            self.done.push(self.current);
        }
        self.done
    }
}

impl PathSink for Outline {
    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        if self.current.len() > 1 {
            self.done.push(std::mem::take(&mut self.current));
        }
        self.current = vec![[x, y]];
        Ok(())
    }

    fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.current.push([x, y]);
        Ok(())
    }

    fn bezier_curve_to(&mut self, _cp1x: f64, _cp1y: f64, _cp2x: f64, _cp2y: f64, x: f64, y: f64) -> Result<()> {
        // control polygon endpoints are close enough for a containment test
        self.current.push([x, y]);
        Ok(())
    }

    fn close_path(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Restricts everything its children draw to a data-space outline.
#[derive(Clone, Debug, Default)]
pub struct Clip {
    path: Option<Vec<Point>>,
    curve: Curve,
}

impl Clip {
    pub fn new(path: Vec<Point>) -> Self {
        Self {
            path: Some(path),
            curve: Curve::default(),
        }
    }

    /// A clip with no geometry; children render unclipped.
    pub fn transparent() -> Self {
        Self::default()
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    /// Renders `children` inside this clip. The node exists for the
    /// duration of the call; only contexts derived here see it.
    pub fn render<'a, F>(&self, ctx: &RenderContext, target: &mut Target<'a>, children: F) -> Result<()>
    where
        F: FnOnce(&RenderContext, &mut Target<'a>) -> Result<()>,
    {
        let px_path: Vec<Point> = match &self.path {
            Some(path) => path.iter().map(|p| ctx.scale(*p)).collect(),
            None => Vec::new(),
        };
        let Some(svg_path) = self.curve.to_svg_path(&px_path)? else {
            return children(ctx, target);
        };
        let inner = ctx.with_clip(ctx.clip().push(px_path, self.curve.clone()));

        if let Some(sink) = target.vector() {
            sink.begin_clip(&svg_path, FillRule::NonZero)?;
            children(&inner, target)?;
            if let Some(sink) = target.vector() {
                sink.end_group()?;
            }
            Ok(())
        } else {
            children(&inner, target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::recording::{DrawOp, RecordingCanvas};
    use crate::queue::RenderQueue;
    use crate::scale::{Gutter, Origin};
    use crate::viewbox::Viewbox;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
        vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }

    fn scenario_context() -> RenderContext {
        RenderContext::new(
            Viewbox::new(0.0, 0.0, 10.0, 10.0),
            Viewbox::new(0.0, 0.0, 100.0, 100.0),
            Gutter::default(),
            Origin::TopLeft,
        )
    }

    #[test]
    fn root_applies_nothing() {
        let mut canvas = RecordingCanvas::new();
        ClipChain::root().apply(&mut canvas).unwrap();
        assert!(canvas.ops().is_empty());
        assert!(ClipChain::root().contains([1e9, -1e9]));
    }

    #[test]
    fn nested_regions_intersect() {
        let outer = ClipChain::root().push(square(0.0, 0.0, 50.0, 50.0), Curve::Linear);
        let inner = outer.push(square(25.0, 25.0, 100.0, 100.0), Curve::Linear);
        assert_eq!(inner.depth(), 2);

        assert!(inner.contains([30.0, 30.0]));
        assert!(!inner.contains([10.0, 10.0]));
        assert!(!inner.contains([60.0, 60.0]));

        let mut canvas = RecordingCanvas::new();
        inner.apply(&mut canvas).unwrap();
        let clips: Vec<_> = canvas
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::Clip { .. }))
            .collect();
        assert_eq!(clips.len(), 2);
        let state = canvas.snapshot();
        assert!(state.is_point_visible([30.0, 30.0]));
        assert!(!state.is_point_visible([10.0, 10.0]));
        assert!(!state.is_point_visible([60.0, 60.0]));
    }

    #[test]
    fn empty_outline_is_transparent() {
        let chain = ClipChain::root().push(Vec::new(), Curve::Linear);
        assert!(chain.contains([5.0, 5.0]));
        let mut canvas = RecordingCanvas::new();
        chain.apply(&mut canvas).unwrap();
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn raster_children_capture_nested_chain() {
        let ctx = scenario_context();
        let mut queue = RenderQueue::new();
        let mut target = Target::Raster(&mut queue);
        let outer = Clip::new(square(0.0, 0.0, 5.0, 5.0));
        let inner = Clip::new(square(2.5, 2.5, 10.0, 10.0));

        outer
            .render(&ctx, &mut target, |ctx, target| {
                inner.render(ctx, target, |ctx, _| {
                    assert_eq!(ctx.clip().depth(), 2);
                    assert!(ctx.clip().contains([30.0, 30.0]));
                    assert!(!ctx.clip().contains([10.0, 10.0]));
                    assert!(!ctx.clip().contains([60.0, 60.0]));
                    Ok(())
                })
            })
            .unwrap();
        assert!(ctx.clip().is_root());
    }

    #[test]
    fn transparent_clip_passes_context_through() {
        let ctx = scenario_context();
        let mut target = Target::Inert;
        let mut ran = false;
        Clip::transparent()
            .render(&ctx, &mut target, |inner, _| {
                ran = true;
                assert!(inner.clip().is_root());
                Ok(())
            })
            .unwrap();
        assert!(ran);
    }
}
