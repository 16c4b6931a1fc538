//! Deferred raster drawing.
//!
//! Primitives rendering in raster mode do not touch the surface; they push
//! closures here. The chart flushes the queue once per render pass, after
//! declarative traversal has finished, so draw order is push order.

use tracing::{debug, warn};

use crate::api::CanvasRenderingContext2D;
use crate::clip::ClipChain;
use crate::error::Result;
use crate::viewbox::Viewbox;

/// A deferred draw call. Receives the surface and the device pixel ratio;
/// coordinates are logical pixels, the flush has already applied the DPR.
pub type DrawFn = Box<dyn FnOnce(&mut dyn CanvasRenderingContext2D, f64) -> Result<()>>;

struct QueueEntry {
    clip: ClipChain,
    draw: DrawFn,
}

#[derive(Default)]
pub struct RenderQueue {
    entries: Vec<QueueEntry>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the queue in place, keeping its allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Appends a draw call that runs inside `clip` when the queue is flushed.
    pub fn push<F>(&mut self, clip: ClipChain, draw: F)
    where
        F: FnOnce(&mut dyn CanvasRenderingContext2D, f64) -> Result<()> + 'static,
    {
        self.entries.push(QueueEntry {
            clip,
            draw: Box::new(draw),
        });
    }

    /// Clears the surface and runs every entry in push order, each inside
    /// its own save/restore pair. The queue is empty afterwards. A failing
    /// entry aborts the flush: its state is still restored and the entries
    /// after it are discarded.
    pub fn flush(&mut self, surface: &mut dyn CanvasRenderingContext2D, dpr: f64, px_box: &Viewbox) -> Result<usize> {
        let count = self.entries.len();
        debug!(entries = count, dpr, "flushing render queue");

        surface.reset_transform()?;
        surface.scale(dpr, dpr)?;
        surface.clear_rect(0.0, 0.0, px_box.x_max(), px_box.y_max())?;
        surface.reset_transform()?;

        for entry in self.entries.drain(..) {
            let mut saved = SavedState::new(&mut *surface)?;
            let surface = saved.surface();
            surface.scale(dpr, dpr)?;
            entry.clip.apply(&mut *surface)?;
            (entry.draw)(surface, dpr)?;
            saved.finish()?;
        }
        Ok(count)
    }
}

/// Undoes one save() on drop, so an entry that bails out with `?` still
/// leaves the surface as it found it.
struct SavedState<'a> {
    surface: &'a mut dyn CanvasRenderingContext2D,
    active: bool,
}

impl<'a> SavedState<'a> {
    fn new(surface: &'a mut dyn CanvasRenderingContext2D) -> Result<Self> {
        surface.save()?;
        Ok(Self {
            surface,
            active: true,
        })
    }

    fn surface(&mut self) -> &mut dyn CanvasRenderingContext2D {
        &mut *self.surface
    }

    fn unwind(&mut self) -> Result<()> {
        self.active = false;
        self.surface.set_global_alpha(1.0)?;
        self.surface.restore()?;
        self.surface.reset_transform()
    }

    fn finish(mut self) -> Result<()> {
        self.unwind()
    }
}

impl Drop for SavedState<'_> {
    fn drop(&mut self) {
        if self.active {
            if let Err(err) = self.unwind() {
                warn!(error = %err, "failed to restore surface state");
            }
        }
    }
}

/// The raster half of a chart: the queue plus the surface it flushes to.
/// Until a surface is attached, passes are built and then dropped.
pub struct RasterTarget<S> {
    queue: RenderQueue,
    surface: Option<S>,
    dpr: f64,
}

impl<S: CanvasRenderingContext2D> RasterTarget<S> {
    pub fn new() -> Self {
        Self {
            queue: RenderQueue::new(),
            surface: None,
            dpr: 1.0,
        }
    }

    pub fn attach(&mut self, surface: S, dpr: f64) {
        self.surface = Some(surface);
        self.dpr = dpr;
    }

    pub fn detach(&mut self) -> Option<S> {
        self.surface.take()
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    pub fn set_dpr(&mut self, dpr: f64) {
        self.dpr = dpr;
    }

    /// Starts a pass: the previous pass's entries are gone.
    pub fn begin_pass(&mut self) -> &mut RenderQueue {
        self.queue.clear();
        &mut self.queue
    }

    /// Flushes the pass to the surface. Returns `false` when no surface is
    /// attached and the pass was dropped.
    pub fn commit(&mut self, px_box: &Viewbox) -> Result<bool> {
        match self.surface.as_mut() {
            Some(surface) => {
                self.queue.flush(surface, self.dpr, px_box)?;
                Ok(true)
            }
            None => {
                debug!(entries = self.queue.len(), "no surface attached, dropping render pass");
                self.queue.clear();
                Ok(false)
            }
        }
    }

    pub fn snapshot(&self) -> Result<String> {
        match &self.surface {
            Some(surface) => surface.to_data_url(),
            None => Ok(String::new()),
        }
    }
}

impl<S: CanvasRenderingContext2D> Default for RasterTarget<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FillRule;
    use crate::backends::recording::{DrawOp, RecordingCanvas};
    use crate::curve::Curve;
    use crate::error::AxialError;

    fn px_box() -> Viewbox {
        Viewbox::new(0.0, 0.0, 300.0, 150.0)
    }

    fn draw_rect(x: f64) -> impl FnOnce(&mut dyn CanvasRenderingContext2D, f64) -> Result<()> {
        move |surface, _dpr| {
            surface.begin_path()?;
            surface.rect(x, 0.0, 10.0, 10.0)?;
            surface.fill(FillRule::NonZero)
        }
    }

    fn fills(canvas: &RecordingCanvas) -> Vec<&DrawOp> {
        canvas
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::FillPath { .. }))
            .collect()
    }

    #[test]
    fn flush_clears_then_draws_in_push_order() {
        let mut queue = RenderQueue::new();
        queue.push(ClipChain::root(), draw_rect(1.0));
        queue.push(ClipChain::root(), draw_rect(2.0));
        let mut canvas = RecordingCanvas::new();

        assert_eq!(queue.flush(&mut canvas, 2.0, &px_box()).unwrap(), 2);
        assert!(queue.is_empty());

        match &canvas.ops()[0] {
            DrawOp::ClearRect { w, h, state, .. } => {
                assert_eq!((*w, *h), (300.0, 150.0));
                assert_eq!(state.transform, [2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
            }
            other => panic!("expected clear first, got {other:?}"),
        }
        let fills = fills(&canvas);
        assert_eq!(fills.len(), 2);
        for (op, expected_x) in fills.iter().zip([1.0, 2.0]) {
            match op {
                DrawOp::FillPath { path, state, .. } => {
                    assert_eq!(state.transform, [2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
                    assert!(matches!(
                        path.commands[0],
                        crate::backends::recording::PathCommand::Rect { x, .. } if x == expected_x
                    ));
                }
                _ => unreachable!(),
            }
        }
        assert_eq!(canvas.save_depth(), 0);
    }

    #[test]
    fn entries_restore_state_between_draws() {
        let mut queue = RenderQueue::new();
        queue.push(ClipChain::root(), |surface, dpr| {
            surface.set_global_alpha(0.25)?;
            surface.set_transform(dpr, 0.0, 0.0, dpr, 40.0, 40.0)?;
            Ok(())
        });
        queue.push(ClipChain::root(), draw_rect(0.0));
        let mut canvas = RecordingCanvas::new();
        queue.flush(&mut canvas, 1.0, &px_box()).unwrap();

        match fills(&canvas)[0] {
            DrawOp::FillPath { state, .. } => {
                assert_eq!(state.global_alpha, 1.0);
                assert_eq!(state.transform, [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn entries_replay_their_clip_chain() {
        let clip = ClipChain::root().push(
            vec![[0.0, 0.0], [50.0, 0.0], [50.0, 50.0], [0.0, 50.0]],
            Curve::Linear,
        );
        let mut queue = RenderQueue::new();
        queue.push(clip, draw_rect(0.0));
        queue.push(ClipChain::root(), draw_rect(100.0));
        let mut canvas = RecordingCanvas::new();
        queue.flush(&mut canvas, 1.0, &px_box()).unwrap();

        let fills = fills(&canvas);
        match (fills[0], fills[1]) {
            (DrawOp::FillPath { state: clipped, .. }, DrawOp::FillPath { state: free, .. }) => {
                assert_eq!(clipped.clips.len(), 1);
                assert!(clipped.is_point_visible([10.0, 10.0]));
                assert!(!clipped.is_point_visible([120.0, 10.0]));
                assert!(free.clips.is_empty());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn failing_entry_aborts_and_restores() {
        let mut queue = RenderQueue::new();
        queue.push(ClipChain::root(), draw_rect(0.0));
        queue.push(ClipChain::root(), |surface, _| {
            surface.set_global_alpha(0.5)?;
            Err(AxialError::draw("boom"))
        });
        queue.push(ClipChain::root(), draw_rect(20.0));
        let mut canvas = RecordingCanvas::new();

        let err = queue.flush(&mut canvas, 1.0, &px_box()).unwrap_err();
        assert!(matches!(err, AxialError::Draw { .. }));
        assert!(queue.is_empty());
        assert_eq!(fills(&canvas).len(), 1);
        assert_eq!(canvas.save_depth(), 0);
        assert_eq!(canvas.snapshot().global_alpha, 1.0);
    }

    #[test]
    fn detached_target_drops_the_pass() {
        let mut target: RasterTarget<RecordingCanvas> = RasterTarget::new();
        target.begin_pass().push(ClipChain::root(), draw_rect(0.0));
        assert!(!target.commit(&px_box()).unwrap());
        assert_eq!(target.snapshot().unwrap(), "");

        target.attach(RecordingCanvas::new(), 2.0);
        target.begin_pass().push(ClipChain::root(), draw_rect(0.0));
        assert!(target.commit(&px_box()).unwrap());
        let canvas = target.detach().unwrap();
        assert_eq!(fills(&canvas).len(), 1);
        assert!(!target.is_attached());
    }
}
