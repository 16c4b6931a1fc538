//! Translating raw pointer and wheel input into chart-space events.

use std::collections::HashMap;

use crate::context::RenderContext;
use crate::viewbox::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
    GotCapture,
    LostCapture,
    Enter,
    Leave,
    Over,
    Out,
}

impl PointerKind {
    pub const ALL: [PointerKind; 10] = [
        PointerKind::Down,
        PointerKind::Move,
        PointerKind::Up,
        PointerKind::Cancel,
        PointerKind::GotCapture,
        PointerKind::LostCapture,
        PointerKind::Enter,
        PointerKind::Leave,
        PointerKind::Over,
        PointerKind::Out,
    ];

    /// Down always starts a fresh gesture, so it never reports a delta.
    pub fn starts_gesture(&self) -> bool {
        matches!(self, PointerKind::Down)
    }

    /// These report their delta and then end the gesture; the pointer's
    /// next event starts without one.
    pub fn ends_gesture(&self) -> bool {
        matches!(
            self,
            PointerKind::Up | PointerKind::Cancel | PointerKind::Leave | PointerKind::Out
        )
    }
}

/// A raw pointer event in client (page) pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub client: Point,
    pub pointer_id: i64,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, client: Point) -> Self {
        Self {
            kind,
            client,
            pointer_id: 0,
        }
    }

    pub fn with_pointer_id(mut self, pointer_id: i64) -> Self {
        self.pointer_id = pointer_id;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartEvent {
    pub original_event: PointerEvent,
    /// Pointer position in data space.
    pub pointer_position: Point,
    /// Data-space movement since the previous event of the same gesture.
    pub delta: Option<Point>,
    /// Data-space anchor of the element that received the event, if any.
    pub element_position: Option<Point>,
}

/// Remembers each pointer's previous position so moves can report a delta.
/// Concurrent pointers (e.g. two fingers) are tracked independently by
/// `pointer_id`.
#[derive(Clone, Debug, Default)]
pub struct GestureTracker {
    previous: HashMap<i64, Point>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.previous.clear();
    }

    /// Whether `pointer_id` is mid-gesture.
    pub fn is_tracking(&self, pointer_id: i64) -> bool {
        self.previous.contains_key(&pointer_id)
    }

    /// Maps `event` into data space. `container_offset` is the client
    /// position of the chart's top-left corner; without it the pointer
    /// position is `[0, 0]` and there is no delta.
    pub fn transform(
        &mut self,
        event: &PointerEvent,
        container_offset: Option<Point>,
        ctx: &RenderContext,
        element_position: Option<Point>,
    ) -> ChartEvent {
        let Some([left, top]) = container_offset else {
            return ChartEvent {
                original_event: event.clone(),
                pointer_position: [0.0, 0.0],
                delta: None,
                element_position,
            };
        };
        let px = [event.client[0] - left, event.client[1] - top];
        let pointer_position = ctx.reverse_scale(px);

        if event.kind.starts_gesture() {
            self.previous.remove(&event.pointer_id);
        }
        let delta = self.previous.get(&event.pointer_id).map(|&[prev_x, prev_y]| {
            let data = ctx.data_box();
            let px_box = ctx.px_box();
            [
                data.width() * (px[0] - prev_x) / px_box.width(),
                data.height() * (px[1] - prev_y) / px_box.height(),
            ]
        });

        if event.kind.ends_gesture() {
            self.previous.remove(&event.pointer_id);
        } else {
            self.previous.insert(event.pointer_id, px);
        }

        ChartEvent {
            original_event: event.clone(),
            pointer_position,
            delta,
            element_position,
        }
    }
}

/// A raw wheel event; `delta` is in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct WheelEvent {
    pub client: Point,
    pub delta: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartWheelEvent {
    pub original_event: WheelEvent,
    /// Scroll distance in data units.
    pub delta: Point,
}

pub fn transform_wheel(event: &WheelEvent, ctx: &RenderContext) -> ChartWheelEvent {
    let data = ctx.data_box();
    let px_box = ctx.px_box();
    ChartWheelEvent {
        original_event: event.clone(),
        delta: [
            data.width() * event.delta[0] / px_box.width(),
            data.height() * event.delta[1] / px_box.height(),
        ],
    }
}

/// Whether a dispatched event reached a handler. A handled event should
/// have its default browser action suppressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    Handled,
    Ignored,
}

pub type ChartEventHandler = Box<dyn FnMut(&ChartEvent)>;

/// Per-kind handlers sharing one gesture tracker. Every dispatched event
/// updates the tracker, handled or not, so deltas stay continuous.
#[derive(Default)]
pub struct EventHandlers {
    handlers: HashMap<PointerKind, ChartEventHandler>,
    tracker: GestureTracker,
    element_position: Option<Point>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, kind: PointerKind, handler: F) -> Self
    where
        F: FnMut(&ChartEvent) + 'static,
    {
        self.set(kind, handler);
        self
    }

    pub fn set<F>(&mut self, kind: PointerKind, handler: F)
    where
        F: FnMut(&ChartEvent) + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn remove(&mut self, kind: PointerKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Anchor reported as `element_position` on every event.
    pub fn with_element_position(mut self, position: Point) -> Self {
        self.element_position = Some(position);
        self
    }

    pub fn dispatch(&mut self, event: &PointerEvent, container_offset: Option<Point>, ctx: &RenderContext) -> EventOutcome {
        let chart_event = self
            .tracker
            .transform(event, container_offset, ctx, self.element_position);
        match self.handlers.get_mut(&event.kind) {
            Some(handler) => {
                handler(&chart_event);
                EventOutcome::Handled
            }
            None => EventOutcome::Ignored,
        }
    }
}
