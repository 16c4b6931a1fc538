//! Container size tracking. The host reports container widths; this module
//! turns them into pixel-space viewboxes and rate-limits the updates.
//!
//! Time is always passed in by the caller, so nothing here spawns timers.

use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::viewbox::Viewbox;

pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Chart height, either fixed or derived from the container width.
#[derive(Clone)]
pub enum HeightSpec {
    Fixed(f64),
    FromWidth(Rc<dyn Fn(f64) -> f64>),
}

impl HeightSpec {
    pub fn from_width<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        HeightSpec::FromWidth(Rc::new(f))
    }

    pub fn resolve(&self, width: f64) -> f64 {
        match self {
            HeightSpec::Fixed(height) => *height,
            HeightSpec::FromWidth(f) => f(width),
        }
    }
}

impl fmt::Debug for HeightSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeightSpec::Fixed(height) => f.debug_tuple("Fixed").field(height).finish(),
            HeightSpec::FromWidth(_) => f.write_str("FromWidth(..)"),
        }
    }
}

impl From<f64> for HeightSpec {
    fn from(height: f64) -> Self {
        HeightSpec::Fixed(height)
    }
}

/// Pixel space for a container of the given client width.
pub fn pixel_box(width: f64, height: &HeightSpec) -> Viewbox {
    Viewbox::new(0.0, 0.0, width, height.resolve(width))
}

/// Fires on the leading edge of a burst and once more on the trailing edge
/// with the latest value, if anything arrived during the burst. A burst ends
/// `wait` after its last submission.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    wait: Duration,
    deadline: Option<Instant>,
    pending: Option<T>,
}

impl<T> Debouncer<T> {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            deadline: None,
            pending: None,
        }
    }

    /// Returns the value when it fires immediately (leading edge).
    pub fn submit(&mut self, value: T, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now < deadline => {
                self.deadline = Some(now + self.wait);
                self.pending = Some(value);
                None
            }
            _ => {
                // an expired burst is superseded by this newer value
                self.deadline = Some(now + self.wait);
                self.pending = None;
                Some(value)
            }
        }
    }

    /// Returns the trailing value once the burst has settled.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

/// Handle returned by [`ResizeObserver::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener = Box<dyn FnMut(ContainerSize)>;

/// Fans debounced container sizes out to subscribers.
pub struct ResizeObserver {
    next_id: u64,
    listeners: Vec<(Subscription, Listener)>,
    debouncer: Debouncer<ContainerSize>,
}

impl ResizeObserver {
    pub fn new(wait: Duration) -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
            debouncer: Debouncer::new(wait),
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(ContainerSize) + 'static,
    {
        let subscription = Subscription(self.next_id);
        self.next_id += 1;
        self.listeners.push((subscription, Box::new(listener)));
        subscription
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != subscription);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Reports a new container size. Returns whether listeners were called.
    pub fn notify(&mut self, size: ContainerSize, now: Instant) -> bool {
        match self.debouncer.submit(size, now) {
            Some(size) => {
                self.deliver(size);
                true
            }
            None => false,
        }
    }

    /// Delivers the trailing size of a settled burst, if any.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(size) => {
                self.deliver(size);
                true
            }
            None => false,
        }
    }

    fn deliver(&mut self, size: ContainerSize) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(size);
        }
    }
}

impl Default for ResizeObserver {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn height_spec_resolves() {
        assert_eq!(pixel_box(300.0, &HeightSpec::Fixed(150.0)).hash(), "0,0,300,150");
        let half = HeightSpec::from_width(|w| w / 2.0);
        assert_eq!(pixel_box(640.0, &half).hash(), "0,0,640,320");
    }

    #[test]
    fn debounce_fires_leading_and_trailing() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(100));
        assert_eq!(d.submit(1, t0), Some(1));
        assert_eq!(d.submit(2, t0 + ms(30)), None);
        assert_eq!(d.submit(3, t0 + ms(60)), None);
        assert!(d.is_pending());
        // burst extends to 160ms after the last submission
        assert_eq!(d.poll(t0 + ms(120)), None);
        assert_eq!(d.poll(t0 + ms(160)), Some(3));
        assert_eq!(d.poll(t0 + ms(500)), None);
        assert_eq!(d.submit(4, t0 + ms(600)), Some(4));
    }

    #[test]
    fn lone_submission_has_no_trailing_call() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(100));
        assert_eq!(d.submit("a", t0), Some("a"));
        assert_eq!(d.poll(t0 + ms(100)), None);
    }

    #[test]
    fn observer_delivers_until_unsubscribed() {
        let t0 = Instant::now();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut observer = ResizeObserver::new(ms(100));
        let sub = observer.subscribe(move |size| sink.borrow_mut().push(size.width));

        assert!(observer.notify(ContainerSize { width: 300.0, height: 150.0 }, t0));
        assert!(!observer.notify(ContainerSize { width: 310.0, height: 150.0 }, t0 + ms(10)));
        assert!(observer.poll(t0 + ms(200)));
        assert_eq!(*seen.borrow(), vec![300.0, 310.0]);

        assert!(observer.unsubscribe(sub));
        assert!(!observer.unsubscribe(sub));
        observer.notify(ContainerSize { width: 500.0, height: 150.0 }, t0 + ms(1000));
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(observer.listener_count(), 0);
    }
}
