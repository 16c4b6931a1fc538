//! Immutable axis-aligned boxes. The same type describes the data-space view
//! of a chart and the pixel-space area it is drawn into; every transform
//! returns a new box.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AxialError, Result};
use crate::geometry::format_number;

pub type Point = [f64; 2];

pub type Range = [f64; 2];

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewbox {
    x_min: f64,
    y_min: f64,
    width: f64,
    height: f64,
}

/// Edge overrides for [`Viewbox::set_edges`]. Unset edges keep their value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edges {
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
}

/// Smallest allowed width/height for [`Viewbox::constrain_zoom`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ZoomLimits {
    pub max_zoom_x: Option<f64>,
    pub max_zoom_y: Option<f64>,
}

/// The shapes a viewbox can be created from.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ViewboxInput {
    Tuple([f64; 4]),
    Existing(Viewbox),
    /// The canonical `"xMin,yMin,width,height"` form produced by [`Viewbox::hash`].
    Hash(String),
}

impl Viewbox {
    /// Width and height may be negative; nothing is validated.
    pub const fn new(x_min: f64, y_min: f64, width: f64, height: f64) -> Self {
        Self {
            x_min,
            y_min,
            width,
            height,
        }
    }

    pub const fn from_coordinates(x_min: f64, y_min: f64, width: f64, height: f64) -> Self {
        Self::new(x_min, y_min, width, height)
    }

    pub const fn from_tuple(values: [f64; 4]) -> Self {
        let [x_min, y_min, width, height] = values;
        Self::new(x_min, y_min, width, height)
    }

    pub const fn from_existing(existing: Viewbox) -> Self {
        existing
    }

    /// Tight bounding box around `points`, or `None` when there are none.
    /// The result can be zoomed out afterwards to pad the data, e.g.
    /// `Viewbox::from_data(&points)?.zoom(0.9, None)`.
    pub fn from_data(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let [mut x_min, mut y_min] = *first;
        let [mut x_max, mut y_max] = *first;
        for &[x, y] in rest {
            if x < x_min {
                x_min = x;
            }
            if x > x_max {
                x_max = x;
            }
            if y < y_min {
                y_min = y;
            }
            if y > y_max {
                y_max = y;
            }
        }
        Some(Self::new(x_min, y_min, x_max - x_min, y_max - y_min))
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn x_max(&self) -> f64 {
        self.x_min + self.width
    }

    pub fn y_max(&self) -> f64 {
        self.y_min + self.height
    }

    /// `[x_min, x_max]`
    pub fn x(&self) -> Range {
        [self.x_min, self.x_max()]
    }

    /// `[y_min, y_max]`
    pub fn y(&self) -> Range {
        [self.y_min, self.y_max()]
    }

    /// Canonical `"xMin,yMin,width,height"` string. Two boxes with the same
    /// hash are interchangeable for re-render short-circuiting.
    pub fn hash(&self) -> String {
        self.to_string()
    }

    /// Returns a box with only the given edges replaced. The result is
    /// rebuilt from edges, so moving one edge resizes rather than pans.
    pub fn set_edges(&self, edges: Edges) -> Viewbox {
        let x_min = edges.x_min.unwrap_or(self.x_min);
        let x_max = edges.x_max.unwrap_or_else(|| self.x_max());
        let y_min = edges.y_min.unwrap_or(self.y_min);
        let y_max = edges.y_max.unwrap_or_else(|| self.y_max());
        Viewbox::new(x_min, y_min, x_max - x_min, y_max - y_min)
    }

    pub fn pan_x(&self, distance: f64) -> Viewbox {
        Viewbox::new(self.x_min + distance, self.y_min, self.width, self.height)
    }

    pub fn pan_y(&self, distance: f64) -> Viewbox {
        Viewbox::new(self.x_min, self.y_min + distance, self.width, self.height)
    }

    /// Zooms in by `factor` (2.0 is a 200% zoom). The anchor keeps its
    /// absolute position; it defaults to the centre of the box. A factor
    /// of zero or less is meaningless and not guarded.
    pub fn zoom(&self, factor: f64, anchor: Option<Point>) -> Viewbox {
        let [ax, ay] = anchor.unwrap_or([self.bisect_x(), self.bisect_y()]);
        let relative_x = (ax - self.x_min) / self.width;
        let relative_y = (ay - self.y_min) / self.height;

        let width = self.width / factor;
        let height = self.height / factor;
        let dx_min = (self.width - width) * relative_x;
        let dy_min = (self.height - height) * relative_y;

        Viewbox::new(self.x_min + dx_min, self.y_min + dy_min, width, height)
    }

    /// Linear interpolation of all four fields; `progress` is not clamped.
    pub fn interpolate(&self, target: &Viewbox, progress: f64) -> Viewbox {
        Viewbox::new(
            self.x_min + progress * (target.x_min - self.x_min),
            self.y_min + progress * (target.y_min - self.y_min),
            self.width + progress * (target.width - self.width),
            self.height + progress * (target.height - self.height),
        )
    }

    /// Keeps this box inside `outer`. Each dimension is capped at the outer
    /// one. The min edge is kept unless the max edge overflows `outer`, in
    /// which case the box is pulled back by the overflow; it is then pushed
    /// forward to `outer`'s min edge if needed.
    pub fn bound(&self, outer: &Viewbox) -> Viewbox {
        let x_min = if self.x_max() > outer.x_max() {
            outer.x_max() - self.width
        } else {
            self.x_min
        };
        let y_min = if self.y_max() > outer.y_max() {
            outer.y_max() - self.height
        } else {
            self.y_min
        };

        Viewbox::new(
            x_min.max(outer.x_min),
            y_min.max(outer.y_min),
            self.width.min(outer.width),
            self.height.min(outer.height),
        )
    }

    /// Hard floor on zoom-in: a dimension smaller than its limit is reset to
    /// the limit, centred on that axis's midpoint. A zero limit is ignored.
    pub fn constrain_zoom(&self, limits: ZoomLimits) -> Viewbox {
        let constrained_x = match limits.max_zoom_x {
            Some(max) if max != 0.0 && self.width < max => {
                Viewbox::new(self.bisect_x() - max / 2.0, self.y_min, max, self.height)
            }
            _ => *self,
        };

        match limits.max_zoom_y {
            Some(max) if max != 0.0 && constrained_x.height < max => Viewbox::new(
                constrained_x.x_min,
                constrained_x.bisect_y() - max / 2.0,
                constrained_x.width,
                max,
            ),
            _ => constrained_x,
        }
    }

    /// Corners in `[min,min], [max,min], [max,max], [min,max]` order.
    pub fn to_path(&self) -> Vec<Point> {
        let (x_max, y_max) = (self.x_max(), self.y_max());
        vec![
            [self.x_min, self.y_min],
            [x_max, self.y_min],
            [x_max, y_max],
            [self.x_min, y_max],
        ]
    }

    pub fn is_equal(&self, other: &Viewbox) -> bool {
        self.hash() == other.hash()
    }

    /// Inclusive containment, with the box grown by `matting` on every side.
    pub fn is_point_within(&self, point: Point, matting: f64) -> bool {
        let [x, y] = point;
        !(self.x_min - matting > x
            || self.y_min - matting > y
            || self.x_max() + matting < x
            || self.y_max() + matting < y)
    }

    pub fn points_within_x(&self, points: &[Point]) -> Vec<Point> {
        points
            .iter()
            .filter(|p| p[0] >= self.x_min && p[0] <= self.x_max())
            .copied()
            .collect()
    }

    pub fn points_within_y(&self, points: &[Point]) -> Vec<Point> {
        points
            .iter()
            .filter(|p| p[1] >= self.y_min && p[1] <= self.y_max())
            .copied()
            .collect()
    }

    fn bisect_x(&self) -> f64 {
        0.5 * self.width + self.x_min
    }

    fn bisect_y(&self) -> f64 {
        0.5 * self.height + self.y_min
    }
}

impl Default for Viewbox {
    fn default() -> Self {
        Viewbox::new(0.0, 0.0, 1.0, 1.0)
    }
}

impl fmt::Display for Viewbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            format_number(self.x_min),
            format_number(self.y_min),
            format_number(self.width),
            format_number(self.height)
        )
    }
}

impl FromStr for Viewbox {
    type Err = AxialError;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| {
                AxialError::invalid_input(format!("unable to create Viewbox from {s:?}: {err}"))
            })?;
        Viewbox::try_from(parts.as_slice())
            .map_err(|_| AxialError::invalid_input(format!("unable to create Viewbox from {s:?}")))
    }
}

impl TryFrom<&[f64]> for Viewbox {
    type Error = AxialError;

    fn try_from(values: &[f64]) -> Result<Self> {
        match values {
            [x_min, y_min, width, height] => Ok(Viewbox::new(*x_min, *y_min, *width, *height)),
            _ => Err(AxialError::invalid_input(format!(
                "unable to create Viewbox from arguments {values:?}"
            ))),
        }
    }
}

impl From<Viewbox> for ViewboxInput {
    fn from(value: Viewbox) -> Self {
        ViewboxInput::Existing(value)
    }
}

impl From<[f64; 4]> for ViewboxInput {
    fn from(value: [f64; 4]) -> Self {
        ViewboxInput::Tuple(value)
    }
}

impl From<&str> for ViewboxInput {
    fn from(value: &str) -> Self {
        ViewboxInput::Hash(value.to_string())
    }
}

/// Builds a viewbox from any accepted shape. An existing box passes through
/// untouched.
pub fn create_viewbox(input: impl Into<ViewboxInput>) -> Result<Viewbox> {
    match input.into() {
        ViewboxInput::Tuple(values) => Ok(Viewbox::from_tuple(values)),
        ViewboxInput::Existing(existing) => Ok(Viewbox::from_existing(existing)),
        ViewboxInput::Hash(hash) => hash.parse(),
    }
}
