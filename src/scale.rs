//! Linear data-space to pixel-space mapping.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AxialError, Result};
use crate::viewbox::{Point, Viewbox};

/// Which corner the data-space origin sits in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Standard Cartesian chart: y grows upward.
    #[default]
    BottomLeft,
    /// Transposed chart (e.g. horizontal bars): data x runs down the pixel
    /// y-axis and data y runs along the pixel x-axis, without flipping.
    TopLeft,
}

impl FromStr for Origin {
    type Err = AxialError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bottom-left" => Ok(Origin::BottomLeft),
            "top-left" => Ok(Origin::TopLeft),
            other => Err(AxialError::invalid_input(format!("unknown origin {other:?}"))),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::BottomLeft => write!(f, "bottom-left"),
            Origin::TopLeft => write!(f, "top-left"),
        }
    }
}

/// Pixel padding subtracted from the scale's output range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "[f64; 4]")]
pub struct Gutter {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Gutter {
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// `[top, right, bottom, left]`
impl From<[f64; 4]> for Gutter {
    fn from([top, right, bottom, left]: [f64; 4]) -> Self {
        Gutter::new(top, right, bottom, left)
    }
}

impl FromStr for Gutter {
    type Err = AxialError;

    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| AxialError::invalid_input(format!("invalid gutter {s:?}: {err}")))?;
        match values.as_slice() {
            [top, right, bottom, left] => Ok(Gutter::new(*top, *right, *bottom, *left)),
            _ => Err(AxialError::invalid_input(format!(
                "gutter needs four values, got {s:?}"
            ))),
        }
    }
}

/// One-dimensional linear map from `domain` onto `range`. Extrapolates
/// outside the domain; a zero-width domain yields non-finite output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl LinearScale {
    pub const fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn apply(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let t = (value - d0) / (d1 - d0);
        r0 * (1.0 - t) + r1 * t
    }

    pub fn invert(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let t = (value - r0) / (r1 - r0);
        d0 * (1.0 - t) + d1 * t
    }
}

/// Forward (`scale`) and inverse (`reverse_scale`) transforms between data
/// space and pixel space. A plain value: equal inputs build equal scales,
/// so callers can memoize on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    x: LinearScale,
    y: LinearScale,
    transposed: bool,
}

impl Scale {
    pub fn new(data_box: &Viewbox, px_box: &Viewbox, gutter: Gutter, origin: Origin) -> Self {
        match origin {
            Origin::BottomLeft => Self {
                x: LinearScale::new(
                    data_box.x(),
                    [px_box.x_min() + gutter.left, px_box.x_max() - gutter.right],
                ),
                y: LinearScale::new(
                    data_box.y(),
                    [px_box.y_max() - gutter.bottom, px_box.y_min() + gutter.top],
                ),
                transposed: false,
            },
            Origin::TopLeft => Self {
                x: LinearScale::new(
                    data_box.x(),
                    [px_box.y_min() + gutter.top, px_box.y_max() - gutter.bottom],
                ),
                y: LinearScale::new(
                    data_box.y(),
                    [px_box.x_min() + gutter.left, px_box.x_max() - gutter.right],
                ),
                transposed: true,
            },
        }
    }

    /// Maps every point onto itself.
    pub const fn identity() -> Self {
        Self {
            x: LinearScale::new([0.0, 1.0], [0.0, 1.0]),
            y: LinearScale::new([0.0, 1.0], [0.0, 1.0]),
            transposed: false,
        }
    }

    /// The map driven by data x.
    pub fn x_axis(&self) -> &LinearScale {
        &self.x
    }

    /// The map driven by data y.
    pub fn y_axis(&self) -> &LinearScale {
        &self.y
    }

    pub fn scale(&self, point: Point) -> Point {
        let [x, y] = point;
        if self.transposed {
            [self.y.apply(y), self.x.apply(x)]
        } else {
            [self.x.apply(x), self.y.apply(y)]
        }
    }

    pub fn reverse_scale(&self, point: Point) -> Point {
        let [px, py] = point;
        if self.transposed {
            [self.x.invert(py), self.y.invert(px)]
        } else {
            [self.x.invert(px), self.y.invert(py)]
        }
    }

    pub fn scale_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.scale(*p)).collect()
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(a: Point, b: Point) {
        assert!(
            (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9,
            "{:?} != {:?}",
            a,
            b
        );
    }

    fn unit_inputs() -> (Viewbox, Viewbox) {
        (
            Viewbox::new(0.0, 0.0, 10.0, 10.0),
            Viewbox::new(0.0, 0.0, 300.0, 150.0),
        )
    }

    #[test]
    fn bottom_left_inverts_y() {
        let (data, px) = unit_inputs();
        let s = Scale::new(&data, &px, Gutter::default(), Origin::BottomLeft);
        assert_eq!(s.scale([0.0, 0.0]), [0.0, 150.0]);
        assert_eq!(s.scale([10.0, 10.0]), [300.0, 0.0]);
        assert_point_eq(s.scale([5.0, 2.0]), [150.0, 120.0]);
    }

    #[test]
    fn top_left_transposes_without_flip() {
        let (data, px) = unit_inputs();
        let s = Scale::new(&data, &px, Gutter::default(), Origin::TopLeft);
        assert_eq!(s.scale([0.0, 0.0]), [0.0, 0.0]);
        assert_eq!(s.scale([10.0, 10.0]), [300.0, 150.0]);
        assert_eq!(s.scale([10.0, 0.0]), [0.0, 150.0]);
        assert_eq!(s.scale([0.0, 10.0]), [300.0, 0.0]);
    }

    #[test]
    fn gutter_shrinks_range() {
        let (data, px) = unit_inputs();
        let gutter = Gutter::new(10.0, 20.0, 30.0, 40.0);
        let s = Scale::new(&data, &px, gutter, Origin::BottomLeft);
        assert_eq!(s.scale([0.0, 0.0]), [40.0, 120.0]);
        assert_eq!(s.scale([10.0, 10.0]), [280.0, 10.0]);

        let t = Scale::new(&data, &px, gutter, Origin::TopLeft);
        assert_eq!(t.scale([0.0, 0.0]), [40.0, 10.0]);
        assert_eq!(t.scale([10.0, 10.0]), [280.0, 120.0]);
    }

    #[test]
    fn reverse_scale_inverts_both_origins() {
        let data = Viewbox::new(-3.0, 7.0, 12.5, -4.0);
        let px = Viewbox::new(5.0, 5.0, 640.0, 480.0);
        let gutter = Gutter::new(4.0, 8.0, 12.0, 16.0);
        for origin in [Origin::BottomLeft, Origin::TopLeft] {
            let s = Scale::new(&data, &px, gutter, origin);
            for p in [[0.0, 0.0], [-3.0, 7.0], [9.5, 3.0], [100.0, -50.0]] {
                assert_point_eq(s.reverse_scale(s.scale(p)), p);
            }
        }
    }

    #[test]
    fn extrapolates_outside_domain() {
        let (data, px) = unit_inputs();
        let s = Scale::new(&data, &px, Gutter::default(), Origin::BottomLeft);
        assert_point_eq(s.scale([20.0, -10.0]), [600.0, 300.0]);
    }

    #[test]
    fn degenerate_domain_is_not_finite() {
        let data = Viewbox::new(0.0, 0.0, 0.0, 10.0);
        let px = Viewbox::new(0.0, 0.0, 100.0, 100.0);
        let s = Scale::new(&data, &px, Gutter::default(), Origin::BottomLeft);
        assert!(!s.scale([1.0, 1.0])[0].is_finite());
    }

    #[test]
    fn identity_maps_points_onto_themselves() {
        let s = Scale::identity();
        assert_eq!(s.scale([3.5, -2.0]), [3.5, -2.0]);
        assert_eq!(s.reverse_scale([3.5, -2.0]), [3.5, -2.0]);
    }

    #[test]
    fn parses_origin_and_gutter() {
        assert_eq!("top-left".parse::<Origin>().unwrap(), Origin::TopLeft);
        assert!("middle".parse::<Origin>().is_err());
        assert_eq!(
            "1, 2, 3, 4".parse::<Gutter>().unwrap(),
            Gutter::new(1.0, 2.0, 3.0, 4.0)
        );
        assert!("1,2".parse::<Gutter>().is_err());
        let g: Gutter = serde_json::from_str("[5, 0, 5, 0]").unwrap();
        assert_eq!(g, Gutter::new(5.0, 0.0, 5.0, 0.0));
    }
}
