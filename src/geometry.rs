use crate::viewbox::Point;

/// Formats a number the way a JS `Number#toString` would: no trailing `.0`,
/// shortest round-trip digits, `NaN`/`Infinity` spelled out. Used for
/// viewbox hashes and SVG path data so both stay stable across back ends.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let mut buf = ryu_js::Buffer::new();
    buf.format(value).to_string()
}

/// True when both coordinates are finite. Primitives skip any geometry that
/// fails this check (e.g. from a zero-extent data box).
pub fn is_finite_point(point: &Point) -> bool {
    point[0].is_finite() && point[1].is_finite()
}

/// Connects both ends of a polyline down (or up) to a horizontal edge, e.g.
/// to fill the area under a line. Needs at least two points.
pub fn close_line_to_edge(line: &[Point], y_edge: f64) -> Option<Vec<Point>> {
    if line.len() < 2 {
        return None;
    }
    let first = line[0];
    let last = line[line.len() - 1];

    let mut closed = Vec::with_capacity(line.len() + 2);
    closed.push([first[0], y_edge]);
    closed.extend_from_slice(line);
    closed.push([last[0], y_edge]);
    Some(closed)
}

pub fn radians_to_degrees(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Angle of the segment `a -> b` from the slope alone, in (-PI/2, PI/2).
pub fn angle_between_points(a: Point, b: Point) -> f64 {
    ((b[1] - a[1]) / (b[0] - a[0])).atan()
}

pub fn distance_between_points(a: Point, b: Point) -> f64 {
    ((b[1] - a[1]).powi(2) + (b[0] - a[0]).powi(2)).sqrt()
}

/// Signed number of times `polygon` (implicitly closed) winds around `point`.
pub fn winding_number(polygon: &[Point], point: Point) -> i32 {
    let [px, py] = point;
    let mut winding = 0;
    let n = polygon.len();
    for i in 0..n {
        let [x0, y0] = polygon[i];
        let [x1, y1] = polygon[(i + 1) % n];
        let side = (x1 - x0) * (py - y0) - (px - x0) * (y1 - y0);
        if y0 <= py {
            if y1 > py && side > 0.0 {
                winding += 1;
            }
        } else if y1 <= py && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}
