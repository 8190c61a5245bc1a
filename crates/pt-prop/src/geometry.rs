//! Planar geometry for scattered-data interpolation.
//!
//! Works in normalized coordinates (each axis mapped to `[0, 1]` over the
//! sample bounding box) so airspeed and RPM carry equal weight.

use crate::error::{PropError, PropResult};

pub type Point = [f64; 2];

/// Tolerance for on-edge and on-hull tests in normalized units.
pub const GEOM_EPS: f64 = 1e-9;

/// Twice the signed area of `(a, b, c)`; positive when counter-clockwise.
#[inline]
pub fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Positive when `d` lies strictly inside the circumcircle of CCW `(a, b, c)`.
#[inline]
fn in_circle(a: Point, b: Point, c: Point, d: Point) -> f64 {
    let (adx, ady) = (a[0] - d[0], a[1] - d[1]);
    let (bdx, bdy) = (b[0] - d[0], b[1] - d[1]);
    let (cdx, cdy) = (c[0] - d[0], c[1] - d[1]);
    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;
    adx * (bdy * cd - bd * cdy) - ady * (bdx * cd - bd * cdx) + ad * (bdx * cdy - bdy * cdx)
}

/// Convex hull, counter-clockwise, without collinear vertices.
#[derive(Clone, Debug)]
pub struct ConvexHull {
    vertices: Vec<Point>,
}

impl ConvexHull {
    /// Andrew's monotone chain.
    pub fn new(points: &[Point]) -> Self {
        let mut pts = points.to_vec();
        pts.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
        pts.dedup();
        if pts.len() < 3 {
            return Self { vertices: pts };
        }

        let mut lower: Vec<Point> = Vec::with_capacity(pts.len());
        for &p in &pts {
            while lower.len() >= 2 && orient(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
                lower.pop();
            }
            lower.push(p);
        }
        let mut upper: Vec<Point> = Vec::with_capacity(pts.len());
        for &p in pts.iter().rev() {
            while upper.len() >= 2 && orient(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
                upper.pop();
            }
            upper.push(p);
        }
        lower.pop();
        upper.pop();
        lower.extend(upper);
        Self { vertices: lower }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Non-degenerate when the hull encloses area.
    pub fn has_area(&self) -> bool {
        self.vertices.len() >= 3
    }

    /// Inside or on the boundary.
    ///
    /// Points outside the vertices' bounding box are rejected exactly;
    /// slanted edges admit a [`GEOM_EPS`] rounding band.
    pub fn contains(&self, q: Point) -> bool {
        if !self.has_area() {
            return false;
        }
        let in_box = |axis: usize| {
            let (lo, hi) = self
                .vertices
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v[axis]), hi.max(v[axis])));
            (lo..=hi).contains(&q[axis])
        };
        if !(in_box(0) && in_box(1)) {
            return false;
        }
        self.edges().all(|(a, b)| {
            let len = ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
            orient(a, b, q) >= -GEOM_EPS * len
        })
    }

    /// Range of `y` where the vertical line `x = x0` meets the hull.
    pub fn y_range_at(&self, x0: f64) -> Option<(f64, f64)> {
        if !self.has_area() {
            return None;
        }
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (a, b) in self.edges() {
            let (x_min, x_max) = if a[0] <= b[0] { (a[0], b[0]) } else { (b[0], a[0]) };
            if x0 < x_min - GEOM_EPS || x0 > x_max + GEOM_EPS {
                continue;
            }
            let dx = b[0] - a[0];
            if dx.abs() <= GEOM_EPS {
                lo = lo.min(a[1].min(b[1]));
                hi = hi.max(a[1].max(b[1]));
            } else {
                let t = ((x0 - a[0]) / dx).clamp(0.0, 1.0);
                let y = a[1] + t * (b[1] - a[1]);
                lo = lo.min(y);
                hi = hi.max(y);
            }
        }
        (lo <= hi).then_some((lo, hi))
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

/// Delaunay triangulation (Bowyer–Watson).
#[derive(Clone, Debug)]
pub struct Triangulation {
    points: Vec<Point>,
    /// Counter-clockwise vertex indices into `points`
    triangles: Vec<[usize; 3]>,
}

/// Super-triangle half-size in normalized units.
const SUPER_SCALE: f64 = 1.0e4;

/// Triangles thinner than this (twice-area, normalized) are dropped.
const MIN_DOUBLE_AREA: f64 = 1e-14;

impl Triangulation {
    /// # Errors
    /// `Degenerate` for duplicate points or when no triangle has area.
    pub fn new(points: Vec<Point>) -> PropResult<Self> {
        let n = points.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| {
            points[i][0]
                .total_cmp(&points[j][0])
                .then(points[i][1].total_cmp(&points[j][1]))
        });
        if order.windows(2).any(|w| points[w[0]] == points[w[1]]) {
            return Err(PropError::Degenerate {
                what: "duplicate (airspeed, rpm) sample",
            });
        }

        let mut work = points.clone();
        work.push([0.5 - 3.0 * SUPER_SCALE, -SUPER_SCALE]);
        work.push([0.5 + 3.0 * SUPER_SCALE, -SUPER_SCALE]);
        work.push([0.5, 2.0 * SUPER_SCALE + 1.0]);
        let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

        for &p_idx in &order {
            let p = work[p_idx];
            let (bad, good): (Vec<[usize; 3]>, Vec<[usize; 3]>) = triangles
                .into_iter()
                .partition(|t| in_circle(work[t[0]], work[t[1]], work[t[2]], p) > 0.0);

            // Cavity boundary: edges of bad triangles not shared with another bad triangle
            let mut boundary: Vec<(usize, usize)> = Vec::new();
            for t in &bad {
                for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                    let shared = bad.iter().any(|u| {
                        u != t && [(u[0], u[1]), (u[1], u[2]), (u[2], u[0])].contains(&(b, a))
                    });
                    if !shared {
                        boundary.push((a, b));
                    }
                }
            }

            triangles = good;
            for (a, b) in boundary {
                if orient(work[a], work[b], p) > 0.0 {
                    triangles.push([a, b, p_idx]);
                }
            }
        }

        triangles.retain(|t| {
            t.iter().all(|&v| v < n) && orient(work[t[0]], work[t[1]], work[t[2]]) > MIN_DOUBLE_AREA
        });
        if triangles.is_empty() {
            return Err(PropError::Degenerate {
                what: "samples are collinear",
            });
        }

        Ok(Self { points, triangles })
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Containing triangle and barycentric weights of `q`.
    ///
    /// When `q` falls in no triangle (a sliver between the triangulation and
    /// the hull, or a point outside), the triangle whose smallest weight is
    /// largest is used with weights clamped to `[0, 1]` and renormalized.
    /// Callers check hull membership first.
    pub fn locate(&self, q: Point) -> ([usize; 3], [f64; 3]) {
        let mut best = (self.triangles[0], [f64::NEG_INFINITY; 3]);
        let mut best_min = f64::NEG_INFINITY;
        for &t in &self.triangles {
            let w = self.barycentric(t, q);
            let w_min = w[0].min(w[1]).min(w[2]);
            if w_min >= -GEOM_EPS {
                return (t, w);
            }
            if w_min > best_min {
                best_min = w_min;
                best = (t, w);
            }
        }

        let (t, w) = best;
        let clamped = [w[0].max(0.0), w[1].max(0.0), w[2].max(0.0)];
        let sum: f64 = clamped.iter().sum();
        (t, clamped.map(|c| c / sum))
    }

    fn barycentric(&self, t: [usize; 3], q: Point) -> [f64; 3] {
        let (a, b, c) = (self.points[t[0]], self.points[t[1]], self.points[t[2]]);
        let area = orient(a, b, c);
        [orient(b, c, q) / area, orient(c, a, q) / area, orient(a, b, q) / area]
    }
}
