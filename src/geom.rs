//! Envelopes and the spatial predicates behind region selection.
//!
//! Geometry here is deliberately small: points, polylines, and simple
//! polygons with optional holes, in f64 world coordinates. Predicates are
//! the closed-set relations the selection modes need (intersects, covers,
//! touches, crosses, overlaps); they are exact for simple inputs and make
//! the usual epsilon concessions on shared-vertex degeneracies.

use glam::DVec2;

const EPS: f64 = 1e-9;

/// Axis-aligned bounding envelope. Empty when `min > max` on an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min: DVec2,
    pub max: DVec2,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::empty()
    }
}

impl Envelope {
    pub fn empty() -> Self {
        Self {
            min: DVec2::splat(f64::INFINITY),
            max: DVec2::splat(f64::NEG_INFINITY),
        }
    }

    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_points(points: &[DVec2]) -> Self {
        let mut env = Self::empty();
        for p in points {
            env.expand_point(*p);
        }
        env
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn width(&self) -> f64 {
        (self.max.x - self.min.x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max.y - self.min.y).max(0.0)
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn expand_point(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grow to the union with `other`. Union with an empty envelope is a
    /// no-op, so accumulating affected areas can start from `empty()`.
    pub fn expand_to_include(&mut self, other: &Envelope) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn intersects(&self, other: &Envelope) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Envelope of the overlap region; empty when the envelopes are apart.
    pub fn intersection(&self, other: &Envelope) -> Envelope {
        if !self.intersects(other) {
            return Envelope::empty();
        }
        Envelope {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    pub fn contains_envelope(&self, other: &Envelope) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    pub fn contains_point(&self, p: DVec2) -> bool {
        !self.is_empty()
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
    }

    /// Closed rectangle as a polygon, for full-geometry tests against an
    /// extent region.
    pub fn to_polygon(&self) -> Geometry {
        Geometry::Polygon {
            outer: vec![
                self.min,
                DVec2::new(self.max.x, self.min.y),
                self.max,
                DVec2::new(self.min.x, self.max.y),
            ],
            holes: Vec::new(),
        }
    }
}

/// Feature or region geometry. Rings are implicitly closed (last vertex
/// connects back to the first).
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(DVec2),
    Line(Vec<DVec2>),
    Polygon {
        outer: Vec<DVec2>,
        holes: Vec<Vec<DVec2>>,
    },
}

impl Geometry {
    pub fn rect(min: DVec2, max: DVec2) -> Self {
        Envelope::new(min, max).to_polygon()
    }

    pub fn envelope(&self) -> Envelope {
        match self {
            Geometry::Point(p) => Envelope::new(*p, *p),
            Geometry::Line(pts) => Envelope::from_points(pts),
            Geometry::Polygon { outer, .. } => Envelope::from_points(outer),
        }
    }

    /// Topological dimension: 0 point, 1 line, 2 polygon.
    pub fn dimension(&self) -> u8 {
        match self {
            Geometry::Point(_) => 0,
            Geometry::Line(_) => 1,
            Geometry::Polygon { .. } => 2,
        }
    }

    fn boundary_segments(&self) -> Vec<(DVec2, DVec2)> {
        match self {
            Geometry::Point(_) => Vec::new(),
            Geometry::Line(pts) => pts.windows(2).map(|w| (w[0], w[1])).collect(),
            Geometry::Polygon { outer, holes } => {
                let mut segs = ring_segments(outer);
                for hole in holes {
                    segs.extend(ring_segments(hole));
                }
                segs
            }
        }
    }

    /// Closed-set point membership (boundary counts as inside).
    pub fn covers_point(&self, p: DVec2) -> bool {
        !matches!(self.locate(p), Location::Outside)
    }

    /// Locate a point relative to this geometry's closure.
    pub fn locate(&self, p: DVec2) -> Location {
        match self {
            Geometry::Point(q) => {
                if p.distance_squared(*q) <= EPS * EPS {
                    Location::Boundary
                } else {
                    Location::Outside
                }
            }
            Geometry::Line(pts) => {
                for w in pts.windows(2) {
                    if on_segment(w[0], w[1], p) {
                        return Location::Boundary;
                    }
                }
                Location::Outside
            }
            Geometry::Polygon { outer, holes } => {
                match locate_in_ring(p, outer) {
                    Location::Outside => return Location::Outside,
                    Location::Boundary => return Location::Boundary,
                    Location::Inside => {}
                }
                for hole in holes {
                    match locate_in_ring(p, hole) {
                        Location::Inside => return Location::Outside,
                        Location::Boundary => return Location::Boundary,
                        Location::Outside => {}
                    }
                }
                Location::Inside
            }
        }
    }
}

/// Point position relative to a geometry's closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Inside,
    Boundary,
    Outside,
}

fn ring_segments(ring: &[DVec2]) -> Vec<(DVec2, DVec2)> {
    if ring.len() < 2 {
        return Vec::new();
    }
    let mut segs: Vec<(DVec2, DVec2)> = ring.windows(2).map(|w| (w[0], w[1])).collect();
    segs.push((ring[ring.len() - 1], ring[0]));
    segs
}

fn cross(o: DVec2, a: DVec2, b: DVec2) -> f64 {
    (a - o).perp_dot(b - o)
}

fn on_segment(a: DVec2, b: DVec2, p: DVec2) -> bool {
    if cross(a, b, p).abs() > EPS * (1.0 + a.distance(b)) {
        return false;
    }
    p.x >= a.x.min(b.x) - EPS
        && p.x <= a.x.max(b.x) + EPS
        && p.y >= a.y.min(b.y) - EPS
        && p.y <= a.y.max(b.y) + EPS
}

/// Ray-cast membership of a point in a single ring.
fn locate_in_ring(p: DVec2, ring: &[DVec2]) -> Location {
    if ring.len() < 3 {
        return Location::Outside;
    }
    for (a, b) in ring_segments(ring) {
        if on_segment(a, b, p) {
            return Location::Boundary;
        }
    }
    let mut inside = false;
    for (a, b) in ring_segments(ring) {
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    if inside {
        Location::Inside
    } else {
        Location::Outside
    }
}

/// How two segments meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegContact {
    None,
    /// Contact at an endpoint or a single boundary point.
    Touch,
    /// Proper crossing through both interiors.
    Cross,
    /// Collinear with a shared span of positive length.
    Collinear,
}

fn seg_contact(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> SegContact {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    let tol = EPS * (1.0 + p1.distance(p2) + q1.distance(q2));
    if ((d1 > tol && d2 < -tol) || (d1 < -tol && d2 > tol))
        && ((d3 > tol && d4 < -tol) || (d3 < -tol && d4 > tol))
    {
        return SegContact::Cross;
    }

    if d1.abs() <= tol && d2.abs() <= tol && d3.abs() <= tol && d4.abs() <= tol {
        // Collinear: measure the shared span along the dominant axis.
        let axis_x = (p2 - p1).x.abs() + (q2 - q1).x.abs() >= (p2 - p1).y.abs() + (q2 - q1).y.abs();
        let (a0, a1, b0, b1) = if axis_x {
            (p1.x.min(p2.x), p1.x.max(p2.x), q1.x.min(q2.x), q1.x.max(q2.x))
        } else {
            (p1.y.min(p2.y), p1.y.max(p2.y), q1.y.min(q2.y), q1.y.max(q2.y))
        };
        let span = a1.min(b1) - a0.max(b0);
        if span > EPS {
            return SegContact::Collinear;
        }
        if span >= -EPS {
            return SegContact::Touch;
        }
        return SegContact::None;
    }

    if on_segment(q1, q2, p1)
        || on_segment(q1, q2, p2)
        || on_segment(p1, p2, q1)
        || on_segment(p1, p2, q2)
    {
        return SegContact::Touch;
    }
    SegContact::None
}

/// Closed-set intersection: any shared point, boundary included.
pub fn intersects(a: &Geometry, b: &Geometry) -> bool {
    if !a.envelope().intersects(&b.envelope()) {
        return false;
    }
    match (a, b) {
        (Geometry::Point(p), _) => b.covers_point(*p),
        (_, Geometry::Point(p)) => a.covers_point(*p),
        _ => {
            // Any boundary contact.
            let segs_a = a.boundary_segments();
            let segs_b = b.boundary_segments();
            for &(a1, a2) in &segs_a {
                for &(b1, b2) in &segs_b {
                    if seg_contact(a1, a2, b1, b2) != SegContact::None {
                        return true;
                    }
                }
            }
            // No boundary contact: one may still lie wholly inside the other.
            first_vertex(a).map_or(false, |p| b.covers_point(p))
                || first_vertex(b).map_or(false, |p| a.covers_point(p))
        }
    }
}

pub fn disjoint(a: &Geometry, b: &Geometry) -> bool {
    !intersects(a, b)
}

fn first_vertex(g: &Geometry) -> Option<DVec2> {
    match g {
        Geometry::Point(p) => Some(*p),
        Geometry::Line(pts) => pts.first().copied(),
        Geometry::Polygon { outer, .. } => outer.first().copied(),
    }
}

fn vertices(g: &Geometry) -> Vec<DVec2> {
    match g {
        Geometry::Point(p) => vec![*p],
        Geometry::Line(pts) => pts.clone(),
        Geometry::Polygon { outer, holes } => {
            let mut all = outer.clone();
            for hole in holes {
                all.extend_from_slice(hole);
            }
            all
        }
    }
}

/// Closed-set containment: every point of `b` lies in the closure of `a`.
pub fn covers(a: &Geometry, b: &Geometry) -> bool {
    if a.dimension() < b.dimension() {
        return false;
    }
    if !a.envelope().contains_envelope(&b.envelope()) {
        return false;
    }
    match a {
        Geometry::Point(_) => matches!(b, Geometry::Point(q) if a.covers_point(*q)),
        Geometry::Line(_) => vertices(b).iter().all(|p| a.covers_point(*p)),
        Geometry::Polygon { .. } => {
            if !vertices(b).iter().all(|p| a.covers_point(*p)) {
                return false;
            }
            // A segment of b escaping the polygon must properly cross its
            // boundary (vertices alone cannot see that).
            let segs_a = a.boundary_segments();
            for (b1, b2) in b.boundary_segments() {
                for &(a1, a2) in &segs_a {
                    if seg_contact(a1, a2, b1, b2) == SegContact::Cross {
                        return false;
                    }
                }
            }
            true
        }
    }
}

/// True when the interiors of `a` and `b` share at least one point.
pub fn interiors_intersect(a: &Geometry, b: &Geometry) -> bool {
    if !intersects(a, b) {
        return false;
    }
    match (a.dimension(), b.dimension()) {
        (0, _) | (_, 0) => {
            // A point has no boundary: the point itself is its interior, so
            // any contact away from the other side's boundary qualifies.
            let (pt, other) = if a.dimension() == 0 { (a, b) } else { (b, a) };
            let Geometry::Point(p) = pt else {
                return false;
            };
            let p = *p;
            match other {
                Geometry::Point(_) => true,
                Geometry::Line(_) => point_in_line_interior(other, p),
                Geometry::Polygon { .. } => other.locate(p) == Location::Inside,
            }
        }
        (1, 1) => {
            // Interior contact for two lines: a proper crossing, a collinear
            // shared span, or a vertex of one in the other's interior part.
            for (a1, a2) in a.boundary_segments() {
                for (b1, b2) in b.boundary_segments() {
                    match seg_contact(a1, a2, b1, b2) {
                        SegContact::Cross | SegContact::Collinear => return true,
                        _ => {}
                    }
                }
            }
            // T-junction: an interior vertex of one polyline resting on the
            // other's interior. Endpoints are line boundary, so they count
            // as touches, not interior contact.
            interior_vertices_meet_line(a, b) || interior_vertices_meet_line(b, a)
        }
        _ => {
            // At least one polygon involved.
            let (poly, other) = if a.dimension() == 2 { (a, b) } else { (b, a) };
            if vertices(other)
                .iter()
                .any(|p| poly.locate(*p) == Location::Inside)
            {
                return true;
            }
            for (o1, o2) in other.boundary_segments() {
                for (p1, p2) in poly.boundary_segments() {
                    if seg_contact(p1, p2, o1, o2) == SegContact::Cross {
                        return true;
                    }
                }
            }
            // Coincident or concentric polygons can share interior without
            // any vertex landing strictly inside; probe a representative
            // point of the envelope overlap.
            if other.dimension() == 2 {
                let center = poly.envelope().intersection(&other.envelope()).center();
                return poly.locate(center) == Location::Inside
                    && other.locate(center) == Location::Inside;
            }
            false
        }
    }
}

/// `p` lies on the line away from the line's two endpoints.
fn point_in_line_interior(line: &Geometry, p: DVec2) -> bool {
    let pts = match line {
        Geometry::Line(pts) if pts.len() >= 2 => pts,
        _ => return false,
    };
    line.covers_point(p)
        && p.distance_squared(pts[0]) > EPS * EPS
        && p.distance_squared(pts[pts.len() - 1]) > EPS * EPS
}

/// An interior (non-endpoint) vertex of `probe` resting on `target`'s
/// interior.
fn interior_vertices_meet_line(target: &Geometry, probe: &Geometry) -> bool {
    let probe_pts = match probe {
        Geometry::Line(pts) if pts.len() > 2 => &pts[1..pts.len() - 1],
        _ => return false,
    };
    probe_pts
        .iter()
        .any(|p| point_in_line_interior(target, *p))
}

/// Boundary-only contact: the geometries meet but their interiors do not.
pub fn touches(a: &Geometry, b: &Geometry) -> bool {
    intersects(a, b) && !interiors_intersect(a, b)
}

/// Strict containment: covered, and the interiors actually meet.
pub fn contains(a: &Geometry, b: &Geometry) -> bool {
    covers(a, b) && interiors_intersect(a, b)
}

/// Interiors meet, neither side is covered by the other, and the
/// intersection is lower-dimensional than the higher-dimensional operand
/// (a line through a polygon, two lines meeting at a point).
pub fn crosses(a: &Geometry, b: &Geometry) -> bool {
    match (a.dimension(), b.dimension()) {
        (1, 1) => {
            for (a1, a2) in a.boundary_segments() {
                for (b1, b2) in b.boundary_segments() {
                    if seg_contact(a1, a2, b1, b2) == SegContact::Cross {
                        return true;
                    }
                }
            }
            false
        }
        (1, 2) | (2, 1) => {
            interiors_intersect(a, b) && !covers(a, b) && !covers(b, a)
        }
        _ => false,
    }
}

/// Same-dimension partial overlap: interiors meet, neither covers the other.
pub fn overlaps(a: &Geometry, b: &Geometry) -> bool {
    a.dimension() == b.dimension()
        && interiors_intersect(a, b)
        && !covers(a, b)
        && !covers(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    fn unit_square() -> Geometry {
        Geometry::rect(v(0.0, 0.0), v(1.0, 1.0))
    }

    #[test]
    fn test_envelope_union_and_empty() {
        let mut env = Envelope::empty();
        assert!(env.is_empty());
        env.expand_to_include(&Envelope::new(v(0.0, 0.0), v(1.0, 2.0)));
        env.expand_to_include(&Envelope::empty());
        env.expand_to_include(&Envelope::new(v(-1.0, 0.5), v(0.5, 0.6)));
        assert_eq!(env.min, v(-1.0, 0.0));
        assert_eq!(env.max, v(1.0, 2.0));
        assert_eq!(env.width(), 2.0);
    }

    #[test]
    fn test_point_in_polygon_locations() {
        let square = unit_square();
        assert_eq!(square.locate(v(0.5, 0.5)), Location::Inside);
        assert_eq!(square.locate(v(0.0, 0.5)), Location::Boundary);
        assert_eq!(square.locate(v(1.5, 0.5)), Location::Outside);
    }

    #[test]
    fn test_polygon_hole_excludes_interior() {
        let donut = Geometry::Polygon {
            outer: vec![v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0), v(0.0, 10.0)],
            holes: vec![vec![v(4.0, 4.0), v(6.0, 4.0), v(6.0, 6.0), v(4.0, 6.0)]],
        };
        assert_eq!(donut.locate(v(5.0, 5.0)), Location::Outside);
        assert_eq!(donut.locate(v(4.0, 5.0)), Location::Boundary);
        assert_eq!(donut.locate(v(2.0, 2.0)), Location::Inside);
    }

    #[test]
    fn test_intersects_line_polygon() {
        let square = unit_square();
        let through = Geometry::Line(vec![v(-1.0, 0.5), v(2.0, 0.5)]);
        let outside = Geometry::Line(vec![v(2.0, 2.0), v(3.0, 3.0)]);
        assert!(intersects(&square, &through));
        assert!(disjoint(&square, &outside));
    }

    #[test]
    fn test_intersects_nested_polygons_without_boundary_contact() {
        let outer = Geometry::rect(v(0.0, 0.0), v(10.0, 10.0));
        let inner = Geometry::rect(v(4.0, 4.0), v(5.0, 5.0));
        assert!(intersects(&outer, &inner));
        assert!(intersects(&inner, &outer));
    }

    #[test]
    fn test_covers_and_contains() {
        let big = Geometry::rect(v(0.0, 0.0), v(10.0, 10.0));
        let small = Geometry::rect(v(2.0, 2.0), v(3.0, 3.0));
        let straddling = Geometry::rect(v(8.0, 8.0), v(12.0, 12.0));
        assert!(covers(&big, &small));
        assert!(contains(&big, &small));
        assert!(!covers(&big, &straddling));

        // Point on the boundary: covered, not contained.
        let corner = Geometry::Point(v(0.0, 0.0));
        assert!(covers(&big, &corner));
        assert!(!contains(&big, &corner));
    }

    #[test]
    fn test_covers_rejects_escaping_segment() {
        // Both endpoints inside a concave polygon but the segment leaves it.
        let concave = Geometry::Polygon {
            outer: vec![
                v(0.0, 0.0),
                v(10.0, 0.0),
                v(10.0, 10.0),
                v(6.0, 10.0),
                v(6.0, 2.0),
                v(4.0, 2.0),
                v(4.0, 10.0),
                v(0.0, 10.0),
            ],
            holes: Vec::new(),
        };
        let escaping = Geometry::Line(vec![v(2.0, 8.0), v(8.0, 8.0)]);
        assert!(concave.covers_point(v(2.0, 8.0)));
        assert!(concave.covers_point(v(8.0, 8.0)));
        assert!(!covers(&concave, &escaping));
    }

    #[test]
    fn test_touches_boundary_only() {
        let a = Geometry::rect(v(0.0, 0.0), v(1.0, 1.0));
        let b = Geometry::rect(v(1.0, 0.0), v(2.0, 1.0));
        assert!(touches(&a, &b));
        assert!(!overlaps(&a, &b));

        let tangent_line = Geometry::Line(vec![v(0.0, 1.0), v(1.0, 1.0)]);
        assert!(touches(&a, &tangent_line));
    }

    #[test]
    fn test_overlaps_partial_polygons() {
        let a = Geometry::rect(v(0.0, 0.0), v(2.0, 2.0));
        let b = Geometry::rect(v(1.0, 1.0), v(3.0, 3.0));
        assert!(overlaps(&a, &b));
        assert!(!touches(&a, &b));
        assert!(!covers(&a, &b));
    }

    #[test]
    fn test_crosses_line_through_polygon() {
        let square = unit_square();
        let through = Geometry::Line(vec![v(-1.0, 0.5), v(2.0, 0.5)]);
        assert!(crosses(&through, &square));
        assert!(crosses(&square, &through));

        let inside = Geometry::Line(vec![v(0.2, 0.5), v(0.8, 0.5)]);
        assert!(!crosses(&inside, &square));
        assert!(covers(&square, &inside));
    }

    #[test]
    fn test_crosses_lines_at_point() {
        let a = Geometry::Line(vec![v(0.0, 0.0), v(2.0, 2.0)]);
        let b = Geometry::Line(vec![v(0.0, 2.0), v(2.0, 0.0)]);
        assert!(crosses(&a, &b));

        // Meeting only at endpoints is a touch, not a cross.
        let c = Geometry::Line(vec![v(2.0, 2.0), v(3.0, 0.0)]);
        assert!(!crosses(&a, &c));
        assert!(touches(&a, &c));
    }

    #[test]
    fn test_collinear_lines_overlap() {
        let a = Geometry::Line(vec![v(0.0, 0.0), v(2.0, 0.0)]);
        let b = Geometry::Line(vec![v(1.0, 0.0), v(3.0, 0.0)]);
        assert!(overlaps(&a, &b));
        assert!(!touches(&a, &b));
    }

    #[test]
    fn test_point_predicates() {
        let square = unit_square();
        let inside = Geometry::Point(v(0.5, 0.5));
        let on_edge = Geometry::Point(v(0.0, 0.5));
        assert!(intersects(&square, &inside));
        assert!(contains(&square, &inside));
        assert!(touches(&square, &on_edge));
        assert!(!contains(&square, &on_edge));
    }
}
