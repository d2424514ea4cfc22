use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{contour_area, convex_hull};
use imageproc::point::Point;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{Candidate, ColorClass};

const EPS: f64 = 1e-7;

/// Strict lower bounds a blob must exceed to become a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobLimits {
    pub min_area: f64,
    pub min_radius: f64,
}

impl BlobLimits {
    pub fn admits_area(&self, area: f64) -> bool {
        area > self.min_area
    }

    pub fn admits_radius(&self, radius: f64) -> bool {
        radius > self.min_radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl Circle {
    fn contains(&self, x: f64, y: f64) -> bool {
        ((x - self.cx).powi(2) + (y - self.cy).powi(2)).sqrt() <= self.r + EPS
    }

    fn from_two(a: (f64, f64), b: (f64, f64)) -> Self {
        let cx = (a.0 + b.0) / 2.0;
        let cy = (a.1 + b.1) / 2.0;
        let r = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt() / 2.0;
        Self { cx, cy, r }
    }

    fn from_three(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Self {
        let d = 2.0 * (a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1));
        if d.abs() < EPS {
            // collinear: the widest pair spans the rest
            let candidates = [Self::from_two(a, b), Self::from_two(a, c), Self::from_two(b, c)];
            return candidates
                .into_iter()
                .max_by(|x, y| x.r.total_cmp(&y.r))
                .unwrap_or(Self { cx: a.0, cy: a.1, r: 0.0 });
        }
        let sa = a.0 * a.0 + a.1 * a.1;
        let sb = b.0 * b.0 + b.1 * b.1;
        let sc = c.0 * c.0 + c.1 * c.1;
        let cx = (sa * (b.1 - c.1) + sb * (c.1 - a.1) + sc * (a.1 - b.1)) / d;
        let cy = (sa * (c.0 - b.0) + sb * (a.0 - c.0) + sc * (b.0 - a.0)) / d;
        let r = ((a.0 - cx).powi(2) + (a.1 - cy).powi(2)).sqrt();
        Self { cx, cy, r }
    }
}

/// Outermost contours of the mask; borders nested inside holes are skipped.
pub fn external_contours(mask: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Smallest circle containing every point. None for an empty slice.
pub fn min_enclosing_circle(points: &[Point<i32>]) -> Option<Circle> {
    // the circle is fixed by hull vertices; tiny inputs are used as-is
    let hull = convex_hull(points.to_vec());
    let support: &[Point<i32>] = if hull.len() < 3 { points } else { &hull[..] };
    let mut pts: Vec<(f64, f64)> = support.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let first = *pts.first()?;

    // Contour order is adversarial for the incremental algorithm; fixed seed keeps runs repeatable.
    let mut rng = StdRng::seed_from_u64(pts.len() as u64);
    pts.shuffle(&mut rng);

    let mut c = Circle { cx: first.0, cy: first.1, r: 0.0 };
    for i in 0..pts.len() {
        if c.contains(pts[i].0, pts[i].1) {
            continue;
        }
        c = Circle { cx: pts[i].0, cy: pts[i].1, r: 0.0 };
        for j in 0..i {
            if c.contains(pts[j].0, pts[j].1) {
                continue;
            }
            c = Circle::from_two(pts[i], pts[j]);
            for k in 0..j {
                if !c.contains(pts[k].0, pts[k].1) {
                    c = Circle::from_three(pts[i], pts[j], pts[k]);
                }
            }
        }
    }
    Some(c)
}

/// Area filter (enclosed polygon area), circle fit, radius filter, in that order.
pub fn candidates_from_contours(
    class: ColorClass,
    contours: &[Vec<Point<i32>>],
    limits: &BlobLimits,
) -> Vec<Candidate> {
    contours
        .iter()
        .filter(|pts| limits.admits_area(contour_area(pts)))
        .filter_map(|pts| min_enclosing_circle(pts))
        .filter(|c| limits.admits_radius(c.r))
        .map(|c| Candidate { class, cx: c.cx, cy: c.cy, radius_px: c.r })
        .collect()
}

pub fn extract(class: ColorClass, mask: &GrayImage, limits: &BlobLimits) -> Vec<Candidate> {
    candidates_from_contours(class, &external_contours(mask), limits)
}
