use crate::Detection;

/// Orders by pixel radius, largest first. The sort is stable, so equal radii
/// keep their input order (color class order, then contour order).
pub fn rank_by_radius(mut dets: Vec<Detection>) -> Vec<Detection> {
    dets.sort_by(|a, b| b.radius_px().total_cmp(&a.radius_px()));
    dets
}

/// Largest apparent target of the frame, if any.
pub fn select_target(dets: Vec<Detection>) -> Option<Detection> {
    rank_by_radius(dets).into_iter().next()
}
