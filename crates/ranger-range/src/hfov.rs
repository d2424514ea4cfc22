use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("reference distance must be > 0 (got {0})")]
    NonPositiveDistance(f64),
    #[error("real width must be > 0 (got {0})")]
    NonPositiveWidth(f64),
    #[error("the two points coincide")]
    CoincidentPoints,
    #[error("frame width is zero")]
    ZeroFrameWidth,
}

/// Result of one HFOV calibration, with the intermediates an operator wants to see.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HfovCalibration {
    pub pixel_width: f64,
    pub frame_real_width_cm: f64,
    pub hfov_exact_deg: f64,
    /// Whole degrees, rounded up to a multiple of 10.
    pub hfov_deg: u32,
}

/// Horizontal field of view from a reference of known width at a known distance.
///
/// `a` and `b` are the two screen points bounding `real_width_cm` on a frame
/// `frame_width_px` wide, with the reference `distance_cm` away from the camera.
pub fn compute_hfov(
    distance_cm: f64,
    real_width_cm: f64,
    a: (f64, f64),
    b: (f64, f64),
    frame_width_px: u32,
) -> Result<HfovCalibration, CalibrationError> {
    if !(distance_cm > 0.0) {
        return Err(CalibrationError::NonPositiveDistance(distance_cm));
    }
    if !(real_width_cm > 0.0) {
        return Err(CalibrationError::NonPositiveWidth(real_width_cm));
    }
    if frame_width_px == 0 {
        return Err(CalibrationError::ZeroFrameWidth);
    }
    let pixel_width = (a.0 - b.0).hypot(a.1 - b.1);
    if pixel_width == 0.0 {
        return Err(CalibrationError::CoincidentPoints);
    }

    let frame_real_width_cm = real_width_cm / pixel_width * frame_width_px as f64;
    let hfov_exact_deg = (2.0 * (frame_real_width_cm / (2.0 * distance_cm)).atan()).to_degrees();
    let hfov_deg = ((hfov_exact_deg / 10.0).ceil() * 10.0) as u32;

    Ok(HfovCalibration { pixel_width, frame_real_width_cm, hfov_exact_deg, hfov_deg })
}
