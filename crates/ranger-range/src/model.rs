use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use ranger_vision::Candidate;

use crate::Detection;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub distance_cm: f64,
    pub angle_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("zero denominator: {0}")]
    ZeroDenominator(&'static str),
    #[error("non-finite {0}")]
    NonFinite(&'static str),
}

/// Converts a candidate's apparent size and position into range and bearing.
pub trait RangeModel {
    fn estimate(&self, frame_width_px: u32, candidate: &Candidate) -> Result<Estimate, EstimateError>;
}

fn nonzero(v: f64, what: &'static str) -> Result<f64, EstimateError> {
    if !v.is_finite() {
        return Err(EstimateError::NonFinite(what));
    }
    if v == 0.0 {
        return Err(EstimateError::ZeroDenominator(what));
    }
    Ok(v)
}

fn finite(est: Estimate) -> Result<Estimate, EstimateError> {
    if !est.distance_cm.is_finite() {
        return Err(EstimateError::NonFinite("distance"));
    }
    if !est.angle_deg.is_finite() {
        return Err(EstimateError::NonFinite("angle"));
    }
    Ok(est)
}

/// Size-to-distance through a measured horizontal field of view.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AngularModel {
    pub target_diameter_cm: f64,
    pub hfov_deg: f64,
}

impl RangeModel for AngularModel {
    fn estimate(&self, frame_width_px: u32, c: &Candidate) -> Result<Estimate, EstimateError> {
        let w = nonzero(frame_width_px as f64, "frame width")?;
        let r = nonzero(c.radius_px, "pixel radius")?;
        let tan_half = nonzero((self.hfov_deg.to_radians() / 2.0).tan(), "tan(hfov/2)")?;

        // Negative coefficient is part of the calibrated convention; keep the sign.
        let distance_cm = -(self.target_diameter_cm * w) / (2.0 * r * tan_half);
        // Linear in pixel offset, not a projected angle.
        let angle_deg = (c.cx - w / 2.0) / w * self.hfov_deg;
        finite(Estimate { distance_cm, angle_deg })
    }
}

/// One reference (distance, radius) pair measured at startup.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LinearModel {
    pub base_distance_cm: f64,
    pub base_radius_px: f64,
}

impl RangeModel for LinearModel {
    fn estimate(&self, frame_width_px: u32, c: &Candidate) -> Result<Estimate, EstimateError> {
        let w = nonzero(frame_width_px as f64, "frame width")?;
        let base_r = nonzero(self.base_radius_px, "base radius")?;

        let distance_cm = self.base_distance_cm * c.radius_px / base_r;
        let angle_deg = (c.cx - w / 2.0).atan2(distance_cm).to_degrees();
        finite(Estimate { distance_cm, angle_deg })
    }
}

/// The single model active for the process, chosen at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationModel {
    Angular(AngularModel),
    Linear(LinearModel),
}

impl CalibrationModel {
    pub fn name(&self) -> &'static str {
        match self {
            CalibrationModel::Angular(_) => "angular",
            CalibrationModel::Linear(_) => "linear",
        }
    }

    pub fn detect(&self, frame_width_px: u32, candidate: &Candidate) -> Result<Detection, EstimateError> {
        let est = self.estimate(frame_width_px, candidate)?;
        Ok(Detection { candidate: *candidate, distance_cm: est.distance_cm, angle_deg: est.angle_deg })
    }
}

impl RangeModel for CalibrationModel {
    fn estimate(&self, frame_width_px: u32, candidate: &Candidate) -> Result<Estimate, EstimateError> {
        match self {
            CalibrationModel::Angular(m) => m.estimate(frame_width_px, candidate),
            CalibrationModel::Linear(m) => m.estimate(frame_width_px, candidate),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RangingConfig {
    pub model: String, // "angular" | "linear"
    pub angular: Option<AngularModel>,
    pub linear: Option<LinearModel>,
}

impl RangingConfig {
    pub fn build(&self) -> Result<CalibrationModel> {
        let model = match self.model.as_str() {
            "angular" => CalibrationModel::Angular(
                self.angular.context("ranging.angular missing (model=angular)")?,
            ),
            "linear" => CalibrationModel::Linear(
                self.linear.context("ranging.linear missing (model=linear)")?,
            ),
            other => anyhow::bail!("unknown ranging.model: {}", other),
        };
        crate::doctor::check_model(&model)?;
        Ok(model)
    }
}
