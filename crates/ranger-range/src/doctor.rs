use anyhow::Result;

use crate::model::{AngularModel, CalibrationModel, LinearModel};

pub fn check_angular(m: &AngularModel) -> Result<()> {
    anyhow::ensure!(
        m.target_diameter_cm.is_finite() && m.target_diameter_cm > 0.0,
        "ranging.angular.target_diameter_cm must be > 0"
    );
    anyhow::ensure!(
        m.hfov_deg.is_finite() && m.hfov_deg > 0.0 && m.hfov_deg < 180.0,
        "ranging.angular.hfov_deg should be in (0, 180)"
    );
    Ok(())
}

pub fn check_linear(m: &LinearModel) -> Result<()> {
    anyhow::ensure!(
        m.base_distance_cm.is_finite() && m.base_distance_cm > 0.0,
        "ranging.linear.base_distance_cm must be > 0"
    );
    anyhow::ensure!(
        m.base_radius_px.is_finite() && m.base_radius_px > 0.0,
        "ranging.linear.base_radius_px must be > 0"
    );
    Ok(())
}

pub fn check_model(model: &CalibrationModel) -> Result<()> {
    match model {
        CalibrationModel::Angular(m) => check_angular(m),
        CalibrationModel::Linear(m) => check_linear(m),
    }
}
