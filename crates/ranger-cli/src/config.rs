use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use ranger_link::{DispatchConfig, LinkConfig};
use ranger_range::model::{AngularModel, LinearModel, RangingConfig};
use ranger_vision::{camera::CameraConfig, VisionConfig};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub camera: CameraConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    pub ranging: RangingConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub link: LinkConfig,
    pub overlay: Option<OverlayCfg>,
}

#[derive(Debug, Deserialize)]
pub struct OverlayCfg {
    /// Annotated copy of the latest frame is written here.
    pub path: String,
}

pub fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    let mut cfg = parse_config(&s)?;
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok())?;
    Ok(cfg)
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config toml")
}

fn env_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<f64>> {
    match lookup(key) {
        None => Ok(None),
        Some(v) => {
            let x: f64 = v.trim().parse().with_context(|| format!("{}={:?} is not a number", key, v))?;
            Ok(Some(x))
        }
    }
}

fn env_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>> {
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(None),
        Some("True" | "true" | "1") => Ok(Some(true)),
        Some("False" | "false" | "0") => Ok(Some(false)),
        Some(other) => anyhow::bail!("{}={:?} is not a boolean", key, other),
    }
}

/// Environment keys take precedence over the file:
/// HFOV, BALL_DIAMETER, BASE_DISTANCE, BASE_RADIUS, ARDUINO_CONNECTED, SERIAL_PORT.
pub fn apply_env_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    let hfov = env_f64(&lookup, "HFOV")?;
    let diameter = env_f64(&lookup, "BALL_DIAMETER")?;
    match (cfg.ranging.angular.as_mut(), hfov, diameter) {
        (Some(m), h, d) => {
            if let Some(h) = h { m.hfov_deg = h; }
            if let Some(d) = d { m.target_diameter_cm = d; }
        }
        (None, Some(hfov_deg), Some(target_diameter_cm)) => {
            cfg.ranging.angular = Some(AngularModel { target_diameter_cm, hfov_deg });
        }
        (None, None, None) => {}
        (None, _, _) => anyhow::bail!("HFOV and BALL_DIAMETER must both be set when [ranging.angular] is absent"),
    }

    let base_distance = env_f64(&lookup, "BASE_DISTANCE")?;
    let base_radius = env_f64(&lookup, "BASE_RADIUS")?;
    match (cfg.ranging.linear.as_mut(), base_distance, base_radius) {
        (Some(m), d, r) => {
            if let Some(d) = d { m.base_distance_cm = d; }
            if let Some(r) = r { m.base_radius_px = r; }
        }
        (None, Some(base_distance_cm), Some(base_radius_px)) => {
            cfg.ranging.linear = Some(LinearModel { base_distance_cm, base_radius_px });
        }
        (None, None, None) => {}
        (None, _, _) => anyhow::bail!("BASE_DISTANCE and BASE_RADIUS must both be set when [ranging.linear] is absent"),
    }

    if let Some(on) = env_flag(&lookup, "ARDUINO_CONNECTED")? {
        cfg.link.enable = on;
    }
    if let Some(dev) = lookup("SERIAL_PORT") {
        cfg.link.serial_dev = Some(dev);
    }
    Ok(())
}

/// Dispatch refresh interval; negative, NaN and overflowing values are rejected.
pub fn refresh_interval(cfg: &Config) -> Result<Duration> {
    Duration::try_from_secs_f64(cfg.dispatch.refresh_s)
        .with_context(|| format!("dispatch.refresh_s out of range: {}", cfg.dispatch.refresh_s))
}

/// Startup checks; any failure stops the process before the loop starts.
pub fn validate(cfg: &Config) -> Result<()> {
    anyhow::ensure!(cfg.camera.width > 0 && cfg.camera.height > 0, "camera.width/height must be > 0");
    anyhow::ensure!(
        cfg.vision.min_contour_area.is_finite() && cfg.vision.min_contour_area >= 0.0,
        "vision.min_contour_area must be >= 0"
    );
    anyhow::ensure!(
        cfg.vision.min_radius_px.is_finite() && cfg.vision.min_radius_px >= 0.0,
        "vision.min_radius_px must be >= 0"
    );
    refresh_interval(cfg)?;
    if cfg.link.enable {
        anyhow::ensure!(
            cfg.link.serial_dev.as_ref().map(|s| !s.is_empty()).unwrap_or(false),
            "link.serial_dev missing"
        );
        anyhow::ensure!(cfg.link.baud > 0, "link.baud invalid");
    }
    cfg.ranging.build()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const BASE: &str = r#"
        [camera]
        mode = "v4l2-mjpeg"
        width = 640
        height = 480

        [ranging]
        model = "angular"

        [ranging.angular]
        target_diameter_cm = 6.5
        hfov_deg = 60.0
    "#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_fill_optional_sections() {
        let cfg = parse_config(BASE).unwrap();
        assert_eq!(cfg.camera.device, "/dev/video0");
        assert_eq!(cfg.vision.min_contour_area, 500.0);
        assert_eq!(cfg.vision.min_radius_px, 5.0);
        assert_eq!(cfg.dispatch.refresh_s, 5.0);
        assert!(!cfg.link.enable);
        assert_eq!(cfg.link.baud, 9600);
        assert!(cfg.overlay.is_none());
        validate(&cfg).unwrap();
    }

    #[test]
    fn env_overrides_calibration_and_link() {
        let mut cfg = parse_config(BASE).unwrap();
        apply_env_overrides(
            &mut cfg,
            env(&[("HFOV", "70"), ("ARDUINO_CONNECTED", "True"), ("SERIAL_PORT", "/dev/ttyACM0")]),
        )
        .unwrap();
        let m = cfg.ranging.angular.unwrap();
        assert_eq!(m.hfov_deg, 70.0);
        assert_eq!(m.target_diameter_cm, 6.5);
        assert!(cfg.link.enable);
        assert_eq!(cfg.link.serial_dev.as_deref(), Some("/dev/ttyACM0"));
    }

    #[test]
    fn env_can_supply_a_whole_linear_model() {
        let mut cfg = parse_config(BASE).unwrap();
        apply_env_overrides(&mut cfg, env(&[("BASE_DISTANCE", "30"), ("BASE_RADIUS", "42.5")])).unwrap();
        let m = cfg.ranging.linear.unwrap();
        assert_eq!((m.base_distance_cm, m.base_radius_px), (30.0, 42.5));

        let mut half = parse_config(BASE).unwrap();
        assert!(apply_env_overrides(&mut half, env(&[("BASE_RADIUS", "42.5")])).is_err());
    }

    #[test]
    fn malformed_env_values_are_fatal() {
        let mut cfg = parse_config(BASE).unwrap();
        assert!(apply_env_overrides(&mut cfg, env(&[("HFOV", "wide")])).is_err());
        let mut cfg = parse_config(BASE).unwrap();
        assert!(apply_env_overrides(&mut cfg, env(&[("ARDUINO_CONNECTED", "maybe")])).is_err());
    }

    #[test]
    fn validation_catches_bad_constants() {
        let mut cfg = parse_config(BASE).unwrap();
        apply_env_overrides(&mut cfg, env(&[("HFOV", "0")])).unwrap();
        assert!(validate(&cfg).is_err());

        let mut cfg = parse_config(BASE).unwrap();
        cfg.link.enable = true;
        assert!(validate(&cfg).is_err());

        let mut cfg = parse_config(BASE).unwrap();
        cfg.dispatch.refresh_s = -1.0;
        assert!(validate(&cfg).is_err());

        let linear_missing = BASE.replace("model = \"angular\"", "model = \"linear\"");
        assert!(validate(&parse_config(&linear_missing).unwrap()).is_err());
    }

    #[test]
    fn huge_refresh_interval_fails_validation_instead_of_panicking() {
        let toml = format!("{}\n[dispatch]\nrefresh_s = 1e20\n", BASE);
        let cfg = parse_config(&toml).unwrap();
        assert!(refresh_interval(&cfg).is_err());
        assert!(validate(&cfg).is_err());

        let ok = parse_config(&format!("{}\n[dispatch]\nrefresh_s = 2.5\n", BASE)).unwrap();
        assert_eq!(refresh_interval(&ok).unwrap(), Duration::from_millis(2500));
    }
}
