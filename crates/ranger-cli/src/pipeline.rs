use std::time::Instant;

use image::RgbImage;
use tracing::{debug, warn};

use ranger_link::gate::{Decision, DispatchGate};
use ranger_link::link::{ActuatorLink, Delivery};
use ranger_range::model::CalibrationModel;
use ranger_range::select::select_target;
use ranger_range::Detection;
use ranger_vision::blobs::BlobLimits;
use ranger_vision::color::Segmenter;
use ranger_vision::{find_candidates, Candidate};

#[derive(Debug, Clone)]
pub struct FrameReport {
    pub candidates: Vec<Candidate>,
    pub detections: Vec<Detection>,
    pub selected: Option<Detection>,
}

impl FrameReport {
    /// Candidates that produced a detection; rejected ones are left out.
    pub fn ranged_candidates(&self) -> Vec<Candidate> {
        self.detections.iter().map(|d| d.candidate).collect()
    }
}

/// Segmentation, blob extraction, ranging and selection for one frame.
pub struct Pipeline {
    segmenter: Segmenter,
    limits: BlobLimits,
    model: CalibrationModel,
}

impl Pipeline {
    pub fn new(segmenter: Segmenter, limits: BlobLimits, model: CalibrationModel) -> Self {
        Self { segmenter, limits, model }
    }

    pub fn process(&self, frame: &RgbImage) -> FrameReport {
        let width = frame.width();
        let candidates = find_candidates(frame, &self.segmenter, &self.limits);

        let detections: Vec<Detection> = candidates
            .iter()
            .filter_map(|c| match self.model.detect(width, c) {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!("range: dropping {:?} candidate at ({:.1},{:.1}): {}", c.class, c.cx, c.cy, e);
                    None
                }
            })
            .collect();

        let selected = select_target(detections.clone());
        FrameReport { candidates, detections, selected }
    }
}

/// Gate the frame's selection and hand it to the link when due.
/// Returns None when nothing was dispatched.
pub async fn dispatch(
    gate: &mut DispatchGate,
    link: &mut ActuatorLink,
    selected: Option<&Detection>,
    now: Instant,
) -> Option<Delivery> {
    match (gate.decide(selected.is_some(), now), selected) {
        (Decision::Dispatch, Some(det)) => Some(link.send(&det.to_message()).await),
        (decision, _) => {
            debug!("dispatch: {:?}", decision);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;
    use ranger_range::model::{AngularModel, LinearModel};
    use ranger_vision::{ColorClass, VisionConfig};
    use std::time::Duration;

    fn paint_disc(img: &mut RgbImage, cx: i32, cy: i32, r: i32, px: Rgb<u8>) {
        for y in 0..img.height() as i32 {
            for x in 0..img.width() as i32 {
                if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                    img.put_pixel(x as u32, y as u32, px);
                }
            }
        }
    }

    fn angular_pipeline() -> Pipeline {
        Pipeline::new(
            Segmenter::with_defaults(),
            VisionConfig::default().limits(),
            CalibrationModel::Angular(AngularModel { target_diameter_cm: 5.0, hfov_deg: 60.0 }),
        )
    }

    #[test]
    fn nearest_ball_is_selected_across_colors() {
        let mut frame = RgbImage::from_pixel(320, 240, Rgb([30, 30, 30]));
        paint_disc(&mut frame, 60, 120, 18, Rgb([230, 20, 20]));
        paint_disc(&mut frame, 160, 120, 40, Rgb([240, 220, 20]));
        paint_disc(&mut frame, 270, 120, 25, Rgb([20, 40, 230]));

        let report = angular_pipeline().process(&frame);
        assert_eq!(report.candidates.len(), 3);
        assert_eq!(report.detections.len(), 3);
        let sel = report.selected.unwrap();
        assert_eq!(sel.candidate.class, ColorClass::Yellow);
        // centered target: bearing is zero
        assert!(sel.angle_deg.abs() < 0.2);
        assert!(sel.distance_cm < 0.0);
    }

    #[test]
    fn empty_scene_selects_nothing() {
        let frame = RgbImage::from_pixel(320, 240, Rgb([30, 30, 30]));
        let report = angular_pipeline().process(&frame);
        assert!(report.candidates.is_empty());
        assert!(report.selected.is_none());
    }

    #[test]
    fn rejected_candidates_are_not_reported_as_ranged() {
        let mut frame = RgbImage::from_pixel(320, 240, Rgb([30, 30, 30]));
        paint_disc(&mut frame, 100, 120, 30, Rgb([230, 20, 20]));
        // zero field of view: every estimate hits a zero denominator
        let pipeline = Pipeline::new(
            Segmenter::with_defaults(),
            VisionConfig::default().limits(),
            CalibrationModel::Angular(AngularModel { target_diameter_cm: 5.0, hfov_deg: 0.0 }),
        );
        let report = pipeline.process(&frame);
        assert_eq!(report.candidates.len(), 1);
        assert!(report.detections.is_empty());
        assert!(report.ranged_candidates().is_empty());
        assert!(report.selected.is_none());

        let ok = angular_pipeline().process(&frame);
        assert_eq!(ok.ranged_candidates(), ok.candidates);
    }

    #[test]
    fn linear_model_flows_through() {
        let mut frame = RgbImage::from_pixel(320, 240, Rgb([30, 30, 30]));
        paint_disc(&mut frame, 160, 120, 30, Rgb([20, 40, 230]));
        let pipeline = Pipeline::new(
            Segmenter::with_defaults(),
            VisionConfig::default().limits(),
            CalibrationModel::Linear(LinearModel { base_distance_cm: 30.0, base_radius_px: 30.0 }),
        );
        let sel = pipeline.process(&frame).selected.unwrap();
        assert_relative_eq!(sel.distance_cm, 30.0, epsilon = 1.0);
        assert!(sel.angle_deg.abs() < 2.0);
    }

    #[tokio::test]
    async fn dispatch_follows_gate() {
        let t0 = Instant::now();
        let mut gate = DispatchGate::new(Duration::from_secs(5));
        let mut link = ActuatorLink::disabled();
        let det = Detection {
            candidate: Candidate { class: ColorClass::Red, cx: 10.0, cy: 10.0, radius_px: 12.0 },
            distance_cm: -40.0,
            angle_deg: -25.0,
        };

        assert_eq!(dispatch(&mut gate, &mut link, Some(&det), t0).await, Some(Delivery::Logged));
        assert_eq!(dispatch(&mut gate, &mut link, Some(&det), t0 + Duration::from_secs(2)).await, None);
        assert_eq!(dispatch(&mut gate, &mut link, None, t0 + Duration::from_secs(3)).await, None);
        assert_eq!(
            dispatch(&mut gate, &mut link, Some(&det), t0 + Duration::from_millis(3100)).await,
            Some(Delivery::Logged)
        );
    }
}
