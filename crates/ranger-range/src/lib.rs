pub mod doctor;
pub mod hfov;
pub mod model;
pub mod select;

use ranger_proto::ranging::RangingMessage;
use ranger_vision::Candidate;

/// A candidate with its physical range and bearing. Never outlives its frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub candidate: Candidate,
    pub distance_cm: f64,
    pub angle_deg: f64,
}

impl Detection {
    pub fn radius_px(&self) -> f64 {
        self.candidate.radius_px
    }

    /// Wire form; the pixel radius is dropped here.
    pub fn to_message(&self) -> RangingMessage {
        RangingMessage::new(self.candidate.class, self.distance_cm, self.angle_deg)
    }
}
