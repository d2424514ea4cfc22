pub mod blobs;
pub mod camera;
pub mod color;
pub mod overlay;

use image::RgbImage;
use serde::Deserialize;

pub use ranger_proto::ranging::ColorClass;

use crate::blobs::BlobLimits;
use crate::color::Segmenter;

/// A colored blob that survived the area and radius filters. Lives for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class: ColorClass,
    pub cx: f64,
    pub cy: f64,
    pub radius_px: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_min_contour_area")]
    pub min_contour_area: f64,
    #[serde(default = "default_min_radius_px")]
    pub min_radius_px: f64,
}

fn default_min_contour_area() -> f64 { 500.0 }
fn default_min_radius_px() -> f64 { 5.0 }

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            min_contour_area: default_min_contour_area(),
            min_radius_px: default_min_radius_px(),
        }
    }
}

impl VisionConfig {
    pub fn limits(&self) -> BlobLimits {
        BlobLimits { min_area: self.min_contour_area, min_radius: self.min_radius_px }
    }
}

/// Segment the frame and extract candidates for every color class.
/// Output is grouped by class in enumeration order, then by contour order.
pub fn find_candidates(frame: &RgbImage, segmenter: &Segmenter, limits: &BlobLimits) -> Vec<Candidate> {
    segmenter
        .segment(frame)
        .into_iter()
        .flat_map(|(class, mask)| blobs::extract(class, &mask, limits))
        .collect()
}
