use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::ColorClass;

/// Inclusive HSV box in 8-bit camera convention: H in 0..180, S and V in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

pub fn default_range(class: ColorClass) -> HsvRange {
    match class {
        ColorClass::Red => HsvRange { lower: [0, 120, 70], upper: [10, 255, 255] },
        ColorClass::Yellow => HsvRange { lower: [20, 100, 100], upper: [30, 255, 255] },
        ColorClass::Blue => HsvRange { lower: [100, 150, 0], upper: [140, 255, 255] },
    }
}

/// Outline color used when annotating frames.
pub fn display_color(class: ColorClass) -> Rgb<u8> {
    match class {
        ColorClass::Red => Rgb([154, 26, 26]),
        ColorClass::Yellow => Rgb([255, 153, 51]),
        ColorClass::Blue => Rgb([28, 28, 161]),
    }
}

/// RGB -> HSV with hue halved into a byte, matching the range tables above.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = (v - min) as f32;

    let s = if v == 0 { 0 } else { (diff * 255.0 / v as f32).round() as u8 };
    if diff == 0.0 {
        return [0, s, v];
    }

    let (r, g, b) = (r as f32, g as f32, b as f32);
    let h_deg = if v as f32 == r {
        60.0 * (g - b) / diff
    } else if v as f32 == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let mut h = (h_deg / 2.0).round() as i32;
    if h < 0 {
        h += 180;
    }
    [(h % 180) as u8, s, v]
}

/// Produces one binary mask per configured color class.
#[derive(Debug, Clone)]
pub struct Segmenter {
    ranges: Vec<(ColorClass, HsvRange)>,
}

impl Segmenter {
    pub fn new(ranges: Vec<(ColorClass, HsvRange)>) -> Self {
        Self { ranges }
    }

    pub fn with_defaults() -> Self {
        Self::new(ColorClass::ALL.iter().map(|&c| (c, default_range(c))).collect())
    }

    /// Masks are 255 where all three channels fall inside the class range, 0 elsewhere.
    /// The frame is not modified.
    pub fn segment(&self, frame: &RgbImage) -> Vec<(ColorClass, GrayImage)> {
        let hsv: Vec<[u8; 3]> = frame.pixels().map(|p| rgb_to_hsv(p[0], p[1], p[2])).collect();
        let (w, h) = frame.dimensions();

        self.ranges
            .iter()
            .map(|&(class, range)| {
                let mut mask = GrayImage::new(w, h);
                for (px, hsv) in mask.pixels_mut().zip(&hsv) {
                    if range.contains(*hsv) {
                        *px = Luma([255]);
                    }
                }
                (class, mask)
            })
            .collect()
    }
}
