use image::RgbImage;
use imageproc::drawing::draw_hollow_circle_mut;

use crate::{color::display_color, Candidate};

/// Copy of the frame with a 2px outline around each candidate.
pub fn annotate(frame: &RgbImage, candidates: &[Candidate]) -> RgbImage {
    let mut out = frame.clone();
    for c in candidates {
        let center = (c.cx.round() as i32, c.cy.round() as i32);
        let r = c.radius_px.round() as i32;
        let color = display_color(c.class);
        draw_hollow_circle_mut(&mut out, center, r, color);
        draw_hollow_circle_mut(&mut out, center, r + 1, color);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColorClass;
    use image::Rgb;

    #[test]
    fn outline_is_drawn_in_class_color() {
        let frame = RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]));
        let c = Candidate { class: ColorClass::Blue, cx: 25.0, cy: 25.0, radius_px: 10.0 };
        let out = annotate(&frame, &[c]);
        assert_eq!(out.get_pixel(35, 25), &display_color(ColorClass::Blue));
        assert_eq!(out.get_pixel(25, 25), &Rgb([0, 0, 0]));
        assert_eq!(frame.get_pixel(35, 25), &Rgb([0, 0, 0]));
    }
}
