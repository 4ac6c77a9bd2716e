//! Avatar overlays anchored on face mesh landmarks

use image::{Rgb, RgbImage};

use super::topology::{self, cartoon, mask, robot, LIPS};
use crate::control::AvatarType;
use crate::imaging::draw::{
    draw_closed_polyline, draw_connections, draw_ellipse, draw_line, draw_outlined_circle,
    draw_rect, to_pixel,
};
use crate::imaging::filter::add_weighted;
use crate::ml::{Landmark, LandmarkSet};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const NOSE_PINK: Rgb<u8> = Rgb([255, 120, 120]);
const ROBOT_CYAN: Rgb<u8> = Rgb([0, 255, 255]);
const SCAN_GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const CIRCUIT_BLUE: Rgb<u8> = Rgb([0, 160, 255]);
const MASK_GOLD: Rgb<u8> = Rgb([255, 215, 0]);
const NEON_MAGENTA: Rgb<u8> = Rgb([255, 0, 255]);
const NEON_CYAN: Rgb<u8> = Rgb([0, 255, 255]);
const NEON_GREEN: Rgb<u8> = Rgb([57, 255, 20]);

/// Pixels the robot scan line advances per frame
const SCAN_SPEED: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvatarParams {
    pub avatar_type: AvatarType,
    /// Multiplier on feature sizes derived from the inter-eye distance
    pub face_scale: f32,
}

impl Default for AvatarParams {
    fn default() -> Self {
        Self {
            avatar_type: AvatarType::Cartoon,
            face_scale: 1.2,
        }
    }
}

/// Pixel geometry of one face's eyes
#[derive(Debug, Clone, Copy, PartialEq)]
struct EyeGeometry {
    right_center: (f32, f32),
    left_center: (f32, f32),
    right_width: f32,
    left_width: f32,
}

impl EyeGeometry {
    fn from_points(points: &[Landmark], width: u32, height: u32) -> Option<Self> {
        let px = |i: usize| points.get(i).map(|p| to_pixel(p, width, height));
        let right_outer = px(topology::eyes::RIGHT_OUTER)?;
        let right_inner = px(topology::eyes::RIGHT_INNER)?;
        let left_inner = px(topology::eyes::LEFT_INNER)?;
        let left_outer = px(topology::eyes::LEFT_OUTER)?;
        Some(Self {
            right_center: midpoint(right_outer, right_inner),
            left_center: midpoint(left_inner, left_outer),
            right_width: distance(right_outer, right_inner),
            left_width: distance(left_inner, left_outer),
        })
    }

    fn inter_eye_distance(&self) -> f32 {
        distance(self.right_center, self.left_center)
    }
}

fn midpoint(a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn rounded(p: (f32, f32)) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}

/// Draw the selected avatar on every face. Faces missing the eye landmarks
/// are skipped.
pub fn render(image: &RgbImage, faces: &[LandmarkSet], params: &AvatarParams, tick: u64) -> RgbImage {
    match params.avatar_type {
        AvatarType::Cartoon => {
            let mut out = image.clone();
            for face in faces {
                draw_cartoon(&mut out, face, params.face_scale);
            }
            out
        }
        AvatarType::Robot => {
            let mut out = image.clone();
            for face in faces {
                draw_robot(&mut out, face);
            }
            draw_scan_line(&mut out, tick);
            out
        }
        AvatarType::Mask => {
            let mut out = image.clone();
            for face in faces {
                draw_mask(&mut out, face);
            }
            out
        }
        AvatarType::Neon => {
            let mut glow = RgbImage::new(image.width(), image.height());
            for face in faces {
                draw_neon(&mut glow, face);
            }
            add_weighted(image, 0.7, &glow, 0.3, 0.0)
        }
    }
}

fn draw_cartoon(image: &mut RgbImage, face: &[Landmark], face_scale: f32) {
    let (width, height) = image.dimensions();
    let Some(eyes) = EyeGeometry::from_points(face, width, height) else {
        return;
    };

    let radius = eyes.inter_eye_distance() * 0.25 * face_scale;
    for center in [eyes.right_center, eyes.left_center] {
        draw_outlined_circle(image, rounded(center), radius.round() as i32, WHITE, BLACK);
        imageproc::drawing::draw_filled_circle_mut(
            image,
            rounded(center),
            (radius * 0.5).round().max(1.0) as i32,
            BLACK,
        );
        let highlight = (center.0 - radius * 0.25, center.1 - radius * 0.25);
        imageproc::drawing::draw_filled_circle_mut(
            image,
            rounded(highlight),
            (radius * 0.2).round().max(1.0) as i32,
            WHITE,
        );
    }

    if let Some(nose) = face.get(cartoon::NOSE_TIP) {
        let center = rounded(to_pixel(nose, width, height));
        draw_outlined_circle(image, center, (radius * 0.4).round() as i32, NOSE_PINK, BLACK);
    }
}

fn draw_robot(image: &mut RgbImage, face: &[Landmark]) {
    let (width, height) = image.dimensions();
    let Some(eyes) = EyeGeometry::from_points(face, width, height) else {
        return;
    };

    for (center, eye_width) in [
        (eyes.right_center, eyes.right_width),
        (eyes.left_center, eyes.left_width),
    ] {
        let half_w = eye_width / 2.0;
        let half_h = eye_width * 0.3;
        draw_rect(
            image,
            center.0 - half_w,
            center.1 - half_h,
            center.0 + half_w,
            center.1 + half_h,
            ROBOT_CYAN,
            2,
        );
    }

    let forehead = face.get(robot::FOREHEAD).map(|p| to_pixel(p, width, height));
    let nose = face.get(robot::NOSE_TIP).map(|p| to_pixel(p, width, height));
    for anchor in [forehead, nose].into_iter().flatten() {
        draw_line(image, anchor, eyes.right_center, CIRCUIT_BLUE, 1);
        draw_line(image, anchor, eyes.left_center, CIRCUIT_BLUE, 1);
    }
}

/// Full-width horizontal line moving down by a fixed step per frame
fn draw_scan_line(image: &mut RgbImage, tick: u64) {
    let (width, height) = image.dimensions();
    if height == 0 {
        return;
    }
    let y = (tick.wrapping_mul(SCAN_SPEED) % height as u64) as f32;
    draw_line(image, (0.0, y), (width as f32 - 1.0, y), SCAN_GREEN, 1);
}

fn draw_mask(image: &mut RgbImage, face: &[Landmark]) {
    let (width, height) = image.dimensions();
    draw_closed_polyline(image, face, &mask::OUTLINE, MASK_GOLD, 2);

    let Some(eyes) = EyeGeometry::from_points(face, width, height) else {
        return;
    };
    for (center, eye_width) in [
        (eyes.right_center, eyes.right_width),
        (eyes.left_center, eyes.left_width),
    ] {
        let rx = (eye_width * 0.75).round() as i32;
        let ry = (eye_width * 0.45).round() as i32;
        draw_ellipse(image, rounded(center), rx, ry, MASK_GOLD);
    }
}

fn draw_neon(glow: &mut RgbImage, face: &[Landmark]) {
    draw_connections(glow, face, &topology::face_oval_connections(), NEON_MAGENTA, 2);
    draw_connections(glow, face, &LIPS, NEON_CYAN, 2);
    draw_connections(glow, face, &topology::LEFT_EYE, NEON_GREEN, 2);
    draw_connections(glow, face, &topology::RIGHT_EYE, NEON_GREEN, 2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::topology::FACE_MESH_LANDMARK_COUNT;

    /// A face centered in the frame with eye corners on a horizontal line
    fn synthetic_face() -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5); FACE_MESH_LANDMARK_COUNT];
        points[topology::eyes::RIGHT_OUTER] = Landmark::new(0.30, 0.40);
        points[topology::eyes::RIGHT_INNER] = Landmark::new(0.40, 0.40);
        points[topology::eyes::LEFT_INNER] = Landmark::new(0.60, 0.40);
        points[topology::eyes::LEFT_OUTER] = Landmark::new(0.70, 0.40);
        points[cartoon::NOSE_TIP] = Landmark::new(0.50, 0.60);
        points[robot::FOREHEAD] = Landmark::new(0.50, 0.20);
        for (i, &idx) in mask::OUTLINE.iter().enumerate() {
            let angle = i as f32 / mask::OUTLINE.len() as f32 * std::f32::consts::TAU;
            points[idx] = Landmark::new(0.5 + 0.35 * angle.cos(), 0.5 + 0.45 * angle.sin());
        }
        points
    }

    fn gray_frame() -> RgbImage {
        RgbImage::from_pixel(200, 200, Rgb([90, 90, 90]))
    }

    #[test]
    fn test_cartoon_eye_radius_follows_eye_distance() {
        let params = AvatarParams {
            avatar_type: AvatarType::Cartoon,
            face_scale: 1.0,
        };
        let out = render(&gray_frame(), &[synthetic_face()], &params, 0);
        // Eye centers at x=70 and x=130, y=80; radius = 60 * 0.25 = 15
        // Pupil covers the center; sclera is white between pupil and rim
        assert_eq!(out.get_pixel(70, 80).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(70, 92).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(70, 100).0, [90, 90, 90]);
    }

    #[test]
    fn test_robot_scan_line_moves_with_tick() {
        let params = AvatarParams {
            avatar_type: AvatarType::Robot,
            face_scale: 1.0,
        };
        let out = render(&gray_frame(), &[], &params, 10);
        assert_eq!(*out.get_pixel(5, 30), SCAN_GREEN);
        assert_eq!(out.get_pixel(5, 31).0, [90, 90, 90]);

        // Wraps at the frame height
        let out = render(&gray_frame(), &[], &params, 70);
        assert_eq!(*out.get_pixel(5, 10), SCAN_GREEN);
    }

    fn has_color(
        out: &RgbImage,
        xs: std::ops::RangeInclusive<u32>,
        ys: std::ops::RangeInclusive<u32>,
        color: Rgb<u8>,
    ) -> bool {
        xs.into_iter().any(|x| ys.clone().any(|y| *out.get_pixel(x, y) == color))
    }

    #[test]
    fn test_robot_eye_frames_and_circuits() {
        let params = AvatarParams {
            avatar_type: AvatarType::Robot,
            face_scale: 1.0,
        };
        let out = render(&gray_frame(), &[synthetic_face()], &params, 0);

        // Right eye spans x 60..80 at y=80, so its frame is 20 wide and 12 tall
        assert!(has_color(&out, 68..=72, 73..=75, ROBOT_CYAN));
        assert!(has_color(&out, 68..=72, 85..=87, ROBOT_CYAN));
        assert!(has_color(&out, 59..=61, 78..=82, ROBOT_CYAN));
        assert!(has_color(&out, 128..=132, 73..=75, ROBOT_CYAN));
        assert_eq!(out.get_pixel(66, 78).0, [90, 90, 90]);

        // Forehead (100, 40) and nose (100, 120) wired to the right eye center
        assert!(has_color(&out, 84..=86, 59..=61, CIRCUIT_BLUE));
        assert!(has_color(&out, 84..=86, 99..=101, CIRCUIT_BLUE));
        assert!(has_color(&out, 114..=116, 59..=61, CIRCUIT_BLUE));
    }

    #[test]
    fn test_mask_outline_drawn() {
        let params = AvatarParams {
            avatar_type: AvatarType::Mask,
            face_scale: 1.0,
        };
        let out = render(&gray_frame(), &[synthetic_face()], &params, 0);
        assert!(out.pixels().any(|p| *p == MASK_GOLD));
    }

    #[test]
    fn test_neon_without_faces_only_dims() {
        let params = AvatarParams {
            avatar_type: AvatarType::Neon,
            face_scale: 1.0,
        };
        let out = render(&gray_frame(), &[], &params, 0);
        assert!(out.pixels().all(|p| p.0 == [63, 63, 63]));
    }

    #[test]
    fn test_face_without_eyes_is_skipped() {
        let params = AvatarParams::default();
        let partial = vec![Landmark::new(0.5, 0.5); 10];
        assert_eq!(render(&gray_frame(), &[partial], &params, 0), gray_frame());
    }
}
