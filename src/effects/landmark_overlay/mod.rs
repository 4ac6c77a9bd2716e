//! Detection and landmark overlays
//!
//! Face boxes, pose skeletons, face meshes and hand skeletons drawn over a
//! copy of the frame.

use image::{Rgb, RgbImage};

use super::topology::{face_contours, irises, Tessellation, HAND_CONNECTIONS, POSE_CONNECTIONS};
use crate::config::DrawingConfig;
use crate::imaging::draw::{draw_connections, draw_landmarks, draw_rect, to_pixel_i32};
use crate::ml::{Detection, LandmarkSet};

/// Colors and sizes for skeleton and box overlays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub landmark_color: Rgb<u8>,
    pub landmark_radius: i32,
    pub connection_color: Rgb<u8>,
    pub connection_thickness: u32,
    pub box_color: Rgb<u8>,
    pub box_thickness: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self::from(&DrawingConfig::default())
    }
}

impl From<&DrawingConfig> for OverlayStyle {
    fn from(config: &DrawingConfig) -> Self {
        Self {
            landmark_color: Rgb(config.landmark_color),
            landmark_radius: config.landmark_radius,
            connection_color: Rgb(config.connection_color),
            connection_thickness: config.connection_thickness,
            box_color: Rgb(config.bounding_box_color),
            box_thickness: config.bounding_box_thickness,
        }
    }
}

/// Face mesh colors: a light tessellation under brighter contours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshStyle {
    pub tessellation_color: Rgb<u8>,
    pub contour_color: Rgb<u8>,
    pub iris_color: Rgb<u8>,
    pub contour_thickness: u32,
}

impl Default for MeshStyle {
    fn default() -> Self {
        Self {
            tessellation_color: Rgb([192, 192, 192]),
            contour_color: Rgb([255, 255, 255]),
            iris_color: Rgb([48, 255, 48]),
            contour_thickness: 1,
        }
    }
}

/// Bounding box and keypoints for every detection
pub fn draw_detections(image: &RgbImage, detections: &[Detection], style: &OverlayStyle) -> RgbImage {
    let mut out = image.clone();
    let (width, height) = out.dimensions();
    for detection in detections {
        let bbox = detection.bbox.to_pixels(width, height);
        draw_rect(
            &mut out,
            bbox.xmin,
            bbox.ymin,
            bbox.xmax,
            bbox.ymax,
            style.box_color,
            style.box_thickness,
        );
        for keypoint in &detection.keypoints {
            imageproc::drawing::draw_filled_circle_mut(
                &mut out,
                to_pixel_i32(keypoint, width, height),
                style.landmark_radius,
                style.landmark_color,
            );
        }
    }
    out
}

/// Skeleton drawn with the given connection table
pub fn draw_skeletons(
    image: &RgbImage,
    sets: &[LandmarkSet],
    connections: &[(usize, usize)],
    style: &OverlayStyle,
) -> RgbImage {
    let mut out = image.clone();
    for points in sets {
        draw_connections(
            &mut out,
            points,
            connections,
            style.connection_color,
            style.connection_thickness,
        );
        draw_landmarks(&mut out, points, style.landmark_color, style.landmark_radius);
    }
    out
}

pub fn draw_pose(image: &RgbImage, sets: &[LandmarkSet], style: &OverlayStyle) -> RgbImage {
    draw_skeletons(image, sets, &POSE_CONNECTIONS, style)
}

/// At most `max_hands` hands are drawn, in the order the model reported them
pub fn draw_hands(
    image: &RgbImage,
    sets: &[LandmarkSet],
    style: &OverlayStyle,
    max_hands: usize,
) -> RgbImage {
    let shown = &sets[..sets.len().min(max_hands)];
    draw_skeletons(image, shown, &HAND_CONNECTIONS, style)
}

/// Tessellation, then contours, then irises when the mesh carries them
pub fn draw_face_mesh(
    image: &RgbImage,
    faces: &[LandmarkSet],
    style: &MeshStyle,
    tessellation: &Tessellation,
) -> RgbImage {
    let mut out = image.clone();
    let contours = face_contours();
    let iris_edges = irises();
    for points in faces {
        draw_connections(
            &mut out,
            points,
            tessellation.edges(),
            style.tessellation_color,
            1,
        );
        draw_connections(
            &mut out,
            points,
            &contours,
            style.contour_color,
            style.contour_thickness,
        );
        draw_connections(&mut out, points, &iris_edges, style.iris_color, 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::RelativeBox;
    use crate::effects::topology::{
        FACE_MESH_LANDMARK_COUNT, FACE_MESH_WITH_IRIS_COUNT, FACE_OVAL, POSE_LANDMARK_COUNT,
    };
    use crate::ml::Landmark;
    use std::collections::BTreeSet;

    fn hand(offset: f32) -> LandmarkSet {
        (0..21)
            .map(|i| Landmark::new(offset + 0.01 * i as f32, 0.2 + 0.03 * i as f32))
            .collect()
    }

    #[test]
    fn test_detection_box_uses_box_color() {
        let image = RgbImage::new(100, 100);
        let detection = Detection {
            bbox: RelativeBox {
                xmin: 0.2,
                ymin: 0.2,
                width: 0.5,
                height: 0.5,
            },
            score: 0.9,
            keypoints: vec![Landmark::new(0.45, 0.45)],
        };
        let style = OverlayStyle::default();
        let out = draw_detections(&image, &[detection], &style);
        assert!((18..=22).any(|y| *out.get_pixel(45, y) == style.box_color));
        assert_eq!(*out.get_pixel(45, 45), style.landmark_color);
        assert_eq!(out.get_pixel(5, 5).0, [0, 0, 0]);
    }

    #[test]
    fn test_hands_are_capped() {
        let image = RgbImage::new(200, 200);
        let style = OverlayStyle::default();
        let sets = vec![hand(0.1), hand(0.6)];

        let one = draw_hands(&image, &sets, &style, 1);
        let both = draw_hands(&image, &sets, &style, 2);
        let right_half_lit = |img: &RgbImage| {
            img.enumerate_pixels()
                .any(|(x, _, p)| x > 110 && p.0 != [0, 0, 0])
        };
        assert!(!right_half_lit(&one));
        assert!(right_half_lit(&both));
    }

    #[test]
    fn test_empty_sets_leave_frame_untouched() {
        let image = RgbImage::from_pixel(10, 10, Rgb([9, 9, 9]));
        assert_eq!(draw_pose(&image, &[], &OverlayStyle::default()), image);
        assert_eq!(
            draw_face_mesh(&image, &[], &MeshStyle::default(), &Tessellation::empty()),
            image
        );
    }

    /// Mesh with every point parked in the top-left corner
    fn parked_mesh() -> LandmarkSet {
        vec![Landmark::new(0.02, 0.02); FACE_MESH_WITH_IRIS_COUNT]
    }

    #[test]
    fn test_pose_draws_skeleton() {
        let image = RgbImage::new(100, 100);
        let mut pose = vec![Landmark::new(0.5, 0.9); POSE_LANDMARK_COUNT];
        pose[11] = Landmark::new(0.3, 0.5);
        pose[12] = Landmark::new(0.7, 0.5);

        let style = OverlayStyle::default();
        let out = draw_pose(&image, &[pose], &style);
        // Shoulder line
        assert_eq!(*out.get_pixel(50, 50), style.connection_color);
        assert_eq!(*out.get_pixel(30, 50), style.landmark_color);
        assert_eq!(out.get_pixel(50, 20).0, [0, 0, 0]);
    }

    #[test]
    fn test_face_mesh_uses_only_table_edges() {
        let contour_points: BTreeSet<usize> = face_contours()
            .into_iter()
            .chain(irises())
            .flat_map(|(a, b)| [a, b])
            .collect();
        let free: Vec<usize> = (0..FACE_MESH_LANDMARK_COUNT)
            .filter(|i| !contour_points.contains(i))
            .take(3)
            .collect();
        let (a, b, c) = (free[0], free[1], free[2]);
        let tessellation = Tessellation::from_edges([(a, b)]).unwrap();
        let style = MeshStyle::default();

        let mut face = parked_mesh();
        face[a] = Landmark::new(0.2, 0.8);
        face[b] = Landmark::new(0.8, 0.8);
        face[c] = Landmark::new(0.5, 0.3);
        let first = draw_face_mesh(&RgbImage::new(100, 100), &[face.clone()], &style, &tessellation);

        // Same table on the next frame even though a point moved
        face[c] = Landmark::new(0.52, 0.3);
        let second = draw_face_mesh(&RgbImage::new(100, 100), &[face], &style, &tessellation);

        for out in [&first, &second] {
            assert_eq!(*out.get_pixel(50, 80), style.tessellation_color);
            // b-c and c-a are not in the table
            assert_eq!(out.get_pixel(65, 55).0, [0, 0, 0]);
            assert_eq!(out.get_pixel(35, 55).0, [0, 0, 0]);
        }
    }

    #[test]
    fn test_face_mesh_draws_contours_and_irises() {
        let mut face = parked_mesh();
        for (i, &idx) in FACE_OVAL.iter().enumerate() {
            let angle = i as f32 / FACE_OVAL.len() as f32 * std::f32::consts::TAU;
            face[idx] = Landmark::new(0.5 + 0.4 * angle.cos(), 0.5 + 0.4 * angle.sin());
        }
        face[469] = Landmark::new(0.6, 0.4);
        face[470] = Landmark::new(0.7, 0.4);
        face[471] = Landmark::new(0.7, 0.5);
        face[472] = Landmark::new(0.6, 0.5);

        let style = MeshStyle::default();
        let out = draw_face_mesh(&RgbImage::new(100, 100), &[face], &style, &Tessellation::empty());

        // Rightmost oval vertex sits near (90, 50)
        let on_oval = (88..=91).any(|x| (48..=52).any(|y| *out.get_pixel(x, y) == style.contour_color));
        assert!(on_oval);
        assert_eq!(*out.get_pixel(65, 40), style.iris_color);
        assert_eq!(out.get_pixel(50, 50).0, [0, 0, 0]);
    }
}
