//! Overlay drawing on RGB images

use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_ellipse_mut,
    draw_line_segment_mut,
};

use crate::ml::Landmark;

/// Map a normalized landmark onto pixel coordinates
pub fn to_pixel(point: &Landmark, width: u32, height: u32) -> (f32, f32) {
    (point.x * width as f32, point.y * height as f32)
}

/// Integer pixel position, for circle and ellipse centers
pub fn to_pixel_i32(point: &Landmark, width: u32, height: u32) -> (i32, i32) {
    let (x, y) = to_pixel(point, width, height);
    (x.round() as i32, y.round() as i32)
}

/// Draw a line of the given thickness as parallel 1px segments
pub fn draw_line(
    image: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    color: Rgb<u8>,
    thickness: u32,
) {
    let thickness = thickness.max(1);
    if thickness == 1 {
        draw_line_segment_mut(image, start, end, color);
        return;
    }

    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = if length > f32::EPSILON {
        (-dy / length, dx / length)
    } else {
        (0.0, 1.0)
    };

    let half = (thickness - 1) as f32 / 2.0;
    for i in 0..thickness {
        let offset = i as f32 - half;
        draw_line_segment_mut(
            image,
            (start.0 + nx * offset, start.1 + ny * offset),
            (end.0 + nx * offset, end.1 + ny * offset),
            color,
        );
    }
}

/// Draw every connection whose endpoints exist in `points`.
///
/// Out-of-range indices are skipped, so a topology that references refined
/// iris points still draws on a mesh without them.
pub fn draw_connections(
    image: &mut RgbImage,
    points: &[Landmark],
    connections: &[(usize, usize)],
    color: Rgb<u8>,
    thickness: u32,
) {
    let (width, height) = image.dimensions();
    for &(a, b) in connections {
        let (Some(start), Some(end)) = (points.get(a), points.get(b)) else {
            continue;
        };
        draw_line(
            image,
            to_pixel(start, width, height),
            to_pixel(end, width, height),
            color,
            thickness,
        );
    }
}

/// Draw a filled dot at each landmark
pub fn draw_landmarks(image: &mut RgbImage, points: &[Landmark], color: Rgb<u8>, radius: i32) {
    let (width, height) = image.dimensions();
    for point in points {
        draw_filled_circle_mut(image, to_pixel_i32(point, width, height), radius, color);
    }
}

/// Draw a closed polyline through the given landmark indices
pub fn draw_closed_polyline(
    image: &mut RgbImage,
    points: &[Landmark],
    indices: &[usize],
    color: Rgb<u8>,
    thickness: u32,
) {
    let (width, height) = image.dimensions();
    let path: Vec<(f32, f32)> = indices
        .iter()
        .filter_map(|&i| points.get(i))
        .map(|p| to_pixel(p, width, height))
        .collect();
    if path.len() < 2 {
        return;
    }
    for (i, &start) in path.iter().enumerate() {
        let end = path[(i + 1) % path.len()];
        draw_line(image, start, end, color, thickness);
    }
}

/// Axis-aligned rectangle outline in pixel coordinates
pub fn draw_rect(
    image: &mut RgbImage,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    color: Rgb<u8>,
    thickness: u32,
) {
    draw_line(image, (left, top), (right, top), color, thickness);
    draw_line(image, (right, top), (right, bottom), color, thickness);
    draw_line(image, (right, bottom), (left, bottom), color, thickness);
    draw_line(image, (left, bottom), (left, top), color, thickness);
}

/// Filled circle with a 1px outline in a second color
pub fn draw_outlined_circle(
    image: &mut RgbImage,
    center: (i32, i32),
    radius: i32,
    fill: Rgb<u8>,
    outline: Rgb<u8>,
) {
    let radius = radius.max(1);
    draw_filled_circle_mut(image, center, radius, fill);
    draw_hollow_circle_mut(image, center, radius, outline);
}

/// Ellipse outline
pub fn draw_ellipse(image: &mut RgbImage, center: (i32, i32), rx: i32, ry: i32, color: Rgb<u8>) {
    draw_hollow_ellipse_mut(image, center, rx.max(1), ry.max(1), color);
}
