//! Detection post-processing
//!
//! Overlap metrics and non-maximum suppression for detector output.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{EffectsError, Result};

/// Axis-aligned box given by its corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl BoundingBox {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> f32 {
        (self.xmax - self.xmin).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.ymax - self.ymin).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }
}

/// Box in coordinates normalized to the frame size, as detectors report them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeBox {
    pub xmin: f32,
    pub ymin: f32,
    pub width: f32,
    pub height: f32,
}

impl RelativeBox {
    /// Scale to pixels, clipped to the frame
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        let w = frame_width as f32;
        let h = frame_height as f32;
        BoundingBox {
            xmin: (self.xmin * w).clamp(0.0, w),
            ymin: (self.ymin * h).clamp(0.0, h),
            xmax: ((self.xmin + self.width) * w).clamp(0.0, w),
            ymax: ((self.ymin + self.height) * h).clamp(0.0, h),
        }
    }
}

/// Intersection over union of two boxes; 0 when they do not overlap.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.xmin.max(b.xmin);
    let y1 = a.ymin.max(b.ymin);
    let x2 = a.xmax.min(b.xmax);
    let y2 = a.ymax.min(b.ymax);

    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }

    let intersection = (x2 - x1) * (y2 - y1);
    let union = a.area() + b.area() - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Greedy non-maximum suppression.
///
/// Picks the highest-scoring remaining box, keeps it, and drops every other
/// box whose IOU with it is at least `threshold`. Returns the kept indices in
/// pick order. Equal scores keep their input order.
pub fn non_max_suppression(
    boxes: &[BoundingBox],
    scores: &[f32],
    threshold: f32,
) -> Result<Vec<usize>> {
    if boxes.len() != scores.len() {
        return Err(EffectsError::invalid(format!(
            "{} boxes but {} scores",
            boxes.len(),
            scores.len()
        )));
    }

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for (pos, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        for &j in &order[pos + 1..] {
            if !suppressed[j] && iou(&boxes[i], &boxes[j]) >= threshold {
                suppressed[j] = true;
            }
        }
    }

    Ok(keep)
}
