//! K-means color quantization

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stopping rules for the clustering loop
#[derive(Debug, Clone, Copy)]
pub struct KMeansCriteria {
    pub max_iterations: u32,
    /// Stop once no center moves further than this (in color units)
    pub epsilon: f32,
}

impl Default for KMeansCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            epsilon: 1.0,
        }
    }
}

/// Quantize an image to at most `k` colors.
///
/// Initial centers are `k` distinct pixels drawn with a `StdRng` seeded from
/// `seed`, so the same input and seed always produce the same output.
pub fn kmeans_quantize(image: &RgbImage, k: usize, seed: u64, criteria: KMeansCriteria) -> RgbImage {
    let pixels: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32])
        .collect();
    if pixels.is_empty() || k == 0 {
        return image.clone();
    }

    let k = k.min(pixels.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centers: Vec<[f32; 3]> = rand::seq::index::sample(&mut rng, pixels.len(), k)
        .into_iter()
        .map(|i| pixels[i])
        .collect();
    let mut labels = vec![0usize; pixels.len()];

    for _ in 0..criteria.max_iterations.max(1) {
        for (label, pixel) in labels.iter_mut().zip(&pixels) {
            *label = nearest(&centers, pixel);
        }

        let mut sums = vec![[0.0f32; 3]; k];
        let mut counts = vec![0usize; k];
        for (&label, pixel) in labels.iter().zip(&pixels) {
            for ch in 0..3 {
                sums[label][ch] += pixel[ch];
            }
            counts[label] += 1;
        }

        let mut max_shift = 0.0f32;
        for (i, center) in centers.iter_mut().enumerate() {
            // Empty clusters keep their previous center
            if counts[i] == 0 {
                continue;
            }
            let updated = [
                sums[i][0] / counts[i] as f32,
                sums[i][1] / counts[i] as f32,
                sums[i][2] / counts[i] as f32,
            ];
            max_shift = max_shift.max(distance_sq(center, &updated).sqrt());
            *center = updated;
        }

        if max_shift <= criteria.epsilon {
            break;
        }
    }

    for (label, pixel) in labels.iter_mut().zip(&pixels) {
        *label = nearest(&centers, pixel);
    }

    let palette: Vec<Rgb<u8>> = centers
        .iter()
        .map(|c| Rgb([c[0].round() as u8, c[1].round() as u8, c[2].round() as u8]))
        .collect();
    let width = image.width();
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        palette[labels[(y * width + x) as usize]]
    })
}

fn nearest(centers: &[[f32; 3]], pixel: &[f32; 3]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::MAX;
    for (i, center) in centers.iter().enumerate() {
        let d = distance_sq(center, pixel);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

fn distance_sq(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn gradient() -> RgbImage {
        RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8]))
    }

    #[test]
    fn test_palette_size_bounded_by_k() {
        let out = kmeans_quantize(&gradient(), 8, 7, KMeansCriteria::default());
        let colors: HashSet<[u8; 3]> = out.pixels().map(|p| p.0).collect();
        assert!(colors.len() <= 8);
        assert!(colors.len() > 1);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let a = kmeans_quantize(&gradient(), 8, 42, KMeansCriteria::default());
        let b = kmeans_quantize(&gradient(), 8, 42, KMeansCriteria::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_one_pixel_per_cluster_is_exact() {
        let image = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([10, 20, 30])
            } else {
                Rgb([200, 100, 50])
            }
        });
        let out = kmeans_quantize(&image, 2, 1, KMeansCriteria::default());
        assert_eq!(out, image);
    }
}
