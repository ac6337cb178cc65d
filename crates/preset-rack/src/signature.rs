//! Coarse visual signatures for thumbnail change detection.
//!
//! A [`Signature`] is a cheap, reduced representation of a thumbnail: the
//! image dimensions plus a fixed grid of sampled pixels (with the corners
//! and edge midpoints added so border-only edits are caught). It exists
//! only for equality-based change detection — it is never used for display,
//! and comparison is exact: any differing sample point counts as "changed",
//! with no fuzzy tolerance.
//!
//! Sampling a `grid`×`grid` signature touches on the order of `grid²`
//! pixels regardless of thumbnail resolution, which is what keeps the
//! change detector's per-tick cost bounded.

use image::RgbaImage;

/// Default sample grid edge length.
pub const DEFAULT_SAMPLE_GRID: u32 = 8;

/// A sampled, reduced representation of a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    width: u32,
    height: u32,
    samples: Vec<u32>,
}

impl Signature {
    /// Sample a thumbnail into a signature.
    ///
    /// Returns `None` for an empty image. `grid` is clamped to at least 1.
    pub fn sample(image: &RgbaImage, grid: u32) -> Option<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        let grid = grid.max(1);
        let step_x = (width / grid).max(1);
        let step_y = (height / grid).max(1);

        let mut samples = Vec::with_capacity((grid as usize + 1).pow(2) + 8);

        let mut y = 0;
        while y < height {
            let mut x = 0;
            while x < width {
                samples.push(pack(image, x, y));
                x += step_x;
            }
            y += step_y;
        }

        // Corners and edge midpoints, so edits hugging the border register
        // even when the grid step leaves the last row/column unsampled.
        let edge_points = [
            (0, 0),
            (width - 1, 0),
            (0, height - 1),
            (width - 1, height - 1),
            (width / 2, 0),
            (width / 2, height - 1),
            (0, height / 2),
            (width - 1, height / 2),
        ];
        for (x, y) in edge_points {
            samples.push(pack(image, x, y));
        }

        Some(Self {
            width,
            height,
            samples,
        })
    }

    /// The sampled image's width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The sampled image's height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of sample points backing this signature.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

fn pack(image: &RgbaImage, x: u32, y: u32) -> u32 {
    let [r, g, b, a] = image.get_pixel(x, y).0;
    u32::from_be_bytes([r, g, b, a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_identical_images_equal() {
        let a = solid(64, 64, [10, 20, 30, 255]);
        let b = solid(64, 64, [10, 20, 30, 255]);
        assert_eq!(
            Signature::sample(&a, DEFAULT_SAMPLE_GRID),
            Signature::sample(&b, DEFAULT_SAMPLE_GRID)
        );
    }

    #[test]
    fn test_single_sampled_pixel_difference_detected() {
        let a = solid(64, 64, [10, 20, 30, 255]);
        let mut b = solid(64, 64, [10, 20, 30, 255]);
        // (0, 0) is always a sample point.
        b.put_pixel(0, 0, Rgba([11, 20, 30, 255]));

        assert_ne!(
            Signature::sample(&a, DEFAULT_SAMPLE_GRID),
            Signature::sample(&b, DEFAULT_SAMPLE_GRID)
        );
    }

    #[test]
    fn test_corner_difference_detected() {
        let a = solid(64, 64, [0, 0, 0, 255]);
        let mut b = solid(64, 64, [0, 0, 0, 255]);
        b.put_pixel(63, 63, Rgba([255, 255, 255, 255]));

        assert_ne!(
            Signature::sample(&a, DEFAULT_SAMPLE_GRID),
            Signature::sample(&b, DEFAULT_SAMPLE_GRID)
        );
    }

    #[test]
    fn test_dimension_change_detected() {
        let a = solid(64, 64, [10, 20, 30, 255]);
        let b = solid(32, 32, [10, 20, 30, 255]);
        assert_ne!(
            Signature::sample(&a, DEFAULT_SAMPLE_GRID),
            Signature::sample(&b, DEFAULT_SAMPLE_GRID)
        );
    }

    #[test]
    fn test_empty_image_has_no_signature() {
        let empty = RgbaImage::new(0, 0);
        assert!(Signature::sample(&empty, DEFAULT_SAMPLE_GRID).is_none());
    }

    #[test]
    fn test_tiny_image_sampled() {
        let img = solid(2, 2, [1, 2, 3, 4]);
        let sig = Signature::sample(&img, DEFAULT_SAMPLE_GRID).unwrap();
        assert!(sig.sample_count() > 0);
    }

    #[test]
    fn test_sample_count_bounded_by_grid_not_image() {
        let small = Signature::sample(&solid(32, 32, [0; 4]), 8).unwrap();
        let large = Signature::sample(&solid(512, 512, [0; 4]), 8).unwrap();
        // Same grid, wildly different image sizes, same number of samples.
        assert_eq!(small.sample_count(), large.sample_count());
    }
}
