//! Image decoding and shrink-to-fit resizing

use crate::config::BoundsConfig;
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageError};

/// Decodes raw response bytes into an image, guessing the format from content
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes)
}

/// Optional maximum width and height for a resized image
///
/// Resizing only ever shrinks and always preserves the aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageBounds {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl ImageBounds {
    pub const UNBOUNDED: Self = Self {
        max_width: None,
        max_height: None,
    };

    pub fn new(max_width: Option<u32>, max_height: Option<u32>) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Computes the target dimensions for an image of the given size
    ///
    /// Width is constrained first, then height, each step scaling the other
    /// side proportionally with integer truncation.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        let (mut w, mut h) = (width, height);

        if let Some(max_w) = self.max_width {
            if w > max_w {
                h = scale(h, max_w, w);
                w = max_w;
            }
        }

        if let Some(max_h) = self.max_height {
            if h > max_h {
                w = scale(w, max_h, h);
                h = max_h;
            }
        }

        (w.max(1), h.max(1))
    }

    /// Returns a copy of `image` shrunk to fit within these bounds
    pub fn shrink(&self, image: &DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (target_w, target_h) = self.fit(width, height);

        if (target_w, target_h) == (width, height) {
            image.clone()
        } else {
            image.resize_exact(target_w, target_h, FilterType::Lanczos3)
        }
    }
}

impl From<BoundsConfig> for ImageBounds {
    fn from(config: BoundsConfig) -> Self {
        Self::new(config.max_width, config.max_height)
    }
}

fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    (u64::from(value) * u64::from(numerator) / u64::from(denominator)) as u32
}
