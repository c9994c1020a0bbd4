//! Median-cut color quantization for icon theming.
//!
//! Samples every `quality`-th pixel, skipping mostly-transparent and
//! near-white ones, then repeatedly splits the most populated box of colors
//! at the median of its widest channel. Each box's average becomes a swatch;
//! swatches are ordered by how many sampled pixels they cover. The result is
//! deterministic for a given image.

#[cfg(test)]
#[path = "quantize_test.rs"]
mod quantize_test;

use image::DynamicImage;

use crate::color::{ColorError, Rgb};

/// Sampling stride: 1 inspects every pixel, higher is faster and coarser.
pub const DEFAULT_QUALITY: u32 = 10;

/// Swatches computed when only the dominant color is wanted.
pub const DEFAULT_PALETTE_SIZE: usize = 5;

/// Pixels with lower alpha are ignored.
const MIN_ALPHA: u8 = 125;

/// Pixels brighter than this on every channel count as background white.
const WHITE_CUTOFF: u8 = 250;

/// Most representative color of `image`.
///
/// # Errors
///
/// Returns `ColorError::EmptyImage` when no pixel survives sampling.
pub fn dominant_color(image: &DynamicImage, quality: u32) -> Result<Rgb, ColorError> {
    palette(image, DEFAULT_PALETTE_SIZE, quality)?
        .first()
        .copied()
        .ok_or(ColorError::EmptyImage)
}

/// Up to `count` swatches, most common first.
///
/// Fewer are returned when the image has fewer distinct colors.
///
/// # Errors
///
/// Returns `ColorError::EmptyImage` when no pixel survives sampling.
pub fn palette(image: &DynamicImage, count: usize, quality: u32) -> Result<Vec<Rgb>, ColorError> {
    let pixels = sample_pixels(image, quality);
    if pixels.is_empty() {
        return Err(ColorError::EmptyImage);
    }

    let mut boxes = vec![ColorBox { pixels }];
    while boxes.len() < count.max(1) {
        let Some(index) = split_candidate(&boxes) else {
            break;
        };
        let (low, high) = boxes.remove(index).split();
        boxes.push(low);
        boxes.push(high);
    }

    // Distinct boxes can average to the same color; merge their counts.
    let mut swatches: Vec<(Rgb, usize)> = Vec::with_capacity(boxes.len());
    for color_box in &boxes {
        let color = color_box.average();
        match swatches.iter_mut().find(|(c, _)| *c == color) {
            Some((_, population)) => *population += color_box.pixels.len(),
            None => swatches.push((color, color_box.pixels.len())),
        }
    }
    swatches.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(swatches.into_iter().map(|(color, _)| color).collect())
}

fn sample_pixels(image: &DynamicImage, quality: u32) -> Vec<[u8; 3]> {
    let step = usize::try_from(quality.max(1)).unwrap_or(1);
    image
        .to_rgba8()
        .pixels()
        .step_by(step)
        .filter_map(|px| {
            let [r, g, b, a] = px.0;
            let white = r > WHITE_CUTOFF && g > WHITE_CUTOFF && b > WHITE_CUTOFF;
            (a >= MIN_ALPHA && !white).then_some([r, g, b])
        })
        .collect()
}

/// Index of the most populated box that still holds more than one color.
fn split_candidate(boxes: &[ColorBox]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, color_box) in boxes.iter().enumerate() {
        if color_box.widest_channel().is_none() {
            continue;
        }
        if best.is_none_or(|j| color_box.pixels.len() > boxes[j].pixels.len()) {
            best = Some(i);
        }
    }
    best
}

struct ColorBox {
    pixels: Vec<[u8; 3]>,
}

impl ColorBox {
    /// Channel with the largest value range, `None` if every pixel is identical.
    fn widest_channel(&self) -> Option<usize> {
        let mut lo = [u8::MAX; 3];
        let mut hi = [u8::MIN; 3];
        for px in &self.pixels {
            for ch in 0..3 {
                lo[ch] = lo[ch].min(px[ch]);
                hi[ch] = hi[ch].max(px[ch]);
            }
        }
        let mut widest = None;
        let mut widest_range = 0;
        for ch in 0..3 {
            let range = hi[ch].saturating_sub(lo[ch]);
            if range > widest_range {
                widest = Some(ch);
                widest_range = range;
            }
        }
        widest
    }

    fn split(mut self) -> (Self, Self) {
        if let Some(ch) = self.widest_channel() {
            self.pixels.sort_by_key(|px| px[ch]);
        }
        let high = self.pixels.split_off(self.pixels.len() / 2);
        (self, Self { pixels: high })
    }

    fn average(&self) -> Rgb {
        let n = self.pixels.len() as u64;
        if n == 0 {
            return Rgb::default();
        }
        let mut sums = [0_u64; 3];
        for px in &self.pixels {
            for ch in 0..3 {
                sums[ch] += u64::from(px[ch]);
            }
        }
        let channel = |sum: u64| u8::try_from((sum + n / 2) / n).unwrap_or(u8::MAX);
        Rgb::new(channel(sums[0]), channel(sums[1]), channel(sums[2]))
    }
}
