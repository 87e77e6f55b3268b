//! Edge weights for intelligent scissors.
//!
//! Both weights start from a 3x3 Sobel gradient and turn strong edges into
//! cheap pixels, so least-cost paths hug object boundaries.
//!
//! ## Supported Formats
//!
//! Weights accept images with 1, 3, or 4 channels:
//! - **Grayscale**: (height, width, 1) - uses single channel directly
//! - **RGB**: (height, width, 3) - luminance or per-channel gradients
//! - **RGBA**: (height, width, 4) - alpha is ignored

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView3};
use rayon::prelude::*;

use crate::error::{check_channels, Error, Result};

// BT.709 luminosity coefficients
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

const KERNEL_H: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const KERNEL_V: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// How gradient magnitude is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Weight {
    /// Sobel magnitude of BT.709 luminance.
    #[default]
    CrossGradMono,
    /// Largest Sobel magnitude over the color channels.
    ColorBand,
}

impl Weight {
    pub fn as_str(self) -> &'static str {
        match self {
            Weight::CrossGradMono => "CrossGradMono",
            Weight::ColorBand => "ColorBand",
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weight {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "CrossGradMono" | "gray" | "mono" => Ok(Weight::CrossGradMono),
            "ColorBand" | "color" => Ok(Weight::ColorBand),
            other => Err(Error::InvalidArgument(format!("unknown weight name '{other}'"))),
        }
    }
}

/// Gradient magnitude per pixel, clamped to 0-255. Border pixels are 0.
///
/// Fails with [`Error::InvalidArgument`] unless the image has 1, 3, or 4
/// channels.
pub fn gradient_magnitude(input: ArrayView3<u8>, weight: Weight) -> Result<Array2<u8>> {
    let (height, width, channels) = input.dim();
    check_channels(channels)?;
    let color_channels = if channels == 4 { 3 } else { channels };

    let rows: Vec<Vec<u8>> = (0..height)
        .into_par_iter()
        .map(|y| {
            let mut row = vec![0u8; width];
            if y == 0 || y + 1 >= height {
                return row;
            }
            for x in 1..width.saturating_sub(1) {
                row[x] = match weight {
                    Weight::CrossGradMono => sobel_at(y, x, |py, px| {
                        if color_channels == 1 {
                            input[[py, px, 0]] as f32
                        } else {
                            LUMA_R * input[[py, px, 0]] as f32
                                + LUMA_G * input[[py, px, 1]] as f32
                                + LUMA_B * input[[py, px, 2]] as f32
                        }
                    }),
                    Weight::ColorBand => (0..color_channels)
                        .map(|c| sobel_at(y, x, |py, px| input[[py, px, c]] as f32))
                        .max()
                        .unwrap_or(0),
                };
            }
            row
        })
        .collect();

    let flat: Vec<u8> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((height, width), flat)
        .map_err(|err| Error::InvalidArgument(err.to_string()))
}

/// Sobel magnitude at an interior pixel, sampling through `sample`.
#[inline]
fn sobel_at(y: usize, x: usize, sample: impl Fn(usize, usize) -> f32) -> u8 {
    let mut gx = 0.0f32;
    let mut gy = 0.0f32;
    for ky in 0..3 {
        for kx in 0..3 {
            let v = sample(y + ky - 1, x + kx - 1);
            gx += v * KERNEL_H[ky][kx] as f32;
            gy += v * KERNEL_V[ky][kx] as f32;
        }
    }
    (gx * gx + gy * gy).sqrt().min(255.0) as u8
}

/// Per-pixel traversal cost: `1 + (255 - magnitude)`, so edges are cheap.
pub fn pixel_costs(input: ArrayView3<u8>, weight: Weight) -> Result<Array2<u32>> {
    Ok(gradient_magnitude(input, weight)?.mapv(|m| 1 + (255 - m as u32)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// Left half black, right half white.
    fn step_image(channels: usize) -> Array3<u8> {
        let mut img = Array3::<u8>::zeros((6, 6, channels));
        for y in 0..6 {
            for x in 3..6 {
                for c in 0..channels {
                    img[[y, x, c]] = 255;
                }
            }
        }
        img
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("CrossGradMono".parse::<Weight>().unwrap(), Weight::CrossGradMono);
        assert_eq!("ColorBand".parse::<Weight>().unwrap(), Weight::ColorBand);
        assert!(matches!(
            "Sepia".parse::<Weight>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_edge_is_strong() {
        let img = step_image(3);
        let mag = gradient_magnitude(img.view(), Weight::CrossGradMono).unwrap();

        assert_eq!(mag[[2, 2]], 255);
        assert_eq!(mag[[2, 3]], 255);
        assert_eq!(mag[[2, 1]], 0);
        assert_eq!(mag[[0, 3]], 0); // border
    }

    #[test]
    fn test_color_band_sees_single_channel_edge() {
        let mut img = Array3::<u8>::zeros((5, 5, 4));
        for y in 0..5 {
            for x in 2..5 {
                img[[y, x, 2]] = 255; // blue only
            }
        }
        let mono = gradient_magnitude(img.view(), Weight::CrossGradMono).unwrap();
        let band = gradient_magnitude(img.view(), Weight::ColorBand).unwrap();

        assert!(band[[2, 2]] > mono[[2, 2]]);
        assert_eq!(band[[2, 2]], 255);
    }

    #[test]
    fn test_costs_favor_edges() {
        let img = step_image(1);
        let costs = pixel_costs(img.view(), Weight::CrossGradMono).unwrap();

        assert_eq!(costs[[2, 2]], 1);
        assert_eq!(costs[[2, 1]], 256);
    }

    #[test]
    fn test_unsupported_channels_rejected() {
        for channels in [0, 2, 5] {
            let img = Array3::<u8>::zeros((5, 5, channels));
            assert!(matches!(
                pixel_costs(img.view(), Weight::CrossGradMono),
                Err(Error::InvalidArgument(_))
            ));
            assert!(matches!(
                gradient_magnitude(img.view(), Weight::ColorBand),
                Err(Error::InvalidArgument(_))
            ));
        }
    }
}
