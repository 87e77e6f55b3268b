//! WebAssembly exports for the ImageStag selector.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! ## Buffer Layout
//!
//! - Images are flat RGBA bytes (length = width * height * 4)
//! - Point lists are flat `[x0, y0, x1, y1, ...]` i32 arrays
//!
//! Mismatched buffer lengths raise a JavaScript error.

use ndarray::{Array3, ArrayView3};
use wasm_bindgen::prelude::*;

use crate::error::Error;
use crate::scissors::{self, CostMap, Weight};
use crate::selection::{mask, Point};

impl From<Error> for JsValue {
    fn from(err: Error) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

fn rgba_view(data: &[u8], width: usize, height: usize) -> Result<ArrayView3<'_, u8>, JsValue> {
    ArrayView3::from_shape((height, width, 4), data)
        .map_err(|_| JsValue::from_str("data length does not match width * height * 4"))
}

fn points_from_flat(coords: &[i32]) -> Result<Vec<(i32, i32)>, JsValue> {
    if coords.len() % 2 != 0 {
        return Err(JsValue::from_str("point list must hold x, y pairs"));
    }
    Ok(coords.chunks_exact(2).map(|c| (c[0], c[1])).collect())
}

fn flatten(points: &[Point]) -> Vec<i32> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

fn into_flat(array: Array3<u8>) -> Vec<u8> {
    array.into_raw_vec_and_offset().0
}

// ============================================================================
// Intelligent Scissors
// ============================================================================

/// Least-cost edge-following path between two pixels.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `start_x`, `start_y` - First control point
/// * `end_x`, `end_y` - Second control point
/// * `weight` - "CrossGradMono" or "ColorBand"
///
/// # Returns
/// Flat `[x0, y0, x1, y1, ...]` pixel coordinates from start to end
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn scissors_path_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    start_x: i32,
    start_y: i32,
    end_x: i32,
    end_y: i32,
    weight: &str,
) -> Result<Vec<i32>, JsValue> {
    let weight: Weight = weight.parse()?;
    let costs = CostMap::from_image(rgba_view(data, width, height)?, weight)?;
    let path = scissors::scissors_path(
        &costs,
        Point::new(start_x, start_y),
        Point::new(end_x, end_y),
    )?;
    Ok(flatten(path.points()))
}

// ============================================================================
// Selection Export
// ============================================================================

/// Alpha mask of the polygon through `points`, one byte per pixel.
#[wasm_bindgen]
pub fn selection_mask_wasm(points: &[i32], width: usize, height: usize) -> Result<Vec<u8>, JsValue> {
    let path = crate::polygon(&points_from_flat(points)?)?;
    let (alpha, _) = mask::selection_mask(&path, width, height).into_raw_vec_and_offset();
    Ok(alpha)
}

/// The image with everything outside the polygon made transparent.
///
/// # Returns
/// Flat RGBA bytes at the full input size, so the result can be put straight
/// back into an `ImageData` of the same dimensions.
#[wasm_bindgen]
pub fn extract_selection_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    points: &[i32],
) -> Result<Vec<u8>, JsValue> {
    let path = crate::polygon(&points_from_flat(points)?)?;
    let image = rgba_view(data, width, height)?;
    let alpha = mask::selection_mask(&path, width, height);

    let mut out = image.to_owned();
    for ((y, x), &a) in alpha.indexed_iter() {
        if a == 0 {
            out[[y, x, 3]] = 0;
        }
    }
    Ok(into_flat(out))
}

/// PNG bytes of the selected region, cropped to its bounding box.
#[wasm_bindgen]
pub fn selection_png_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    points: &[i32],
) -> Result<Vec<u8>, JsValue> {
    let path = crate::polygon(&points_from_flat(points)?)?;
    let rgba = mask::extract_selection(rgba_view(data, width, height)?, &path)?;
    let mut bytes = Vec::<u8>::new();
    mask::write_png(rgba.view(), &mut bytes)?;
    Ok(bytes)
}
