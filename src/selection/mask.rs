//! Rasterizing a selection path and extracting the pixels it encloses.
//!
//! Only the part of the path's bounding box that lies inside the image is
//! rasterized, so memory follows the visible crop no matter how far control
//! points were dragged off the image. Pixels are classified with an even-odd
//! scanline fill over the segment polyline (pixel centers at integer
//! coordinates), and the outline itself, clipped to the window, counts as
//! selected.

use std::io::Write;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use ndarray::{Array2, Array3, ArrayView3};

use crate::error::{check_channels, Error, Result};

use super::geometry::{bresenham, Point};
use super::path::SelectionPath;

/// Inclusive pixel window `(x0, y0, x1, y1)`.
type Window = (i32, i32, i32, i32);

/// Inside/outside classification of one window of the image.
struct Raster {
    window: Window,
    width: usize,
    inside: Vec<bool>,
}

impl Raster {
    fn new(path: &SelectionPath, window: Window) -> Self {
        let (x0, y0, x1, y1) = window;
        let width = (x1 as i64 - x0 as i64 + 1) as usize;
        let height = (y1 as i64 - y0 as i64 + 1) as usize;
        let edges = outline_edges(path);
        let mut raster = Raster {
            window,
            width,
            inside: vec![false; width * height],
        };

        // Even-odd fill, half-open in y so shared vertices count once
        let mut crossings: Vec<f64> = Vec::new();
        for row in 0..height {
            let y = y0 as f64 + row as f64;
            crossings.clear();
            for &(a, b) in &edges {
                let (ay, by) = (a.y as f64, b.y as f64);
                if (ay <= y && y < by) || (by <= y && y < ay) {
                    let t = (y - ay) / (by - ay);
                    crossings.push(a.x as f64 + t * (b.x as f64 - a.x as f64));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for pair in crossings.chunks_exact(2) {
                let from = pair[0].ceil().max(x0 as f64) as i64;
                let to = pair[1].floor().min(x1 as f64) as i64;
                for x in from..=to {
                    raster.inside[row * width + (x - x0 as i64) as usize] = true;
                }
            }
        }

        let mut pixels = Vec::new();
        for &(a, b) in &edges {
            if let Some((from, to)) = clip_line(a, b, window) {
                pixels.clear();
                pixels.push(from);
                bresenham(from, to, &mut pixels);
                for &p in &pixels {
                    raster.mark(p);
                }
            }
        }
        raster
    }

    fn index(&self, p: Point) -> Option<usize> {
        let (x0, y0, x1, y1) = self.window;
        if p.x < x0 || p.x > x1 || p.y < y0 || p.y > y1 {
            return None;
        }
        let x = (p.x as i64 - x0 as i64) as usize;
        let y = (p.y as i64 - y0 as i64) as usize;
        Some(y * self.width + x)
    }

    fn mark(&mut self, p: Point) {
        if let Some(i) = self.index(p) {
            self.inside[i] = true;
        }
    }

    #[inline]
    fn contains(&self, p: Point) -> bool {
        self.index(p).is_some_and(|i| self.inside[i])
    }
}

/// Every straight piece of the outline, closing an open path to its anchor.
fn outline_edges(path: &SelectionPath) -> Vec<(Point, Point)> {
    let mut edges: Vec<(Point, Point)> = path
        .segments()
        .iter()
        .flat_map(|segment| segment.points().windows(2).map(|pair| (pair[0], pair[1])))
        .collect();
    if let (Some(start), Some(last)) = (path.start(), path.last_point()) {
        if !path.is_closed() && start != last {
            edges.push((last, start));
        }
    }
    edges
}

/// Clip the line `a -> b` to `window` (Liang-Barsky) and round the ends back
/// to pixels. Lines already inside the window come back unchanged.
fn clip_line(a: Point, b: Point, window: Window) -> Option<(Point, Point)> {
    let (x0, y0, x1, y1) = window;
    let (ax, ay) = (a.x as f64, a.y as f64);
    let dx = b.x as f64 - ax;
    let dy = b.y as f64 - ay;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [
        (-dx, ax - x0 as f64),
        (dx, x1 as f64 - ax),
        (-dy, ay - y0 as f64),
        (dy, y1 as f64 - ay),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    let at = |t: f64| Point::new((ax + t * dx).round() as i32, (ay + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}

/// The path's bounding box intersected with a `width` x `height` image.
fn clip_window(path: &SelectionPath, width: usize, height: usize) -> Option<Window> {
    let (min_x, min_y, max_x, max_y) = path.bounds()?;
    let x0 = (min_x as i64).max(0);
    let y0 = (min_y as i64).max(0);
    let x1 = (max_x as i64).min(width as i64 - 1);
    let y1 = (max_y as i64).min(height as i64 - 1);
    if x0 > x1 || y0 > y1 {
        return None;
    }
    // Bounded by the path's own i32 coordinates on both sides.
    Some((x0 as i32, y0 as i32, x1 as i32, y1 as i32))
}

/// Selection mask for an image of `width` x `height` (255 = selected).
///
/// An open path is treated as if closed back to its anchor.
pub fn selection_mask(path: &SelectionPath, width: usize, height: usize) -> Array2<u8> {
    let mut mask = Array2::<u8>::zeros((height, width));
    if let Some(window) = clip_window(path, width, height) {
        let raster = Raster::new(path, window);
        let (x0, y0, x1, y1) = window;
        for y in y0..=y1 {
            for x in x0..=x1 {
                if raster.contains(Point::new(x, y)) {
                    mask[[y as usize, x as usize]] = 255;
                }
            }
        }
    }
    mask
}

/// Crop `image` to the path's bounding box and mask out unselected pixels.
///
/// # Arguments
/// * `image` - Image with 1, 3, or 4 channels (height, width, channels)
/// * `path` - Selection path in image coordinates
///
/// # Returns
/// RGBA image (crop_height, crop_width, 4); alpha is 0 outside the selection
/// and the source alpha (or 255) inside.
pub fn extract_selection(image: ArrayView3<u8>, path: &SelectionPath) -> Result<Array3<u8>> {
    let (height, width, channels) = image.dim();
    check_channels(channels)?;
    if path.is_empty() {
        return Err(Error::InvalidArgument("selection is empty".into()));
    }
    let window = clip_window(path, width, height).ok_or_else(|| {
        Error::InvalidArgument("selection does not overlap the image".into())
    })?;
    let raster = Raster::new(path, window);
    let (x0, y0, x1, y1) = window;

    let crop_w = (x1 - x0 + 1) as usize;
    let crop_h = (y1 - y0 + 1) as usize;
    let mut output = Array3::<u8>::zeros((crop_h, crop_w, 4));

    for cy in 0..crop_h {
        for cx in 0..crop_w {
            let x = x0 as usize + cx;
            let y = y0 as usize + cy;
            if !raster.contains(Point::new(x as i32, y as i32)) {
                continue;
            }
            let (r, g, b, a) = match channels {
                1 => {
                    let v = image[[y, x, 0]];
                    (v, v, v, 255)
                }
                3 => (image[[y, x, 0]], image[[y, x, 1]], image[[y, x, 2]], 255),
                _ => (
                    image[[y, x, 0]],
                    image[[y, x, 1]],
                    image[[y, x, 2]],
                    image[[y, x, 3]],
                ),
            };
            output[[cy, cx, 0]] = r;
            output[[cy, cx, 1]] = g;
            output[[cy, cx, 2]] = b;
            output[[cy, cx, 3]] = a;
        }
    }

    Ok(output)
}

/// Encode an RGBA image (height, width, 4) as PNG into `writer`.
pub fn write_png<W: Write>(rgba: ArrayView3<u8>, writer: W) -> Result<()> {
    let (height, width, channels) = rgba.dim();
    if channels != 4 {
        return Err(Error::InvalidArgument(format!(
            "expected 4 channels, got {channels}"
        )));
    }
    let data: Vec<u8> = rgba.iter().copied().collect();
    PngEncoder::new(writer).write_image(
        &data,
        width as u32,
        height as u32,
        ExtendedColorType::Rgba8,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::model::SelectionModel;

    fn path_through(points: &[(i32, i32)]) -> SelectionPath {
        let mut model = SelectionModel::point_to_point();
        for &(x, y) in points {
            model.add_point(Point::new(x, y)).unwrap();
        }
        model.finish().unwrap();
        model.path().clone()
    }

    #[test]
    fn test_square_mask() {
        let path = path_through(&[(2, 2), (6, 2), (6, 6), (2, 6)]);
        let mask = selection_mask(&path, 10, 10);

        // 5x5 block including the outline
        let selected = mask.iter().filter(|&&v| v == 255).count();
        assert_eq!(selected, 25);
        assert_eq!(mask[[4, 4]], 255);
        assert_eq!(mask[[1, 1]], 0);
        assert_eq!(mask[[7, 4]], 0);
    }

    #[test]
    fn test_triangle_mask_excludes_corner() {
        let path = path_through(&[(0, 0), (8, 0), (0, 8)]);
        let mask = selection_mask(&path, 10, 10);

        assert_eq!(mask[[1, 1]], 255);
        assert_eq!(mask[[7, 7]], 0);
    }

    #[test]
    fn test_extract_crops_and_masks() {
        let mut image = Array3::<u8>::zeros((10, 10, 3));
        image.fill(200);
        let path = path_through(&[(1, 1), (7, 1), (1, 7)]);

        let rgba = extract_selection(image.view(), &path).unwrap();

        assert_eq!(rgba.dim(), (7, 7, 4));
        assert_eq!(rgba[[1, 1, 0]], 200);
        assert_eq!(rgba[[1, 1, 3]], 255);
        assert_eq!(rgba[[6, 6, 3]], 0);
    }

    #[test]
    fn test_extract_outside_image() {
        let image = Array3::<u8>::zeros((4, 4, 4));
        let path = path_through(&[(10, 10), (20, 10), (20, 20)]);

        assert!(matches!(
            extract_selection(image.view(), &path),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_png_signature() {
        let rgba = Array3::<u8>::zeros((3, 2, 4));
        let mut bytes = Vec::<u8>::new();
        write_png(rgba.view(), &mut bytes).unwrap();

        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_save_requires_selected() {
        let image = Array3::<u8>::zeros((4, 4, 4));
        let mut model = SelectionModel::point_to_point();
        model.add_point(Point::new(0, 0)).unwrap();

        let result = model.save_selection(image.view(), Vec::<u8>::new());
        assert!(matches!(result, Err(Error::IllegalState { .. })));
    }

    #[test]
    fn test_save_selected() {
        let image = Array3::<u8>::from_elem((8, 8, 4), 90);
        let mut model = SelectionModel::point_to_point();
        for (x, y) in [(1, 1), (6, 1), (6, 6)] {
            model.add_point(Point::new(x, y)).unwrap();
        }
        model.finish().unwrap();

        let mut bytes = Vec::<u8>::new();
        model.save_selection(image.view(), &mut bytes).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_save_after_point_dragged_far_off_image() {
        let image = Array3::<u8>::from_elem((8, 8, 4), 90);
        let mut model = SelectionModel::point_to_point();
        for (x, y) in [(1, 1), (6, 1), (6, 6), (1, 6)] {
            model.add_point(Point::new(x, y)).unwrap();
        }
        model.finish().unwrap();
        model.move_point(2, Point::new(200_000, 200_000)).unwrap();

        let mut bytes = Vec::<u8>::new();
        model.save_selection(image.view(), &mut bytes).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        // Crop stops at the image edge
        let rgba = extract_selection(image.view(), model.path()).unwrap();
        assert_eq!(rgba.dim(), (7, 7, 4));
        assert_eq!(rgba[[5, 5, 3]], 90);
    }

    #[test]
    fn test_extreme_coordinates_mask() {
        let path = crate::polygon(&[(i32::MIN, 0), (i32::MAX, 0), (0, 5)]).unwrap();
        let mask = selection_mask(&path, 4, 4);

        assert!(mask.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_open_path_closed_for_mask() {
        let mut model = SelectionModel::point_to_point();
        for (x, y) in [(0, 0), (6, 0), (6, 6)] {
            model.add_point(Point::new(x, y)).unwrap();
        }
        let mask = selection_mask(model.path(), 8, 8);

        assert_eq!(mask[[1, 4]], 255);
        assert_eq!(mask[[5, 1]], 0);
        // closing diagonal is part of the outline
        assert_eq!(mask[[3, 3]], 255);
    }
}
