//! ImageStag Selector
//!
//! Path-based region selection for images, with Python bindings via PyO3
//! and WASM bindings for JavaScript.
//!
//! ## Selection Model
//! A selection is traced by placing control points that are joined into a
//! path. Finishing closes the path back to its first point; afterwards any
//! control point can be dragged to a new position and only the two segments
//! touching it are rebuilt. Every edit can be undone and redone.
//!
//! States: `NO_SELECTION` -> `SELECTING` -> (`PROCESSING` ->) `SELECTED`.
//!
//! ## Segment Tools
//! - **Point-to-point**: straight lines between control points
//! - **Intelligent scissors**: least-cost pixel paths that follow image
//!   edges, computed in the background with cancellation and progress
//!
//! ## Image Format
//! Images are `(height, width, channels)` u8 arrays with 1, 3, or 4 channels.
//! Extracted selections are always RGBA with the selection as alpha.

pub mod config;
pub mod error;
pub mod graph;
pub mod scissors;
pub mod selection;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::SelectorConfig;
pub use error::{Error, Result};
pub use graph::IndexedMinPriorityQueue;
pub use scissors::{ScissorsTool, Weight};
pub use selection::{
    EventKind, Point, PointToPoint, PolyLine, SegmentTool, SelectionEvent, SelectionModel,
    SelectionPath, SelectionState,
};

/// Build a closed straight-line path from `(x, y)` pairs, as the bindings
/// receive them.
pub fn polygon(points: &[(i32, i32)]) -> Result<SelectionPath> {
    let points: Vec<Point> = points.iter().copied().map(Point::from).collect();
    SelectionPath::from_control_points(&points)
        .ok_or_else(|| Error::InvalidArgument("a selection needs at least two points".into()))
}

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray2, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::{PyIOError, PyIndexError, PyRuntimeError, PyValueError};
    use pyo3::prelude::*;
    use pyo3::types::PyBytes;

    use crate::error::Error;
    use crate::scissors::{self, CostMap, Weight};
    use crate::selection::{mask, Point};

    impl From<Error> for PyErr {
        fn from(err: Error) -> PyErr {
            let message = err.to_string();
            match err {
                Error::EmptyCollection => PyIndexError::new_err(message),
                Error::IllegalState { .. } => PyRuntimeError::new_err(message),
                Error::InvalidArgument(_) => PyValueError::new_err(message),
                Error::Encode(_) => PyIOError::new_err(message),
            }
        }
    }

    // ========================================================================
    // Intelligent Scissors
    // ========================================================================

    /// Least-cost edge-following path between two pixels.
    ///
    /// # Arguments
    /// * `image` - Input image (1, 3, or 4 channels)
    /// * `start` - (x, y) of the first control point
    /// * `end` - (x, y) of the second control point
    /// * `weight` - "CrossGradMono" (luminance edges) or "ColorBand"
    ///
    /// # Returns
    /// List of (x, y) pixels from start to end inclusive
    #[pyfunction]
    #[pyo3(signature = (image, start, end, weight="CrossGradMono"))]
    pub fn scissors_path<'py>(
        image: PyReadonlyArray3<'py, u8>,
        start: (i32, i32),
        end: (i32, i32),
        weight: &str,
    ) -> PyResult<Vec<(i32, i32)>> {
        let weight: Weight = weight.parse()?;
        let costs = CostMap::from_image(image.as_array(), weight)?;
        let path = scissors::scissors_path(&costs, Point::from(start), Point::from(end))?;
        Ok(path.points().iter().map(|p| (p.x, p.y)).collect())
    }

    /// Edge strength used by the scissors, 0-255 per pixel.
    #[pyfunction]
    #[pyo3(signature = (image, weight="CrossGradMono"))]
    pub fn edge_magnitude<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        weight: &str,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let weight: Weight = weight.parse()?;
        let result = scissors::gradient_magnitude(image.as_array(), weight)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Selection Export
    // ========================================================================

    /// Alpha mask (height, width) of the polygon through `points`.
    #[pyfunction]
    pub fn selection_mask<'py>(
        py: Python<'py>,
        points: Vec<(i32, i32)>,
        width: usize,
        height: usize,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let path = crate::polygon(&points)?;
        Ok(mask::selection_mask(&path, width, height).into_pyarray(py))
    }

    /// RGBA crop of `image` with everything outside the polygon transparent.
    #[pyfunction]
    pub fn extract_selection<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        points: Vec<(i32, i32)>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let path = crate::polygon(&points)?;
        let result = mask::extract_selection(image.as_array(), &path)?;
        Ok(result.into_pyarray(py))
    }

    /// PNG bytes of the selected region.
    #[pyfunction]
    pub fn selection_png<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        points: Vec<(i32, i32)>,
    ) -> PyResult<Bound<'py, PyBytes>> {
        let path = crate::polygon(&points)?;
        let rgba = mask::extract_selection(image.as_array(), &path)?;
        let mut bytes = Vec::<u8>::new();
        mask::write_png(rgba.view(), &mut bytes)?;
        Ok(PyBytes::new(py, &bytes))
    }

    /// ImageStag selector extension module
    #[pymodule]
    pub fn imagestag_selector(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Scissors
        m.add_function(wrap_pyfunction!(scissors_path, m)?)?;
        m.add_function(wrap_pyfunction!(edge_magnitude, m)?)?;

        // Export
        m.add_function(wrap_pyfunction!(selection_mask, m)?)?;
        m.add_function(wrap_pyfunction!(extract_selection, m)?)?;
        m.add_function(wrap_pyfunction!(selection_png, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::imagestag_selector;
