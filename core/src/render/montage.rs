use crate::error::{QcError, Result};
use crate::volume::Volume;
use image::{GrayImage, Luma};
use ndarray::ArrayView2;
use std::path::Path;

/// Gap between tiles, in pixels
const DEFAULT_PADDING: u32 = 4;

/// Grid layout for rendering axial slices side by side
///
/// Tiles are filled row by row in the order the slice indices are given.
/// Each tile is scaled independently from its own minimum (black) to its
/// own maximum (white). Tile pixel `(col, row)` shows voxel `[x, y]` with
/// `col = x` and `row = y`. Unused tiles stay black and indices beyond
/// `rows * cols` are not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceMontage {
    pub rows: u32,
    pub cols: u32,
    pub padding: u32,
}

impl SliceMontage {
    /// Creates a montage layout with the default padding
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            padding: DEFAULT_PADDING,
        }
    }

    /// Number of tiles in the grid
    pub fn capacity(&self) -> usize {
        (self.rows * self.cols) as usize
    }

    /// Renders the selected slices into a grayscale image
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is empty or an index is outside the
    /// volume
    pub fn render(&self, volume: &Volume, indices: &[usize]) -> Result<GrayImage> {
        if self.capacity() == 0 {
            return Err(QcError::Config(format!(
                "montage grid must be at least 1x1, got {}x{}",
                self.rows, self.cols
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&z| z >= volume.z_len()) {
            return Err(QcError::Processing(format!(
                "slice index {} out of range for {} slices",
                bad,
                volume.z_len()
            )));
        }

        let (x_len, y_len, _) = volume.shape();
        let (tile_w, tile_h) = (x_len as u32, y_len as u32);
        let width = self.cols * tile_w + (self.cols + 1) * self.padding;
        let height = self.rows * tile_h + (self.rows + 1) * self.padding;
        let mut canvas = GrayImage::new(width, height);

        for (tile, &z) in indices.iter().take(self.capacity()).enumerate() {
            let tile = tile as u32;
            let left = self.padding + (tile % self.cols) * (tile_w + self.padding);
            let top = self.padding + (tile / self.cols) * (tile_h + self.padding);
            draw_tile(&mut canvas, volume.slice_at(z), left, top);
        }

        Ok(canvas)
    }

    /// Renders the selected slices and writes them as a PNG
    pub fn save<P: AsRef<Path>>(&self, volume: &Volume, indices: &[usize], path: P) -> Result<()> {
        let canvas = self.render(volume, indices)?;
        canvas.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Copies one min-max scaled slice into the canvas at (left, top)
fn draw_tile(canvas: &mut GrayImage, slice: ArrayView2<'_, f64>, left: u32, top: u32) {
    let (lo, hi) = slice
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = hi - lo;

    for ((x, y), &v) in slice.indexed_iter() {
        let gray = if range > 0.0 && v.is_finite() {
            (((v - lo) / range) * 255.0).round() as u8
        } else {
            0
        };
        canvas.put_pixel(left + x as u32, top + y as u32, Luma([gray]));
    }
}
