//! 3D intensity volumes loaded from NIfTI files
//!
//! Volumes are stored as `[x, y, z]` arrays of `f64`, the natural NIfTI
//! axis order. Axial slices are taken along `z`.

pub mod slices;
pub mod stats;

pub use slices::find_slices_of_interest;
pub use stats::{analyze_file, IntensityStats};

use crate::error::{QcError, Result};
use log::debug;
use ndarray::{Array3, ArrayD, ArrayView2, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::Path;

/// Compressed NIfTI extension
pub const NII_GZ_EXT: &str = ".nii.gz";

/// Uncompressed NIfTI extension
pub const NII_EXT: &str = ".nii";

/// A 3D scalar volume with axes (x, y, z)
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<f64>,
}

impl Volume {
    /// Opens a `.nii` or `.nii.gz` file
    ///
    /// Scaling slope/intercept from the header are applied. Volumes with
    /// more than three dimensions are accepted when every extra dimension
    /// has length 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded, or if the
    /// volume shape is not (effectively) 3D with at least one voxel
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let obj = ReaderOptions::new().read_file(path)?;
        let data = obj.into_volume().into_ndarray::<f64>()?;
        debug!("Loaded {} with shape {:?}", path.display(), data.shape());
        Self::from_dyn(data)
    }

    /// Wraps an in-memory `[x, y, z]` array
    ///
    /// # Errors
    ///
    /// Returns [`QcError::MalformedVolume`] if any axis has length 0
    pub fn from_array(data: Array3<f64>) -> Result<Self> {
        if data.is_empty() {
            return Err(QcError::MalformedVolume(format!(
                "volume has no voxels (shape {:?})",
                data.shape()
            )));
        }
        Ok(Self { data })
    }

    /// Drops trailing singleton axes of an N-d array and wraps the result
    fn from_dyn(mut data: ArrayD<f64>) -> Result<Self> {
        let shape = data.shape().to_vec();
        if shape.len() < 3 {
            return Err(QcError::MalformedVolume(format!(
                "expected at least 3 dimensions, got shape {:?}",
                shape
            )));
        }
        if shape[3..].iter().any(|&len| len != 1) {
            return Err(QcError::MalformedVolume(format!(
                "dimensions beyond the third must be singleton, got shape {:?}",
                shape
            )));
        }

        while data.ndim() > 3 {
            let last = data.ndim() - 1;
            data = data.index_axis_move(Axis(last), 0);
        }

        Self::from_array(data.into_dimensionality::<Ix3>()?)
    }

    /// Returns the (x, y, z) shape
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Returns the number of axial slices
    pub fn z_len(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Returns the total number of voxels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; a volume holds at least one voxel
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the axial slice at `z` as an `[x, y]` view
    ///
    /// # Panics
    ///
    /// Panics if `z` is out of bounds
    pub fn slice_at(&self, z: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(2), z)
    }

    /// Iterates over every voxel value
    pub fn voxels(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    /// Sum of intensities of every axial slice, indexed by z
    pub fn slice_sums(&self) -> Vec<f64> {
        self.data
            .axis_iter(Axis(2))
            .map(|slice| slice.sum())
            .collect()
    }
}

/// Returns whether a file name has a NIfTI extension
pub fn is_nifti(file_name: &str) -> bool {
    file_name.ends_with(NII_GZ_EXT) || file_name.ends_with(NII_EXT)
}

/// Removes a `.nii.gz` or `.nii` extension from a file name
///
/// Names without either extension are returned unchanged.
pub fn strip_nifti_ext(file_name: &str) -> &str {
    file_name
        .strip_suffix(NII_GZ_EXT)
        .or_else(|| file_name.strip_suffix(NII_EXT))
        .unwrap_or(file_name)
}
