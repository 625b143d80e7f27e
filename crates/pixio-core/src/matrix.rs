//! Float matrices used by calibration and camera control metadata.
//!
//! - [`Matrix3`] - fixed 3x3, e.g. colour correction matrices
//! - [`DynamicMatrix`] - any `rows x cols`, e.g. vignetting or shading grids
//!
//! Both store `f32` row-major and share the buffer exchange contract of
//! images: format `f`, shape `(rows, cols)`, byte strides `(4 * cols, 4)`.
//! Serialized they become nested rows, `[[row 0], [row 1], ...]`.
//!
//! # Usage
//!
//! ```rust
//! use pixio_core::Matrix3;
//!
//! let m = Matrix3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
//! assert_eq!(m[(1, 2)], 6.0);
//! assert_eq!(m.buffer_info().strides, vec![12, 4]);
//! ```

use std::ops::{Index, IndexMut};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{BufferInfo, Error, Result};

/// Fixed 3x3 row-major `f32` matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Matrix3 {
    data: [f32; 9],
}

impl Matrix3 {
    /// Builds from 9 row-major values.
    #[inline]
    pub const fn new(data: [f32; 9]) -> Self {
        Self { data }
    }

    /// Identity matrix.
    pub const fn identity() -> Self {
        Self::new([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    pub fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        let mut data = [0.0; 9];
        for (r, row) in rows.iter().enumerate() {
            data[r * 3..r * 3 + 3].copy_from_slice(row);
        }
        Self { data }
    }

    /// Copies a 3x3 `f32` buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::IncompatibleFormat`] if the elements are not `f32` or the
    ///   buffer is not contiguous
    /// - [`Error::IncompatibleBufferDimension`] if the shape is not 3x3
    pub fn from_buffer(info: &BufferInfo<'_>) -> Result<Self> {
        info.check_format::<f32>()?;
        if info.shape != [3, 3] {
            return Err(Error::incompatible_dimension(format!(
                "incompatible buffer shape {:?}, expected [3, 3]",
                info.shape
            )));
        }
        info.check_contiguous()?;
        let values = info.typed::<f32>()?;
        let mut data = [0.0; 9];
        data.copy_from_slice(values.get(..9).ok_or(Error::BufferTooSmall {
            required: 9,
            actual: values.len(),
        })?);
        Ok(Self { data })
    }

    #[inline]
    pub const fn num_rows(&self) -> usize {
        3
    }

    #[inline]
    pub const fn num_cols(&self) -> usize {
        3
    }

    /// Element at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * 3 + col]
    }

    /// Row-major storage.
    #[inline]
    pub fn data(&self) -> &[f32; 9] {
        &self.data
    }

    pub fn rows(&self) -> [[f32; 3]; 3] {
        [
            [self.data[0], self.data[1], self.data[2]],
            [self.data[3], self.data[4], self.data[5]],
            [self.data[6], self.data[7], self.data[8]],
        ]
    }

    pub fn buffer_info(&self) -> BufferInfo<'_> {
        BufferInfo::from_slice(&self.data, vec![3, 3])
    }
}

impl Index<(usize, usize)> for Matrix3 {
    type Output = f32;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        &self.data[row * 3 + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix3 {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        &mut self.data[row * 3 + col]
    }
}

impl Serialize for Matrix3 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Matrix3 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        <[[f32; 3]; 3]>::deserialize(deserializer).map(Self::from_rows)
    }
}

/// Row-major `f32` matrix of any positive size.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl DynamicMatrix {
    /// Adopts `data` as a `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::incompatible_dimension(format!(
                "matrix dimensions must be positive, got {rows}x{cols}"
            )));
        }
        if data.len() != rows * cols {
            return Err(Error::incompatible_dimension(format!(
                "{rows}x{cols} matrix needs {} values, got {}",
                rows * cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// A `rows x cols` matrix with every element set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f32) -> Result<Self> {
        Self::new(rows, cols, vec![value; rows * cols])
    }

    /// Builds from nested rows of equal length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(Error::incompatible_dimension(format!(
                "ragged rows: expected {cols} columns, found {}",
                bad.len()
            )));
        }
        let n = rows.len();
        Self::new(n, cols, rows.into_iter().flatten().collect())
    }

    /// Copies a two-dimensional `f32` buffer.
    pub fn from_buffer(info: &BufferInfo<'_>) -> Result<Self> {
        info.check_format::<f32>()?;
        info.check_ndim(2, 2)?;
        info.check_contiguous()?;
        let (rows, cols) = (info.shape[0], info.shape[1]);
        let values = info.typed::<f32>()?;
        let data = values
            .get(..rows * cols)
            .ok_or(Error::BufferTooSmall {
                required: rows * cols,
                actual: values.len(),
            })?
            .to_vec();
        Self::new(rows, cols, data)
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn num_cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Element at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks(self.cols)
    }

    pub fn buffer_info(&self) -> BufferInfo<'_> {
        BufferInfo::from_slice(&self.data, vec![self.rows, self.cols])
    }
}

impl Index<(usize, usize)> for DynamicMatrix {
    type Output = f32;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for DynamicMatrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        &mut self.data[row * self.cols + col]
    }
}

impl Serialize for DynamicMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}

impl<'de> Deserialize<'de> for DynamicMatrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let rows = Vec::<Vec<f32>>::deserialize(deserializer)?;
        Self::from_rows(rows).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix3_layout() {
        let m = Matrix3::new([0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(m.get(2, 1), 7.0);
        assert_eq!(m[(0, 2)], 2.0);
        assert_eq!(m.rows()[1], [3.0, 4.0, 5.0]);
        assert_eq!(Matrix3::identity()[(2, 2)], 1.0);
    }

    #[test]
    fn test_matrix3_from_buffer_shape() {
        let data = [1.0f32; 12];
        let info = BufferInfo::from_slice(&data, vec![4, 3]);
        assert!(matches!(
            Matrix3::from_buffer(&info),
            Err(Error::IncompatibleBufferDimension(_))
        ));

        let ints = [1i32; 9];
        let info = BufferInfo::from_slice(&ints, vec![3, 3]);
        assert!(matches!(
            Matrix3::from_buffer(&info),
            Err(Error::IncompatibleFormat { .. })
        ));
    }

    #[test]
    fn test_dynamic_matrix_new_checks() {
        assert!(DynamicMatrix::new(0, 3, vec![]).is_err());
        assert!(DynamicMatrix::new(2, 2, vec![1.0; 3]).is_err());
        assert!(DynamicMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(DynamicMatrix::from_rows(vec![]).is_err());
    }

    #[test]
    fn test_dynamic_matrix_buffer_info() {
        let m = DynamicMatrix::filled(2, 5, 0.5).unwrap();
        let info = m.buffer_info();
        assert_eq!(info.shape, vec![2, 5]);
        assert_eq!(info.strides, vec![20, 4]);
        assert_eq!(info.format, "f");
        let back = DynamicMatrix::from_buffer(&info).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_dynamic_matrix_serializes_rows() {
        let m = DynamicMatrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v, serde_json::json!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));
        let back: DynamicMatrix = serde_json::from_value(v).unwrap();
        assert_eq!(back.shape(), (2, 3));
        assert_eq!(back[(1, 0)], 4.0);
    }
}
