//! Strided raw-buffer descriptions for zero-copy exchange.
//!
//! [`BufferInfo`] is the buffer-protocol style contract between pixio types
//! and external numeric array consumers: a byte slice plus element format
//! code, item size, shape and byte strides. Images and matrices produce one
//! with `buffer_info()` and accept one through `from_buffer()`.
//!
//! Strides are always in bytes here. Everywhere else in the crate they are
//! counted in elements.

use crate::{Error, Result, Sample};

/// A borrowed, strided view of numeric data.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferInfo<'a> {
    /// Raw bytes, starting at the first element.
    pub data: &'a [u8],
    /// Size of one element in bytes.
    pub item_size: usize,
    /// Element format code (`B`, `H`, `i`, `f`, `d`).
    pub format: &'a str,
    /// Extent of each axis, outermost first.
    pub shape: Vec<usize>,
    /// Byte distance between consecutive indices of each axis.
    pub strides: Vec<isize>,
}

impl<'a> BufferInfo<'a> {
    /// Describes a C-contiguous array of `T` with the given shape.
    pub fn from_slice<T: Sample>(data: &'a [T], shape: Vec<usize>) -> Self {
        let item_size = std::mem::size_of::<T>();
        let strides = contiguous_strides(&shape, item_size);
        Self {
            data: bytemuck::cast_slice(data),
            item_size,
            format: T::FORMAT,
            shape,
            strides,
        }
    }

    /// Number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total element count implied by the shape.
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the strides describe a dense row-major array.
    pub fn is_c_contiguous(&self) -> bool {
        self.strides == contiguous_strides(&self.shape, self.item_size)
    }

    /// Fails with [`Error::IncompatibleFormat`] unless the elements are `T`.
    pub fn check_format<T: Sample>(&self) -> Result<()> {
        if self.format != T::FORMAT || self.item_size != std::mem::size_of::<T>() {
            return Err(Error::incompatible_format(T::FORMAT, self.format));
        }
        Ok(())
    }

    /// Fails with [`Error::IncompatibleBufferDimension`] unless
    /// `min <= ndim <= max`.
    pub fn check_ndim(&self, min: usize, max: usize) -> Result<()> {
        if !(min..=max).contains(&self.ndim()) {
            return Err(Error::incompatible_dimension(format!(
                "expected {min} to {max} dimensions, got {}",
                self.ndim()
            )));
        }
        Ok(())
    }

    /// Fails with [`Error::IncompatibleFormat`] unless C-contiguous.
    pub fn check_contiguous(&self) -> Result<()> {
        self.check_strides(&contiguous_strides(&self.shape, self.item_size))
    }

    /// Fails with [`Error::IncompatibleFormat`] unless the byte strides are
    /// exactly `expected`.
    pub fn check_strides(&self, expected: &[isize]) -> Result<()> {
        if self.strides != expected {
            return Err(Error::incompatible_format(
                format!("strides {expected:?}"),
                format!("strides {:?}", self.strides),
            ));
        }
        Ok(())
    }

    /// Reinterprets the bytes as a slice of `T`.
    ///
    /// Fails if the format does not match or the bytes are misaligned.
    pub fn typed<T: Sample>(&self) -> Result<&'a [T]> {
        self.check_format::<T>()?;
        bytemuck::try_cast_slice(self.data).map_err(|e| {
            Error::incompatible_format(T::FORMAT, format!("{} ({e})", self.format))
        })
    }
}

/// Byte strides of a dense row-major array.
pub fn contiguous_strides(shape: &[usize], item_size: usize) -> Vec<isize> {
    let mut strides = vec![0isize; shape.len()];
    let mut step = item_size as isize;
    for (stride, &extent) in strides.iter_mut().zip(shape).rev() {
        *stride = step;
        step *= extent as isize;
    }
    strides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_strides() {
        assert_eq!(contiguous_strides(&[4, 5], 2), vec![10, 2]);
        assert_eq!(contiguous_strides(&[2, 3, 4], 4), vec![48, 16, 4]);
        assert!(contiguous_strides(&[], 4).is_empty());
    }

    #[test]
    fn test_from_slice() {
        let data = [0u16; 12];
        let info = BufferInfo::from_slice(&data, vec![3, 4]);
        assert_eq!(info.format, "H");
        assert_eq!(info.item_size, 2);
        assert_eq!(info.strides, vec![8, 2]);
        assert_eq!(info.data.len(), 24);
        assert!(info.is_c_contiguous());
        assert_eq!(info.typed::<u16>().unwrap().len(), 12);
    }

    #[test]
    fn test_format_and_rank_checks() {
        let data = [0f32; 8];
        let info = BufferInfo::from_slice(&data, vec![2, 4]);
        assert!(info.check_format::<f32>().is_ok());
        assert!(matches!(
            info.check_format::<u16>(),
            Err(Error::IncompatibleFormat { .. })
        ));
        assert!(info.check_ndim(2, 3).is_ok());
        assert!(matches!(
            info.check_ndim(3, 3),
            Err(Error::IncompatibleBufferDimension(_))
        ));
    }

    #[test]
    fn test_non_contiguous_rejected() {
        let data = [0u8; 16];
        let mut info = BufferInfo::from_slice(&data, vec![2, 4]);
        info.strides = vec![8, 1];
        assert!(!info.is_c_contiguous());
        assert!(matches!(
            info.check_contiguous(),
            Err(Error::IncompatibleFormat { .. })
        ));
    }
}
